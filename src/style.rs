//! Cell style configuration
//!
//! Every property is optional; unset properties fall through to whatever a
//! lower-priority style (or the workbook default) says. Styles are combined
//! with [`CellStyle::merge`], later styles winning per property.

use crate::error::{ExportError, Result};

/// Border line style applied to all four sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BorderStyle {
    #[default]
    None,
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
}

impl BorderStyle {
    /// Name used in the OOXML `style` attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            BorderStyle::None => "none",
            BorderStyle::Thin => "thin",
            BorderStyle::Medium => "medium",
            BorderStyle::Thick => "thick",
            BorderStyle::Dashed => "dashed",
            BorderStyle::Dotted => "dotted",
            BorderStyle::Double => "double",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HorizontalAlign {
    General,
    Left,
    Center,
    Right,
    Justify,
}

impl HorizontalAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            HorizontalAlign::General => "general",
            HorizontalAlign::Left => "left",
            HorizontalAlign::Center => "center",
            HorizontalAlign::Right => "right",
            HorizontalAlign::Justify => "justify",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum VerticalAlign {
    Top,
    Center,
    Bottom,
}

impl VerticalAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerticalAlign::Top => "top",
            VerticalAlign::Center => "center",
            VerticalAlign::Bottom => "bottom",
        }
    }
}

/// Style applied to a cell or a range of cells
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CellStyle {
    pub font_name: Option<String>,
    pub font_size: Option<u32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    /// Font color as `RRGGBB` or `AARRGGBB`
    pub font_color: Option<String>,
    /// Solid fill color as `RRGGBB` or `AARRGGBB`
    pub fill_color: Option<String>,
    pub border: Option<BorderStyle>,
    pub border_color: Option<String>,
    pub horizontal: Option<HorizontalAlign>,
    pub vertical: Option<VerticalAlign>,
    pub wrap_text: Option<bool>,
    /// Number format code, e.g. `#,##0.00`
    pub number_format: Option<String>,
}

impl CellStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bold text for headers
    pub fn header_bold() -> Self {
        CellStyle::new().bold(true).fill_color("FFD9D9D9")
    }

    /// Integer format with thousand separator (#,##0)
    pub fn number_integer() -> Self {
        CellStyle::new().number_format("#,##0")
    }

    /// Decimal format with 2 places (#,##0.00)
    pub fn number_decimal() -> Self {
        CellStyle::new().number_format("#,##0.00")
    }

    /// Yellow background highlight
    pub fn highlight_yellow() -> Self {
        CellStyle::new().fill_color("FFFFFF00")
    }

    /// Thin borders on all sides
    pub fn border_thin() -> Self {
        CellStyle::new().border(BorderStyle::Thin)
    }

    pub fn font_name(mut self, name: impl Into<String>) -> Self {
        self.font_name = Some(name.into());
        self
    }

    pub fn font_size(mut self, size: u32) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = Some(bold);
        self
    }

    pub fn italic(mut self, italic: bool) -> Self {
        self.italic = Some(italic);
        self
    }

    pub fn underline(mut self, underline: bool) -> Self {
        self.underline = Some(underline);
        self
    }

    pub fn font_color(mut self, color: impl Into<String>) -> Self {
        self.font_color = Some(color.into());
        self
    }

    pub fn fill_color(mut self, color: impl Into<String>) -> Self {
        self.fill_color = Some(color.into());
        self
    }

    pub fn border(mut self, border: BorderStyle) -> Self {
        self.border = Some(border);
        self
    }

    pub fn border_color(mut self, color: impl Into<String>) -> Self {
        self.border_color = Some(color.into());
        self
    }

    pub fn horizontal(mut self, align: HorizontalAlign) -> Self {
        self.horizontal = Some(align);
        self
    }

    pub fn vertical(mut self, align: VerticalAlign) -> Self {
        self.vertical = Some(align);
        self
    }

    pub fn wrap_text(mut self, wrap: bool) -> Self {
        self.wrap_text = Some(wrap);
        self
    }

    pub fn number_format(mut self, code: impl Into<String>) -> Self {
        self.number_format = Some(code.into());
        self
    }

    /// Overlay `other` on top of this style; properties set in `other` win.
    pub fn merge(&mut self, other: &CellStyle) {
        fn overlay<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
            if src.is_some() {
                dst.clone_from(src);
            }
        }

        overlay(&mut self.font_name, &other.font_name);
        overlay(&mut self.font_size, &other.font_size);
        overlay(&mut self.bold, &other.bold);
        overlay(&mut self.italic, &other.italic);
        overlay(&mut self.underline, &other.underline);
        overlay(&mut self.font_color, &other.font_color);
        overlay(&mut self.fill_color, &other.fill_color);
        overlay(&mut self.border, &other.border);
        overlay(&mut self.border_color, &other.border_color);
        overlay(&mut self.horizontal, &other.horizontal);
        overlay(&mut self.vertical, &other.vertical);
        overlay(&mut self.wrap_text, &other.wrap_text);
        overlay(&mut self.number_format, &other.number_format);
    }

    /// Consuming variant of [`merge`](Self::merge)
    pub fn merged(mut self, other: &CellStyle) -> Self {
        self.merge(other);
        self
    }

    /// Whether no property is set
    pub fn is_default(&self) -> bool {
        *self == CellStyle::default()
    }

    /// Check that every color is a valid hex color.
    pub fn validate(&self) -> Result<()> {
        for color in [&self.font_color, &self.fill_color, &self.border_color]
            .into_iter()
            .flatten()
        {
            argb(color)?;
        }
        Ok(())
    }
}

/// Normalize `RRGGBB`, `#RRGGBB` or `AARRGGBB` to uppercase `AARRGGBB`.
pub fn argb(color: &str) -> Result<String> {
    let hex = color.trim_start_matches('#');
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ExportError::InvalidValue(format!(
            "'{}' is not a hex color",
            color
        )));
    }
    match hex.len() {
        6 => Ok(format!("FF{}", hex.to_ascii_uppercase())),
        8 => Ok(hex.to_ascii_uppercase()),
        _ => Err(ExportError::InvalidValue(format!(
            "'{}' is not a hex color",
            color
        ))),
    }
}
