//! Style table for `xl/styles.xml`
//!
//! Fonts, fills, borders, number formats and cell formats (xfs) are
//! deduplicated; equal [`CellStyle`]s always map to the same xf id.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};

use super::xml_writer::XmlWriter;
use crate::error::Result;
use crate::style::{argb, BorderStyle, CellStyle, HorizontalAlign, VerticalAlign};

const DEFAULT_FONT_NAME: &str = "Calibri";
const DEFAULT_FONT_SIZE: u32 = 11;
/// First id available for custom number formats
const FIRST_CUSTOM_NUM_FMT: u32 = 164;

const BUILTIN_NUM_FMTS: &[(u32, &str)] = &[
    (0, "General"),
    (1, "0"),
    (2, "0.00"),
    (3, "#,##0"),
    (4, "#,##0.00"),
    (9, "0%"),
    (10, "0.00%"),
    (11, "0.00E+00"),
    (14, "mm-dd-yy"),
    (15, "d-mmm-yy"),
    (16, "d-mmm"),
    (17, "mmm-yy"),
    (18, "h:mm AM/PM"),
    (19, "h:mm:ss AM/PM"),
    (20, "h:mm"),
    (21, "h:mm:ss"),
    (22, "m/d/yy h:mm"),
    (49, "@"),
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Font {
    name: String,
    size: u32,
    bold: bool,
    italic: bool,
    underline: bool,
    color: Option<String>,
}

impl Default for Font {
    fn default() -> Self {
        Font {
            name: DEFAULT_FONT_NAME.to_string(),
            size: DEFAULT_FONT_SIZE,
            bold: false,
            italic: false,
            underline: false,
            color: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Fill {
    None,
    Gray125,
    Solid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
struct Border {
    style: BorderStyle,
    color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
struct Alignment {
    horizontal: Option<HorizontalAlign>,
    vertical: Option<VerticalAlign>,
    wrap: bool,
}

impl Alignment {
    fn is_default(&self) -> bool {
        *self == Alignment::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
struct Xf {
    num_fmt: u32,
    font: u32,
    fill: u32,
    border: u32,
    alignment: Alignment,
}

/// Deduplicating registry of workbook styles
#[derive(Debug)]
pub struct StyleTable {
    fonts: IndexSet<Font>,
    fills: IndexSet<Fill>,
    borders: IndexSet<Border>,
    num_fmts: IndexMap<String, u32>,
    xfs: IndexSet<Xf>,
    cache: HashMap<CellStyle, u32>,
}

impl Default for StyleTable {
    fn default() -> Self {
        StyleTable::new()
    }
}

impl StyleTable {
    pub fn new() -> Self {
        let mut fonts = IndexSet::new();
        fonts.insert(Font::default());

        // Excel requires these two fills at ids 0 and 1
        let mut fills = IndexSet::new();
        fills.insert(Fill::None);
        fills.insert(Fill::Gray125);

        let mut borders = IndexSet::new();
        borders.insert(Border::default());

        let mut xfs = IndexSet::new();
        xfs.insert(Xf::default());

        StyleTable {
            fonts,
            fills,
            borders,
            num_fmts: IndexMap::new(),
            xfs,
            cache: HashMap::new(),
        }
    }

    /// Number of distinct cell formats, including the default
    pub fn xf_count(&self) -> usize {
        self.xfs.len()
    }

    /// Cell format id for a style; the default style is always 0.
    pub fn xf_id(&mut self, style: &CellStyle) -> Result<u32> {
        if style.is_default() {
            return Ok(0);
        }
        if let Some(&id) = self.cache.get(style) {
            return Ok(id);
        }

        let font = Font {
            name: style
                .font_name
                .clone()
                .unwrap_or_else(|| DEFAULT_FONT_NAME.to_string()),
            size: style.font_size.unwrap_or(DEFAULT_FONT_SIZE),
            bold: style.bold.unwrap_or(false),
            italic: style.italic.unwrap_or(false),
            underline: style.underline.unwrap_or(false),
            color: style.font_color.as_deref().map(argb).transpose()?,
        };
        let fill = match &style.fill_color {
            Some(color) => Fill::Solid(argb(color)?),
            None => Fill::None,
        };
        let border = Border {
            style: style.border.unwrap_or_default(),
            color: style.border_color.as_deref().map(argb).transpose()?,
        };
        let alignment = Alignment {
            horizontal: style.horizontal,
            vertical: style.vertical,
            wrap: style.wrap_text.unwrap_or(false),
        };

        let xf = Xf {
            num_fmt: style
                .number_format
                .as_deref()
                .map_or(0, |code| self.num_fmt_id(code)),
            font: self.fonts.insert_full(font).0 as u32,
            fill: self.fills.insert_full(fill).0 as u32,
            border: self.borders.insert_full(border).0 as u32,
            alignment,
        };
        let id = self.xfs.insert_full(xf).0 as u32;
        self.cache.insert(style.clone(), id);
        Ok(id)
    }

    fn num_fmt_id(&mut self, code: &str) -> u32 {
        if let Some(&(id, _)) = BUILTIN_NUM_FMTS.iter().find(|(_, c)| *c == code) {
            return id;
        }
        let next = FIRST_CUSTOM_NUM_FMT + self.num_fmts.len() as u32;
        *self.num_fmts.entry(code.to_string()).or_insert(next)
    }

    /// Serialize the table as `xl/styles.xml`
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut xml = XmlWriter::new(Vec::with_capacity(4096));
        xml.write_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#)?;
        xml.write_str("\n")?;
        xml.start_element("styleSheet")?;
        xml.attribute(
            "xmlns",
            "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
        )?;
        xml.close_start_tag()?;

        if !self.num_fmts.is_empty() {
            xml.start_element("numFmts")?;
            xml.attribute_int("count", self.num_fmts.len() as u32)?;
            xml.close_start_tag()?;
            for (code, id) in &self.num_fmts {
                xml.start_element("numFmt")?;
                xml.attribute_int("numFmtId", *id)?;
                xml.attribute("formatCode", code)?;
                xml.close_empty()?;
            }
            xml.end_element("numFmts")?;
        }

        xml.start_element("fonts")?;
        xml.attribute_int("count", self.fonts.len() as u32)?;
        xml.close_start_tag()?;
        for font in &self.fonts {
            write_font(&mut xml, font)?;
        }
        xml.end_element("fonts")?;

        xml.start_element("fills")?;
        xml.attribute_int("count", self.fills.len() as u32)?;
        xml.close_start_tag()?;
        for fill in &self.fills {
            write_fill(&mut xml, fill)?;
        }
        xml.end_element("fills")?;

        xml.start_element("borders")?;
        xml.attribute_int("count", self.borders.len() as u32)?;
        xml.close_start_tag()?;
        for border in &self.borders {
            write_border(&mut xml, border)?;
        }
        xml.end_element("borders")?;

        xml.write_str(
            r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
        )?;

        xml.start_element("cellXfs")?;
        xml.attribute_int("count", self.xfs.len() as u32)?;
        xml.close_start_tag()?;
        for xf in &self.xfs {
            write_xf(&mut xml, xf)?;
        }
        xml.end_element("cellXfs")?;

        xml.write_str(
            r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
        )?;
        xml.end_element("styleSheet")?;
        xml.into_inner()
    }
}

fn write_font<W: std::io::Write>(xml: &mut XmlWriter<W>, font: &Font) -> Result<()> {
    xml.write_str("<font>")?;
    if font.bold {
        xml.empty_element("b")?;
    }
    if font.italic {
        xml.empty_element("i")?;
    }
    if font.underline {
        xml.empty_element("u")?;
    }
    xml.start_element("sz")?;
    xml.attribute_int("val", font.size)?;
    xml.close_empty()?;
    if let Some(color) = &font.color {
        xml.start_element("color")?;
        xml.attribute("rgb", color)?;
        xml.close_empty()?;
    }
    xml.start_element("name")?;
    xml.attribute("val", &font.name)?;
    xml.close_empty()?;
    xml.end_element("font")
}

fn write_fill<W: std::io::Write>(xml: &mut XmlWriter<W>, fill: &Fill) -> Result<()> {
    match fill {
        Fill::None => xml.write_str(r#"<fill><patternFill patternType="none"/></fill>"#),
        Fill::Gray125 => xml.write_str(r#"<fill><patternFill patternType="gray125"/></fill>"#),
        Fill::Solid(color) => {
            xml.write_str(r#"<fill><patternFill patternType="solid"><fgColor"#)?;
            xml.attribute("rgb", color)?;
            xml.write_str(r#"/><bgColor indexed="64"/></patternFill></fill>"#)
        }
    }
}

fn write_border<W: std::io::Write>(xml: &mut XmlWriter<W>, border: &Border) -> Result<()> {
    if border.style == BorderStyle::None {
        return xml.write_str("<border><left/><right/><top/><bottom/><diagonal/></border>");
    }
    xml.write_str("<border>")?;
    for side in ["left", "right", "top", "bottom"] {
        xml.start_element(side)?;
        xml.attribute("style", border.style.as_str())?;
        match &border.color {
            Some(color) => {
                xml.write_str("><color")?;
                xml.attribute("rgb", color)?;
                xml.write_str("/>")?;
                xml.end_element(side)?;
            }
            None => xml.close_empty()?,
        }
    }
    xml.write_str("<diagonal/></border>")
}

fn write_xf<W: std::io::Write>(xml: &mut XmlWriter<W>, xf: &Xf) -> Result<()> {
    xml.start_element("xf")?;
    xml.attribute_int("numFmtId", xf.num_fmt)?;
    xml.attribute_int("fontId", xf.font)?;
    xml.attribute_int("fillId", xf.fill)?;
    xml.attribute_int("borderId", xf.border)?;
    xml.attribute_int("xfId", 0)?;
    if xf.num_fmt != 0 {
        xml.attribute("applyNumberFormat", "1")?;
    }
    if xf.font != 0 {
        xml.attribute("applyFont", "1")?;
    }
    if xf.fill != 0 {
        xml.attribute("applyFill", "1")?;
    }
    if xf.border != 0 {
        xml.attribute("applyBorder", "1")?;
    }
    if xf.alignment.is_default() {
        return xml.close_empty();
    }

    xml.attribute("applyAlignment", "1")?;
    xml.close_start_tag()?;
    xml.start_element("alignment")?;
    if let Some(h) = xf.alignment.horizontal {
        xml.attribute("horizontal", h.as_str())?;
    }
    if let Some(v) = xf.alignment.vertical {
        xml.attribute("vertical", v.as_str())?;
    }
    if xf.alignment.wrap {
        xml.attribute("wrapText", "1")?;
    }
    xml.close_empty()?;
    xml.end_element("xf")
}
