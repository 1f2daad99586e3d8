//! Model metadata: column kinds, relations and attribute labels

use std::collections::HashMap;

use crate::error::{ExportError, Result};

/// Deepest supported attribute path, in segments
pub const MAX_PATH_DEPTH: usize = 16;

/// Storage kind of a model column, as far as export cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DataKind {
    Plain,
    Date,
    DateTime,
    Decimal { scale: u32 },
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub kind: DataKind,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, kind: DataKind) -> Self {
        ColumnSchema {
            name: name.into(),
            kind,
        }
    }
}

/// What a model field name refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMeta {
    Column(ColumnSchema),
    /// Relation to a single record of another model
    Relation { model: String },
}

/// Source of model metadata for query-bound sheets
pub trait ModelMetadata {
    /// Column names of `model` in declaration order
    fn attributes(&self, model: &str) -> Result<Vec<String>>;

    fn field(&self, model: &str, name: &str) -> Option<FieldMeta>;

    /// Declared label of an attribute, if any
    fn attribute_label(&self, model: &str, attribute: &str) -> Option<String>;
}

/// Metadata of one model, built up field by field
#[derive(Debug, Clone, Default)]
pub struct ModelSchema {
    name: String,
    attributes: Vec<String>,
    fields: HashMap<String, FieldMeta>,
    labels: HashMap<String, String>,
}

impl ModelSchema {
    pub fn new(name: impl Into<String>) -> Self {
        ModelSchema {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(mut self, name: impl Into<String>, kind: DataKind) -> Self {
        let name = name.into();
        if !self.fields.contains_key(&name) {
            self.attributes.push(name.clone());
        }
        self.fields
            .insert(name.clone(), FieldMeta::Column(ColumnSchema::new(name, kind)));
        self
    }

    pub fn relation(mut self, name: impl Into<String>, model: impl Into<String>) -> Self {
        self.fields.insert(
            name.into(),
            FieldMeta::Relation {
                model: model.into(),
            },
        );
        self
    }

    /// Declare a label; dotted attributes are allowed
    pub fn label(mut self, attribute: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(attribute.into(), label.into());
        self
    }
}

/// In-memory [`ModelMetadata`] over a set of [`ModelSchema`]s
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    models: HashMap<String, ModelSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, schema: ModelSchema) -> Self {
        self.register(schema);
        self
    }

    pub fn register(&mut self, schema: ModelSchema) {
        self.models.insert(schema.name.clone(), schema);
    }

    pub fn model(&self, name: &str) -> Option<&ModelSchema> {
        self.models.get(name)
    }
}

impl ModelMetadata for SchemaRegistry {
    fn attributes(&self, model: &str) -> Result<Vec<String>> {
        self.models
            .get(model)
            .map(|m| m.attributes.clone())
            .ok_or_else(|| ExportError::InvalidConfig(format!("unknown model '{}'", model)))
    }

    fn field(&self, model: &str, name: &str) -> Option<FieldMeta> {
        self.models.get(model)?.fields.get(name).cloned()
    }

    fn attribute_label(&self, model: &str, attribute: &str) -> Option<String> {
        self.models.get(model)?.labels.get(attribute).cloned()
    }
}

/// Model reached by following the relation segments of `relations`.
fn walk_relations<'a, M, I>(metadata: &M, model: &str, attribute: &str, relations: I) -> Result<String>
where
    M: ModelMetadata + ?Sized,
    I: IntoIterator<Item = &'a str>,
{
    let mut current = model.to_string();
    for segment in relations {
        match metadata.field(&current, segment) {
            Some(FieldMeta::Relation { model }) => current = model,
            _ => {
                return Err(ExportError::UnknownAttribute {
                    attribute: attribute.to_string(),
                    segment: segment.to_string(),
                    model: current,
                })
            }
        }
    }
    Ok(current)
}

fn split_path(attribute: &str) -> Result<(Vec<&str>, &str)> {
    let mut segments: Vec<&str> = attribute.split('.').collect();
    if segments.len() > MAX_PATH_DEPTH {
        return Err(ExportError::InvalidConfig(format!(
            "attribute '{}' is nested deeper than {} levels",
            attribute, MAX_PATH_DEPTH
        )));
    }
    let last = segments.pop().unwrap_or_default();
    Ok((segments, last))
}

/// Column metadata behind a possibly dotted attribute.
///
/// Every segment but the last must be a relation, otherwise the path is
/// rejected with [`ExportError::UnknownAttribute`]. A last segment that is
/// not a column yields `None`.
pub fn resolve_schema<M>(metadata: &M, model: &str, attribute: &str) -> Result<Option<ColumnSchema>>
where
    M: ModelMetadata + ?Sized,
{
    let (relations, last) = split_path(attribute)?;
    let target = walk_relations(metadata, model, attribute, relations)?;
    match metadata.field(&target, last) {
        Some(FieldMeta::Column(schema)) => Ok(Some(schema)),
        _ => Ok(None),
    }
}

/// Display label of an attribute.
///
/// Declared labels win; dotted attributes use the label the related model
/// declares for the last segment. Anything else gets a generated label.
pub fn attribute_label<M>(metadata: &M, model: &str, attribute: &str) -> String
where
    M: ModelMetadata + ?Sized,
{
    if let Some(label) = metadata.attribute_label(model, attribute) {
        return label;
    }
    if attribute.contains('.') {
        if let Ok((relations, last)) = split_path(attribute) {
            if let Ok(related) = walk_relations(metadata, model, attribute, relations) {
                if let Some(label) = metadata.attribute_label(&related, last) {
                    return label;
                }
            }
        }
    }
    generate_label(attribute)
}

/// Words of an attribute name, capitalized: `first_name` and `firstName`
/// both give "First Name".
pub fn generate_label(name: &str) -> String {
    let mut spaced = String::with_capacity(name.len() + 4);
    let mut prev_upper = false;
    for ch in name.chars() {
        let upper = ch.is_uppercase();
        if upper && !prev_upper {
            spaced.push(' ');
        }
        prev_upper = upper;
        match ch {
            '-' | '_' | '.' => spaced.push(' '),
            c => spaced.extend(c.to_lowercase()),
        }
    }

    spaced
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new()
            .with_model(
                ModelSchema::new("user")
                    .column("id", DataKind::Plain)
                    .column("first_name", DataKind::Plain)
                    .column("created_at", DataKind::DateTime)
                    .relation("company", "company")
                    .label("created_at", "Registered"),
            )
            .with_model(
                ModelSchema::new("company")
                    .column("name", DataKind::Plain)
                    .column("founded", DataKind::Date)
                    .relation("owner", "user")
                    .label("name", "Company Name"),
            )
    }

    #[test]
    fn test_attributes_exclude_relations() {
        let registry = registry();
        assert_eq!(
            registry.attributes("user").unwrap(),
            vec!["id", "first_name", "created_at"]
        );
        assert!(registry.attributes("order").is_err());
    }

    #[test]
    fn test_resolve_dotted_path() {
        let registry = registry();
        let schema = resolve_schema(&registry, "user", "company.owner.created_at")
            .unwrap()
            .unwrap();
        assert_eq!(schema.kind, DataKind::DateTime);

        assert_eq!(resolve_schema(&registry, "user", "nickname").unwrap(), None);
        assert_eq!(resolve_schema(&registry, "user", "company").unwrap(), None);
    }

    #[test]
    fn test_non_relation_segment_is_rejected() {
        let err = resolve_schema(&registry(), "user", "first_name.length").unwrap_err();
        match err {
            ExportError::UnknownAttribute { segment, model, .. } => {
                assert_eq!(segment, "first_name");
                assert_eq!(model, "user");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_self_referencing_depth_limit() {
        let path = ["company", "owner"].repeat(8).join(".") + ".id";
        assert!(matches!(
            resolve_schema(&registry(), "user", &path),
            Err(ExportError::InvalidConfig(_))
        ));

        let path = ["company", "owner"].repeat(7).join(".") + ".id";
        assert!(resolve_schema(&registry(), "user", &path).unwrap().is_some());
    }

    #[test]
    fn test_labels() {
        let registry = registry();
        assert_eq!(attribute_label(&registry, "user", "created_at"), "Registered");
        assert_eq!(attribute_label(&registry, "user", "first_name"), "First Name");
        assert_eq!(attribute_label(&registry, "user", "company.name"), "Company Name");
        assert_eq!(attribute_label(&registry, "user", "company.founded"), "Company Founded");
        assert_eq!(attribute_label(&registry, "user", "team.name"), "Team Name");
    }

    #[test]
    fn test_generate_label() {
        assert_eq!(generate_label("firstName"), "First Name");
        assert_eq!(generate_label("first_name"), "First Name");
        assert_eq!(generate_label("userID"), "User Id");
        assert_eq!(generate_label("id"), "Id");
        assert_eq!(generate_label("post-count"), "Post Count");
    }
}
