//! Named-field records and batched query cursors

use std::cmp::Ordering;
use std::collections::VecDeque;

use indexmap::IndexMap;

use crate::error::{ExportError, Result};
use crate::types::{CellValue, RowData};

/// A record field: a plain value or a related record (`None` when unset)
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Value(CellValue),
    Relation(Option<Box<Record>>),
}

/// A query result row with named fields and nested relations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: IndexMap<String, Field>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder variant of [`set`](Self::set)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Builder variant of [`set_relation`](Self::set_relation)
    pub fn with_relation(mut self, name: impl Into<String>, related: Option<Record>) -> Self {
        self.set_relation(name, related);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<CellValue>) {
        self.fields.insert(name.into(), Field::Value(value.into()));
    }

    pub fn set_relation(&mut self, name: impl Into<String>, related: Option<Record>) {
        self.fields
            .insert(name.into(), Field::Relation(related.map(Box::new)));
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Value at a dotted path such as `company.name`.
    ///
    /// Missing fields, unset relations and relation-valued paths are empty.
    pub fn value(&self, path: &str) -> CellValue {
        let mut record = self;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let field = record.fields.get(segment);
            if segments.peek().is_none() {
                return match field {
                    Some(Field::Value(v)) => v.clone(),
                    _ => CellValue::Empty,
                };
            }
            match field {
                Some(Field::Relation(Some(related))) => record = related,
                _ => return CellValue::Empty,
            }
        }
        CellValue::Empty
    }
}

/// Plain values in field order; relations are skipped
impl RowData for Record {
    fn cells(&self) -> Vec<CellValue> {
        self.fields
            .values()
            .filter_map(|field| match field {
                Field::Value(v) => Some(v.clone()),
                Field::Relation(_) => None,
            })
            .collect()
    }
}

/// A query over records of one model, fetched in slices
pub trait RecordQuery {
    /// Name of the queried model, used for metadata lookups
    fn model(&self) -> &str;

    /// Up to `limit` records starting at `offset`
    fn fetch(&mut self, offset: usize, limit: usize) -> Result<Vec<Record>>;
}

impl<Q: RecordQuery + ?Sized> RecordQuery for &mut Q {
    fn model(&self) -> &str {
        (**self).model()
    }

    fn fetch(&mut self, offset: usize, limit: usize) -> Result<Vec<Record>> {
        (**self).fetch(offset, limit)
    }
}

/// Lazy record iterator pulling `batch_size` records per fetch
///
/// Stops after the first short batch or the first error.
pub struct BatchRows<Q> {
    query: Q,
    batch_size: usize,
    offset: usize,
    buffer: VecDeque<Record>,
    exhausted: bool,
    fetches: usize,
}

impl<Q: RecordQuery> BatchRows<Q> {
    pub fn new(query: Q, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(ExportError::InvalidConfig(
                "batch size must be greater than 0".to_string(),
            ));
        }
        Ok(BatchRows {
            query,
            batch_size,
            offset: 0,
            buffer: VecDeque::with_capacity(batch_size),
            exhausted: false,
            fetches: 0,
        })
    }

    /// Number of fetches issued so far
    pub fn fetches(&self) -> usize {
        self.fetches
    }

    fn fill(&mut self) -> Result<()> {
        let batch = self.query.fetch(self.offset, self.batch_size)?;
        self.fetches += 1;
        log::trace!(
            "fetched {} '{}' records at offset {}",
            batch.len(),
            self.query.model(),
            self.offset
        );
        if batch.len() < self.batch_size {
            self.exhausted = true;
        }
        self.offset += batch.len();
        self.buffer.extend(batch);
        Ok(())
    }
}

impl<Q: RecordQuery> Iterator for BatchRows<Q> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(e) = self.fill() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SortOrder {
    Asc,
    Desc,
}

type Filter = Box<dyn Fn(&Record) -> bool>;

/// In-memory [`RecordQuery`] with filtering and multi-key ordering
pub struct MemoryQuery {
    model: String,
    records: Vec<Record>,
    filters: Vec<Filter>,
    order: Vec<(String, SortOrder)>,
    /// Indices of matching records in output order
    prepared: Option<Vec<usize>>,
    fetch_count: usize,
}

impl MemoryQuery {
    pub fn new(model: impl Into<String>, records: Vec<Record>) -> Self {
        MemoryQuery {
            model: model.into(),
            records,
            filters: Vec::new(),
            order: Vec::new(),
            prepared: None,
            fetch_count: 0,
        }
    }

    /// Keep only records matching `filter`; filters combine with AND
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Record) -> bool + 'static,
    {
        self.filters.push(Box::new(filter));
        self.prepared = None;
        self
    }

    /// Add a sort key; earlier keys take precedence
    pub fn order_by(mut self, path: impl Into<String>, order: SortOrder) -> Self {
        self.order.push((path.into(), order));
        self.prepared = None;
        self
    }

    /// Number of `fetch` calls served
    pub fn fetch_count(&self) -> usize {
        self.fetch_count
    }

    fn prepare(&mut self) -> &[usize] {
        let records = &self.records;
        let filters = &self.filters;
        let order = &self.order;
        self.prepared.get_or_insert_with(|| {
            let mut indices: Vec<usize> = (0..records.len())
                .filter(|&i| filters.iter().all(|f| f(&records[i])))
                .collect();
            if !order.is_empty() {
                indices.sort_by(|&a, &b| {
                    order
                        .iter()
                        .map(|(path, dir)| {
                            let ord = compare_values(
                                &records[a].value(path),
                                &records[b].value(path),
                            );
                            match dir {
                                SortOrder::Asc => ord,
                                SortOrder::Desc => ord.reverse(),
                            }
                        })
                        .find(|ord| ord.is_ne())
                        .unwrap_or(Ordering::Equal)
                });
            }
            indices
        })
    }
}

impl RecordQuery for MemoryQuery {
    fn model(&self) -> &str {
        &self.model
    }

    fn fetch(&mut self, offset: usize, limit: usize) -> Result<Vec<Record>> {
        self.fetch_count += 1;
        let indices = self.prepare().iter().skip(offset).take(limit).copied();
        let batch: Vec<usize> = indices.collect();
        Ok(batch.into_iter().map(|i| self.records[i].clone()).collect())
    }
}

fn kind_rank(value: &CellValue) -> u8 {
    match value {
        CellValue::Empty => 0,
        CellValue::Bool(_) => 1,
        CellValue::Int(_) | CellValue::Float(_) => 2,
        CellValue::Date(_) | CellValue::DateTime(_) => 3,
        CellValue::String(_) | CellValue::Formula(_) | CellValue::Error(_) => 4,
    }
}

/// Total order over values: empty, booleans, numbers, dates, text
fn compare_values(a: &CellValue, b: &CellValue) -> Ordering {
    match (a, b) {
        (CellValue::Bool(x), CellValue::Bool(y)) => x.cmp(y),
        (CellValue::Int(x), CellValue::Int(y)) => x.cmp(y),
        (CellValue::Date(x), CellValue::Date(y)) => x.cmp(y),
        (CellValue::DateTime(x), CellValue::DateTime(y)) => x.cmp(y),
        _ => match kind_rank(a).cmp(&kind_rank(b)) {
            Ordering::Equal => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) if kind_rank(a) != 4 => x.total_cmp(&y),
                _ => a.as_string().cmp(&b.as_string()),
            },
            other => other,
        },
    }
}
