//! Per-column configuration properties with derived defaults
//!
//! Titles, types, formats, formatters and callbacks all share the same
//! three-state behaviour: unset (use derived defaults), suppressed (emit
//! nothing) or overridden (sparse overrides merged over the defaults).

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::column::{ColumnMap, ColumnRef, ColumnResolver};
use crate::error::Result;
use crate::types::{Cell, CellValue};

/// Value transformation applied before a cell is written.
///
/// Receives the raw value, the 1-based worksheet row and the source record.
pub type Formatter<R> = Arc<dyn Fn(CellValue, u32, &R) -> Result<CellValue>>;

/// Hook invoked with the freshly written cell, its column and its row.
pub type Callback = Arc<dyn Fn(&mut Cell, u32, u32) -> Result<()>>;

/// Caller-facing setting for a column property
#[derive(Clone)]
pub enum Setting<T> {
    /// Use derived defaults
    Unspecified,
    /// Emit nothing for this property
    Suppressed,
    /// Override the given columns, keep defaults elsewhere
    Resolved(ColumnMap<T>),
}

impl<T> From<ColumnMap<T>> for Setting<T> {
    fn from(map: ColumnMap<T>) -> Self {
        Setting::Resolved(map)
    }
}

/// Positional values map to offsets 0, 1, 2, ...
impl<T> From<Vec<T>> for Setting<T> {
    fn from(values: Vec<T>) -> Self {
        Setting::Resolved(
            values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (ColumnRef::from(i), v))
                .collect(),
        )
    }
}

impl From<Vec<&str>> for Setting<String> {
    fn from(values: Vec<&str>) -> Self {
        values
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
            .into()
    }
}

impl<T> From<bool> for Setting<T> {
    /// `false` suppresses the property, `true` goes back to defaults.
    fn from(enabled: bool) -> Self {
        if enabled {
            Setting::Unspecified
        } else {
            Setting::Suppressed
        }
    }
}

#[derive(Clone)]
enum State<T> {
    Unspecified,
    Suppressed,
    Overridden(Vec<ColumnMap<T>>),
}

/// Current state of a [`ColumnProperty`], for inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyState {
    Unspecified,
    Suppressed,
    Overridden { layers: usize },
}

/// A column-indexed property merged over lazily derived defaults
#[derive(Clone)]
pub struct ColumnProperty<T> {
    defaults: Option<ColumnMap<T>>,
    state: State<T>,
}

impl<T> Default for ColumnProperty<T> {
    fn default() -> Self {
        ColumnProperty {
            defaults: None,
            state: State::Unspecified,
        }
    }
}

impl<T> fmt::Debug for ColumnProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnProperty")
            .field("state", &self.state())
            .field("defaults_cached", &self.defaults.is_some())
            .finish()
    }
}

impl<T> ColumnProperty<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a setting.
    ///
    /// Overrides accumulate as layers, an empty override suppresses the
    /// property and overriding a suppressed property re-enables it. An
    /// override keyed the same way as the previous one is merged into it.
    pub fn set(&mut self, setting: impl Into<Setting<T>>) {
        match setting.into() {
            Setting::Unspecified => self.state = State::Unspecified,
            Setting::Suppressed => self.state = State::Suppressed,
            Setting::Resolved(map) if map.is_empty() => self.state = State::Suppressed,
            Setting::Resolved(map) => match &mut self.state {
                State::Overridden(layers) => match layers.last_mut() {
                    Some(last) if can_fold(last, &map) => fold_layer(last, map),
                    _ => layers.push(map),
                },
                state => *state = State::Overridden(vec![map]),
            },
        }
    }

    pub fn state(&self) -> PropertyState {
        match &self.state {
            State::Unspecified => PropertyState::Unspecified,
            State::Suppressed => PropertyState::Suppressed,
            State::Overridden(layers) => PropertyState::Overridden {
                layers: layers.len(),
            },
        }
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self.state, State::Suppressed)
    }

    /// Cached defaults, if they were derived already
    pub fn defaults(&self) -> Option<&ColumnMap<T>> {
        self.defaults.as_ref()
    }

    /// Drop the cached defaults so the next resolve derives them again
    pub fn clear_defaults(&mut self) {
        self.defaults = None;
    }
}

impl<T: Clone> ColumnProperty<T> {
    /// Effective mapping keyed by absolute column, or `None` when suppressed.
    ///
    /// `derive` runs at most once over the property's life; its result is
    /// cached even when the property is suppressed at the time.
    pub fn resolve<F>(
        &mut self,
        resolver: &ColumnResolver,
        derive: F,
    ) -> Result<Option<BTreeMap<u32, T>>>
    where
        F: FnOnce() -> Result<ColumnMap<T>>,
    {
        if self.defaults.is_none() {
            self.defaults = Some(derive()?);
        }

        let layers = match &self.state {
            State::Suppressed => return Ok(None),
            State::Unspecified => &[][..],
            State::Overridden(layers) => layers.as_slice(),
        };

        let mut effective = match &self.defaults {
            Some(defaults) => resolver.normalize_map(defaults.clone())?,
            None => BTreeMap::new(),
        };
        for layer in layers {
            effective.extend(resolver.normalize_map(layer.clone())?);
        }
        Ok(Some(effective))
    }
}

/// Labels compare case-insensitively, offsets as they are
fn fold_key(key: &ColumnRef) -> ColumnRef {
    match key {
        ColumnRef::Label(label) => ColumnRef::Label(label.to_ascii_uppercase()),
        offset => offset.clone(),
    }
}

fn has_distinct_keys<T>(map: &ColumnMap<T>) -> bool {
    map.keys().map(fold_key).collect::<HashSet<_>>().len() == map.len()
}

/// Two layers keyed only by labels, or only by offsets, name the same column
/// exactly when their keys match, so the later one can replace entries in
/// place. Layers with colliding keys stay apart so resolve still reports them.
fn can_fold<T>(last: &ColumnMap<T>, next: &ColumnMap<T>) -> bool {
    let all_labels = |map: &ColumnMap<T>| map.keys().all(ColumnRef::is_label);
    let no_labels = |map: &ColumnMap<T>| !map.keys().any(ColumnRef::is_label);
    let same_kind = (all_labels(last) && all_labels(next)) || (no_labels(last) && no_labels(next));
    same_kind && has_distinct_keys(last) && has_distinct_keys(next)
}

fn fold_layer<T>(last: &mut ColumnMap<T>, next: ColumnMap<T>) {
    for (key, value) in next {
        let folded = fold_key(&key);
        last.retain(|existing, _| fold_key(existing) != folded);
        last.insert(key, value);
    }
}
