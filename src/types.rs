/// Shared types used across the codebase

use serde::{Deserialize, Deserializer};

/// A single field of a partial update.
///
/// Distinguishes a field that was left out of the request from one that was
/// explicitly sent as `null`. Built from the `Option<Option<T>>` produced by
/// [`nullable`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldUpdate<T> {
    #[default]
    Unchanged,
    Cleared,
    Set(T),
}

impl<T> FieldUpdate<T> {
    /// Apply this update to an optional stored value.
    pub fn apply_to(self, current: &mut Option<T>) {
        match self {
            FieldUpdate::Unchanged => {}
            FieldUpdate::Cleared => *current = None,
            FieldUpdate::Set(value) => *current = Some(value),
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, FieldUpdate::Unchanged)
    }
}

impl<T> From<Option<Option<T>>> for FieldUpdate<T> {
    fn from(value: Option<Option<T>>) -> Self {
        match value {
            None => FieldUpdate::Unchanged,
            Some(None) => FieldUpdate::Cleared,
            Some(Some(v)) => FieldUpdate::Set(v),
        }
    }
}

/// Deserialize a field so that "absent" and "null" stay distinguishable.
///
/// Use together with `#[serde(default)]`: absent → `None`, `null` →
/// `Some(None)`, value → `Some(Some(v))`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
