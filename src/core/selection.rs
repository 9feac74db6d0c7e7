use serde::Serialize;

use super::error::{CoreError, CoreResult};

/// Maximum number of funds shown side by side on the comparison view.
pub const COMPARE_LIMIT: usize = 4;
/// Maximum number of funds in a dashboard basket.
pub const BASKET_LIMIT: usize = 5;

/// Ordered set of fund ids with a fixed capacity.
///
/// Operations return a new selection and leave the receiver untouched, so a
/// view can hold the previous state until the new one is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    limit: usize,
    ids: Vec<String>,
}

impl Selection {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            ids: Vec::new(),
        }
    }

    pub fn for_comparison() -> Self {
        Self::new(COMPARE_LIMIT)
    }

    pub fn for_basket() -> Self {
        Self::new(BASKET_LIMIT)
    }

    /// Builds a selection from `ids` in order, skipping duplicates.
    pub fn from_ids<I, S>(limit: usize, ids: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ids.into_iter()
            .try_fold(Self::new(limit), |selection, id| selection.insert(id.as_ref()))
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    /// Adds `id` unless already present; fails when the selection is full.
    pub fn insert(&self, id: &str) -> CoreResult<Self> {
        if self.contains(id) {
            return Ok(self.clone());
        }
        if self.ids.len() >= self.limit {
            return Err(CoreError::SelectionFull { limit: self.limit });
        }
        let mut next = self.clone();
        next.ids.push(id.to_string());
        Ok(next)
    }

    pub fn remove(&self, id: &str) -> Self {
        Self {
            limit: self.limit,
            ids: self.ids.iter().filter(|s| *s != id).cloned().collect(),
        }
    }

    /// Removes `id` if selected, otherwise adds it.
    pub fn toggle(&self, id: &str) -> CoreResult<Self> {
        if self.contains(id) {
            Ok(self.remove(id))
        } else {
            self.insert(id)
        }
    }

    pub fn require_at_least(&self, min: usize) -> CoreResult<()> {
        if self.ids.len() < min {
            return Err(CoreError::SelectionTooSmall { min });
        }
        Ok(())
    }
}
