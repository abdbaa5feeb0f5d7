//! Region bracket bookkeeping.
//!
//! `{label` opens a region and `}label` closes it. Labeled regions may overlap freely; the tracker
//! only maps labels to ids. The empty label names the anonymous region, which always has id 0.

use std::collections::HashMap;

use thiserror::Error;

/// The id of a region as handed to the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionId(pub u32);

impl RegionId {
    /// The id shared by every anonymous region.
    pub const ANONYMOUS: Self = Self(0);
}

/// An error occurred when closing a region.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RegionError {
    /// `}label` without a matching open `{label`.
    #[error("region `{0}` closed but never opened")]
    UnmatchedClose(String),
}

/// Label to id map for the regions of one document.
#[derive(Debug, Clone, Default)]
pub struct RegionTracker {
    open: HashMap<String, RegionId>,
    /// Labels in the order they were opened, for reporting.
    order: Vec<String>,
    anonymous_depth: usize,
    last_id: u32,
}

impl RegionTracker {
    /// Creates a tracker with nothing open.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `label` and returns its id.
    ///
    /// Re-opening a label that is still open returns the existing id: the open span is extended
    /// rather than nested.
    pub fn open(&mut self, label: &str) -> RegionId {
        if label.is_empty() {
            self.anonymous_depth += 1;
            return RegionId::ANONYMOUS;
        }
        if let Some(&id) = self.open.get(label) {
            return id;
        }
        self.last_id += 1;
        let id = RegionId(self.last_id);
        self.open.insert(label.to_string(), id);
        self.order.push(label.to_string());
        id
    }

    /// Closes `label` and returns the id it had.
    ///
    /// # Errors
    ///
    /// [`RegionError::UnmatchedClose`] if `label` is not empty and not open.
    pub fn close(&mut self, label: &str) -> Result<RegionId, RegionError> {
        if label.is_empty() {
            self.anonymous_depth = self.anonymous_depth.saturating_sub(1);
            return Ok(RegionId::ANONYMOUS);
        }
        let id = self
            .open
            .remove(label)
            .ok_or_else(|| RegionError::UnmatchedClose(label.to_string()))?;
        self.order.retain(|open| open != label);
        Ok(id)
    }

    /// Whether `label` is currently open.
    #[must_use]
    pub fn is_open(&self, label: &str) -> bool {
        if label.is_empty() {
            self.anonymous_depth > 0
        } else {
            self.open.contains_key(label)
        }
    }

    /// Labels still open, in opening order. Each unclosed anonymous region appears as `""`.
    #[must_use]
    pub fn unclosed(&self) -> Vec<String> {
        let mut labels = self.order.clone();
        labels.extend(std::iter::repeat_n(String::new(), self.anonymous_depth));
        labels
    }
}
