use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::imaging::NormalizedImage;

use super::contact::{ContactSelection, ContactSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Outcome of a stage that may fall back to a fixed placeholder instead of
/// failing the submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<T> {
    Ok(T),
    Degraded {
        placeholder: &'static str,
        reason: Option<String>,
    },
}

impl<T> Resolved<T> {
    pub fn degraded(placeholder: &'static str, reason: impl Into<String>) -> Self {
        Resolved::Degraded {
            placeholder,
            reason: Some(reason.into()),
        }
    }

    pub fn absent(placeholder: &'static str) -> Self {
        Resolved::Degraded {
            placeholder,
            reason: None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Resolved::Degraded { .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Resolved::Ok(value) => Some(value),
            Resolved::Degraded { .. } => None,
        }
    }
}

impl<T: AsRef<str>> Resolved<T> {
    /// Text written to the row store and sheet: the value or its placeholder.
    pub fn as_text(&self) -> &str {
        match self {
            Resolved::Ok(value) => value.as_ref(),
            Resolved::Degraded { placeholder, .. } => placeholder,
        }
    }
}

/// A validated visit waiting for submission.
#[derive(Debug, Clone)]
pub struct VisitDraft {
    pub user_email: String,
    pub rm_email: String,
    pub zm_email: String,
    pub state: String,
    pub district: String,
    pub school: String,
    pub coordinates: Option<Coordinates>,
    pub outcome: String,
    pub selected_skus: Vec<String>,
    pub contact: ContactSelection,
    /// At most two co-visitor e-mails.
    pub co_visitors: Vec<String>,
    pub remarks: String,
    pub photo: Option<NormalizedImage>,
    pub follow_up: Option<DateTime<FixedOffset>>,
}

/// The assembled record written to the row store. Immutable once built.
#[derive(Debug, Clone)]
pub struct VisitRecord {
    pub submission_id: String,
    pub submitted_at: DateTime<Utc>,
    pub user_email: String,
    pub rm_email: String,
    pub zm_email: String,
    pub state: String,
    pub district: String,
    pub school: String,
    pub outcome: String,
    pub selected_skus: Vec<String>,
    pub contact: ContactSnapshot,
    pub co_visitors: Vec<String>,
    pub remarks: String,
    pub coordinates: Option<Coordinates>,
    pub address: Resolved<String>,
    pub photo_url: Resolved<String>,
    pub follow_up: Option<DateTime<FixedOffset>>,
}

impl VisitRecord {
    pub fn co_visitor(&self, index: usize) -> &str {
        self.co_visitors.get(index).map(String::as_str).unwrap_or("")
    }

    /// SKUs as a single cell, in the order they were ticked.
    pub fn skus_text(&self) -> String {
        self.selected_skus.join(" // ")
    }
}
