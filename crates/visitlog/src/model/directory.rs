use serde::{Deserialize, Serialize};

use super::contact::KnownContact;

pub const ACTIVE_STATUS: &str = "Active";

/// An employee record from the identity table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    #[serde(default)]
    pub reporting_manager_email: String,
    #[serde(default)]
    pub zonal_manager_email: String,
    pub status: String,
}

impl Identity {
    pub fn is_active(&self) -> bool {
        self.status == ACTIVE_STATUS
    }
}

/// A peer who may accompany the requester on a visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoVisitor {
    pub email: String,
    pub name: String,
}

impl CoVisitor {
    pub fn from_email(email: &str) -> Self {
        Self {
            email: email.to_string(),
            name: display_name(email),
        }
    }
}

/// "jane.doe@pw.live" -> "Jane Doe".
pub fn display_name(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    local
        .split('.')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A school the requester may log a visit at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    pub district: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub contacts: Vec<KnownContact>,
}
