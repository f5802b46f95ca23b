//! Site search and contact options over the session's site list.

use serde::Serialize;

use crate::model::{ContactSelection, NewContact, Site};

pub const ADD_NEW_CONTACT_LABEL: &str = "Add New SPOC";

/// Sites whose name contains `query` (case-insensitive), sorted by name.
/// An empty query matches every site.
pub fn filter_sites<'a>(sites: &'a [Site], query: &str) -> Vec<&'a Site> {
    let needle = query.trim().to_lowercase();
    let mut matches: Vec<&Site> = sites
        .iter()
        .filter(|site| site.name.to_lowercase().contains(&needle))
        .collect();
    matches.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
    matches
}

pub fn find_site<'a>(sites: &'a [Site], name: &str) -> Option<&'a Site> {
    sites.iter().find(|site| site.name == name)
}

/// One entry of the contact dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactOption {
    pub label: String,
    pub selection: ContactSelection,
}

/// Known contacts of `site` in stored order, followed by the "add new" entry.
pub fn contact_options(site: &Site) -> Vec<ContactOption> {
    site.contacts
        .iter()
        .map(|contact| ContactOption {
            label: contact.label(),
            selection: ContactSelection::Existing {
                payload: contact.to_payload(),
            },
        })
        .chain(std::iter::once(ContactOption {
            label: ADD_NEW_CONTACT_LABEL.to_string(),
            selection: ContactSelection::New(NewContact::default()),
        }))
        .collect()
}
