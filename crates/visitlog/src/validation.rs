//! Visit form validation.
//!
//! Every field is checked and all problems are reported together, keyed by
//! field name, so the form can mark each one.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::imaging::NormalizedImage;
use crate::model::{ContactSelection, VisitDraft};
use crate::selector::find_site;
use crate::session::SessionCache;

/// The one outcome that requires at least one SKU.
pub const SKU_OUTCOME: &str = "Sample Submission Test Prep";

/// Format of the follow-up input (`datetime-local`).
pub const FOLLOW_UP_FORMAT: &str = "%Y-%m-%dT%H:%M";

pub const MAX_CO_VISITORS: usize = 2;

static RE_PHONE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{10}$").unwrap());

pub fn is_valid_phone(phone: &str) -> bool {
    RE_PHONE.is_match(phone)
}

/// Empty is allowed; anything else must at least contain an `@`.
pub fn is_valid_email(email: &str) -> bool {
    email.is_empty() || email.contains('@')
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == name)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join(" "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Raw form content as submitted. The photo is decoded and normalized by the
/// caller before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisitForm {
    pub district: String,
    pub school: String,
    pub outcome: String,
    pub selected_skus: Vec<String>,
    pub contact: Option<ContactSelection>,
    pub co_visitor1: String,
    pub co_visitor2: String,
    pub remarks: String,
    /// `YYYY-MM-DDTHH:MM` in the configured local offset, or empty.
    pub follow_up: String,
    #[serde(skip)]
    pub photo: Option<NormalizedImage>,
}

impl VisitForm {
    pub fn validate(
        &self,
        session: &SessionCache,
        offset: FixedOffset,
    ) -> Result<VisitDraft, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let district = self.district.trim();
        if session.is_manager && district.is_empty() {
            errors.push("district", "Please select a district.");
        }

        let school = self.school.trim();
        let site = if school.is_empty() {
            errors.push("school", "Please select a school.");
            None
        } else {
            let site = find_site(session.sites(), school);
            if site.is_none() {
                errors.push("school", "Please select a school from the list.");
            }
            site
        };

        let outcome = self.outcome.trim();
        if outcome.is_empty() {
            errors.push("outcome", "Please select a meeting outcome.");
        }

        match &self.contact {
            None => errors.push("contact", "Please select or add a SPOC."),
            Some(ContactSelection::Existing { payload }) if payload.trim().is_empty() => {
                errors.push("contact", "Please select or add a SPOC.")
            }
            Some(ContactSelection::New(new)) => {
                if new.designation.trim().is_empty() {
                    errors.push("newContact.designation", "Designation is required.");
                }
                if new.name.trim().is_empty() {
                    errors.push("newContact.name", "Name is required.");
                }
                if !is_valid_phone(new.phone.trim()) {
                    errors.push("newContact.phone", "Contact must be 10 digits.");
                }
                if !is_valid_email(new.email.trim()) {
                    errors.push("newContact.email", "Please enter a valid email.");
                }
            }
            Some(existing @ ContactSelection::Existing { .. }) => {
                if existing.resolve().is_err() {
                    errors.push("contact", "Please select or add a SPOC.");
                }
            }
        }

        if self.photo.is_none() {
            errors.push("photo", "Please capture an image.");
        }

        let selected_skus = if outcome == SKU_OUTCOME {
            let skus: Vec<String> = self
                .selected_skus
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if skus.is_empty() {
                errors.push("skus", "Please select at least one SKU.");
            }
            let known = |sku: &str| {
                session
                    .product_catalog
                    .values()
                    .any(|list| list.iter().any(|s| s == sku))
            };
            if let Some(unknown) = skus.iter().find(|s| !known(s)) {
                errors.push("skus", format!("Unknown SKU '{}'.", unknown));
            }
            skus
        } else {
            Vec::new()
        };

        let co_visitors = self.co_visitors(session.email(), &mut errors);
        let follow_up = self.follow_up(offset, &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        let Some(site) = site else {
            return Err(errors);
        };
        let Some(contact) = self.contact.clone() else {
            return Err(errors);
        };

        Ok(VisitDraft {
            user_email: session.email().to_string(),
            rm_email: session.identity.reporting_manager_email.clone(),
            zm_email: session.identity.zonal_manager_email.clone(),
            state: site.state.clone(),
            district: site.district.clone(),
            school: site.name.clone(),
            coordinates: Some(session.coordinates),
            outcome: outcome.to_string(),
            selected_skus,
            contact,
            co_visitors,
            remarks: self.remarks.trim().to_string(),
            photo: self.photo.clone(),
            follow_up,
        })
    }

    fn co_visitors(&self, requester: &str, errors: &mut ValidationErrors) -> Vec<String> {
        let mut chosen: Vec<String> = Vec::with_capacity(MAX_CO_VISITORS);
        for (field, value) in [
            ("coVisitor1", &self.co_visitor1),
            ("coVisitor2", &self.co_visitor2),
        ] {
            let email = value.trim().to_lowercase();
            if email.is_empty() {
                continue;
            }
            if email == requester {
                errors.push(field, "You cannot add yourself as a co-visitor.");
            } else if chosen.contains(&email) {
                errors.push(field, "Co-visitors must be different people.");
            } else {
                chosen.push(email);
            }
        }
        chosen
    }

    fn follow_up(
        &self,
        offset: FixedOffset,
        errors: &mut ValidationErrors,
    ) -> Option<DateTime<FixedOffset>> {
        let raw = self.follow_up.trim();
        if raw.is_empty() {
            return None;
        }
        let parsed = NaiveDateTime::parse_from_str(raw, FOLLOW_UP_FORMAT)
            .ok()
            .and_then(|naive| offset.from_local_datetime(&naive).single());
        if parsed.is_none() {
            errors.push("followUp", "Please enter a valid follow-up date.");
        }
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinates, NewContact};
    use crate::session::SiteScope;
    use crate::testing::{identity, site};

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(330 * 60).unwrap()
    }

    fn session(is_manager: bool) -> SessionCache {
        let sites = vec![site("DPS Pune", "Pune"), site("Beta High", "Pune")];
        SessionCache {
            identity: identity("asha.rao@pw.live", "rm@pw.live", "zm@pw.live"),
            is_manager,
            coordinates: Coordinates {
                latitude: 18.5,
                longitude: 73.8,
            },
            co_visitors: Vec::new(),
            product_catalog: crate::config::schema::default_product_catalog(),
            scope: if is_manager {
                SiteScope::Districts {
                    districts: vec!["Pune".to_string()],
                    selected: Some("Pune".to_string()),
                    sites,
                }
            } else {
                SiteScope::Sites { sites }
            },
        }
    }

    fn photo() -> NormalizedImage {
        NormalizedImage {
            bytes: vec![0xFF, 0xD8, 0xFF],
            width: 1,
            height: 1,
        }
    }

    fn valid_form() -> VisitForm {
        VisitForm {
            school: "DPS Pune".to_string(),
            outcome: "Demo Given".to_string(),
            contact: Some(ContactSelection::Existing {
                payload: r#"{"name":"Asha Rao","designation":"Principal"}"#.to_string(),
            }),
            photo: Some(photo()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_form_builds_draft() {
        let mut form = valid_form();
        form.co_visitor1 = "Vikram.Singh@pw.live".to_string();
        form.remarks = "  met principal ".to_string();
        form.follow_up = "2025-07-01T10:00".to_string();

        let draft = form.validate(&session(false), ist()).unwrap();
        assert_eq!(draft.user_email, "asha.rao@pw.live");
        assert_eq!(draft.rm_email, "rm@pw.live");
        assert_eq!(draft.district, "Pune");
        assert_eq!(draft.state, "Maharashtra");
        assert_eq!(draft.co_visitors, vec!["vikram.singh@pw.live"]);
        assert_eq!(draft.remarks, "met principal");
        assert_eq!(
            draft.follow_up.unwrap().to_rfc3339(),
            "2025-07-01T10:00:00+05:30"
        );
        assert!(draft.selected_skus.is_empty());
    }

    #[test]
    fn test_all_errors_are_collected() {
        let form = VisitForm::default();
        let errors = form.validate(&session(true), ist()).unwrap_err();
        let fields: Vec<_> = errors.errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["district", "school", "outcome", "contact", "photo"]);
        assert_eq!(
            errors.field("photo").unwrap().message,
            "Please capture an image."
        );
    }

    #[test]
    fn test_school_must_be_in_session() {
        let mut form = valid_form();
        form.school = "Somewhere Else".to_string();
        let errors = form.validate(&session(false), ist()).unwrap_err();
        assert!(errors.field("school").is_some());
    }

    #[test]
    fn test_sku_outcome_requires_sku() {
        let mut form = valid_form();
        form.outcome = SKU_OUTCOME.to_string();
        let errors = form.validate(&session(false), ist()).unwrap_err();
        assert_eq!(
            errors.field("skus").unwrap().message,
            "Please select at least one SKU."
        );

        form.selected_skus = vec!["NEET".to_string(), "Physics Test Prep".to_string()];
        let draft = form.validate(&session(false), ist()).unwrap();
        assert_eq!(draft.selected_skus.len(), 2);

        form.selected_skus = vec!["Astrology".to_string()];
        assert!(form.validate(&session(false), ist()).is_err());
    }

    #[test]
    fn test_skus_dropped_for_other_outcomes() {
        let mut form = valid_form();
        form.selected_skus = vec!["NEET".to_string()];
        let draft = form.validate(&session(false), ist()).unwrap();
        assert!(draft.selected_skus.is_empty());
    }

    #[test]
    fn test_new_contact_rules() {
        let mut form = valid_form();
        form.contact = Some(ContactSelection::New(NewContact {
            designation: String::new(),
            name: " ".to_string(),
            phone: "98765-4321".to_string(),
            email: "not-an-email".to_string(),
        }));
        let errors = form.validate(&session(false), ist()).unwrap_err();
        let fields: Vec<_> = errors.errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "newContact.designation",
                "newContact.name",
                "newContact.phone",
                "newContact.email"
            ]
        );

        form.contact = Some(ContactSelection::New(NewContact {
            designation: "Coordinator".to_string(),
            name: "Meera".to_string(),
            phone: "9123456789".to_string(),
            email: String::new(),
        }));
        assert!(form.validate(&session(false), ist()).is_ok());

        form.contact = Some(ContactSelection::New(NewContact {
            designation: "Coordinator".to_string(),
            name: "Meera".to_string(),
            phone: "३८७६५४३२१०".to_string(),
            email: String::new(),
        }));
        let errors = form.validate(&session(false), ist()).unwrap_err();
        assert!(errors.field("newContact.phone").is_some());
    }

    #[test]
    fn test_co_visitor_rules() {
        let mut form = valid_form();
        form.co_visitor1 = "ASHA.RAO@pw.live".to_string();
        form.co_visitor2 = "asha.rao@pw.live".to_string();
        let errors = form.validate(&session(false), ist()).unwrap_err();
        assert_eq!(errors.errors.len(), 2);

        form.co_visitor1 = "a@pw.live".to_string();
        form.co_visitor2 = "A@pw.live".to_string();
        let errors = form.validate(&session(false), ist()).unwrap_err();
        assert!(errors.field("coVisitor2").is_some());
    }

    #[test]
    fn test_bad_follow_up() {
        let mut form = valid_form();
        form.follow_up = "01/07/2025 10:00".to_string();
        let errors = form.validate(&session(false), ist()).unwrap_err();
        assert!(errors.field("followUp").is_some());
    }

    #[test]
    fn test_phone_and_email_helpers() {
        assert!(is_valid_phone("9876543210"));
        assert!(!is_valid_phone("987654321"));
        assert!(!is_valid_phone("98765432100"));
        assert!(!is_valid_phone("98765abcde"));
        assert!(!is_valid_phone("३८७६५४३२१०"));
        assert!(!is_valid_phone("９８７６５４３２１０"));
        assert!(is_valid_email(""));
        assert!(is_valid_email("x@y"));
        assert!(!is_valid_email("xy"));
    }

    #[test]
    fn test_form_deserializes_from_camel_case() {
        let json = r#"{
            "school": "DPS Pune",
            "outcome": "Demo Given",
            "selectedSkus": [],
            "contact": {"type": "existing", "payload": "{\"name\":\"A\"}"},
            "coVisitor1": "",
            "followUp": ""
        }"#;
        let form: VisitForm = serde_json::from_str(json).unwrap();
        assert!(matches!(form.contact, Some(ContactSelection::Existing { .. })));
        assert!(form.photo.is_none());
    }
}
