use serde::{Deserialize, Serialize};

/// A contact already known for a site, as stored in the row store and as
/// carried (JSON-encoded) in the form's contact option value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownContact {
    pub name: String,
    #[serde(default)]
    pub designation: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

impl KnownContact {
    /// Label shown in the contact dropdown.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.designation)
    }

    pub fn to_payload(&self) -> String {
        // Serializing a struct of plain strings cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Contact details typed into the "add new" sub-form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContact {
    pub designation: String,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

/// What the user picked in the contact dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContactSelection {
    /// An existing contact; `payload` is the JSON option value.
    Existing { payload: String },
    New(NewContact),
}

impl ContactSelection {
    /// Normalizes either branch into a snapshot. Only the existing branch can
    /// fail, when its payload does not parse.
    pub fn resolve(&self) -> Result<ContactSnapshot, serde_json::Error> {
        match self {
            ContactSelection::Existing { payload } => {
                let known: KnownContact = serde_json::from_str(payload)?;
                Ok(ContactSnapshot {
                    kind: ContactKind::Existing,
                    name: known.name,
                    designation: known.designation,
                    phone: known.phone,
                    email: known.email,
                })
            }
            ContactSelection::New(new) => Ok(ContactSnapshot {
                kind: ContactKind::New,
                name: new.name.trim().to_string(),
                designation: new.designation.trim().to_string(),
                phone: new.phone.trim().to_string(),
                email: new.email.trim().to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    New,
    Existing,
}

impl ContactKind {
    pub fn label(&self) -> &'static str {
        match self {
            ContactKind::New => "New SPOC",
            ContactKind::Existing => "Existing SPOC",
        }
    }
}

/// Point-of-contact captured at submit time and embedded by value in the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSnapshot {
    pub kind: ContactKind,
    pub name: String,
    pub designation: String,
    pub phone: String,
    pub email: String,
}

impl ContactSnapshot {
    pub fn display(&self) -> String {
        format!("{} ({})", self.name, self.designation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal() -> KnownContact {
        KnownContact {
            name: "Asha Rao".to_string(),
            designation: "Principal".to_string(),
            phone: "9876543210".to_string(),
            email: "asha@school.in".to_string(),
        }
    }

    #[test]
    fn test_existing_payload_resolves() {
        let selection = ContactSelection::Existing {
            payload: principal().to_payload(),
        };
        let snapshot = selection.resolve().unwrap();
        assert_eq!(snapshot.kind, ContactKind::Existing);
        assert_eq!(snapshot.name, "Asha Rao");
        assert_eq!(snapshot.display(), "Asha Rao (Principal)");
    }

    #[test]
    fn test_existing_payload_with_missing_optional_fields() {
        let selection = ContactSelection::Existing {
            payload: r#"{"name":"Ravi"}"#.to_string(),
        };
        let snapshot = selection.resolve().unwrap();
        assert_eq!(snapshot.designation, "");
        assert_eq!(snapshot.email, "");
    }

    #[test]
    fn test_malformed_payload_fails() {
        let selection = ContactSelection::Existing {
            payload: "AddNewSpoc".to_string(),
        };
        assert!(selection.resolve().is_err());
    }

    #[test]
    fn test_new_contact_is_trimmed() {
        let selection = ContactSelection::New(NewContact {
            designation: " Coordinator ".to_string(),
            name: " Meera ".to_string(),
            phone: "9123456789".to_string(),
            email: String::new(),
        });
        let snapshot = selection.resolve().unwrap();
        assert_eq!(snapshot.kind, ContactKind::New);
        assert_eq!(snapshot.name, "Meera");
        assert_eq!(snapshot.designation, "Coordinator");
        assert_eq!(snapshot.kind.label(), "New SPOC");
    }

    #[test]
    fn test_selection_serde_shape() {
        let json = r#"{"type":"new","designation":"HOD","name":"X","phone":"9999999999"}"#;
        let selection: ContactSelection = serde_json::from_str(json).unwrap();
        assert!(matches!(selection, ContactSelection::New(ref c) if c.email.is_empty()));
    }
}
