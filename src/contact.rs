//! Contacts, as supplied by the upstream contact source

use serde::{Deserialize, Serialize};

/// A phone number, an email address or a URL, with an optional label (e.g. `mobile`, `work`)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabeledValue {
    pub field: String,
    pub label: Option<String>,
}

impl LabeledValue {
    pub fn new<S: ToString>(field: S) -> Self {
        Self { field: field.to_string(), label: None }
    }

    pub fn with_label<S: ToString, L: ToString>(field: S, label: L) -> Self {
        Self { field: field.to_string(), label: Some(label.to_string()) }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostalAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub label: Option<String>,
}

/// A birthday. The year is optional, a birthday without a month or a day is ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Birthday {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

/// A contact as fetched from the source.
///
/// Field names follow the camelCase keys of the cloud export, so that a JSON dump deserializes as is.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SourceContact {
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company_name: Option<String>,
    pub phones: Vec<LabeledValue>,
    pub emails: Vec<LabeledValue>,
    pub addresses: Vec<PostalAddress>,
    pub birthdays: Vec<Birthday>,
    pub urls: Vec<LabeledValue>,
    pub note: Option<String>,
    pub contact_id: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| s.is_empty() == false)
}

impl SourceContact {
    pub fn first_name(&self) -> &str { self.first_name.as_deref().unwrap_or("") }
    pub fn last_name(&self) -> &str { self.last_name.as_deref().unwrap_or("") }
    pub fn company_name(&self) -> Option<&str> { non_empty(&self.company_name) }
    pub fn note(&self) -> Option<&str> { non_empty(&self.note) }
    pub fn contact_id(&self) -> Option<&str> { non_empty(&self.contact_id) }

    /// The best display name for this contact, if any can be derived.
    ///
    /// Candidates are tried in order, the first non-empty one wins: full name, "first last", organization,
    /// first email address, and finally `Unknown {id}`.
    pub fn display_name(&self) -> Option<String> {
        if let Some(full) = non_empty(&self.full_name) {
            return Some(full.to_string());
        }

        let joined = format!("{} {}", self.first_name(), self.last_name());
        let joined = joined.trim();
        if joined.is_empty() == false {
            return Some(joined.to_string());
        }

        if let Some(org) = self.company_name() {
            return Some(org.to_string());
        }

        if let Some(email) = self.emails.first().map(|e| e.field.trim()).filter(|e| e.is_empty() == false) {
            return Some(email.to_string());
        }

        self.contact_id().map(|id| format!("Unknown {}", id))
    }

    /// A short description, used in log lines
    pub fn describe(&self) -> String {
        match (self.display_name(), self.contact_id()) {
            (Some(name), _) => name,
            (None, Some(id)) => id.to_string(),
            (None, None) => "<anonymous contact>".to_string(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_priority() {
        let mut contact = SourceContact {
            full_name: Some("Ada Lovelace".into()),
            first_name: Some("Augusta".into()),
            last_name: Some("King".into()),
            company_name: Some("Analytical Engines".into()),
            emails: vec![LabeledValue::new("ada@example.org")],
            contact_id: Some("42".into()),
            ..SourceContact::default()
        };
        assert_eq!(contact.display_name().as_deref(), Some("Ada Lovelace"));

        contact.full_name = Some(String::new());
        assert_eq!(contact.display_name().as_deref(), Some("Augusta King"));

        contact.first_name = None;
        assert_eq!(contact.display_name().as_deref(), Some("King"));

        contact.last_name = None;
        assert_eq!(contact.display_name().as_deref(), Some("Analytical Engines"));

        contact.company_name = None;
        assert_eq!(contact.display_name().as_deref(), Some("ada@example.org"));

        contact.emails = vec![LabeledValue::new("  ")];
        assert_eq!(contact.display_name().as_deref(), Some("Unknown 42"));

        contact.contact_id = None;
        assert_eq!(contact.display_name(), None);
    }

    #[test]
    fn deserialize_cloud_export() {
        let json = r#"{
            "firstName": "Grace",
            "lastName": "Hopper",
            "phones": [{"field": "06 12 34 56 78", "label": "mobile"}],
            "addresses": [{"street": "1 Navy Rd", "city": "Arlington", "postalCode": "22201", "country": "USA"}],
            "birthdays": [{"month": 12, "day": 9}],
            "contactId": "ABC-1",
            "someUnknownKey": true
        }"#;
        let contact: SourceContact = serde_json::from_str(json).unwrap();
        assert_eq!(contact.first_name(), "Grace");
        assert_eq!(contact.phones[0].label.as_deref(), Some("mobile"));
        assert_eq!(contact.addresses[0].postal_code, "22201");
        assert_eq!(contact.birthdays[0].year, None);
        assert_eq!(contact.contact_id(), Some("ABC-1"));
        assert!(contact.emails.is_empty());
    }
}
