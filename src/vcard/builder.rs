//! A module to build vCards out of source contacts

use crate::contact::{Birthday, SourceContact};
use crate::error::{SyncError, SyncResult};

use super::{ContactRecord, Field, VCARD_VERSION};

const DEFAULT_PHONE_LABEL: &str = "VOICE";
const DEFAULT_ADDRESS_LABEL: &str = "HOME";
const EMAIL_TYPE: &str = "INTERNET";

/// Create a vCard from a [`SourceContact`]
///
/// This fails with [`SyncError::MalformedInput`] when no name at all can be derived for this contact.
pub fn build_from(contact: &SourceContact) -> SyncResult<ContactRecord> {
    let full_name = contact.display_name()
        .ok_or_else(|| SyncError::malformed(contact.describe(), "no name can be derived (no name, organization, email or identifier)"))?;

    let mut record = ContactRecord::new();
    record.push(Field::raw("VERSION", VCARD_VERSION));
    record.push(Field::text("FN", &full_name));
    record.push(Field::structured("N", &[contact.last_name(), contact.first_name(), "", "", ""]));

    for phone in &contact.phones {
        let number: String = phone.field.chars()
            .filter(|c| *c != ' ' && *c != '-')
            .collect();
        record.push(
            Field::text("TEL", &number)
                .with_param("TYPE", &label_or(&phone.label, DEFAULT_PHONE_LABEL))
        );
    }

    for email in &contact.emails {
        let address = email.field.trim();
        if address.is_empty() {
            continue;
        }
        record.push(Field::text("EMAIL", address).with_param("TYPE", EMAIL_TYPE));
    }

    if let Some(org) = contact.company_name() {
        record.push(Field::text("ORG", org));
    }

    for address in &contact.addresses {
        // Post office box and extended address are never filled
        record.push(
            Field::structured("ADR", &[
                "", "",
                &address.street,
                &address.city,
                &address.state,
                &address.postal_code,
                &address.country,
            ])
            .with_param("TYPE", &label_or(&address.label, DEFAULT_ADDRESS_LABEL))
        );
    }

    for birthday in &contact.birthdays {
        if let Some(date) = format_birthday(birthday) {
            record.push(Field::raw("BDAY", date));
        }
    }

    for url in &contact.urls {
        if url.field.is_empty() == false {
            record.push(Field::text("URL", &url.field));
        }
    }

    if let Some(note) = contact.note() {
        record.push(Field::text("NOTE", note));
    }

    if let Some(id) = contact.contact_id() {
        record.push(Field::text("UID", id));
    }

    Ok(record)
}

fn label_or(label: &Option<String>, default: &str) -> String {
    match label.as_deref().map(str::trim) {
        Some(label) if label.is_empty() == false => label.to_uppercase(),
        _ => default.to_string(),
    }
}

fn format_birthday(birthday: &Birthday) -> Option<String> {
    let month = birthday.month?;
    let day = birthday.day?;
    Some(match birthday.year {
        Some(year) => format!("{:04}-{:02}-{:02}", year, month, day),
        None => format!("--{:02}-{:02}", month, day),
    })
}
