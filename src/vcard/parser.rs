//! A module to parse vCard files

use std::io::BufReader;

use chrono::{Datelike, NaiveDate};
use ical::parser::vcard::component::VcardContact;

use crate::contact::{Birthday, LabeledValue, PostalAddress, SourceContact};
use crate::error::{SyncError, SyncResult};

use super::{ContactRecord, Field};

/// Split the content of a `.vcf` file into one text block per vCard.
///
/// Lines outside of a `BEGIN:VCARD`/`END:VCARD` pair, as well as blank lines, are dropped.
pub fn split_records(content: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut inside = false;

    for line in content.lines() {
        let trimmed = line.trim_end_matches('\r');
        if trimmed.eq_ignore_ascii_case("BEGIN:VCARD") {
            buffer.clear();
            buffer.push(trimmed);
            inside = true;
        } else if trimmed.eq_ignore_ascii_case("END:VCARD") {
            if inside {
                buffer.push(trimmed);
                blocks.push(buffer.join("\n"));
            }
            inside = false;
        } else if inside && trimmed.is_empty() == false {
            buffer.push(trimmed);
        }
    }
    blocks
}

/// Parse a single vCard
pub fn parse(content: &str) -> SyncResult<ContactRecord> {
    let mut reader = ical::VcardParser::new(BufReader::new(content.as_bytes()));
    let card = match reader.next() {
        None => return Err(SyncError::malformed("<vcard>", "no vCard to parse")),
        Some(Err(err)) => return Err(SyncError::malformed("<vcard>", format!("unable to parse vCard data: {}", err))),
        Some(Ok(card)) => card,
    };

    // A second card is refused even when it cannot be parsed
    if reader.next().is_some() {
        return Err(SyncError::malformed("<vcard>", "parsing multiple vCards at once is not supported"));
    }

    Ok(record_from(card))
}

/// Parse every vCard of a `.vcf` file. A card that cannot be parsed does not prevent the others from being parsed.
pub fn parse_records(content: &str) -> Vec<SyncResult<ContactRecord>> {
    split_records(content)
        .iter()
        .map(|block| parse(block))
        .collect()
}

fn record_from(card: VcardContact) -> ContactRecord {
    let mut record = ContactRecord::new();
    for prop in card.properties {
        let mut field = Field::raw(&prop.name, prop.value.unwrap_or_default());
        for (key, values) in prop.params.unwrap_or_default() {
            field = field.with_param(key, &values.join(" "));
        }
        record.push(field);
    }
    record
}

/// Map a parsed vCard back to the source contact it could have been built from
pub fn to_source_contact(record: &ContactRecord) -> SourceContact {
    let mut contact = SourceContact {
        full_name: record.full_name(),
        company_name: record.organization(),
        note: record.note(),
        contact_id: record.uid(),
        ..SourceContact::default()
    };

    if let Some(n) = record.first("N") {
        let mut components = n.components().into_iter();
        contact.last_name = components.next().filter(|s| s.is_empty() == false);
        contact.first_name = components.next().filter(|s| s.is_empty() == false);
    }

    for field in record.fields() {
        let label = field.param("TYPE").map(str::to_string);
        match field.name() {
            "TEL" => contact.phones.push(LabeledValue { field: field.value(), label }),
            "EMAIL" => contact.emails.push(LabeledValue { field: field.value(), label }),
            "URL" => contact.urls.push(LabeledValue { field: field.value(), label }),
            "ADR" => {
                let mut parts = field.components().into_iter().skip(2);
                let mut next = || parts.next().unwrap_or_default();
                contact.addresses.push(PostalAddress {
                    street: next(),
                    city: next(),
                    state: next(),
                    postal_code: next(),
                    country: next(),
                    label,
                });
            },
            "BDAY" => match parse_birthday(&field.value()) {
                Some(birthday) => contact.birthdays.push(birthday),
                None => log::warn!("Ignoring unsupported birthday {:?}", field.value()),
            },
            _ => {},
        }
    }

    contact
}

fn parse_birthday(value: &str) -> Option<Birthday> {
    if let Some(yearless) = value.strip_prefix("--") {
        let (month, day) = match yearless.split_once('-') {
            Some((m, d)) => (m, d),
            None if yearless.len() == 4 => yearless.split_at(2),
            None => return None,
        };
        return Some(Birthday {
            year: None,
            month: Some(month.parse().ok()?),
            day: Some(day.parse().ok()?),
        });
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y%m%d"))
        .ok()?;
    Some(Birthday {
        year: Some(date.year()),
        month: Some(date.month()),
        day: Some(date.day()),
    })
}
