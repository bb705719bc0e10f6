//! The in-memory form of a vCard

use std::fmt::{Display, Formatter};

use super::{escape, split_components, unescape};

/// One content line of a vCard, e.g. `TEL;TYPE=CELL:+33612345678`
///
/// The value is stored in its escaped (on-the-wire) form.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    name: String,
    params: Vec<(String, String)>,
    value: String,
}

impl Field {
    /// A field holding free text, that will be escaped
    pub fn text<N: ToString>(name: N, value: &str) -> Self {
        Self::raw(name, escape(value))
    }

    /// A field whose value is already escaped (or must not be escaped, e.g. a structured value)
    pub fn raw<N: ToString, V: ToString>(name: N, value: V) -> Self {
        Self {
            name: name.to_string().to_uppercase(),
            params: Vec::new(),
            value: value.to_string(),
        }
    }

    /// A field whose value is made of several escaped components, joined by `;`
    pub fn structured<N: ToString>(name: N, components: &[&str]) -> Self {
        let escaped: Vec<String> = components.iter().map(|c| escape(c)).collect();
        Self::raw(name, escaped.join(";"))
    }

    pub fn with_param<K: ToString>(mut self, key: K, value: &str) -> Self {
        self.params.push((key.to_string().to_uppercase(), sanitize_param(value)));
        self
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn params(&self) -> &[(String, String)] { &self.params }
    /// The escaped value
    pub fn raw_value(&self) -> &str { &self.value }

    /// The unescaped value
    pub fn value(&self) -> String {
        unescape(&self.value)
    }

    /// The unescaped components of a structured value (`N`, `ADR`, `ORG`...)
    pub fn components(&self) -> Vec<String> {
        split_components(&self.value, ';')
            .iter()
            .map(|c| unescape(c))
            .collect()
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        for (key, value) in &self.params {
            write!(f, ";{}={}", key, value)?;
        }
        write!(f, ":{}", self.value)
    }
}

/// Parameter values cannot contain these characters unquoted
fn sanitize_param(value: &str) -> String {
    value.chars()
        .filter(|c| matches!(c, ';' | ':' | ',' | '"') == false && c.is_control() == false)
        .collect()
}


/// A contact record, i.e. an ordered sequence of vCard fields
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContactRecord {
    fields: Vec<Field>,
}

impl ContactRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn first(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields.iter().filter(move |f| f.name.eq_ignore_ascii_case(name))
    }

    /// A record is only usable if it has a non-empty `FN`
    pub fn is_valid(&self) -> bool {
        self.full_name().map(|name| name.trim().is_empty() == false).unwrap_or(false)
    }

    pub fn full_name(&self) -> Option<String> {
        self.first("FN").map(|f| f.value())
    }

    pub fn uid(&self) -> Option<String> {
        self.first("UID").map(|f| f.value()).filter(|uid| uid.is_empty() == false)
    }

    pub fn organization(&self) -> Option<String> {
        self.first("ORG")
            .and_then(|f| f.components().into_iter().next())
            .filter(|org| org.is_empty() == false)
    }

    pub fn note(&self) -> Option<String> {
        self.first("NOTE").map(|f| f.value())
    }

    pub fn phones(&self) -> Vec<String> {
        self.all("TEL").map(|f| f.value()).collect()
    }

    pub fn emails(&self) -> Vec<String> {
        self.all("EMAIL").map(|f| f.value()).collect()
    }

    /// Serialize this record, `BEGIN:VCARD` and `END:VCARD` included
    pub fn to_vcard(&self) -> String {
        self.to_string()
    }
}

impl Display for ContactRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "BEGIN:VCARD\r\n")?;
        for field in &self.fields {
            write!(f, "{}\r\n", field)?;
        }
        write!(f, "END:VCARD\r\n")
    }
}
