//! Public types produced and consumed by the pipeline.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Field names kept from line-oriented WHOIS output.
///
/// Anything else in the raw text is dropped.
pub const WHOIS_TEXT_FIELDS: [&str; 11] = [
    "Domain Name",
    "Registrar",
    "Registrar URL",
    "Registrar Abuse Contact",
    "Updated Date",
    "Creation Date",
    "Registrar Registration Expiration Date",
    "Domain Status",
    "Registrant Email",
    "Admin Email",
    "DNSSEC",
];

/// Unnormalised output of a WHOIS source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum WhoisRaw {
    /// Free-text WHOIS protocol output (local client).
    Text(String),
    /// Structured body returned by a hosted WHOIS API.
    Json(serde_json::Value),
}

impl WhoisRaw {
    /// Whether the raw result carries no data at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Json(value) => match value {
                serde_json::Value::Null => true,
                serde_json::Value::Object(map) => map.is_empty(),
                _ => false,
            },
        }
    }
}

impl Default for WhoisRaw {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// A single allow-listed WHOIS field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WhoisField {
    pub key: String,
    pub value: String,
}

/// Normalised WHOIS data.
///
/// Keys keep the order in which they were first discovered. Inserting a key
/// that already exists replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct WhoisRecord {
    fields: Vec<WhoisField>,
}

impl WhoisRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(field) = self.fields.iter_mut().find(|f| f.key == key) {
            field.value = value;
        } else {
            self.fields.push(WhoisField { key, value });
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields as an ordered two-column (key, value) table.
    pub fn fields(&self) -> &[WhoisField] {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|f| (f.key.as_str(), f.value.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for WhoisRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

impl Serialize for WhoisRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in &self.fields {
            map.serialize_entry(&field.key, &field.value)?;
        }
        map.end()
    }
}

/// Result of the WHOIS step: the record plus the failure that emptied it, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhoisOutcome {
    pub record: WhoisRecord,
    /// User-facing description of a caught retrieval failure.
    pub error: Option<String>,
}

/// DNS record types collected for every domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DnsRecordType {
    /// IPv4 address record.
    A,
    /// IPv6 address record.
    Aaaa,
    /// Canonical name (alias) record.
    Cname,
    /// Mail exchange record.
    Mx,
    /// Name server record.
    Ns,
    /// Text record.
    Txt,
}

impl DnsRecordType {
    /// Every collected type, in display order.
    pub const ALL: [Self; 6] = [Self::A, Self::Aaaa, Self::Cname, Self::Mx, Self::Ns, Self::Txt];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Cname => "CNAME",
            Self::Mx => "MX",
            Self::Ns => "NS",
            Self::Txt => "TXT",
        }
    }
}

impl fmt::Display for DnsRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DnsRecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "A" => Ok(Self::A),
            "AAAA" => Ok(Self::Aaaa),
            "CNAME" => Ok(Self::Cname),
            "MX" => Ok(Self::Mx),
            "NS" => Ok(Self::Ns),
            "TXT" => Ok(Self::Txt),
            _ => Err(format!("Unsupported DNS record type: {s}")),
        }
    }
}

/// One resolved DNS value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DnsValue {
    /// Address, host name or text, depending on the record type.
    Text(String),
    /// Mail exchange with its preference.
    Mx { exchange: String, preference: u16 },
}

impl DnsValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn mx(exchange: impl Into<String>, preference: u16) -> Self {
        Self::Mx {
            exchange: exchange.into(),
            preference,
        }
    }
}

impl fmt::Display for DnsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) => f.write_str(value),
            Self::Mx {
                exchange,
                preference,
            } => write!(f, "({exchange}, {preference})"),
        }
    }
}

/// Render a value sequence as `[v1, v2]`; an empty sequence renders as `[]`.
pub fn render_values(values: &[DnsValue]) -> String {
    let joined = values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{joined}]")
}

/// Successful outcome of a single-type DNS query.
///
/// A failed query is a [`ToolboxError`](crate::ToolboxError) instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnsAnswer {
    /// The server answered with records of the requested type.
    Records(Vec<DnsValue>),
    /// The name exists but holds no records of the requested type.
    NoData,
}

impl DnsAnswer {
    pub fn into_values(self) -> Vec<DnsValue> {
        match self {
            Self::Records(values) => values,
            Self::NoData => Vec::new(),
        }
    }
}

/// Resolved values keyed by record type.
///
/// Always holds all six [`DnsRecordType`] keys; a type without data maps to an
/// empty sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DnsRecordSet {
    records: BTreeMap<DnsRecordType, Vec<DnsValue>>,
}

impl DnsRecordSet {
    pub fn new() -> Self {
        Self {
            records: DnsRecordType::ALL
                .into_iter()
                .map(|record_type| (record_type, Vec::new()))
                .collect(),
        }
    }

    /// Replace the values held for `record_type`.
    pub fn set(&mut self, record_type: DnsRecordType, values: Vec<DnsValue>) {
        self.records.insert(record_type, values);
    }

    pub fn get(&self, record_type: DnsRecordType) -> &[DnsValue] {
        self.records
            .get(&record_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Entries in display order (A, AAAA, CNAME, MX, NS, TXT).
    pub fn iter(&self) -> impl Iterator<Item = (DnsRecordType, &[DnsValue])> {
        self.records
            .iter()
            .map(|(record_type, values)| (*record_type, values.as_slice()))
    }

    /// Whether every record type came back empty.
    pub fn is_empty(&self) -> bool {
        self.records.values().all(Vec::is_empty)
    }
}

impl Default for DnsRecordSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed generation parameters sent with every summary request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    /// Completion model identifier.
    pub model: String,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo-instruct".to_string(),
            max_tokens: 1000,
            temperature: 0.1,
        }
    }
}

/// Everything gathered for one domain.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainReport {
    /// The domain as submitted.
    pub domain: String,
    pub whois: WhoisRecord,
    /// Caught WHOIS retrieval failure, if the record is empty because of one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois_error: Option<String>,
    pub dns: DnsRecordSet,
    /// Natural-language summary from the completion service.
    pub summary: String,
}
