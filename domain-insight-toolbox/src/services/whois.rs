//! WHOIS retrieval and field extraction.

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use super::http;
use crate::error::{ToolboxError, ToolboxResult};
use crate::types::{WHOIS_TEXT_FIELDS, WhoisRaw, WhoisRecord};

/// Default endpoint of the hosted WHOIS API.
pub const DEFAULT_WHOIS_API_URL: &str = "https://www.whoisxmlapi.com/whoisserver/WhoisService";

/// Registry-data keys copied by the hosted extractor, with the label each is stored under.
const REGISTRY_DATA_FIELDS: [(&str, &str); 5] = [
    ("domainName", "Domain Name"),
    ("createdDateNormalized", "Created Date"),
    ("updatedDateNormalized", "Updated Date"),
    ("expiresDateNormalized", "Expires Date"),
    ("status", "Status"),
];

/// A place raw WHOIS data can be obtained from.
#[async_trait]
pub trait WhoisSource: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// Fetch the raw WHOIS result for `domain`.
    async fn fetch(&self, domain: &str) -> ToolboxResult<WhoisRaw>;
}

/// Runs the system WHOIS client with the domain as its only argument.
#[derive(Debug, Clone)]
pub struct LocalWhoisSource {
    command: String,
}

impl LocalWhoisSource {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for LocalWhoisSource {
    fn default() -> Self {
        Self::new("whois")
    }
}

#[async_trait]
impl WhoisSource for LocalWhoisSource {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn fetch(&self, domain: &str) -> ToolboxResult<WhoisRaw> {
        log::debug!("[whois] running `{} {domain}`", self.command);

        let output = Command::new(&self.command)
            .arg(domain)
            .output()
            .await
            .map_err(|e| ToolboxError::WhoisError(format!("failed to run `{}`: {e}", self.command)))?;

        // Registries often exit non-zero while still printing a useful record.
        if !output.status.success() {
            log::warn!(
                "[whois] `{}` exited with {} for {domain}",
                self.command,
                output.status
            );
        }

        let text = String::from_utf8(output.stdout).map_err(|e| {
            ToolboxError::WhoisError(format!("`{}` output is not valid UTF-8: {e}", self.command))
        })?;

        Ok(WhoisRaw::Text(text))
    }
}

/// Queries a hosted WHOIS web API that answers in JSON.
#[derive(Debug, Clone)]
pub struct HostedWhoisSource {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HostedWhoisSource {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl WhoisSource for HostedWhoisSource {
    fn name(&self) -> &'static str {
        "hosted"
    }

    async fn fetch(&self, domain: &str) -> ToolboxResult<WhoisRaw> {
        let request = self.client.get(&self.endpoint).query(&[
            ("apiKey", self.api_key.as_str()),
            ("domainName", domain),
            ("outputFormat", "JSON"),
        ]);

        let (status, body) = http::execute_request(request, "whois-api", "GET", &self.endpoint)
            .await
            .map_err(|e| ToolboxError::WhoisError(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(ToolboxError::WhoisError(format!(
                "WHOIS API returned HTTP {status}: {}",
                http::truncate_for_log(&body)
            )));
        }

        let value: Value = http::parse_json(&body, "whois-api")
            .map_err(|e| ToolboxError::WhoisError(e.to_string()))?;
        Ok(WhoisRaw::Json(value))
    }
}

/// Normalise a raw result into a [`WhoisRecord`].
pub fn extract_record(raw: &WhoisRaw) -> WhoisRecord {
    match raw {
        WhoisRaw::Text(text) => parse_whois_text(text),
        WhoisRaw::Json(value) => extract_registry_data(value),
    }
}

/// Keep allow-listed `key: value` lines; later duplicates win.
fn parse_whois_text(text: &str) -> WhoisRecord {
    let mut record = WhoisRecord::new();
    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if WHOIS_TEXT_FIELDS.contains(&key) {
            record.insert(key, value.trim());
        }
    }
    record
}

/// Copy the known fields out of `WhoisRecord.registryData`.
fn extract_registry_data(value: &Value) -> WhoisRecord {
    let Some(registry) = value
        .get("WhoisRecord")
        .and_then(|record| record.get("registryData"))
        .and_then(Value::as_object)
    else {
        return WhoisRecord::new();
    };

    REGISTRY_DATA_FIELDS
        .iter()
        .filter_map(|(source_key, label)| {
            let text = match registry.get(*source_key)? {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((*label, text))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    // ==================== parse_whois_text tests ====================

    #[test]
    fn test_parse_whois_text_basic() {
        let record = parse_whois_text("Domain Name: EXAMPLE.COM\nRegistrar: ACME Inc.\n");
        let fields: Vec<(&str, &str)> = record.iter().collect();
        assert_eq!(
            fields,
            vec![("Domain Name", "EXAMPLE.COM"), ("Registrar", "ACME Inc.")]
        );
    }

    #[test]
    fn test_parse_whois_text_drops_unknown_keys() {
        let raw = "Registrar: X\nRegistry Domain ID: 2336799_DOMAIN_COM-VRSN\nName Server: A.IANA-SERVERS.NET";
        let record = parse_whois_text(raw);
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("Registrar"), Some("X"));
        assert!(record.get("Name Server").is_none());
    }

    #[test]
    fn test_parse_whois_text_later_duplicate_wins() {
        let raw = "Domain Status: clientDeleteProhibited\nDomain Status: clientTransferProhibited";
        let record = parse_whois_text(raw);
        assert_eq!(record.get("Domain Status"), Some("clientTransferProhibited"));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_parse_whois_text_splits_at_first_colon() {
        let raw = "Registrar URL: http://www.example-registrar.com\nCreation Date: 1995-08-14T04:00:00Z";
        let record = parse_whois_text(raw);
        assert_eq!(record.get("Registrar URL"), Some("http://www.example-registrar.com"));
        assert_eq!(record.get("Creation Date"), Some("1995-08-14T04:00:00Z"));
    }

    #[test]
    fn test_parse_whois_text_trims_and_handles_crlf() {
        let raw = "   Registrar:    Spaced Out LLC   \r\nDNSSEC: unsigned\r\n";
        let record = parse_whois_text(raw);
        assert_eq!(record.get("Registrar"), Some("Spaced Out LLC"));
        assert_eq!(record.get("DNSSEC"), Some("unsigned"));
    }

    #[test]
    fn test_parse_whois_text_key_match_is_exact() {
        // Case and spelling must match the allow-list exactly
        let raw = "registrar: lower\nRegistrar Name: other\nSponsoring Registrar: third";
        assert!(parse_whois_text(raw).is_empty());
    }

    #[test]
    fn test_parse_whois_text_ignores_lines_without_colon() {
        let raw = ">>> Last update of whois database <<<\nNOTICE and TERMS OF USE\n\n";
        assert!(parse_whois_text(raw).is_empty());
    }

    #[test]
    fn test_parse_whois_text_empty_value_kept() {
        let record = parse_whois_text("Admin Email:\n");
        assert_eq!(record.get("Admin Email"), Some(""));
    }

    // ==================== extract_registry_data tests ====================

    #[test]
    fn test_extract_registry_data_full() {
        let value = json!({
            "WhoisRecord": {
                "domainName": "example.com",
                "registryData": {
                    "domainName": "EXAMPLE.COM",
                    "createdDateNormalized": "1995-08-14 04:00:00 UTC",
                    "updatedDateNormalized": "2023-08-14 07:01:38 UTC",
                    "expiresDateNormalized": "2024-08-13 04:00:00 UTC",
                    "status": "clientDeleteProhibited clientTransferProhibited",
                    "registrarName": "not copied"
                }
            }
        });
        let record = extract_registry_data(&value);
        let keys: Vec<&str> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec!["Domain Name", "Created Date", "Updated Date", "Expires Date", "Status"]
        );
        assert_eq!(record.get("Created Date"), Some("1995-08-14 04:00:00 UTC"));
    }

    #[test]
    fn test_extract_registry_data_partial() {
        let value = json!({
            "WhoisRecord": { "registryData": { "domainName": "EXAMPLE.ORG", "status": null } }
        });
        let record = extract_registry_data(&value);
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("Domain Name"), Some("EXAMPLE.ORG"));
    }

    #[test]
    fn test_extract_registry_data_missing_structure() {
        assert!(extract_registry_data(&json!({})).is_empty());
        assert!(extract_registry_data(&json!({"WhoisRecord": {}})).is_empty());
        assert!(extract_registry_data(&json!({"ErrorMessage": {"msg": "bad key"}})).is_empty());
        assert!(extract_registry_data(&json!({"WhoisRecord": {"registryData": "oops"}})).is_empty());
        assert!(extract_registry_data(&json!([1, 2, 3])).is_empty());
    }

    #[test]
    fn test_extract_registry_data_non_string_scalar() {
        let value = json!({ "WhoisRecord": { "registryData": { "status": 3 } } });
        assert_eq!(extract_registry_data(&value).get("Status"), Some("3"));
    }

    #[test]
    fn test_extract_record_dispatches_on_raw_kind() {
        let text = WhoisRaw::Text("Registrar: ACME Inc.".to_string());
        assert_eq!(extract_record(&text).get("Registrar"), Some("ACME Inc."));
        assert!(extract_record(&WhoisRaw::default()).is_empty());
        assert!(extract_record(&WhoisRaw::Json(json!({}))).is_empty());
    }

    // ==================== source tests ====================

    #[tokio::test]
    async fn test_local_source_missing_binary() {
        let source = LocalWhoisSource::new("definitely-not-a-whois-binary-7f3a");
        let result = source.fetch("example.com").await;
        assert!(matches!(result, Err(ToolboxError::WhoisError(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_local_source_passes_domain_as_sole_argument() {
        let source = LocalWhoisSource::new("echo");
        let raw = source.fetch("example.com").await.unwrap();
        assert_eq!(raw, WhoisRaw::Text("example.com\n".to_string()));
    }

    #[tokio::test]
    async fn test_hosted_source_sends_query_parameters() {
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/whoisserver/WhoisService"))
            .and(query_param("apiKey", "k-123"))
            .and(query_param("domainName", "example.com"))
            .and(query_param("outputFormat", "JSON"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "WhoisRecord": { "registryData": { "domainName": "EXAMPLE.COM" } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = HostedWhoisSource::new(
            reqwest::Client::new(),
            format!("{}/whoisserver/WhoisService", server.uri()),
            "k-123",
        );
        let raw = source.fetch("example.com").await.unwrap();
        assert_eq!(extract_record(&raw).get("Domain Name"), Some("EXAMPLE.COM"));
    }

    #[tokio::test]
    async fn test_hosted_source_http_error() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let source = HostedWhoisSource::new(reqwest::Client::new(), server.uri(), "bad");
        let result = source.fetch("example.com").await;
        assert!(matches!(result, Err(ToolboxError::WhoisError(msg)) if msg.contains("401")));
    }

    #[tokio::test]
    async fn test_hosted_source_invalid_json() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let source = HostedWhoisSource::new(reqwest::Client::new(), server.uri(), "k");
        let result = source.fetch("example.com").await;
        assert!(matches!(result, Err(ToolboxError::WhoisError(_))));
    }

    #[tokio::test]
    async fn test_hosted_source_unreachable() {
        // Port 9 (discard) on localhost is almost never listening
        let source = HostedWhoisSource::new(reqwest::Client::new(), "http://127.0.0.1:9/", "k");
        let result = source.fetch("example.com").await;
        assert!(matches!(result, Err(ToolboxError::WhoisError(_))));
    }

    // ==================== integration tests ====================

    #[tokio::test]
    #[ignore]
    async fn test_local_source_real() {
        let raw = LocalWhoisSource::default().fetch("google.com").await.unwrap();
        let record = extract_record(&raw);
        assert!(record.get("Registrar").is_some());
    }
}
