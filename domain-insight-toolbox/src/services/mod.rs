//! Pipeline façade wiring the WHOIS, DNS and completion capabilities together.
//!
//! Each capability is a trait object chosen once at startup, so alternate
//! WHOIS sources share everything downstream of extraction.

mod dns;
mod http;
mod resolver;
mod summary;
mod whois;

pub use dns::{DnsSource, HickoryDnsSource, resolve_record_set};
pub use http::build_client;
pub use summary::{
    CompletionService, DEFAULT_COMPLETION_URL, OpenAiCompletionClient, build_prompt, summarize,
};
pub use whois::{
    DEFAULT_WHOIS_API_URL, HostedWhoisSource, LocalWhoisSource, WhoisSource, extract_record,
};

use crate::error::ToolboxResult;
use crate::types::{DnsRecordSet, DomainReport, WhoisOutcome, WhoisRaw, WhoisRecord};

/// Runs the fetch → extract → resolve → summarise pipeline for one domain at a time.
///
/// ```rust,no_run
/// use domain_insight_toolbox::{
///     DomainInspector, GenerationParams, HickoryDnsSource, LocalWhoisSource,
///     OpenAiCompletionClient, DEFAULT_COMPLETION_URL,
/// };
/// # async fn demo() -> domain_insight_toolbox::ToolboxResult<()> {
/// let inspector = DomainInspector::new(
///     Box::new(LocalWhoisSource::default()),
///     Box::new(HickoryDnsSource::new(None)?),
///     Box::new(OpenAiCompletionClient::new(
///         reqwest::Client::new(),
///         DEFAULT_COMPLETION_URL,
///         "sk-...",
///         GenerationParams::default(),
///     )),
/// );
/// let _report = inspector.inspect("example.com").await?;
/// # Ok(())
/// # }
/// ```
pub struct DomainInspector {
    whois: Box<dyn WhoisSource>,
    dns: Box<dyn DnsSource>,
    completion: Box<dyn CompletionService>,
    language: String,
}

impl DomainInspector {
    pub fn new(
        whois: Box<dyn WhoisSource>,
        dns: Box<dyn DnsSource>,
        completion: Box<dyn CompletionService>,
    ) -> Self {
        Self {
            whois,
            dns,
            completion,
            language: "English".to_string(),
        }
    }

    /// Request summaries in `language`.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Retrieve and extract WHOIS data.
    ///
    /// Never fails: a source error is logged, carried in
    /// [`WhoisOutcome::error`], and the record is extracted from an empty raw result.
    pub async fn whois(&self, domain: &str) -> WhoisOutcome {
        match self.whois.fetch(domain).await {
            Ok(raw) => WhoisOutcome {
                record: extract_record(&raw),
                error: None,
            },
            Err(e) => {
                log::warn!("[whois:{}] {domain}: {e}", self.whois.name());
                WhoisOutcome {
                    record: extract_record(&WhoisRaw::default()),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Resolve the six record types; resolution failures propagate.
    pub async fn dns(&self, domain: &str) -> ToolboxResult<DnsRecordSet> {
        resolve_record_set(self.dns.as_ref(), domain).await
    }

    /// Ask the completion service to summarise both result sets.
    pub async fn summarize(&self, whois: &WhoisRecord, dns: &DnsRecordSet) -> ToolboxResult<String> {
        summarize(self.completion.as_ref(), whois, dns, &self.language).await
    }

    /// Run every step in sequence. DNS and completion failures abort the run.
    pub async fn inspect(&self, domain: &str) -> ToolboxResult<DomainReport> {
        let whois = self.whois(domain).await;
        let dns = self.dns(domain).await?;
        let summary = self.summarize(&whois.record, &dns).await?;

        Ok(DomainReport {
            domain: domain.to_string(),
            whois: whois.record,
            whois_error: whois.error,
            dns,
            summary,
        })
    }
}
