//! Domain information pipeline.
//!
//! Retrieves WHOIS registration data and DNS records for a domain, normalises
//! both, and asks a text-completion service for a natural-language summary.

mod error;
mod services;
mod types;

pub use error::{ToolboxError, ToolboxResult};
pub use services::{
    CompletionService, DEFAULT_COMPLETION_URL, DEFAULT_WHOIS_API_URL, DnsSource, DomainInspector,
    HickoryDnsSource, HostedWhoisSource, LocalWhoisSource, OpenAiCompletionClient, WhoisSource,
    build_client, build_prompt, extract_record, resolve_record_set, summarize,
};
pub use types::{
    DnsAnswer, DnsRecordSet, DnsRecordType, DnsValue, DomainReport, GenerationParams,
    WHOIS_TEXT_FIELDS, WhoisField, WhoisOutcome, WhoisRaw, WhoisRecord, render_values,
};
