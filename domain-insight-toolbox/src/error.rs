//! Unified error type for the pipeline.

use serde::Serialize;
use thiserror::Error;

use crate::types::DnsRecordType;

/// Toolbox error type.
///
/// Only some of these abort a domain inspection: a [`WhoisError`](Self::WhoisError)
/// is caught at the retrieval boundary, while DNS and completion failures
/// propagate to the caller.
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum ToolboxError {
    /// Invalid caller input.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A WHOIS source could not produce a raw result.
    #[error("WHOIS retrieval failed: {0}")]
    WhoisError(String),

    /// The queried name does not exist (NXDOMAIN).
    #[error("Domain not found: {0}")]
    DomainNotFound(String),

    /// Any DNS failure other than "no records of this type".
    #[error("DNS {record_type} lookup failed: {detail}")]
    DnsError {
        record_type: DnsRecordType,
        detail: String,
    },

    /// Transport-level HTTP failure.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// A response body could not be decoded.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The completion service rejected the request or returned nothing usable.
    #[error("Completion service error: {0}")]
    CompletionError(String),
}

/// Toolbox Result type alias.
pub type ToolboxResult<T> = std::result::Result<T, ToolboxError>;
