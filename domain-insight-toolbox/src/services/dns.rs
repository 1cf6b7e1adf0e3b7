//! DNS record resolution.
//!
//! Every domain is resolved for the same six record types. "No records of this
//! type" is a normal answer and folds to an empty sequence; any other failure
//! aborts the whole record set.

use std::net::IpAddr;

use async_trait::async_trait;
use futures::future::join_all;
use hickory_resolver::{
    ResolveError, TokioResolver,
    proto::{ProtoError, ProtoErrorKind, op::ResponseCode, rr::RecordType},
};

use super::resolver::{build_resolver, system_dns_label};
use crate::error::{ToolboxError, ToolboxResult};
use crate::types::{DnsAnswer, DnsRecordSet, DnsRecordType, DnsValue};

/// Something that can answer a single-type DNS query.
#[async_trait]
pub trait DnsSource: Send + Sync {
    async fn query(&self, domain: &str, record_type: DnsRecordType) -> ToolboxResult<DnsAnswer>;
}

/// [`DnsSource`] backed by a Hickory recursive resolver.
pub struct HickoryDnsSource {
    resolver: TokioResolver,
    nameserver: String,
}

impl HickoryDnsSource {
    /// Use `nameserver` (an IP address) when given, the system configuration otherwise.
    pub fn new(nameserver: Option<&str>) -> ToolboxResult<Self> {
        let effective = nameserver.map(str::trim).filter(|s| !s.is_empty());
        if let Some(ns) = effective {
            let ns_ip: IpAddr = ns.parse().map_err(|_| {
                ToolboxError::ValidationError(format!("Invalid DNS server address: {ns}"))
            })?;
            return Ok(Self {
                resolver: build_resolver(Some(ns_ip)),
                nameserver: ns.to_string(),
            });
        }
        Ok(Self {
            resolver: build_resolver(None),
            nameserver: system_dns_label(),
        })
    }

    /// Label of the server(s) queries go to.
    pub fn nameserver(&self) -> &str {
        &self.nameserver
    }

    async fn lookup_values(
        &self,
        domain: &str,
        record_type: DnsRecordType,
    ) -> Result<Vec<DnsValue>, ResolveError> {
        let values: Vec<DnsValue> = match record_type {
            DnsRecordType::A => self
                .resolver
                .ipv4_lookup(domain)
                .await?
                .iter()
                .map(|ip| DnsValue::text(ip.to_string()))
                .collect(),
            DnsRecordType::Aaaa => self
                .resolver
                .ipv6_lookup(domain)
                .await?
                .iter()
                .map(|ip| DnsValue::text(ip.to_string()))
                .collect(),
            DnsRecordType::Cname => self
                .resolver
                .lookup(domain, RecordType::CNAME)
                .await?
                .record_iter()
                .filter_map(|record| record.data().as_cname())
                .map(|cname| DnsValue::text(trim_root(&cname.0.to_string())))
                .collect(),
            DnsRecordType::Mx => self
                .resolver
                .mx_lookup(domain)
                .await?
                .iter()
                .map(|mx| DnsValue::mx(trim_root(&mx.exchange().to_string()), mx.preference()))
                .collect(),
            DnsRecordType::Ns => self
                .resolver
                .ns_lookup(domain)
                .await?
                .iter()
                .map(|ns| DnsValue::text(trim_root(&ns.to_string())))
                .collect(),
            DnsRecordType::Txt => self
                .resolver
                .txt_lookup(domain)
                .await?
                .iter()
                .map(|txt| {
                    DnsValue::text(
                        txt.iter()
                            .map(|data| String::from_utf8_lossy(data).to_string())
                            .collect::<String>(),
                    )
                })
                .collect(),
        };
        Ok(values)
    }
}

#[async_trait]
impl DnsSource for HickoryDnsSource {
    async fn query(&self, domain: &str, record_type: DnsRecordType) -> ToolboxResult<DnsAnswer> {
        match self.lookup_values(domain, record_type).await {
            Ok(values) if values.is_empty() => Ok(DnsAnswer::NoData),
            Ok(values) => Ok(DnsAnswer::Records(values)),
            Err(e) => classify_error(domain, record_type, &e),
        }
    }
}

/// How a failed lookup is treated.
#[derive(Debug, PartialEq, Eq)]
enum LookupFailure {
    /// The name itself does not exist.
    NxDomain,
    /// The name exists but has no records of the queried type.
    NoData,
    Other(String),
}

impl LookupFailure {
    fn from_resolve_error(err: &ResolveError) -> Self {
        match err.proto().map(ProtoError::kind) {
            Some(ProtoErrorKind::NoRecordsFound { response_code, .. }) => {
                Self::from_response_code(*response_code, err)
            }
            _ => Self::Other(err.to_string()),
        }
    }

    fn from_response_code(code: ResponseCode, err: &impl std::fmt::Display) -> Self {
        match code {
            ResponseCode::NXDomain => Self::NxDomain,
            ResponseCode::NoError => Self::NoData,
            _ => Self::Other(err.to_string()),
        }
    }

    fn into_answer(self, domain: &str, record_type: DnsRecordType) -> ToolboxResult<DnsAnswer> {
        match self {
            Self::NxDomain => Err(ToolboxError::DomainNotFound(domain.to_string())),
            Self::NoData => {
                log::debug!("[dns] {domain} has no {record_type} records");
                Ok(DnsAnswer::NoData)
            }
            Self::Other(detail) => Err(ToolboxError::DnsError { record_type, detail }),
        }
    }
}

/// Map a resolver error to the empty answer or a propagating failure.
fn classify_error(
    domain: &str,
    record_type: DnsRecordType,
    err: &ResolveError,
) -> ToolboxResult<DnsAnswer> {
    LookupFailure::from_resolve_error(err).into_answer(domain, record_type)
}

fn trim_root(name: &str) -> String {
    name.trim_end_matches('.').to_string()
}

/// Query all six record types and fold the answers into a [`DnsRecordSet`].
///
/// Queries run concurrently; when several fail, the first failure in
/// [`DnsRecordType::ALL`] order is returned.
pub async fn resolve_record_set(source: &dyn DnsSource, domain: &str) -> ToolboxResult<DnsRecordSet> {
    let answers = join_all(DnsRecordType::ALL.map(|record_type| async move {
        (record_type, source.query(domain, record_type).await)
    }))
    .await;

    let mut record_set = DnsRecordSet::new();
    for (record_type, answer) in answers {
        let values = answer?.into_values();
        log::debug!("[dns] {domain} {record_type}: {} value(s)", values.len());
        record_set.set(record_type, values);
    }
    Ok(record_set)
}
