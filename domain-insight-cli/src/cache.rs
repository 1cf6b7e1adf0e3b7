//! In-process memo of finished lookups, kept for the lifetime of a session.

use std::collections::HashMap;

use domain_insight_toolbox::{DnsRecordSet, WhoisRecord};

/// Successful results keyed by their exact inputs.
///
/// Nothing is ever evicted; failures are never stored, so a failed step is
/// retried on the next submission.
#[derive(Debug, Default)]
pub struct LookupCache {
    whois: HashMap<String, WhoisRecord>,
    dns: HashMap<String, DnsRecordSet>,
    summaries: HashMap<(WhoisRecord, DnsRecordSet), String>,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn whois(&self, domain: &str) -> Option<&WhoisRecord> {
        self.whois.get(domain)
    }

    pub fn store_whois(&mut self, domain: &str, record: WhoisRecord) {
        self.whois.insert(domain.to_string(), record);
    }

    pub fn dns(&self, domain: &str) -> Option<&DnsRecordSet> {
        self.dns.get(domain)
    }

    pub fn store_dns(&mut self, domain: &str, records: DnsRecordSet) {
        self.dns.insert(domain.to_string(), records);
    }

    pub fn summary(&self, whois: &WhoisRecord, dns: &DnsRecordSet) -> Option<&str> {
        // Tuple keys can't be borrowed piecewise, so the lookup key is cloned.
        self.summaries
            .get(&(whois.clone(), dns.clone()))
            .map(String::as_str)
    }

    pub fn store_summary(&mut self, whois: WhoisRecord, dns: DnsRecordSet, summary: String) {
        self.summaries.insert((whois, dns), summary);
    }
}
