//! Prompt loop: read a domain, run each pipeline step behind a spinner,
//! render the result, repeat.

use std::future::Future;
use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use domain_insight_toolbox::{DomainInspector, DomainReport, ToolboxResult};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cache::LookupCache;
use crate::render;

const PROMPT: &str = "Enter a domain name (or 'quit'): ";

/// One user session over a configured pipeline.
pub struct Session<'a> {
    inspector: &'a DomainInspector,
    cache: LookupCache,
    json: bool,
    spinners: bool,
}

impl<'a> Session<'a> {
    pub fn new(inspector: &'a DomainInspector, json: bool) -> Self {
        Self {
            inspector,
            cache: LookupCache::new(),
            json,
            spinners: true,
        }
    }

    /// Read domains from stdin until `quit`, `exit` or end of input.
    pub async fn run_interactive(&mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("{}", PROMPT.bold());
            std::io::stdout().flush().context("failed to flush stdout")?;

            let Some(line) = lines.next_line().await.context("failed to read from stdin")? else {
                println!();
                break;
            };
            let domain = line.trim();
            if domain.is_empty() {
                continue;
            }
            if domain.eq_ignore_ascii_case("quit") || domain.eq_ignore_ascii_case("exit") {
                break;
            }

            self.submit(domain).await;
        }
        Ok(())
    }

    /// Look up one domain and print the outcome. Returns `false` if a step failed.
    pub async fn submit(&mut self, domain: &str) -> bool {
        match self.lookup(domain).await {
            Ok(report) => {
                self.print_report(&report);
                true
            }
            Err(e) => {
                tracing::debug!("lookup of {domain} failed: {e:?}");
                eprintln!("{}", format!("Error: {e}").red());
                false
            }
        }
    }

    fn print_report(&self, report: &DomainReport) {
        if self.json {
            match render::report_json(report) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("{}", format!("Error: failed to encode report: {e}").red()),
            }
        } else {
            println!("\n{}", render::report_text(report));
        }
    }

    /// Run WHOIS, DNS and summary in order, serving each step from the cache when possible.
    pub async fn lookup(&mut self, domain: &str) -> ToolboxResult<DomainReport> {
        let (whois, whois_error) = if let Some(record) = self.cache.whois(domain) {
            tracing::debug!("WHOIS cache hit for {domain}");
            (record.clone(), None)
        } else {
            let outcome = self
                .step("Retrieving WHOIS information...", self.inspector.whois(domain))
                .await;
            match outcome.error {
                Some(error) => {
                    eprintln!("{}", format!("Error retrieving WHOIS information: {error}").red());
                    (outcome.record, Some(error))
                }
                None => {
                    self.cache.store_whois(domain, outcome.record.clone());
                    (outcome.record, None)
                }
            }
        };

        let dns = if let Some(records) = self.cache.dns(domain) {
            tracing::debug!("DNS cache hit for {domain}");
            records.clone()
        } else {
            let records = self
                .step("Retrieving DNS information...", self.inspector.dns(domain))
                .await?;
            self.cache.store_dns(domain, records.clone());
            records
        };

        let summary = if let Some(summary) = self.cache.summary(&whois, &dns) {
            tracing::debug!("summary cache hit for {domain}");
            summary.to_string()
        } else {
            let summary = self
                .step(
                    "Generating summary and explanation...",
                    self.inspector.summarize(&whois, &dns),
                )
                .await?;
            self.cache
                .store_summary(whois.clone(), dns.clone(), summary.clone());
            summary
        };

        Ok(DomainReport {
            domain: domain.to_string(),
            whois,
            whois_error,
            dns,
            summary,
        })
    }

    async fn step<F: Future>(&self, message: &'static str, work: F) -> F::Output {
        if !self.spinners {
            return work.await;
        }
        let spinner = spinner(message);
        let output = work.await;
        spinner.finish_and_clear();
        output
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let style = ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"]);
    let pb = ProgressBar::new_spinner().with_style(style).with_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use domain_insight_toolbox::{
        CompletionService, DnsAnswer, DnsRecordType, DnsSource, DnsValue, ToolboxError, WhoisRaw,
        WhoisSource,
    };

    use super::*;

    #[derive(Default)]
    struct Calls {
        whois: AtomicUsize,
        dns: AtomicUsize,
        completion: AtomicUsize,
        whois_fails: AtomicBool,
        dns_fails: AtomicBool,
    }

    struct Whois(Arc<Calls>);
    struct Dns(Arc<Calls>);
    struct Completion(Arc<Calls>);

    #[async_trait]
    impl WhoisSource for Whois {
        fn name(&self) -> &'static str {
            "test"
        }

        async fn fetch(&self, domain: &str) -> ToolboxResult<WhoisRaw> {
            self.0.whois.fetch_add(1, Ordering::SeqCst);
            if self.0.whois_fails.load(Ordering::SeqCst) {
                return Err(ToolboxError::WhoisError("connection refused".to_string()));
            }
            Ok(WhoisRaw::Text(format!("Domain Name: {}\nRegistrar: ACME Inc.\n", domain.to_uppercase())))
        }
    }

    #[async_trait]
    impl DnsSource for Dns {
        async fn query(&self, domain: &str, record_type: DnsRecordType) -> ToolboxResult<DnsAnswer> {
            self.0.dns.fetch_add(1, Ordering::SeqCst);
            if self.0.dns_fails.load(Ordering::SeqCst) {
                return Err(ToolboxError::DomainNotFound(domain.to_string()));
            }
            Ok(match record_type {
                DnsRecordType::A => DnsAnswer::Records(vec![DnsValue::text("93.184.216.34")]),
                _ => DnsAnswer::NoData,
            })
        }
    }

    #[async_trait]
    impl CompletionService for Completion {
        async fn complete(&self, _prompt: &str) -> ToolboxResult<String> {
            let n = self.0.completion.fetch_add(1, Ordering::SeqCst);
            Ok(format!("summary #{n}"))
        }
    }

    fn fixture() -> (Arc<Calls>, DomainInspector) {
        let calls = Arc::new(Calls::default());
        let inspector = DomainInspector::new(
            Box::new(Whois(Arc::clone(&calls))),
            Box::new(Dns(Arc::clone(&calls))),
            Box::new(Completion(Arc::clone(&calls))),
        );
        (calls, inspector)
    }

    fn quiet(inspector: &DomainInspector) -> Session<'_> {
        let mut session = Session::new(inspector, false);
        session.spinners = false;
        session
    }

    #[tokio::test]
    async fn test_repeat_lookup_is_served_from_cache() {
        let (calls, inspector) = fixture();
        let mut session = quiet(&inspector);

        let first = session.lookup("example.com").await.unwrap();
        let second = session.lookup("example.com").await.unwrap();

        assert_eq!(first.summary, "summary #0");
        assert_eq!(second.summary, "summary #0");
        assert_eq!(second.whois.get("Registrar"), Some("ACME Inc."));
        assert_eq!(calls.whois.load(Ordering::SeqCst), 1);
        assert_eq!(calls.dns.load(Ordering::SeqCst), 6);
        assert_eq!(calls.completion.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_domain_misses_cache() {
        let (calls, inspector) = fixture();
        let mut session = quiet(&inspector);

        session.lookup("example.com").await.unwrap();
        let other = session.lookup("example.org").await.unwrap();

        assert_eq!(other.whois.get("Domain Name"), Some("EXAMPLE.ORG"));
        assert_eq!(calls.whois.load(Ordering::SeqCst), 2);
        assert_eq!(calls.completion.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_whois_failure_not_cached() {
        let (calls, inspector) = fixture();
        let mut session = quiet(&inspector);
        calls.whois_fails.store(true, Ordering::SeqCst);

        let report = session.lookup("example.com").await.unwrap();
        assert!(report.whois.is_empty());
        assert_eq!(report.whois_error.as_deref(), Some("WHOIS retrieval failed: connection refused"));

        calls.whois_fails.store(false, Ordering::SeqCst);
        let report = session.lookup("example.com").await.unwrap();
        assert!(report.whois_error.is_none());
        assert_eq!(calls.whois.load(Ordering::SeqCst), 2);
        // The WHOIS record changed, so the summary key changed too.
        assert_eq!(calls.completion.load(Ordering::SeqCst), 2);
        // DNS was cached by the first run.
        assert_eq!(calls.dns.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_dns_failure_aborts_and_is_retried() {
        let (calls, inspector) = fixture();
        let mut session = quiet(&inspector);
        calls.dns_fails.store(true, Ordering::SeqCst);

        assert!(!session.submit("example.com").await);
        assert_eq!(calls.completion.load(Ordering::SeqCst), 0);

        calls.dns_fails.store(false, Ordering::SeqCst);
        assert!(session.submit("example.com").await);
        assert_eq!(calls.dns.load(Ordering::SeqCst), 12);
        assert_eq!(calls.whois.load(Ordering::SeqCst), 1);
        assert_eq!(calls.completion.load(Ordering::SeqCst), 1);
    }
}
