//! Terminal rendering of a finished report.

use colored::Colorize;
use domain_insight_toolbox::{DnsRecordSet, DomainReport, WhoisRecord};

fn heading(title: &str) -> String {
    title.bold().underline().to_string()
}

/// `WHOIS Information` section: one aligned `key  value` row per field.
pub fn whois_table(record: &WhoisRecord) -> String {
    let mut out = heading("WHOIS Information");
    out.push('\n');

    if record.is_empty() {
        out.push_str("  (no fields found)\n");
        return out;
    }

    let width = record.iter().map(|(key, _)| key.chars().count()).max().unwrap_or(0);
    for (key, value) in record.iter() {
        let label = format!("{key:<width$}");
        out.push_str(&format!("  {}  {value}\n", label.cyan()));
    }
    out
}

/// `DNS Information` section: every record type, values one per line.
pub fn dns_listing(dns: &DnsRecordSet) -> String {
    let mut out = heading("DNS Information");
    out.push('\n');

    for (record_type, values) in dns.iter() {
        let label = format!("{:<5}", record_type.as_str());
        match values.split_first() {
            None => out.push_str(&format!("  {}  {}\n", label.cyan(), "-".dimmed())),
            Some((first, rest)) => {
                out.push_str(&format!("  {}  {first}\n", label.cyan()));
                for value in rest {
                    out.push_str(&format!("  {:<5}  {value}\n", ""));
                }
            }
        }
    }
    out
}

/// `Summary and Explanation` section rendered as a `> ` quoted block.
pub fn summary_block(summary: &str) -> String {
    let mut out = heading("Summary and Explanation");
    out.push('\n');
    for line in summary.lines() {
        if line.is_empty() {
            out.push_str(">\n");
        } else {
            out.push_str(&format!("> {line}\n"));
        }
    }
    out
}

/// All three sections, blank-line separated.
pub fn report_text(report: &DomainReport) -> String {
    [
        whois_table(&report.whois),
        dns_listing(&report.dns),
        summary_block(&report.summary),
    ]
    .join("\n")
}

pub fn report_json(report: &DomainReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
