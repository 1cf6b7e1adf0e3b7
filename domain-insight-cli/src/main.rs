//! `domain-insight`: WHOIS and DNS lookups with a generated plain-language summary.
//!
//! With a DOMAIN argument the pipeline runs once and the process exits;
//! otherwise domains are read interactively until `quit`.

mod cache;
mod config;
mod render;
mod session;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use config::{AppConfig, Cli, WhoisConfig};
use domain_insight_toolbox::{
    DomainInspector, HickoryDnsSource, HostedWhoisSource, LocalWhoisSource, OpenAiCompletionClient,
    WhoisSource, build_client,
};
use session::Session;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only reports.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time(),
        )
        .with(EnvFilter::from_default_env().add_directive(config::log_level(cli.verbose).into()))
        .init();

    let config = match AppConfig::from_cli(cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            return ExitCode::FAILURE;
        }
    };

    let inspector = match build_inspector(&config) {
        Ok(inspector) => inspector,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            return ExitCode::FAILURE;
        }
    };

    let mut session = Session::new(&inspector, config.json);
    match config.domain.as_deref() {
        Some(domain) => {
            if session.submit(domain).await {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        None => match session.run_interactive().await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{} {e:#}", "error:".red().bold());
                ExitCode::FAILURE
            }
        },
    }
}

fn build_inspector(config: &AppConfig) -> Result<DomainInspector> {
    let client = build_client(config.timeout).context("failed to build HTTP client")?;

    let whois: Box<dyn WhoisSource> = match &config.whois {
        WhoisConfig::Local { command } => Box::new(LocalWhoisSource::new(command.as_str())),
        WhoisConfig::Hosted { endpoint, api_key } => Box::new(HostedWhoisSource::new(
            client.clone(),
            endpoint.as_str(),
            api_key.as_str(),
        )),
    };

    let dns = HickoryDnsSource::new(config.nameserver.as_deref()).context("invalid --nameserver")?;
    tracing::info!(
        "WHOIS source: {}, DNS server: {}, completion model: {}",
        whois.name(),
        dns.nameserver(),
        config.generation.model
    );

    let completion = OpenAiCompletionClient::new(
        client,
        config.completion_url.as_str(),
        config.openai_api_key.as_str(),
        config.generation.clone(),
    );

    Ok(
        DomainInspector::new(whois, Box::new(dns), Box::new(completion))
            .with_language(config.language.as_str()),
    )
}
