//! Command-line options and the resolved startup configuration.

use std::time::Duration;

use anyhow::{Result, bail};
use clap::{ArgAction, Parser, ValueEnum};
use domain_insight_toolbox::{DEFAULT_COMPLETION_URL, DEFAULT_WHOIS_API_URL, GenerationParams};

/// Where WHOIS data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WhoisSourceKind {
    /// Run the local `whois` client.
    Local,
    /// Query the hosted WHOIS JSON API.
    Hosted,
}

/// Look up WHOIS and DNS data for a domain and get a plain-language summary of it.
#[derive(Debug, Parser)]
#[command(name = "domain-insight", version, about)]
pub struct Cli {
    /// Domain to inspect once. Without it an interactive prompt is started.
    pub domain: Option<String>,

    /// API key for the completion service.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Completion endpoint (OpenAI-compatible `/v1/completions`).
    #[arg(long, env = "COMPLETION_API_URL", default_value = DEFAULT_COMPLETION_URL)]
    pub completion_url: String,

    /// Completion model.
    #[arg(long, env = "COMPLETION_MODEL", default_value = "gpt-3.5-turbo-instruct")]
    pub model: String,

    #[arg(long, default_value_t = 1000)]
    pub max_tokens: u32,

    #[arg(long, default_value_t = 0.1)]
    pub temperature: f64,

    /// Language the summary is written in.
    #[arg(long, default_value = "English")]
    pub language: String,

    #[arg(long, value_enum, default_value_t = WhoisSourceKind::Local)]
    pub whois_source: WhoisSourceKind,

    /// WHOIS client binary used by the local source.
    #[arg(long, default_value = "whois")]
    pub whois_command: String,

    /// API key for the hosted WHOIS source.
    #[arg(long, env = "WHOIS_API_KEY", hide_env_values = true)]
    pub whois_api_key: Option<String>,

    #[arg(long, default_value = DEFAULT_WHOIS_API_URL)]
    pub whois_api_url: String,

    /// Resolve through this nameserver instead of the system configuration.
    #[arg(long, value_name = "IP")]
    pub nameserver: Option<String>,

    /// HTTP request timeout in seconds.
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Print each report as JSON instead of tables.
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Resolved WHOIS source settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhoisConfig {
    Local { command: String },
    Hosted { endpoint: String, api_key: String },
}

/// Immutable configuration built once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub domain: Option<String>,
    pub openai_api_key: String,
    pub completion_url: String,
    pub generation: GenerationParams,
    pub language: String,
    pub whois: WhoisConfig,
    pub nameserver: Option<String>,
    pub timeout: Duration,
    pub json: bool,
}

impl AppConfig {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let Some(openai_api_key) = non_blank(cli.openai_api_key) else {
            bail!("no completion API key configured; set OPENAI_API_KEY or pass --openai-api-key");
        };

        let whois = match cli.whois_source {
            WhoisSourceKind::Local => WhoisConfig::Local {
                command: cli.whois_command,
            },
            WhoisSourceKind::Hosted => {
                let Some(api_key) = non_blank(cli.whois_api_key) else {
                    bail!(
                        "the hosted WHOIS source needs an API key; set WHOIS_API_KEY or pass --whois-api-key"
                    );
                };
                WhoisConfig::Hosted {
                    endpoint: cli.whois_api_url,
                    api_key,
                }
            }
        };

        if !(0.0..=2.0).contains(&cli.temperature) {
            bail!("--temperature must be between 0 and 2, got {}", cli.temperature);
        }
        if cli.max_tokens == 0 {
            bail!("--max-tokens must be greater than zero");
        }
        if cli.timeout == 0 {
            bail!("--timeout must be greater than zero");
        }

        let domain = match cli.domain {
            Some(domain) if domain.trim().is_empty() => bail!("the domain argument is empty"),
            Some(domain) => Some(domain.trim().to_string()),
            None => None,
        };

        Ok(Self {
            domain,
            openai_api_key,
            completion_url: cli.completion_url,
            generation: GenerationParams {
                model: cli.model,
                max_tokens: cli.max_tokens,
                temperature: cli.temperature,
            },
            language: cli.language,
            whois,
            nameserver: non_blank(cli.nameserver),
            timeout: Duration::from_secs(cli.timeout),
            json: cli.json,
        })
    }
}

/// Minimum log level for the `-v` count.
pub fn log_level(verbose: u8) -> tracing::Level {
    match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["domain-insight"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_cli(parse(&["--openai-api-key", "sk-test"])).unwrap();

        assert_eq!(config.domain, None);
        assert_eq!(config.openai_api_key, "sk-test");
        assert_eq!(config.completion_url, DEFAULT_COMPLETION_URL);
        assert_eq!(config.generation, GenerationParams::default());
        assert_eq!(config.language, "English");
        assert_eq!(
            config.whois,
            WhoisConfig::Local {
                command: "whois".to_string()
            }
        );
        assert_eq!(config.nameserver, None);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(!config.json);
    }

    #[test]
    fn test_missing_completion_key_is_fatal() {
        let mut cli = parse(&["example.com"]);
        cli.openai_api_key = None;
        let err = AppConfig::from_cli(cli).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_blank_completion_key_is_fatal() {
        let cli = parse(&["--openai-api-key", "   "]);
        assert!(AppConfig::from_cli(cli).is_err());
    }

    #[test]
    fn test_hosted_source_requires_key() {
        let mut cli = parse(&["--openai-api-key", "sk-test", "--whois-source", "hosted"]);
        cli.whois_api_key = None;
        let err = AppConfig::from_cli(cli).unwrap_err();
        assert!(err.to_string().contains("WHOIS_API_KEY"));
    }

    #[test]
    fn test_hosted_source_with_key() {
        let cli = parse(&[
            "--openai-api-key",
            "sk-test",
            "--whois-source",
            "hosted",
            "--whois-api-key",
            "at_123",
            "--whois-api-url",
            "http://127.0.0.1:8080/whois",
        ]);
        let config = AppConfig::from_cli(cli).unwrap();
        assert_eq!(
            config.whois,
            WhoisConfig::Hosted {
                endpoint: "http://127.0.0.1:8080/whois".to_string(),
                api_key: "at_123".to_string(),
            }
        );
    }

    #[test]
    fn test_domain_is_trimmed() {
        let cli = parse(&["--openai-api-key", "sk-test", "  example.com  "]);
        let config = AppConfig::from_cli(cli).unwrap();
        assert_eq!(config.domain.as_deref(), Some("example.com"));
    }

    #[test]
    fn test_empty_domain_rejected() {
        let cli = parse(&["--openai-api-key", "sk-test", " "]);
        assert!(AppConfig::from_cli(cli).is_err());
    }

    #[test]
    fn test_generation_overrides() {
        let cli = parse(&[
            "--openai-api-key",
            "sk-test",
            "--model",
            "local-instruct",
            "--max-tokens",
            "256",
            "--temperature",
            "0.7",
            "--language",
            "Japanese",
        ]);
        let config = AppConfig::from_cli(cli).unwrap();
        assert_eq!(config.generation.model, "local-instruct");
        assert_eq!(config.generation.max_tokens, 256);
        assert!((config.generation.temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.language, "Japanese");
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        for args in [
            ["--temperature", "3.5"],
            ["--max-tokens", "0"],
            ["--timeout", "0"],
        ] {
            let mut full = vec!["--openai-api-key", "sk-test"];
            full.extend_from_slice(&args);
            assert!(AppConfig::from_cli(parse(&full)).is_err(), "{args:?}");
        }
    }

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(0), tracing::Level::WARN);
        assert_eq!(log_level(1), tracing::Level::INFO);
        assert_eq!(log_level(5), tracing::Level::DEBUG);
    }
}
