// Configuration management for devreply
// Supports CLI arguments, config file (TOML), and environment variables

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::Level;

use devreply::Family;

/// devreply - Convert Junos ping, traceroute and BGP route replies between XML, JSON and CLI text
#[derive(Parser, Debug, Clone)]
#[command(name = "devreply")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Reply to convert (reads stdin when omitted)
    pub input: Option<PathBuf>,

    /// Format of the input reply
    #[arg(short, long, value_enum, default_value = "xml", env = "DEVREPLY_FROM")]
    pub from: InputFormat,

    /// Output format [default: cli]
    #[arg(short, long, value_enum, env = "DEVREPLY_TO")]
    pub to: Option<OutputFormat>,

    /// Reply family (auto, ping, traceroute, route)
    #[arg(long, default_value = "auto", env = "DEVREPLY_FAMILY")]
    pub family: String,

    /// Name of the device the reply came from (JSON output only)
    #[arg(long, env = "DEVREPLY_ORIGIN_HOST")]
    pub origin_host: Option<String>,

    /// Address of the device the reply came from (JSON output only)
    #[arg(long, env = "DEVREPLY_ORIGIN_IP")]
    pub origin_ip: Option<String>,

    /// Use the local hostname as origin host when none is given
    #[arg(long, env = "DEVREPLY_STAMP_ORIGIN")]
    pub stamp_origin: bool,

    /// Logging level (error, warn, info, debug, trace)
    #[arg(short, long, env = "DEVREPLY_LOG")]
    pub log_level: Option<String>,

    /// Path to configuration file
    #[arg(short, long, env = "DEVREPLY_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    Xml,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Xml,
    Json,
    Cli,
}

/// Configuration file structure (TOML format)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Origin tagging settings
    #[serde(default)]
    pub origin: OriginConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format (xml, json, cli)
    #[serde(default = "default_output_format")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OriginConfig {
    /// Origin host written into JSON output
    #[serde(default)]
    pub host: Option<String>,

    /// Origin IP written into JSON output
    #[serde(default)]
    pub ip: Option<String>,

    /// Fall back to the local hostname for the origin host
    #[serde(default)]
    pub stamp: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_output_format() -> OutputFormat {
    OutputFormat::Cli
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            format: default_output_format(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

/// Merged configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub input: Option<PathBuf>,
    pub from: InputFormat,
    pub to: OutputFormat,
    /// `None` lets the reply itself tell its family
    pub family: Option<Family>,
    pub origin_host: Option<String>,
    pub origin_ip: Option<String>,
    pub stamp_origin: bool,
    pub log_level: Level,
    /// Config file that was loaded, if any
    pub source: Option<PathBuf>,
}

impl Config {
    /// Load configuration from all sources (CLI args, config file, defaults)
    /// Priority: CLI args > Environment variables > Config file > Defaults
    pub fn load() -> anyhow::Result<Self> {
        Config::from_args(CliArgs::parse())
    }

    pub fn from_args(cli_args: CliArgs) -> anyhow::Result<Self> {
        // Load config file if specified
        let (config_file, source) = if let Some(config_path) = &cli_args.config {
            (read_config_file(config_path)?, Some(config_path.clone()))
        } else {
            // Try loading from default locations
            let default_paths = [PathBuf::from("devreply.toml"), PathBuf::from("config.toml")];

            match default_paths.into_iter().find(|path| path.exists()) {
                Some(path) => (read_config_file(&path)?, Some(path)),
                None => (ConfigFile::default(), None),
            }
        };

        // Merge configuration (CLI args override config file)
        let to = cli_args.to.unwrap_or(config_file.output.format);
        let family = parse_family(&cli_args.family)?;
        let origin_host = cli_args.origin_host.or(config_file.origin.host);
        let origin_ip = cli_args.origin_ip.or(config_file.origin.ip);
        let stamp_origin = cli_args.stamp_origin || config_file.origin.stamp;

        let log_level = parse_log_level(
            cli_args
                .log_level
                .as_deref()
                .unwrap_or(&config_file.logging.level),
        )?;

        Ok(Config {
            input: cli_args.input,
            from: cli_args.from,
            to,
            family,
            origin_host,
            origin_ip,
            stamp_origin,
            log_level,
            source,
        })
    }
}

fn read_config_file(path: &Path) -> anyhow::Result<ConfigFile> {
    let config_content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read config file {}: {}", path.display(), e))?;
    toml::from_str::<ConfigFile>(&config_content)
        .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path.display(), e))
}

fn parse_family(family_str: &str) -> anyhow::Result<Option<Family>> {
    if family_str.eq_ignore_ascii_case("auto") {
        return Ok(None);
    }
    family_str
        .parse::<Family>()
        .map(Some)
        .map_err(|_| anyhow::anyhow!("Invalid reply family: {}", family_str))
}

fn parse_log_level(level_str: &str) -> anyhow::Result<Level> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(anyhow::anyhow!("Invalid log level: {}", level_str)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();
        assert_eq!(config.output.format, OutputFormat::Cli);
        assert_eq!(config.logging.level, "warn");
        assert!(!config.origin.stamp);
        assert!(config.origin.host.is_none());
    }

    #[test]
    fn test_config_file_sections() {
        let config: ConfigFile = toml::from_str(
            r#"
            [output]
            format = "json"

            [origin]
            host = "edge1"
            stamp = true
            "#,
        )
        .unwrap();

        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.origin.host.as_deref(), Some("edge1"));
        assert!(config.origin.ip.is_none());
        assert!(config.origin.stamp);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_config_file_rejects_unknown_format() {
        let result = toml::from_str::<ConfigFile>("[output]\nformat = \"yaml\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_args() {
        let args = CliArgs::try_parse_from([
            "devreply",
            "reply.json",
            "--from",
            "json",
            "--to",
            "xml",
            "--family",
            "bgp",
        ])
        .unwrap();

        assert_eq!(args.input, Some(PathBuf::from("reply.json")));
        assert_eq!(args.from, InputFormat::Json);
        assert_eq!(args.to, Some(OutputFormat::Xml));
        assert_eq!(args.family, "bgp");
        assert!(CliArgs::try_parse_from(["devreply", "--to", "yaml"]).is_err());
    }

    #[test]
    fn test_parse_family() {
        assert_eq!(parse_family("auto").unwrap(), None);
        assert_eq!(parse_family("Traceroute").unwrap(), Some(Family::Traceroute));
        assert_eq!(parse_family("route").unwrap(), Some(Family::Route));
        assert!(parse_family("arp").is_err());
    }

    #[test]
    fn test_parse_log_level() {
        assert!(matches!(parse_log_level("info"), Ok(Level::INFO)));
        assert!(matches!(parse_log_level("debug"), Ok(Level::DEBUG)));
        assert!(parse_log_level("invalid").is_err());
    }
}
