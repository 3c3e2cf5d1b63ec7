mod config;

use anyhow::Context;
use std::io::{self, Read, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use config::{Config, InputFormat, OutputFormat};
use devreply::{ConvertError, Producible, Reply};

fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(2);
        }
    };

    // Initialize logging; stdout carries only the converted reply
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.log_level).into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Some(path) = &config.source {
        tracing::info!("Loaded configuration from: {}", path.display());
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            match e.downcast_ref::<ConvertError>() {
                Some(err) => {
                    eprintln!("{}", err.user_message());
                    ExitCode::from(if err.is_input_error() { 2 } else { 1 })
                }
                None => {
                    eprintln!("Error: {:#}", e);
                    ExitCode::from(1)
                }
            }
        }
    }
}

fn run(config: &Config) -> anyhow::Result<()> {
    let input = read_input(config)?;

    let mut reply = match (config.from, config.family) {
        (InputFormat::Xml, None) => Reply::read_xml(&input),
        (InputFormat::Xml, Some(family)) => Reply::read_xml_as(family, &input),
        (InputFormat::Json, family) => Reply::read_json(&input, family),
    }
    .context("Failed to read reply")?;
    tracing::info!("Read {} reply ({} bytes)", reply.family(), input.len());

    let origin_host = match &config.origin_host {
        Some(host) => Some(host.clone()),
        None if config.stamp_origin => local_hostname(),
        None => None,
    };
    reply.set_origin(origin_host, config.origin_ip.clone());

    let stdout = io::stdout();
    let mut sink = stdout.lock();
    match config.to {
        OutputFormat::Xml => {
            let n = reply.write_xml_to(&mut sink)?;
            tracing::debug!("Wrote {} bytes of XML", n);
        }
        OutputFormat::Json => {
            let n = reply.write_json_to(&mut sink)?;
            tracing::debug!("Wrote {} bytes of JSON", n);
        }
        OutputFormat::Cli => reply.write_cli_to(&mut sink)?,
    }
    sink.flush()?;

    Ok(())
}

fn read_input(config: &Config) -> anyhow::Result<Vec<u8>> {
    match &config.input {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("Cannot read {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Cannot read stdin")?;
            Ok(buf)
        }
    }
}

fn local_hostname() -> Option<String> {
    let hostname = hostname::get().ok().and_then(|h| h.into_string().ok());
    if hostname.is_none() {
        tracing::warn!("Local hostname unavailable, origin host left unset");
    }
    hostname
}
