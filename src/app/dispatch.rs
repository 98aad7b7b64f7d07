use crate::app::status::render_config;
use crate::cli::commands::{Cli, Commands};
use anyhow::{Context, Result, anyhow, bail};
use mailcraft::auth::{API_KEY, ConfigCredentialStore, CredentialStore};
use mailcraft::prompt::{Draft, Tone};
use mailcraft::transport::ChannelSettings;
use mailcraft::transport::protocol::{PingResult, ValidityResult};
use mailcraft::{Config, CorrelationChannel, LocalHost, Request, Response, TransportStrategy};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing::info;

struct RewriteArgs {
    tone: Option<Tone>,
    instruction: Option<String>,
    subject: Option<String>,
    file: Option<PathBuf>,
    transport: Option<TransportStrategy>,
    text: Vec<String>,
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Rewrite {
            tone,
            instruction,
            subject,
            file,
            transport,
            text,
        } => {
            run_rewrite(
                &config,
                RewriteArgs {
                    tone,
                    instruction,
                    subject,
                    file,
                    transport,
                    text,
                },
            )
            .await
        }
        Commands::ValidateKey { key } => run_validate_key(&config, key).await,
        Commands::Ping { transport } => run_ping(&config, transport).await,
        Commands::Config => {
            println!("{}", render_config(&config));
            Ok(())
        }
    }
}

/// Channel to a fresh in-process background host.
fn open_channel(
    config: &Config,
    transport: Option<TransportStrategy>,
) -> Result<CorrelationChannel<LocalHost>> {
    let host = LocalHost::from_config(config)?;
    let mut settings = ChannelSettings::from_config(&config.channel);
    if let Some(transport) = transport {
        settings.strategy = transport;
    }
    Ok(CorrelationChannel::new(host, settings))
}

/// Result of a successful response, or its error description as the error.
fn into_result(response: Response) -> Result<serde_json::Value> {
    if response.is_success() {
        return Ok(response.result.unwrap_or_default());
    }
    bail!(
        "{}",
        response
            .error_description
            .unwrap_or_else(|| "Unknown error".to_string())
    )
}

async fn read_body(file: Option<PathBuf>, text: Vec<String>) -> Result<String> {
    if let Some(path) = file {
        return tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read draft {}", path.display()));
    }
    if !text.is_empty() {
        return Ok(text.join(" "));
    }
    let mut body = String::new();
    tokio::io::stdin()
        .read_to_string(&mut body)
        .await
        .context("Failed to read draft from stdin")?;
    Ok(body)
}

async fn run_rewrite(config: &Config, args: RewriteArgs) -> Result<()> {
    let body = read_body(args.file, args.text).await?;
    let store = ConfigCredentialStore::new(config);
    let payload = Draft::new(args.subject.unwrap_or_default(), body)
        .into_payload(args.tone, args.instruction, store.get(API_KEY))
        .map_err(|e| anyhow!(e.user_message()))?;

    let channel = open_channel(config, args.transport)?;
    info!(transport = %channel.settings().strategy, "rewriting draft");
    let result = into_result(channel.call(Request::rewrite(&payload)?).await)?;
    let rewritten = result
        .as_str()
        .ok_or_else(|| anyhow!("Rewrite returned a non-text result"))?;
    println!("{rewritten}");
    Ok(())
}

async fn run_validate_key(config: &Config, key: Option<String>) -> Result<()> {
    let key = key
        .or_else(|| ConfigCredentialStore::new(config).get(API_KEY))
        .ok_or_else(|| anyhow!("Please set up your Gemini API key."))?;

    let channel = open_channel(config, None)?;
    let result = into_result(channel.call(Request::validate_credential(&key)?).await)?;
    let validity: ValidityResult =
        serde_json::from_value(result).context("Malformed validation result")?;
    println!("{}", if validity.valid { "valid" } else { "invalid" });
    Ok(())
}

async fn run_ping(config: &Config, transport: Option<TransportStrategy>) -> Result<()> {
    let channel = open_channel(config, transport)?;
    let result = into_result(channel.call(Request::ping()).await)?;
    let ping: PingResult = serde_json::from_value(result).context("Malformed ping result")?;
    let at = chrono::DateTime::from_timestamp_millis(ping.ts)
        .map_or_else(|| ping.ts.to_string(), |t| t.to_rfc3339());
    println!("pong: background host alive at {at}");
    Ok(())
}
