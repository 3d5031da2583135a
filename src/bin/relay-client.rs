use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tts_relay::domain::generation::{
    package_artifacts, CorrelationRegistry, Entry, GenerationService, GenerationServiceApi,
    GenerationSettings,
};
use tts_relay::infrastructure::config::ClientConfig;
use tts_relay::infrastructure::logging::init_logging;
use tts_relay::infrastructure::relay_client::{HttpGatewayProbe, ReconnectPolicy, RelayConnection};

#[derive(Debug, Parser)]
#[command(name = "relay-client")]
#[command(about = "Synthesize a batch of texts through a TTS relay gateway and zip the audio")]
struct Cli {
    /// JSON file holding `[{text, voiceId, voiceName?, language?, settings?}]`
    input: PathBuf,
    /// Archive to write
    #[arg(long, short, default_value = "tts-batch.zip")]
    output: PathBuf,
    /// Overrides RELAY_WS_URL
    #[arg(long)]
    ws_url: Option<String>,
    /// Overrides RELAY_PROBE_URL
    #[arg(long)]
    probe_url: Option<String>,
    /// Maximum characters per chunk
    #[arg(long)]
    chunk_limit: Option<usize>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Batch aborted");
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env()
        .map_err(|e| anyhow::anyhow!("invalid client configuration: {}", e))?;
    if let Some(ws_url) = cli.ws_url {
        config.ws_url = ws_url;
    }
    if let Some(probe_url) = cli.probe_url {
        config.probe_url = probe_url;
    }
    if let Some(limit) = cli.chunk_limit {
        config.chunk_char_limit = limit;
    }

    init_logging(&config.log_format);

    let raw = tokio::fs::read_to_string(&cli.input)
        .await
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let entries: Vec<Entry> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing batch file {}", cli.input.display()))?;
    if entries.is_empty() {
        bail!("batch file {} has no entries", cli.input.display());
    }

    tracing::info!(
        entry_count = entries.len(),
        ws_url = %config.ws_url,
        chunk_char_limit = config.chunk_char_limit,
        "Starting batch"
    );

    let correlation = CorrelationRegistry::new(config.strict_correlation);
    let connection = Arc::new(RelayConnection::spawn(
        config.ws_url.clone(),
        ReconnectPolicy::from(&config),
        correlation.clone(),
    ));
    let probe = Arc::new(HttpGatewayProbe::new(config.probe_url.clone(), config.connect_timeout)?);
    let service = GenerationService::new(
        connection,
        probe,
        correlation,
        GenerationSettings::from(&config),
    );

    let report = match service.run_batch(entries).await {
        Ok(report) => report,
        Err(e) if e.is_batch_level() => {
            println!("batch not started: {}", e);
            return Ok(ExitCode::from(3));
        }
        Err(e) => return Err(e.into()),
    };

    for outcome in &report.outcomes {
        println!("{}", outcome.describe());
    }

    if report.artifacts.is_empty() {
        println!("no audio produced; nothing written");
        return Ok(ExitCode::FAILURE);
    }

    let archive = package_artifacts(&report.artifacts)?;
    tokio::fs::write(&cli.output, &archive)
        .await
        .with_context(|| format!("writing {}", cli.output.display()))?;

    println!(
        "wrote {} artifacts ({} bytes) to {}",
        report.artifacts.len(),
        archive.len(),
        cli.output.display()
    );

    Ok(if report.failure_count() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}
