use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use call_analyzer::{
    write_result_json, AnalysisBackend, AnalyzerConfig, AppState, HumanReport, StageTimeouts,
    TranscriptionBackend,
};

#[derive(Parser)]
#[command(name = "call-analyzer")]
#[command(author, version, about = "Customer-call intent and sentiment analyzer", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve POST /analyze over HTTP
    Serve {
        /// Address to listen on
        #[arg(long, env = "ANALYZER_HOST", default_value = "0.0.0.0")]
        host: IpAddr,

        /// Port to listen on
        #[arg(long, env = "ANALYZER_PORT", default_value = "8000")]
        port: u16,

        /// Largest accepted upload in megabytes
        #[arg(long, env = "ANALYZER_MAX_UPLOAD_MB", default_value = "50")]
        max_upload_mb: usize,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Analyze a single recording and print the result
    Analyze {
        /// Input audio file (any format the conversion tool reads)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the JSON result (printed to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print a human-readable report instead of JSON
        #[arg(long)]
        human: bool,

        /// Also write the human-readable report to this file
        #[arg(long)]
        report: Option<PathBuf>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Send a recording to a running server
    Submit {
        /// Input audio file
        #[arg(short, long)]
        input: PathBuf,

        /// Analyze endpoint
        #[arg(long, default_value = "http://localhost:8000/analyze")]
        url: String,
    },
}

#[derive(Args)]
struct PipelineArgs {
    /// Transcription variant
    #[arg(long, env = "TRANSCRIBE_PROVIDER", value_enum, default_value = "mock")]
    transcription: TranscriptionBackend,

    /// Analysis variant
    #[arg(long, env = "ANALYSIS_ENGINE", value_enum, default_value = "heuristic")]
    analysis: AnalysisBackend,

    /// Audio conversion tool
    #[arg(long, env = "FFMPEG_PATH", default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// Directory for per-request scratch files (system temp dir if omitted)
    #[arg(long, env = "ANALYZER_SCRATCH_DIR")]
    scratch_dir: Option<PathBuf>,

    /// Time limit for audio conversion, in seconds
    #[arg(long, default_value = "60")]
    normalize_timeout_secs: u64,

    /// Time limit for transcription, in seconds
    #[arg(long, default_value = "120")]
    transcribe_timeout_secs: u64,

    /// Time limit for analysis, in seconds
    #[arg(long, default_value = "60")]
    analyze_timeout_secs: u64,
}

impl PipelineArgs {
    fn into_config(self) -> AnalyzerConfig {
        AnalyzerConfig {
            transcription: self.transcription,
            analysis: self.analysis,
            ffmpeg: self.ffmpeg,
            scratch_dir: self.scratch_dir,
            timeouts: StageTimeouts {
                normalize: Duration::from_secs(self.normalize_timeout_secs),
                transcribe: Duration::from_secs(self.transcribe_timeout_secs),
                analyze: Duration::from_secs(self.analyze_timeout_secs),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Serve {
            host,
            port,
            max_upload_mb,
            pipeline,
        } => serve(SocketAddr::new(host, port), max_upload_mb, pipeline.into_config()).await,
        Commands::Analyze {
            input,
            output,
            human,
            report,
            pipeline,
        } => analyze_file(input, output, human, report, pipeline.into_config()).await,
        Commands::Submit { input, url } => submit_file(input, url).await,
    }
}

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

async fn serve(addr: SocketAddr, max_upload_mb: usize, config: AnalyzerConfig) -> Result<()> {
    let pipeline = config.build_pipeline()?;

    match pipeline.normalizer().probe().await {
        Ok(version) => info!("Conversion tool: {}", version),
        Err(e) => warn!("Conversion tool check failed, requests will fail until fixed: {}", e),
    }

    let state = AppState {
        pipeline: Arc::new(pipeline),
        max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
    };
    call_analyzer::server::serve(addr, state).await
}

async fn analyze_file(
    input: PathBuf,
    output: Option<PathBuf>,
    human: bool,
    report: Option<PathBuf>,
    config: AnalyzerConfig,
) -> Result<()> {
    info!("Loading audio from {:?}", input);
    let audio = tokio::fs::read(&input)
        .await
        .with_context(|| format!("Failed to read file: {:?}", input))?;
    let file_name = input.file_name().and_then(|n| n.to_str());

    let pipeline = config.build_pipeline()?;

    // Ctrl-C aborts the in-flight stage; the scratch directory is still removed
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let result = pipeline
        .run_with_cancel(&audio, file_name, &cancel)
        .await
        .context("Analysis failed")?;

    if let Some(path) = &output {
        write_result_json(&result, path)?;
        info!("Result written to {:?}", path);
    }

    if let Some(path) = &report {
        HumanReport::new(&result).write_file(path)?;
        info!("Report written to {:?}", path);
    }

    if human {
        print!("{}", HumanReport::new(&result).format());
    } else if output.is_none() {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}

async fn submit_file(input: PathBuf, url: String) -> Result<()> {
    let data = tokio::fs::read(&input)
        .await
        .with_context(|| format!("Failed to read file: {:?}", input))?;
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio.wav".to_string());

    let part = reqwest::multipart::Part::bytes(data)
        .file_name(file_name)
        .mime_str("application/octet-stream")?;
    let form = reqwest::multipart::Form::new().part(call_analyzer::server::handlers::AUDIO_FIELD, part);

    let response = reqwest::Client::new()
        .post(&url)
        .multipart(form)
        .send()
        .await
        .with_context(|| format!("Failed to send request to {}", url))?;

    let status = response.status();
    let body = response.text().await.context("Failed to read response body")?;

    println!("Status: {}", status);
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", body),
    }

    if !status.is_success() {
        anyhow::bail!("Server returned {}", status);
    }
    Ok(())
}
