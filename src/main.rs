use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use voxloop::config::file::config_file_path;
use voxloop::{ApiServerBuilder, Config, ConversationBuffer, TurnPipeline};

/// voxloop - voice assistant round trips over HTTP
#[derive(Parser)]
#[command(name = "voxloop", version, about)]
struct Cli {
    /// Address to bind (overrides config)
    #[arg(long, env = "VOXLOOP_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(long, env = "VOXLOOP_PORT")]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Transcribe an audio file once and print the text
    Transcribe {
        /// Audio file to transcribe
        path: PathBuf,
    },
    /// Synthesize text once and write the audio to a file
    Speak {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
        /// Output MP3 path
        #[arg(short, long, default_value = "speech.mp3")]
        output: PathBuf,
    },
    /// Print the config file location
    ConfigPath,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,voxloop=info",
        1 => "info,voxloop=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if matches!(cli.command, Some(Command::ConfigPath)) {
        match config_file_path() {
            Some(path) => println!("{}", path.display()),
            None => anyhow::bail!("could not determine config directory"),
        }
        return Ok(());
    }

    let mut config = Config::load()?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate()?;
    tracing::debug!(?config, "loaded configuration");

    let history = Arc::new(ConversationBuffer::new(config.max_messages));
    let pipeline = TurnPipeline::from_config(&config, history)?;

    match cli.command {
        Some(Command::Transcribe { path }) => transcribe_file(&pipeline, &path).await,
        Some(Command::Speak { text, output }) => speak(&pipeline, &text, &output).await,
        Some(Command::Serve | Command::ConfigPath) | None => serve(&config, pipeline).await,
    }
}

/// Run the HTTP server until interrupted
async fn serve(config: &Config, pipeline: TurnPipeline) -> anyhow::Result<()> {
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        llm = %config.llm.model,
        stt = %config.voice.stt_model,
        tts = %config.voice.tts_model,
        "starting voxloop"
    );

    ApiServerBuilder::new(pipeline)
        .config(config)
        .build()
        .run()
        .await?;

    Ok(())
}

/// Transcribe a file through the configured STT provider
async fn transcribe_file(pipeline: &TurnPipeline, path: &std::path::Path) -> anyhow::Result<()> {
    let audio = tokio::fs::read(path).await?;
    println!("Transcribing {} ({} bytes)...", path.display(), audio.len());

    let text = pipeline.transcriber().transcribe(&audio).await?;
    println!("{text}");
    Ok(())
}

/// Synthesize text through the configured TTS provider
async fn speak(pipeline: &TurnPipeline, text: &str, output: &std::path::Path) -> anyhow::Result<()> {
    println!("Synthesizing: \"{text}\"");

    let audio = pipeline.synthesizer().synthesize(text).await?;
    tokio::fs::write(output, &audio).await?;

    println!("Wrote {} bytes to {}", audio.len(), output.display());
    Ok(())
}
