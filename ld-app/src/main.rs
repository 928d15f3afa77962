//! `llmdemos`: runnable demos of the provider-neutral LLM adapter.

mod commands;
mod config;
mod demos;
mod session;
mod translate;

use clap::{Parser, Subcommand};
use config::AppConfig;
use ld_llm::LlmConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "llmdemos",
    version,
    about = "Chat, streaming and tool-calling demos over OpenAI or Anthropic"
)]
struct Cli {
    /// Provider to use, overriding LLM_PROVIDER and key detection.
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Model name; defaults to a small model of the selected provider.
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send a one-line prompt to check credentials and connectivity.
    TestConnection,
    /// Single question with a system prompt.
    Chat,
    /// Print a completion as it streams in.
    Stream,
    /// Interactive chat that remembers the conversation.
    History {
        #[arg(long)]
        stream: bool,
    },
    /// Offer the lookup_weather tool and show the model's calls.
    Tools {
        /// Run the requested tool calls locally.
        #[arg(long)]
        execute: bool,
    },
    /// Translate a markdown document.
    Translate {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long, default_value = translate::DEFAULT_TARGET_LANGUAGE)]
        to: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    let cfg = AppConfig::resolve(LlmConfig::from_env(), cli.provider.as_deref(), cli.model)?;
    install_panic_hook(&cfg);
    let client = cfg.client()?;
    tracing::info!(provider = %cfg.provider, model = %cfg.model, "client ready");

    let mut out = std::io::stdout().lock();
    match cli.command {
        Command::TestConnection => demos::test_connection(&client, &cfg, &mut out).await,
        Command::Chat => demos::chat(&client, &cfg, &mut out).await,
        Command::Stream => demos::stream(&client, &cfg, &mut out).await,
        Command::History { stream } => {
            let stdin = std::io::stdin().lock();
            demos::history(&client, &cfg, stdin, stream, &mut out).await
        }
        Command::Tools { execute } => demos::tools(&client, &cfg, execute, &mut out).await,
        Command::Translate { input, output, to } => {
            translate::translate_document(&client, &cfg, &input, output.as_deref(), &to, &mut out)
                .await
        }
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(v) => v,
        Err(_) => EnvFilter::new("warn,llmdemos=info,ld_llm=info,ld_tools=info"),
    };
    let log_format = std::env::var("LLMDEMOS_LOG_FORMAT")
        .unwrap_or_else(|_| "compact".to_string())
        .to_ascii_lowercase();

    // Demo output owns stdout; logs go to stderr.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    match log_format.as_str() {
        "json" => builder
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .init(),
        "pretty" => builder.with_file(true).with_line_number(true).pretty().init(),
        "compact" => builder.compact().init(),
        other => {
            return Err(anyhow::anyhow!(
                "unsupported LLMDEMOS_LOG_FORMAT={other:?}; expected one of: json, pretty, compact"
            ));
        }
    }

    tracing::debug!(log_format = %log_format, "tracing initialized");
    Ok(())
}

/// Route panics through tracing, tagged with the provider and model in use.
fn install_panic_hook(cfg: &AppConfig) {
    let provider = cfg.provider;
    let model = cfg.model.clone();
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map_or_else(|| "unknown".to_string(), |l| format!("{}:{}", l.file(), l.line()));
        tracing::error!(
            %provider,
            %model,
            panic_location = %location,
            panic_payload = %panic_message(info.payload()),
            "llmdemos panicked"
        );
        default_hook(info);
    }));
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
