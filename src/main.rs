mod chat;
mod config;
mod error;
mod gemini;
mod input;
mod mock;
mod normalize;
mod report;
mod sentiment;
mod summary;
mod types;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::chat::{format_reply, ChatHandler};
use crate::config::Config;
use crate::gemini::{GeminiClient, TextModel};
use crate::report::BatchReport;
use crate::sentiment::SentimentService;
use crate::types::{ChatMessage, Language, Sender};

const CHAT_FAILURE_REPLY: &str =
    "I'm having trouble connecting right now. Please check your API key or try again later.";

#[derive(Parser)]
#[command(name = "social-pulse")]
#[command(version, about = "Sentiment, emotion and keyword analysis for social media comments")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a batch of comments, one per line
    Analyze {
        /// Comments to analyse (default: read --file, then stdin)
        texts: Vec<String>,
        /// Read comments from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Seed for the mock data used when no API key is set
        #[arg(long, env = "SOCIAL_PULSE_SEED")]
        seed: Option<u64>,
    },

    /// Chat with the assistant about your results
    Chat,

    /// List the languages the analysis can detect
    Languages,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("social_pulse=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            texts,
            file,
            json,
            seed,
        } => {
            let config = Config::from_env();
            run_analyze(&config, &texts, file, json, seed).await
        }
        Commands::Chat => {
            let config = Config::from_env();
            run_chat(&config).await
        }
        Commands::Languages => {
            for language in Language::ALL {
                println!("{:<8} {}", language.code(), language.display_name());
            }
            Ok(())
        }
    }
}

fn model_from(config: &Config) -> Option<Arc<dyn TextModel>> {
    GeminiClient::from_config(config).map(|client| Arc::new(client) as Arc<dyn TextModel>)
}

async fn run_analyze(
    config: &Config,
    args: &[String],
    file: Option<PathBuf>,
    json: bool,
    seed: Option<u64>,
) -> Result<()> {
    let raw = input::collect_input(args, file.as_deref(), std::io::stdin())?;
    let batch = input::split_batch(&raw);
    if batch.is_empty() {
        bail!(input::EMPTY_BATCH_MESSAGE);
    }

    let model = model_from(config);
    let service = match seed {
        Some(seed) => SentimentService::with_rng(model, Box::new(StdRng::seed_from_u64(seed))),
        None => SentimentService::new(model),
    };

    info!(comments = batch.len(), live = config.has_credential(), model = %config.model, "Analyzing batch");
    let results = service.analyze(&batch).await;
    let report = BatchReport::new(&batch, &results);

    if json {
        println!("{}", report.to_json()?);
    } else {
        if !service.is_live() {
            println!("🧪 Demo mode: API_KEY is not set, these results are mock data.\n");
        }
        print!("{}", report.render());
    }
    Ok(())
}

async fn run_chat(config: &Config) -> Result<()> {
    let mut handler = ChatHandler::new(model_from(config));
    let mut transcript: Vec<ChatMessage> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("🍬 Caramel AI: ask about your sentiment results. Type /exit to quit.");
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if message == "/exit" {
            break;
        }

        transcript.push(ChatMessage::new(Sender::User, message));
        let text = match handler.respond(&transcript, message).await {
            Ok(reply) => format_reply(&reply),
            Err(e) => {
                tracing::error!(error = %e, "Chat turn failed");
                CHAT_FAILURE_REPLY.to_string()
            }
        };
        println!("{}\n", text.trim_end());
        transcript.push(ChatMessage::new(Sender::Bot, text));
    }

    info!(messages = transcript.len(), "Chat ended");
    Ok(())
}
