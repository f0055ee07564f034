use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use futures::StreamExt;
use std::io::{self, Write};
use std::num::NonZeroU32;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use nova_core::{ChatMessage, DEFAULT_EMBED_BATCH_SIZE, EmbeddingProvider, LanguageModel};
use nova_embedding::{DEFAULT_EMBEDDING_MODEL, SenseNovaEmbedding};
use nova_llm::{DEFAULT_MODEL, DEFAULT_TEMPERATURE, SenseNova};

const SMOKE_PROMPT: &str = "Say this is a test!";
const SMOKE_TEXT: &str = "What I Worked On\n\nFebruary 2021\n\nBefore college the two main things I worked on, outside of school, were writing and programming.";

#[derive(Parser)]
#[command(name = "nova")]
#[command(about = "Drive SenseNova chat and embedding models from the terminal", long_about = None)]
struct Cli {
    /// Chat model to use
    #[arg(short, long, global = true, default_value = DEFAULT_MODEL)]
    model: String,

    /// Maximum tokens to generate (capped at 512)
    #[arg(long, global = true)]
    max_tokens: Option<u32>,

    /// Sampling temperature
    #[arg(short, long, global = true, default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f32,

    /// Print raw vendor responses as JSON
    #[arg(long, global = true)]
    raw: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Complete a single prompt
    Complete {
        prompt: String,

        /// Print the answer as it is generated
        #[arg(long)]
        stream: bool,
    },

    /// Continue a conversation; messages alternate user, assistant, user, ...
    Chat {
        /// Optional system instruction
        #[arg(long)]
        system: Option<String>,

        #[arg(required = true)]
        messages: Vec<String>,
    },

    /// Embed one or more texts
    Embed {
        #[arg(required = true)]
        texts: Vec<String>,

        /// Embed every text as a search query
        #[arg(long)]
        query: bool,

        /// Embedding model to use
        #[arg(long, default_value = DEFAULT_EMBEDDING_MODEL)]
        embedding_model: String,

        /// Vendor calls per second when embedding several texts
        #[arg(long, default_value_t = NonZeroU32::MIN)]
        rate_limit: NonZeroU32,

        /// Texts per batch
        #[arg(long, default_value_t = DEFAULT_EMBED_BATCH_SIZE)]
        batch_size: usize,
    },

    /// Run one chat completion and one embedding against the live API
    Smoke,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Build the message list for `nova chat`
fn conversation(system: Option<String>, messages: Vec<String>) -> Vec<ChatMessage> {
    system
        .map(ChatMessage::system)
        .into_iter()
        .chain(messages.into_iter().enumerate().map(|(i, content)| {
            if i % 2 == 0 {
                ChatMessage::user(content)
            } else {
                ChatMessage::assistant(content)
            }
        }))
        .collect()
}

fn print_raw(raw: Option<&serde_json::Value>) -> Result<()> {
    if let Some(raw) = raw {
        println!("{}", serde_json::to_string_pretty(raw)?.dimmed());
    }
    Ok(())
}

fn print_embedding(label: &str, embedding: &[f32]) {
    let preview: Vec<String> = embedding.iter().take(5).map(|v| format!("{v:.4}")).collect();
    println!(
        "{} {} [{} dims] {}{}",
        "→".green(),
        label.bold(),
        embedding.len(),
        preview.join(", "),
        if embedding.len() > 5 { ", ..." } else { "" }
    );
}

async fn run_complete(llm: &SenseNova, prompt: &str, stream: bool, raw: bool) -> Result<()> {
    if !stream {
        let response = llm.complete(prompt).await?;
        println!("{}", response.text);
        if raw {
            print_raw(response.raw.as_ref())?;
        }
        return Ok(());
    }

    let mut chunks = llm.stream_complete(prompt).await?;
    let mut stdout = io::stdout();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        print!("{}", chunk.text);
        stdout.flush()?;
        if raw {
            println!();
            print_raw(chunk.raw.as_ref())?;
        }
    }
    println!();

    Ok(())
}

async fn run_embed(embedder: &impl EmbeddingProvider, texts: &[String], query: bool) -> Result<()> {
    if query {
        for (i, text) in texts.iter().enumerate() {
            let embedding = embedder.get_query_embedding(text).await?;
            print_embedding(&format!("query {i}"), &embedding);
        }
        return Ok(());
    }

    let embeddings = if texts.len() == 1 {
        vec![embedder.get_text_embedding(&texts[0]).await?]
    } else {
        embedder.get_text_embedding_batch(texts).await?
    };

    for (i, embedding) in embeddings.iter().enumerate() {
        print_embedding(&format!("text {i}"), embedding);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    debug!(model = %cli.model, "starting");

    match cli.command {
        Commands::Complete { prompt, stream } => {
            let llm = SenseNova::from_env(&cli.model, cli.max_tokens)?.with_temperature(cli.temperature);
            run_complete(&llm, &prompt, stream, cli.raw).await?;
        }
        Commands::Chat { system, messages } => {
            let llm = SenseNova::from_env(&cli.model, cli.max_tokens)?.with_temperature(cli.temperature);
            let response = llm.chat(&conversation(system, messages)).await?;
            println!("{} {}", format!("{}:", response.message.role).cyan(), response.message.content);
            if cli.raw {
                print_raw(response.raw.as_ref())?;
            }
        }
        Commands::Embed {
            texts,
            query,
            embedding_model,
            rate_limit,
            batch_size,
        } => {
            let embedder = SenseNovaEmbedding::from_env()?
                .with_model_name(embedding_model)
                .with_rate_limit_per_second(rate_limit)
                .with_embed_batch_size(batch_size);
            run_embed(&embedder, &texts, query).await?;
        }
        Commands::Smoke => {
            let llm = SenseNova::from_env(&cli.model, cli.max_tokens)?.with_temperature(cli.temperature);
            let embedder = SenseNovaEmbedding::from_env()?;

            println!("{} Chat completion with {}", "🤖".blue(), cli.model.bold());
            run_complete(&llm, SMOKE_PROMPT, false, cli.raw).await?;

            println!("{} Embedding with {}", "🧮".blue(), embedder.model_name().bold());
            run_embed(&embedder, &[SMOKE_TEXT.to_string()], false).await?;

            println!("{} SenseNova is reachable", "✅".green());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use nova_core::MessageRole;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_embed_defaults() {
        let cli = Cli::parse_from(["nova", "embed", "a", "b"]);

        match cli.command {
            Commands::Embed {
                texts,
                query,
                embedding_model,
                rate_limit,
                batch_size,
            } => {
                assert_eq!(texts, vec!["a", "b"]);
                assert!(!query);
                assert_eq!(embedding_model, DEFAULT_EMBEDDING_MODEL);
                assert_eq!(rate_limit.get(), 1);
                assert_eq!(batch_size, DEFAULT_EMBED_BATCH_SIZE);
            }
            _ => panic!("expected embed command"),
        }
        assert_eq!(cli.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        assert!(Cli::try_parse_from(["nova", "embed", "--rate-limit", "0", "a"]).is_err());
    }

    /// Records which path each text was embedded through
    #[derive(Default)]
    struct RecordingEmbedder {
        calls: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for RecordingEmbedder {
        fn model_name(&self) -> &str {
            "recording"
        }

        async fn get_query_embedding(&self, query: &str) -> nova_core::Result<nova_core::Embedding> {
            self.calls.lock().unwrap().push(format!("query:{query}"));
            Ok(vec![1.0])
        }

        async fn get_text_embedding(&self, text: &str) -> nova_core::Result<nova_core::Embedding> {
            self.calls.lock().unwrap().push(format!("text:{text}"));
            Ok(vec![1.0])
        }

        async fn get_text_embeddings(&self, texts: &[String]) -> nova_core::Result<Vec<nova_core::Embedding>> {
            self.calls
                .lock()
                .unwrap()
                .extend(texts.iter().map(|t| format!("batch:{t}")));
            Ok(texts.iter().map(|_| vec![1.0]).collect())
        }
    }

    #[tokio::test]
    async fn test_query_flag_embeds_every_text_as_query() {
        let embedder = RecordingEmbedder::default();

        run_embed(&embedder, &["a".to_string(), "b".to_string()], true)
            .await
            .unwrap();

        assert_eq!(*embedder.calls.lock().unwrap(), vec!["query:a", "query:b"]);
    }

    #[tokio::test]
    async fn test_several_texts_go_through_the_batch_path() {
        let embedder = RecordingEmbedder::default();

        run_embed(&embedder, &["a".to_string(), "b".to_string()], false)
            .await
            .unwrap();

        assert_eq!(*embedder.calls.lock().unwrap(), vec!["batch:a", "batch:b"]);
    }

    #[test]
    fn test_conversation_alternates_roles() {
        let messages = conversation(
            Some("be brief".to_string()),
            vec!["q1".to_string(), "a1".to_string(), "q2".to_string()],
        );

        let roles: Vec<MessageRole> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::System,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
            ]
        );
        assert_eq!(messages[3].content, "q2");
    }
}
