//! `rustedcode session` — Interactive session over the context memory.
//!
//! Plain lines are remembered as immediate context. Slash commands inspect
//! and maintain the memory:
//!
//! | Command | Effect |
//! |---------|--------|
//! | `/query <text>` | Show the most relevant stored context |
//! | `/pin <text>` | Store text in the long-term tier |
//! | `/stats` | Tier counts, usage and compaction totals |
//! | `/compress [--force]` | Compact aged short-term items |
//! | `/clear <tier>` | Empty one tier |
//! | `/history` | Past compaction artifacts as JSON |
//! | `/quit` | Leave the session |

use rustedcode_config::AppConfig;
use rustedcode_core::context::{ContextItem, Tier};
use rustedcode_core::error::ContextError;
use rustedcode_memory::{render_context, ContextMemoryManager};
use serde::Serialize;
use tokio::io::{self, AsyncBufReadExt, BufReader};

const QUERY_LIMIT: usize = 10;

/// A parsed line of session input.
#[derive(Debug, PartialEq, Eq)]
pub enum SessionCommand {
    Remember(String),
    Pin(String),
    Query(String),
    Stats,
    Compress { force: bool },
    Clear(String),
    History,
    Help,
    Quit,
    Unknown(String),
}

impl SessionCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if matches!(line, "exit" | "quit" | ":q") {
            return SessionCommand::Quit;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return SessionCommand::Remember(line.to_string());
        };

        let (cmd, arg) = match rest.split_once(char::is_whitespace) {
            Some((cmd, arg)) => (cmd, arg.trim()),
            None => (rest, ""),
        };
        match cmd {
            "query" | "q" => SessionCommand::Query(arg.to_string()),
            "pin" => SessionCommand::Pin(arg.to_string()),
            "stats" => SessionCommand::Stats,
            "compress" => SessionCommand::Compress {
                force: matches!(arg, "--force" | "-f" | "force"),
            },
            "clear" => SessionCommand::Clear(arg.to_string()),
            "history" => SessionCommand::History,
            "help" | "?" => SessionCommand::Help,
            "quit" | "exit" => SessionCommand::Quit,
            other => SessionCommand::Unknown(other.to_string()),
        }
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let memory = ContextMemoryManager::with_config(config.context);

    println!("🦀 RustedCode session — type /help for commands, /quit to leave");

    let reader = BufReader::new(io::stdin());
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = SessionCommand::parse(&line);
        if command == SessionCommand::Quit {
            break;
        }
        match handle(&memory, command) {
            Ok(output) => {
                if !output.is_empty() {
                    println!("{output}");
                }
            }
            Err(e) if e.is_warning() => println!("⚠️  {e}"),
            Err(e) => println!("❌ {e}"),
        }
    }

    let stats = memory.stats()?;
    tracing::info!(items = stats.total_items(), "Session ended");
    Ok(())
}

/// Apply one command to the memory and return what to print.
pub fn handle(memory: &ContextMemoryManager, command: SessionCommand) -> Result<String, ContextError> {
    match command {
        SessionCommand::Remember(text) => {
            memory.add(ContextItem::new(Tier::Immediate, text).with_metadata("source", "user"))?;
            Ok(String::new())
        }
        SessionCommand::Pin(text) => {
            if text.is_empty() {
                return Ok("usage: /pin <text>".into());
            }
            memory.add(ContextItem::new(Tier::LongTerm, text).with_metadata("source", "pin"))?;
            Ok("📌 pinned".into())
        }
        SessionCommand::Query(text) => {
            let results = memory.query(&text, QUERY_LIMIT)?;
            if results.is_empty() {
                Ok("No relevant context.".into())
            } else {
                Ok(render_context(&results))
            }
        }
        SessionCommand::Stats => {
            let s = memory.stats()?;
            let last = s
                .last_compression
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "never".into());
            Ok(format!(
                "🧠 Context Memory\n\
                 \x20 Immediate:    {}\n\
                 \x20 Short-term:   {}\n\
                 \x20 Medium-term:  {}\n\
                 \x20 Long-term:    {}\n\
                 \x20 Usage:        {} bytes\n\
                 \x20 Avg relevance: {:.3}\n\
                 \x20 Compactions:  {} (last: {last})\n\
                 \x20 Compressed:   {} items, {} bytes saved\n\
                 \x20 Ratio:        {:.2} actual / {:.2} target",
                s.immediate_items,
                s.short_term_items,
                s.medium_term_items,
                s.long_term_items,
                s.total_memory_usage,
                s.average_relevance,
                s.compression_history,
                s.total_compressed,
                s.total_memory_saved,
                s.actual_compression_ratio,
                s.compression_ratio,
            ))
        }
        SessionCommand::Compress { force } => match memory.compress(force)? {
            Some(cc) => Ok(format!(
                "🗜️  Compacted {} items: {} → {} bytes",
                cc.metadata.get("items_compressed").map(String::as_str).unwrap_or("0"),
                cc.original_size,
                cc.compressed_size
            )),
            None => Ok("Nothing to compress.".into()),
        },
        SessionCommand::Clear(tier) => {
            memory.clear_named(&tier)?;
            Ok(format!("🗑️  Cleared {tier}"))
        }
        SessionCommand::History => {
            let history = memory.history()?;
            Ok(to_pretty_json(&history))
        }
        SessionCommand::Help => Ok(HELP.into()),
        SessionCommand::Quit => Ok(String::new()),
        SessionCommand::Unknown(cmd) => Ok(format!("Unknown command: /{cmd} (try /help)")),
    }
}

/// Pretty JSON, or a printable error line when serialization fails.
fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("❌ Failed to serialize history: {e}"))
}

const HELP: &str = "\
Commands:
  /query <text>        show the most relevant stored context
  /pin <text>          store text in long-term memory
  /stats               memory statistics
  /compress [--force]  compact aged short-term context
  /clear <tier>        empty immediate | short_term | medium_term | long_term
  /history             past compactions as JSON
  /quit                leave the session";
