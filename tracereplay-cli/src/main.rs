// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Tracereplay CLI
//!
//! Fetch traces from the tracing backend, rebuild replay contexts and send
//! replay requests.

mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::CliConfig;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use tracereplay_client::{ListTracesParams, ReplayClient, TraceClient};
use tracereplay_core::replay::codec::{HISTORY_KEY, REPLAY_CONTEXT_JSON_KEY, REPLAY_CONTEXT_KEY};
use tracereplay_core::replay::{self, ContextBuilder};
use tracereplay_core::{extract_generation, ReplayContext};
use tracereplay_telemetry::init_logging;
use tracing::info;

#[derive(Parser)]
#[command(name = "tracereplay")]
#[command(about = "Tracereplay - rebuild and replay LLM conversations from traces", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "TRACEREPLAY_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose mode
    #[arg(short, long)]
    verbose: bool,

    /// Output as JSON (machine-readable)
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a trace and summarize its observations
    Trace {
        /// Trace ID
        trace_id: String,
    },

    /// List traces, one page at a time
    List {
        /// Filter by user ID
        #[arg(long)]
        user: Option<String>,

        /// Filter by session ID
        #[arg(long)]
        session: Option<String>,

        /// Filter by trace name
        #[arg(long)]
        name: Option<String>,

        /// Filter by tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Page number (1-based)
        #[arg(long)]
        page: Option<u32>,

        /// Traces per page
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Print the message history of a trace's first generation
    Messages {
        /// Trace ID
        trace_id: String,
    },

    /// Rebuild a replay context from every trace of a session
    Session {
        /// Session ID
        session_id: String,

        /// System prompt recorded in the context
        #[arg(long)]
        system_prompt: Option<String>,

        /// Write the encoded context to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Send a trace's generation history to the replay endpoint
    Replay {
        /// Trace ID
        trace_id: String,

        /// Request body template (JSON)
        #[arg(long)]
        template: Option<PathBuf>,

        /// Replay endpoint URL
        #[arg(long)]
        url: Option<String>,
    },

    /// Print the canonical messages of an encoded replay context
    Decode {
        /// Context file: a bare context, a trace output, or a full trace
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = CliConfig::load(cli.config.clone())?;
    if cli.verbose {
        config.logging = config.logging.verbose();
    }
    init_logging(&config.logging)?;

    match cli.command {
        Commands::Trace { trace_id } => {
            let trace = trace_client(&config)?
                .get_trace(&trace_id)
                .await
                .with_context(|| format!("Failed to fetch trace {}", trace_id))?;
            if cli.json {
                output::print_json(&trace)?;
            } else {
                output::print_trace(&trace);
            }
        }

        Commands::List {
            user,
            session,
            name,
            tags,
            page,
            limit,
        } => {
            let params = ListTracesParams {
                page,
                limit,
                user_id: user,
                name,
                session_id: session,
                tags,
            };
            let list = trace_client(&config)?
                .list_traces(&params)
                .await
                .context("Failed to list traces")?;
            if cli.json {
                output::print_json(&list)?;
            } else {
                output::print_trace_list(&list);
            }
        }

        Commands::Messages { trace_id } => {
            let trace = trace_client(&config)?
                .get_trace(&trace_id)
                .await
                .with_context(|| format!("Failed to fetch trace {}", trace_id))?;
            let extract = extract_generation(&trace, 1)?;
            info!(
                observation_id = %extract.observation_id,
                model = extract.model.as_deref().unwrap_or("-"),
                messages = extract.messages.len(),
                "Extracted generation history"
            );
            if cli.json {
                output::print_json(&extract.messages)?;
            } else {
                output::print_messages(&extract.messages);
            }
        }

        Commands::Session {
            session_id,
            system_prompt,
            out,
        } => {
            let ctx = rebuild_session(&config, &session_id, system_prompt).await?;
            let encoded = replay::encode_pretty(&ctx)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, encoded)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    if cli.json {
                        output::print_json(&json!({
                            "path": path,
                            "turns": ctx.history.len(),
                        }))?;
                    } else {
                        output::print_context_summary(&ctx);
                        println!("✓ Wrote replay context to {:?}", path);
                    }
                }
                None => println!("{}", encoded),
            }
        }

        Commands::Replay {
            trace_id,
            template,
            url,
        } => {
            let trace = trace_client(&config)?
                .get_trace(&trace_id)
                .await
                .with_context(|| format!("Failed to fetch trace {}", trace_id))?;
            let extract = extract_generation(&trace, 1)?;

            let template = match template.or_else(|| config.replay.template.clone()) {
                Some(path) => read_json(&path)?,
                None => {
                    let mut body = Map::new();
                    body.insert(HISTORY_KEY.to_string(), json!([]));
                    Value::Object(body)
                }
            };
            let endpoint = url.unwrap_or_else(|| config.replay.endpoint.clone());
            let client = ReplayClient::new(endpoint, config.replay.timeout())?;

            let response = client.send_messages(&template, &extract.messages).await?;
            if cli.json {
                output::print_json(&json!({
                    "status": response.status,
                    "body": response.json().unwrap_or(Value::String(response.body.clone())),
                }))?;
            } else {
                output::print_replay_response(&response)?;
            }
            if !response.is_success() {
                anyhow::bail!("Replay endpoint returned status {}", response.status);
            }
        }

        Commands::Decode { file } => {
            let ctx = load_context(&file)?;
            let messages = replay::to_canonical_messages(&ctx);
            if cli.json {
                output::print_json(&messages)?;
            } else {
                output::print_context_summary(&ctx);
                println!();
                output::print_messages(&messages);
            }
        }
    }

    Ok(())
}

fn trace_client(config: &CliConfig) -> Result<TraceClient> {
    TraceClient::new(config.backend.client_config()).context("Invalid backend configuration")
}

async fn rebuild_session(
    config: &CliConfig,
    session_id: &str,
    system_prompt: Option<String>,
) -> Result<ReplayContext> {
    let seeds = &config.context;
    let mut builder = ContextBuilder::with_defaults(
        seeds.user_id.as_str(),
        seeds.base_url.as_str(),
        seeds.model.as_str(),
        &seeds.defaults,
    );
    builder.set_session_id(session_id);
    if let Some(prompt) = system_prompt.or_else(|| seeds.system_prompt.clone()) {
        builder.set_system_prompt(prompt, None);
    }

    let appended = trace_client(config)?
        .session_replay_context(session_id, &mut builder)
        .await
        .with_context(|| format!("Failed to rebuild session {}", session_id))?;
    if appended == 0 {
        anyhow::bail!("Session {} has no trace with a generation", session_id);
    }

    let last_trace = builder
        .history()
        .last()
        .map(|turn| turn.turn_id.clone())
        .unwrap_or_default();
    Ok(builder.build(last_trace))
}

fn read_json(path: &Path) -> Result<Value> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?} as JSON", path))
}

/// Accepts a bare encoded context, a trace output carrying one, or a full
/// trace document whose `output` carries one.
fn load_context(path: &Path) -> Result<ReplayContext> {
    let document = read_json(path)?;
    let embedded = |value: &Value| {
        value.get(REPLAY_CONTEXT_KEY).is_some() || value.get(REPLAY_CONTEXT_JSON_KEY).is_some()
    };

    let ctx = if embedded(&document) {
        replay::extract_from_output(&document)?
    } else if document.get("output").map_or(false, |output| embedded(output)) {
        replay::extract_from_output(&document["output"])?
    } else {
        replay::decode_value(document)?
    };
    Ok(ctx)
}
