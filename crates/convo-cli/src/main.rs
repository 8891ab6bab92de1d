//! convo CLI: terminal client for the agent-routed chat service

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use convo_client::{
    ApiError, ChatApi, ChatRequest, ClientConfig, HttpChatApi, Message, SessionContext,
};
use tracing_subscriber::EnvFilter;

const CONFIG_PATH: &str = ".convo/config.json";

/// Terminal client for the agent-routed chat service
#[derive(Parser)]
#[command(name = "convo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Override the server URL from config
    #[arg(long, global = true)]
    server: Option<String>,

    /// Act as this user id instead of a generated one
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the TUI (default when no command specified)
    Tui,

    /// Write the default config to .convo/config.json
    Init,

    /// Check service health and exit
    Health,

    /// Send a single message and print the reply
    Send {
        /// Message text
        message: String,

        /// Continue an existing conversation
        #[arg(long)]
        conversation: Option<String>,

        /// Output the raw response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the stored history of a conversation
    History {
        /// Conversation id
        conversation_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the user's conversation ids
    Conversations {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = load_config();
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    let session = match cli.user {
        Some(user) => SessionContext::with_user_id(user),
        None => SessionContext::new(),
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        None | Some(Commands::Tui) => {
            // Default: open TUI. Logging to stderr would corrupt the
            // alternate screen, so it stays off here.
            match HttpChatApi::from_config(&config) {
                Ok(api) => rt
                    .block_on(convo_tui::run_tui(Arc::new(api), session))
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            }
        }
        Some(command) => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .with_writer(std::io::stderr)
                .init();
            rt.block_on(run_command(command, &config, &session))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config() -> ClientConfig {
    let path = Path::new(CONFIG_PATH);
    if !path.exists() {
        return ClientConfig::default();
    }
    match ClientConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: ignoring invalid config at {CONFIG_PATH}: {e}");
            ClientConfig::default()
        }
    }
}

async fn run_command(
    command: Commands,
    config: &ClientConfig,
    session: &SessionContext,
) -> Result<(), String> {
    match command {
        Commands::Tui => unreachable!("handled before the runtime commands"),
        Commands::Init => cmd_init(config),
        _ => {
            let api = HttpChatApi::from_config(config).map_err(|e| e.to_string())?;
            match command {
                Commands::Health => cmd_health(&api).await,
                Commands::Send {
                    message,
                    conversation,
                    json,
                } => cmd_send(&api, session, message, conversation, json).await,
                Commands::History {
                    conversation_id,
                    json,
                } => cmd_history(&api, &conversation_id, json).await,
                Commands::Conversations { json } => {
                    cmd_conversations(&api, session, json).await
                }
                Commands::Tui | Commands::Init => unreachable!(),
            }
        }
    }
}

fn cmd_init(config: &ClientConfig) -> Result<(), String> {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        return Err(format!("{CONFIG_PATH} already exists"));
    }
    config.save(path).map_err(|e| e.to_string())?;
    println!("Wrote {CONFIG_PATH}");
    Ok(())
}

async fn cmd_health(api: &HttpChatApi) -> Result<(), String> {
    match api.health().await {
        Ok(health) => {
            println!("{}", health.status);
            Ok(())
        }
        Err(ApiError::Transport(e)) => Err(format!("service unreachable: {e}")),
        Err(e) => Err(e.to_string()),
    }
}

async fn cmd_send(
    api: &HttpChatApi,
    session: &SessionContext,
    message: String,
    conversation: Option<String>,
    json: bool,
) -> Result<(), String> {
    let response = api
        .send_chat(ChatRequest {
            message,
            user_id: session.user_id().to_string(),
            conversation_id: conversation,
        })
        .await
        .map_err(|e| e.to_string())?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&response).map_err(|e| e.to_string())?
        );
        return Ok(());
    }

    println!("{}", response.response);
    if !response.agent_workflow.is_empty() {
        let steps: Vec<String> = response
            .agent_workflow
            .iter()
            .map(|step| match &step.decision {
                Some(decision) => format!("{} → {}", step.agent, decision),
                None => step.agent.clone(),
            })
            .collect();
        eprintln!("[{}]", steps.join(" · "));
    }
    eprintln!("conversation: {}", response.conversation_id);
    Ok(())
}

async fn cmd_history(api: &HttpChatApi, conversation_id: &str, json: bool) -> Result<(), String> {
    let history = api
        .conversation_history(conversation_id)
        .await
        .map_err(|e| e.to_string())?;

    let messages: Vec<Message> = history.messages.into_iter().map(Message::from_history).collect();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&messages).map_err(|e| e.to_string())?
        );
        return Ok(());
    }

    for message in &messages {
        let who = if message.is_assistant() { "assistant" } else { "you" };
        println!(
            "[{}] {}: {}",
            message.timestamp.format("%Y-%m-%d %H:%M"),
            who,
            message.text
        );
    }
    Ok(())
}

async fn cmd_conversations(
    api: &HttpChatApi,
    session: &SessionContext,
    json: bool,
) -> Result<(), String> {
    let list = api
        .user_conversations(session.user_id())
        .await
        .map_err(|e| e.to_string())?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "user_id": list.user_id,
                "conversation_ids": list.conversation_ids,
            })
        );
        return Ok(());
    }

    if list.conversation_ids.is_empty() {
        println!("No conversations for {}", list.user_id);
        return Ok(());
    }
    for id in &list.conversation_ids {
        println!("{id}");
    }
    Ok(())
}
