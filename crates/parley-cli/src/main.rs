//! parley - terminal chat client for OpenAI-compatible completion APIs

mod config;

use clap::Parser;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use parley_api::CompletionClient;
use parley_chat::{ChatStore, Dispatcher, FileStore};

/// parley - terminal chat client
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model to use (default: gpt-4o-mini)
    #[arg(short, long)]
    model: Option<String>,

    /// Completion endpoint base URL
    #[arg(short, long)]
    base_url: Option<String>,

    /// Data directory for saved conversations
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("parley=debug")
            .init();
    }

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // Load config file
    let cfg = config::Config::load();

    // Merge config with CLI args (CLI takes precedence)
    let base_url = args
        .base_url
        .or(cfg.base_url.clone())
        .unwrap_or_else(|| config::DEFAULT_BASE_URL.to_string());

    let model = args
        .model
        .or(cfg.model.clone())
        .unwrap_or_else(|| config::DEFAULT_MODEL.to_string());

    let data_dir = args.data_dir.unwrap_or_else(FileStore::default_dir);
    let mut store = ChatStore::open(Box::new(FileStore::new(data_dir)));

    // A key from config or env seeds the store once; /key replaces it later
    if store.credential().is_empty() {
        if let Some(key) = cfg.get_api_key() {
            store.set_credential(key);
        }
    }

    let client = CompletionClient::new(base_url, model.clone());
    let dispatcher = Dispatcher::new(Arc::new(client));

    run_interactive(&mut store, &dispatcher, &model).await
}

async fn run_interactive(
    store: &mut ChatStore,
    dispatcher: &Dispatcher,
    model: &str,
) -> anyhow::Result<()> {
    // Show minimal startup info (only if TTY)
    if io::stderr().is_terminal() {
        eprintln!("parley ({}) - type /help for commands", model);
        if store.credential().is_empty() {
            eprintln!("No API key set. Use /key <token> or set PARLEY_API_KEY.");
        }
        eprintln!();
    }

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        // Handle slash commands
        if let Some(command) = input.strip_prefix('/') {
            if !execute_command(command, store) {
                break;
            }
            continue;
        }

        dispatcher.send_message(store, input).await;
        if let Some(reply) = store.active_conversation().and_then(|c| c.messages.last()) {
            println!("{}", reply.content);
        }
    }

    Ok(())
}

/// Execute a slash command. Returns false when the REPL should exit.
fn execute_command(command: &str, store: &mut ChatStore) -> bool {
    let (name, rest) = command.split_once(' ').unwrap_or((command, ""));

    match name {
        "new" => {
            store.create_conversation();
            println!("Started a new conversation.");
        }
        "list" => {
            if store.conversations().is_empty() {
                println!("No conversations yet.");
            } else {
                for (index, conversation) in store.conversations().iter().enumerate() {
                    let marker = if Some(conversation.id) == store.active_id() {
                        "*"
                    } else {
                        " "
                    };
                    println!(
                        "{} {:>3}. {} ({} messages, {})",
                        marker,
                        index + 1,
                        conversation.title,
                        conversation.messages.len(),
                        conversation.updated_at.format("%Y-%m-%d %H:%M"),
                    );
                }
            }
        }
        "open" => match rest.trim().parse::<usize>() {
            Ok(number) if number >= 1 && number <= store.conversations().len() => {
                let id = store.conversations()[number - 1].id;
                store.select_conversation(id);
                let conversation = store.active_conversation().map(|c| c.title.clone());
                println!("Opened: {}", conversation.unwrap_or_default());
            }
            _ => println!("Usage: /open <number> (see /list)"),
        },
        "clear" => {
            store.clear_messages();
            println!("Cleared conversation.");
        }
        "key" => {
            let token = rest.trim();
            if token.is_empty() {
                println!("Usage: /key <token>");
            } else {
                store.set_credential(token);
                println!("API key updated.");
            }
        }
        "help" => {
            println!("Commands:");
            println!("  /new          Start a new conversation");
            println!("  /list         List saved conversations");
            println!("  /open <n>     Switch to conversation <n>");
            println!("  /clear        Clear the active conversation's messages");
            println!("  /key <token>  Set the API key");
            println!("  /quit         Exit");
        }
        "quit" | "exit" => return false,
        other => {
            println!("Unknown command: /{}", other);
            println!("Type /help for available commands.");
        }
    }

    true
}
