mod api;
mod flow;

use anyhow::Result;
use api::ApiClient;
use clap::{Parser, Subcommand};
use flow::{FlowTimers, Hint, Outcome};
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tonytech-cli", version, about = "Tony Tech Insights chat client", long_about = None)]
struct Cli {
    /// Gateway endpoint
    #[arg(long, env = "TONYTECH_API", default_value = "http://127.0.0.1:3000")]
    endpoint: String,

    /// Give up on a request after this many milliseconds. Kept above the
    /// gateway's platform ceiling, so its answer normally wins the race.
    #[arg(long, default_value_t = 15_000)]
    abort_ms: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive chat session (default)
    Chat,
    /// Send a single prompt and print the reply
    Ask { prompt: Vec<String> },
    /// Check the gateway's health and upstream configuration
    Status,
    /// Ask the gateway to cancel a request by id
    Cancel { request_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let timers = FlowTimers::with_abort(Duration::from_millis(cli.abort_ms));
    let mut client = ApiClient::new(&cli.endpoint, timers.abort_after)?;

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => run_repl(&mut client, &timers).await,
        Command::Ask { prompt } => {
            let prompt = prompt.join(" ");
            send_prompt(&mut client, &timers, &prompt).await;
            Ok(())
        }
        Command::Status => {
            let status = client.status().await?;
            println!("{} (v{})", status.message, status.version);
            println!("status: {}", status.status);
            println!("deepseek connected: {}", status.deepseek_connected);
            Ok(())
        }
        Command::Cancel { request_id } => {
            let result = client.cancel(&request_id).await?;
            println!("{}", result.message);
            if !result.success {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

async fn run_repl(client: &mut ApiClient, timers: &FlowTimers) -> Result<()> {
    println!("Tony Tech Insights chat. Type a message, or \"exit\" to quit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }
        if prompt == "exit" || prompt == "quit" {
            break;
        }
        send_prompt(client, timers, prompt).await;
    }
    Ok(())
}

/// One request, start to terminal state. Ctrl-C while waiting cancels
/// locally; the in-flight upstream call is left to the server's own
/// deadline, since its id is only learned from the response.
async fn send_prompt(client: &mut ApiClient, timers: &FlowTimers, prompt: &str) {
    let outcome = timers
        .drive(
            client.chat(prompt),
            async {
                let _ = tokio::signal::ctrl_c().await;
            },
            |hint| match hint {
                Hint::StillWorking => eprintln!("... still working, this may take a moment"),
                Hint::TakingLong => {
                    eprintln!("... taking longer than expected (Ctrl-C cancels)")
                }
            },
        )
        .await;

    match outcome {
        Outcome::Completed(reply) => {
            if reply.using_deepseek == Some(false) {
                let reason = reply.error.as_deref().unwrap_or("unknown");
                tracing::warn!("gateway served a fallback response ({})", reason);
            }
            println!("{}", reply.response);
            tracing::debug!(
                request_id = %reply.request_id,
                elapsed_ms = ?reply.elapsed_ms,
                tokens = ?reply.tokens,
                tool_calls = reply.tool_calls.len(),
                "reply received"
            );
        }
        Outcome::TimedOut => eprintln!(
            "No reply within {}s, giving up on this request.",
            timers.abort_after.as_secs()
        ),
        Outcome::Cancelled => eprintln!("Cancelled."),
        Outcome::Errored(e) => eprintln!("Request failed: {e:#}"),
    }
}
