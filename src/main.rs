use dex_agent::agent::prompt::AGENT_NAME;
use dex_agent::{AgentEvent, Config, DexAgent, GeminiClient, Toolbox};
use std::io::{self, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // 日志输出到 stderr，避免与对话内容混在一起
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .with_line_number(true)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let model = Arc::new(GeminiClient::from_config(&config));
    info!(
        "Starting {} with model {} against backend {}",
        AGENT_NAME,
        model.model(),
        config.backend_url
    );

    let toolbox = Toolbox::from_config(&config)?;
    let mut agent = DexAgent::new(model, toolbox, config.recipient, config.max_tool_rounds);

    println!("╔═══════════════════════════════════════════════════════╗");
    println!("║   {} - Uniswap V2 DEX Agent                        ║", AGENT_NAME);
    println!("╚═══════════════════════════════════════════════════════╝");
    println!("Type 'exit' to quit, Ctrl-C to stop.\n");

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        print!("You: ");
        io::stdout().flush()?;

        let line = tokio::select! {
            _ = &mut ctrl_c => {
                println!("\nStopping the agent");
                return Ok(());
            }
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            println!();
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "exit" | "quit") {
            break;
        }

        print!("{}: ", AGENT_NAME);
        io::stdout().flush()?;

        let turn = agent.respond(input, &events_tx);
        tokio::pin!(turn);

        let outcome = loop {
            tokio::select! {
                result = &mut turn => break Some(result),
                Some(event) = events_rx.recv() => print_event(event)?,
                _ = &mut ctrl_c => break None,
            }
        };

        while let Ok(event) = events_rx.try_recv() {
            print_event(event)?;
        }

        match outcome {
            None => {
                println!("\nStopping the agent");
                return Ok(());
            }
            Some(Ok(_)) => println!("\n"),
            Some(Err(e)) => {
                error!("Turn failed: {}", e);
                println!("\n⚠️  {}\n", e);
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn print_event(event: AgentEvent) -> io::Result<()> {
    let mut stdout = io::stdout();

    match event {
        AgentEvent::Text(delta) => write!(stdout, "{}", delta)?,
        AgentEvent::ToolCall { name, arguments } => {
            writeln!(stdout, "\n→ {}({})", name, arguments)?
        }
        AgentEvent::ToolResult { name, output } => {
            debug!("{} returned {}", name, output);
        }
        AgentEvent::TurnComplete => {}
    }

    stdout.flush()
}
