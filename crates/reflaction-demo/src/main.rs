use anyhow::{Context, Result};
use std::io::{self, BufRead};
use tokio::sync::mpsc;

mod commands;
mod config;
mod counter;
mod logger;

use commands::Command;
use config::DemoConfig;

fn main() -> Result<()> {
    let (config, load_error) = match DemoConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (DemoConfig::default(), Some(e)),
    };
    logger::init(&config);
    if let Some(e) = load_error {
        log::warn!("Using default config: {:#}", e);
    }

    log::info!("Starting reflaction-demo");
    log::debug!("Config: {:?}", config);

    // The store is single-threaded; async flows run on this LocalSet
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    let local = tokio::task::LocalSet::new();
    let result = local.block_on(&runtime, run(config));

    log::info!("Exiting reflaction-demo");
    result
}

async fn run(config: DemoConfig) -> Result<()> {
    let store = counter::build_store(&config).context("Invalid counter store configuration")?;
    store.subscribe(|state| println!("count = {}  history = {:?}", state.count, state.history));

    let mut lines = spawn_stdin_reader();
    println!("{}", commands::HELP);

    while let Some(line) = lines.recv().await {
        match commands::parse(&line, config.step) {
            Ok(Command::Dispatch(action)) => {
                if let Err(e) = store.dispatch(action) {
                    eprintln!("error: {}", e);
                }
            }
            Ok(Command::Flow { name, payload }) => store.trigger_flow(&name, payload),
            Ok(Command::State) => {
                let json = serde_json::to_string_pretty(&store.state())
                    .context("Failed to serialize state")?;
                println!("{}", json);
            }
            Ok(Command::Help) => println!("{}", commands::HELP),
            Ok(Command::Quit) => break,
            Ok(Command::Empty) => {}
            Err(e) => eprintln!("{:#}", e),
        }
    }

    Ok(())
}

/// Read stdin on a plain thread; blocking reads must stay off the store's thread
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::error!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}
