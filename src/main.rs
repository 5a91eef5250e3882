use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use counterstate::config::Config;
use counterstate::counter::{
    api_counter, basic_counter, combined_counter, persisted_counter, Counter, API_STORE,
    COUNT_STORE,
};
use counterstate::devtools::{Devtools, DEFAULT_HISTORY};
use counterstate::logging::init_tracing;
use counterstate::persist::Persistence;
use counterstate::remote::CountClient;
use counterstate::storage::{FileStorage, Storage};

#[derive(Debug, Parser)]
#[command(name = "counterstate", version, about = "Counter backed by observable stores")]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the persisted counter
    Show,
    /// Add one to the persisted counter
    Increase,
    /// Set the persisted counter to zero
    Reset,
    /// Set the persisted counter to a value
    Set {
        #[arg(allow_hyphen_values = true)]
        value: i64,
    },
    /// Run the basic, combined and selector stores through a scripted session
    #[command(name = "watch-demo")]
    Demo,
    /// Talk to the remote counter API
    Remote {
        /// Counter id (default: remote.counter_id from config)
        #[arg(long)]
        id: Option<String>,

        #[command(subcommand)]
        action: RemoteAction,
    },
}

#[derive(Debug, Subcommand)]
enum RemoteAction {
    Get,
    Increase,
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("loading configuration")?;

    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(config.storage.dir.clone()));

    match cli.command {
        Command::Show => run_local(storage, None),
        Command::Increase => run_local(storage, Some(LocalAction::Increase)),
        Command::Reset => run_local(storage, Some(LocalAction::Reset)),
        Command::Set { value } => run_local(storage, Some(LocalAction::Set(value))),
        Command::Demo => run_demo(),
        Command::Remote { id, action } => {
            let id = id.unwrap_or_else(|| config.remote.counter_id.clone());
            let client = Arc::new(CountClient::from_config(&config.remote)?);
            run_remote(storage, client, id, action).await
        }
    }
}

enum LocalAction {
    Increase,
    Reset,
    Set(i64),
}

fn run_local(storage: Arc<dyn Storage>, action: Option<LocalAction>) -> anyhow::Result<()> {
    let persistence = Persistence::<Counter>::new(storage, COUNT_STORE);
    let devtools = Devtools::new(DEFAULT_HISTORY);
    let counter = persisted_counter(&persistence, &devtools);

    match action {
        None => {}
        Some(LocalAction::Increase) => counter.actions().increase()?,
        Some(LocalAction::Reset) => counter.actions().reset()?,
        Some(LocalAction::Set(value)) => counter.actions().set_count(value)?,
    }

    let status = persistence.last_write();
    if status.is_failed() {
        eprintln!("warning: counter not saved ({:?})", status);
    }
    println!("count: {}", counter.get().count);
    Ok(())
}

fn run_demo() -> anyhow::Result<()> {
    let basic = basic_counter();
    basic.store().subscribe(|c: &Counter| println!("[basic] count -> {}", c.count));
    basic.actions().increase()?;
    basic.actions().increase()?;
    basic.actions().reset()?;

    let combined = combined_counter();
    let selectors = combined.store().selectors();
    let count = selectors
        .get("count")
        .context("counter has a count field")?
        .clone();
    count.subscribe(|value| println!("[selector] count -> {}", value))?;

    println!("[selector] initial count = {}", count.get_as::<i64>().unwrap_or_default());
    combined.actions().increase()?;
    // Same value: the selector stays quiet.
    combined.actions().set_count(1)?;
    combined.actions().set_count(42)?;
    println!("[combined] final count = {}", combined.get().count);
    Ok(())
}

async fn run_remote(
    storage: Arc<dyn Storage>,
    client: Arc<CountClient>,
    id: String,
    action: RemoteAction,
) -> anyhow::Result<()> {
    let persistence = Persistence::<Counter>::new(storage, API_STORE);
    let counter = api_counter(client, id, &persistence)?;

    let value = match action {
        RemoteAction::Get => counter.actions().fetch().await,
        RemoteAction::Increase => counter.actions().increase().await,
        RemoteAction::Reset => counter.actions().reset().await,
    }
    .with_context(|| format!("remote counter '{}'", counter.actions().id()))?;

    println!("count: {}", value);
    Ok(())
}
