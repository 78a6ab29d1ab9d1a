//! cadre CLI — operator interface to the artificial-employee daemon.

use cadre_rs::config::Config;
use cadre_rs::consumer::{Consumer, ConsumerConfig, ConsumerDeps};
use cadre_rs::db::Db;
use cadre_rs::db::queue::PgmqSource;
use cadre_rs::employee::roster;
use cadre_rs::events::FileEventStore;
use cadre_rs::llm::AnthropicGenerator;
use cadre_rs::memory::InMemoryStore;
use cadre_rs::resolver::AssignmentResolver;
use cadre_rs::telemetry::{TelemetryConfig, init_telemetry};
use cadre_rs::tracker::http::HttpTracker;
use cadre_rs::tracker::status::StatusManager;
use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cadre", about = "A cadre of artificial employees for your kanban board")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the task consumer daemon
    Serve {
        /// Directory containing extra roster TOML definitions
        #[arg(long)]
        roster: Option<PathBuf>,
        /// Maximum concurrent task pipelines (default from MAX_CONCURRENT_TASKS)
        #[arg(long)]
        max_concurrent: Option<usize>,
        /// Visibility timeout (seconds) for queue reads
        #[arg(long, default_value_t = 300)]
        visibility_timeout: i32,
    },
    /// Task operations
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Employee operations
    Employee {
        #[command(subcommand)]
        action: EmployeeAction,
    },
}

#[derive(Subcommand)]
enum TaskAction {
    /// Enqueue a task notification (raw board page JSON)
    Submit {
        /// Path to a JSON file, or "-" for stdin
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum EmployeeAction {
    /// Show the roster and performance stats
    List {
        /// Directory containing extra roster TOML definitions
        #[arg(long)]
        roster: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            roster,
            max_concurrent,
            visibility_timeout,
        } => cmd_serve(roster, max_concurrent, visibility_timeout).await,
        Command::Task {
            action: TaskAction::Submit { file },
        } => cmd_task_submit(file).await,
        Command::Employee {
            action: EmployeeAction::List { roster },
        } => cmd_employee_list(roster).await,
    }
}

async fn cmd_serve(
    roster_dir: Option<PathBuf>,
    max_concurrent: Option<usize>,
    visibility_timeout: i32,
) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let max_concurrent = max_concurrent.unwrap_or(config.max_concurrent_tasks);

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "cadre".to_string(),
    })?;

    let db = Db::connect(config.database_url.expose_secret()).await?;
    db.create_queue(&config.queue_name).await?;
    let db = Arc::new(db);

    let generator = Arc::new(AnthropicGenerator::new(
        &config.anthropic_api_key,
        &config.generation_model,
    )?);
    let memory = Arc::new(InMemoryStore::new());

    let registry = match roster_dir {
        Some(ref dir) => roster::load_from_dir(dir, generator.clone(), memory.clone())?,
        None => roster::default_registry(generator, memory)?,
    };
    let registry = Arc::new(registry);
    for name in registry.active_names().await {
        tracing::info!(employee = %name, "on the roster");
    }

    let tracker = Arc::new(HttpTracker::new(
        config.board_base_url.clone(),
        config.board_token.clone(),
    ));

    let deps = ConsumerDeps {
        source: Arc::new(PgmqSource::new(
            Arc::clone(&db),
            config.queue_name.clone(),
            visibility_timeout,
        )),
        resolver: Arc::new(AssignmentResolver::new(Arc::clone(&registry))),
        status: Arc::new(StatusManager::new(tracker.clone())),
        tracker,
        event_store: Arc::new(FileEventStore::new(&config.events_file)),
    };

    let consumer = Arc::new(Consumer::new(
        deps,
        ConsumerConfig {
            max_concurrent_tasks: max_concurrent,
            ..ConsumerConfig::default()
        },
    ));

    let stopper = Arc::clone(&consumer);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        stopper.shutdown();
    });

    consumer.run().await;
    Ok(())
}

async fn cmd_task_submit(file: PathBuf) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let db = Db::connect(config.database_url.expose_secret()).await?;
    db.create_queue(&config.queue_name).await?;

    let raw = if file.as_os_str() == "-" {
        use tokio::io::AsyncReadExt;
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        tokio::fs::read_to_string(&file).await?
    };
    let payload: serde_json::Value = serde_json::from_str(&raw)?;

    // Fail early on payloads the consumer would drop as poison.
    let task = cadre_rs::tracker::mapper::task_from_value(&payload)?;

    let msg_id = db.send_to_queue(&config.queue_name, &payload).await?;
    println!("Queued: {} (msg {msg_id})", task);
    Ok(())
}

async fn cmd_employee_list(roster_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let generator = Arc::new(AnthropicGenerator::new(
        &config.anthropic_api_key,
        &config.generation_model,
    )?);
    let memory = Arc::new(InMemoryStore::new());

    let registry = match roster_dir {
        Some(ref dir) => roster::load_from_dir(dir, generator, memory)?,
        None => roster::default_registry(generator, memory)?,
    };

    let snapshots = registry.snapshots().await;
    if snapshots.is_empty() {
        println!("No employees on the roster.");
        return Ok(());
    }

    println!(
        "{:<22}  {:<12}  {:<7}  {:<9}  {:<9}  WORKFLOWS",
        "NAME", "ID", "ACTIVE", "PROCESSED", "SUCCESS%"
    );
    println!("{}", "-".repeat(90));
    for snap in &snapshots {
        println!(
            "{:<22}  {:<12}  {:<7}  {:<9}  {:<9.0}  {}",
            snap.name,
            snap.employee_id,
            snap.is_active,
            snap.tasks_processed,
            snap.success_rate * 100.0,
            snap.available_workflows.join(", ")
        );
    }
    println!("\n{} employee(s)", snapshots.len());
    Ok(())
}
