//! `taskdesk` command-line client.
//!
//! Talks to the record API over HTTP, or to an in-process backend with
//! `--memory`. Results are printed as pretty JSON on stdout; logs and user
//! notifications go to stderr.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use taskdesk_client::notify::TracingNotifier;
use taskdesk_client::{
    telemetry, AttachedFile, ClientConfig, ClientProvider, FileResource, FileService, Lookup,
    MemoryRecordClient, TaskService,
};
use taskdesk_core::{Notifier, Record, RecordId};

#[derive(Parser)]
#[command(
    name = "taskdesk",
    version,
    about = "Task and file records from the command line"
)]
struct Cli {
    /// Base URL of the record API.
    #[arg(
        long,
        env = "TASKDESK_BASE_URL",
        default_value = "http://127.0.0.1:8080"
    )]
    base_url: String,

    #[arg(long, env = "TASKDESK_PROJECT_ID", default_value = "")]
    project_id: String,

    #[arg(
        long,
        env = "TASKDESK_PUBLIC_KEY",
        default_value = "",
        hide_env_values = true
    )]
    public_key: String,

    /// Per-request timeout in milliseconds.
    #[arg(long, env = "TASKDESK_REQUEST_TIMEOUT_MS", default_value_t = 30_000)]
    timeout_ms: u64,

    /// Use an empty in-process backend instead of the HTTP API.
    #[arg(long)]
    memory: bool,

    /// Emit logs as JSON lines.
    #[arg(long, env = "TASKDESK_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Task records.
    Tasks {
        #[command(subcommand)]
        action: TaskCommand,
    },
    /// File records.
    Files {
        #[command(subcommand)]
        action: FileCommand,
    },
}

#[derive(Subcommand)]
enum TaskCommand {
    List,
    Get {
        id: RecordId,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        completed_at: Option<String>,
        #[arg(long)]
        tags: Option<String>,
        /// Attach a file record with this name (repeatable).
        #[arg(long = "attach")]
        attachments: Vec<String>,
    },
    Update {
        id: RecordId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        completed_at: Option<String>,
        #[arg(long)]
        tags: Option<String>,
    },
    Delete {
        id: RecordId,
    },
}

#[derive(Subcommand)]
enum FileCommand {
    List,
    /// Files attached to a task.
    ForTask {
        task_id: String,
    },
    Get {
        id: RecordId,
    },
    Delete {
        id: RecordId,
    },
}

fn task_fields(pairs: [(&str, Option<String>); 6]) -> Record {
    pairs
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, Value::from(v))))
        .collect()
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn found(resource: &str, id: RecordId, lookup: Lookup) -> anyhow::Result<Record> {
    match lookup {
        Lookup::Found(record) => Ok(record),
        Lookup::NotFound => anyhow::bail!("{resource} {id} not found"),
        Lookup::Failed(err) => {
            let context = format!("looking up {resource} {id}");
            Err(err).context(context)
        }
    }
}

fn provider(cli: &Cli) -> anyhow::Result<ClientProvider> {
    if cli.memory {
        let backend = Arc::new(MemoryRecordClient::new());
        return Ok(ClientProvider::with_client(backend));
    }
    let config = ClientConfig {
        base_url: cli.base_url.clone(),
        project_id: cli.project_id.clone(),
        public_key: cli.public_key.clone(),
        request_timeout: Duration::from_millis(cli.timeout_ms),
    };
    Ok(ClientProvider::from_config(&config)?)
}

async fn run_tasks(tasks: &TaskService, action: TaskCommand) -> anyhow::Result<()> {
    match action {
        TaskCommand::List => print_json(&tasks.list_all().await),
        TaskCommand::Get { id } => print_json(&found("task", id, tasks.lookup(id).await)?),
        TaskCommand::Create {
            title,
            description,
            priority,
            status,
            completed_at,
            tags,
            attachments,
        } => {
            let payload = task_fields([
                ("title", Some(title)),
                ("description", description),
                ("priority", priority),
                ("status", status),
                ("completedAt", completed_at),
                ("Tags", tags),
            ]);
            let files: Vec<AttachedFile> = attachments
                .into_iter()
                .map(|name| AttachedFile {
                    name: Some(name),
                    ..AttachedFile::default()
                })
                .collect();
            let created = tasks
                .create_with_files(&payload, &files)
                .await
                .context("task was not created")?;
            print_json(&created)
        }
        TaskCommand::Update {
            id,
            title,
            description,
            priority,
            status,
            completed_at,
            tags,
        } => {
            let updates = task_fields([
                ("title", title),
                ("description", description),
                ("priority", priority),
                ("status", status),
                ("completedAt", completed_at),
                ("Tags", tags),
            ]);
            let updated = tasks
                .update(id, &updates)
                .await
                .with_context(|| format!("task {id} was not updated"))?;
            print_json(&updated)
        }
        TaskCommand::Delete { id } => {
            print_json(&serde_json::json!({ "deleted": tasks.delete(id).await }))
        }
    }
}

async fn run_files(files: &FileService, action: FileCommand) -> anyhow::Result<()> {
    match action {
        FileCommand::List => print_json(&files.list_all().await),
        FileCommand::ForTask { task_id } => {
            print_json(&files.get_by_task_id(&Value::from(task_id)).await)
        }
        FileCommand::Get { id } => print_json(&found("file", id, files.lookup(id).await)?),
        FileCommand::Delete { id } => {
            print_json(&serde_json::json!({ "deleted": files.delete(id).await }))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.log_json)?;

    let provider = Arc::new(provider(&cli)?);
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
    let files = Arc::new(FileService::new(
        Arc::clone(&provider),
        Arc::clone(&notifier),
        FileResource::default(),
    ));

    match cli.command {
        Command::Tasks { action } => {
            let tasks = TaskService::new(provider, notifier, files);
            run_tasks(&tasks, action).await
        }
        Command::Files { action } => run_files(&files, action).await,
    }
}
