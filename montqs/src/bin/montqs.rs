use anyhow::bail;
use chrono::{
    DateTime,
    Utc,
};
use clap::{
    Parser,
    Subcommand,
};
use moncore::{
    event::{
        EventAction,
        traits::EventBackend,
    },
    platform::ConnectorOption,
    task_status::{
        TaskStatus,
        TaskStatusFilter,
        TaskStatusKey,
        traits::TaskStatusBackend,
    },
};
use mondb_sqlite::SqliteBackend;

use montqs::{
    monitor::TaskInfo,
    prefill::prefill_task,
};


#[derive(Debug, Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(flatten)]
    connector: ConnectorOption,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the latest known status of tasks
    List {
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_enum)]
        status: Option<TaskStatus>,
        #[clap(short = 'j', long = "json", action)]
        json: bool,
    },
    #[command(arg_required_else_help = true)]
    Show {
        name: String,
        #[arg(long)]
        uid: Option<String>,
        #[clap(short = 'j', long = "json", action)]
        json: bool,
    },
    /// Create the placeholder status of a task that has never run
    #[command(arg_required_else_help = true)]
    Prefill {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        module: String,
        #[arg(long, default_value = "")]
        func: String,
    },
    /// List recorded events
    Events {
        #[arg(long, value_enum)]
        action: Option<EventAction>,
        #[clap(short = 'j', long = "json", action)]
        json: bool,
    },
}


#[async_std::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();
    stderrlog::new()
        .module(module_path!())
        .module("mondb_sqlite")
        .verbosity((args.verbose as usize) + 1)
        .timestamp(stderrlog::Timestamp::Second)
        .init()?;

    let backend = SqliteBackend::connect(args.connector)
        .await?
        .migrate()
        .await?;

    match args.command {
        Commands::List { name, status, json } => {
            let filter = TaskStatusFilter { name, status };
            let records = backend.list_task_status(&filter).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("no task status recorded");
            } else {
                for record in records.iter() {
                    println!("{}", record);
                }
            }
        }
        Commands::Show { name, uid, json } => {
            let key = TaskStatusKey::new(name, uid.as_deref());
            let record = match backend.get_task_status(&key).await? {
                Some(record) => record,
                None => bail!("no status recorded for task {key}"),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!("{}", record);
                if let Some(ts) = record.finish_ts.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)) {
                    println!("finished: {}", ts.to_rfc3339());
                }
                if let Some(ts) = record.expires_ts.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)) {
                    println!("expires: {}", ts.to_rfc3339());
                }
            }
        }
        Commands::Prefill { name, description, module, func } => {
            let info = TaskInfo::new(&name)
                .description(description)
                .call(module, func);
            if prefill_task(&backend, &info).await {
                println!("prefilled status for task '{name}'");
            } else {
                println!("task '{name}' already has a recorded status");
            }
        }
        Commands::Events { action, json } => {
            let events = backend.list_events(action).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else {
                for event in events.iter() {
                    println!(
                        "{}> {} {} [{}] {}",
                        event.id,
                        event.created_ts,
                        event.action.as_str(),
                        event.user.username,
                        event.message,
                    );
                }
            }
        }
    }

    Ok(())
}
