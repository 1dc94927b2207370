//! Report command handlers
//!
//! Called from inside farm tasks. The report channel address and the item
//! name come from the task environment the scheduler exported.

use afbridge_client::ReportClient;
use afbridge_core::domain::attribute::AttrValue;
use afbridge_core::domain::shared_server::SharedServerInfo;
use afbridge_core::paths::delocalize_path;
use afbridge_core::tokens::{self, item_name_from_task_env, job_token_from};
use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use colored::*;

/// Arguments shared by every report
#[derive(Args)]
pub struct ReportArgs {
    /// Report channel address (host:port)
    #[arg(long, env = "PDG_RESULT_SERVER")]
    server: String,

    /// Work item name
    #[arg(long, env = "PDG_ITEM_NAME")]
    item: Option<String>,

    /// Batch subindex, -1 for regular items
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    subindex: i32,

    #[command(subcommand)]
    command: ReportCommands,
}

/// Report subcommands
#[derive(Subcommand)]
pub enum ReportCommands {
    /// The item started cooking
    Start,
    /// The item finished successfully
    Succeeded {
        /// Cook time in seconds
        #[arg(long, default_value_t = 0.0)]
        duration: f64,
    },
    /// The item failed
    Failed,
    /// The item was cancelled
    Cancelled,
    /// Report a result of the item
    Result {
        /// Result data, usually a file path
        data: String,

        /// Result tag, e.g. "file/geo"
        #[arg(long, default_value = "")]
        tag: String,

        /// Hash code of the result
        #[arg(long, default_value_t = 0)]
        hash: i64,

        /// Also report success with this cook time in seconds
        #[arg(long)]
        and_success: Option<f64>,
    },
    /// Write attribute values into the item
    Attr {
        name: String,

        /// Values, parsed as integers, then floats, else kept as strings
        #[arg(required = true, allow_negative_numbers = true)]
        values: Vec<String>,
    },
    /// Announce a shared server started by this task
    ServerStarted {
        name: String,
        #[arg(long)]
        host: String,
        #[arg(long)]
        port: u16,
        #[arg(long)]
        pid: u32,
        #[arg(long, default_value = "")]
        proto_type: String,
    },
    /// Ask the scheduler to shut a shared server down
    ServerEnded {
        name: String,
    },
    /// Print a shared server's connection info
    ServerInfo {
        name: String,
    },
}

/// Handle `afbridge report`
pub async fn handle_report_command(args: ReportArgs) -> Result<()> {
    let job_token = job_token_from(|var| std::env::var(var).ok());
    let client = ReportClient::new(&args.server, job_token);
    let subindex = args.subindex;
    let item = || -> Result<String> {
        match &args.item {
            Some(item) => Ok(item_name_from_task_env(item).to_string()),
            None => bail!("No work item given and {} is not set", tokens::env::ITEM_NAME),
        }
    };

    match args.command {
        ReportCommands::Start => {
            let item = item()?;
            println!("PDG_START: {};{}", item, subindex);
            client.start_cook(&item, subindex).await?;
        }
        ReportCommands::Succeeded { duration } => {
            let item = item()?;
            println!("PDG_SUCCESS: {};{};{}", item, subindex, duration);
            client.succeeded(&item, subindex, duration).await?;
        }
        ReportCommands::Failed => {
            let item = item()?;
            println!("PDG_FAILED: {};{}", item, subindex);
            client.failed(&item, subindex).await?;
        }
        ReportCommands::Cancelled => {
            let item = item()?;
            println!("PDG_CANCELLED: {};{}", item, subindex);
            client.cancelled(&item, subindex).await?;
        }
        ReportCommands::Result {
            data,
            tag,
            hash,
            and_success,
        } => {
            let item = item()?;
            let data = result_data(&data, &tag);
            println!("PDG_RESULT: {};{};{:?};{};{}", item, subindex, data, tag, hash);
            match and_success {
                Some(duration) => {
                    println!("PDG_SUCCESS: {};{};{}", item, subindex, duration);
                    client
                        .success_and_result(&item, subindex, data.as_bytes(), &tag, hash, duration)
                        .await?;
                }
                None => {
                    client
                        .result(&item, subindex, data.as_bytes(), &tag, hash)
                        .await?
                }
            }
        }
        ReportCommands::Attr { name, values } => {
            let item = item()?;
            let values: Vec<AttrValue> = values.iter().map(|v| parse_attr_value(v)).collect();
            let printed: Vec<String> = values.iter().map(ToString::to_string).collect();
            println!("PDG_RESULT_ATTR: {};{};[{}]", item, name, printed.join(", "));
            client.write_attr(&item, &name, values).await?;
        }
        ReportCommands::ServerStarted {
            name,
            host,
            port,
            pid,
            proto_type,
        } => {
            let info = SharedServerInfo {
                name,
                host,
                port,
                pid,
                proto_type,
            };
            if !client.shared_server_started(info.clone()).await? {
                bail!("Scheduler refused shared server '{}'", info.name);
            }
            if let Ok(item) = item() {
                client
                    .result(&item, subindex, info.host.as_bytes(), "socket/ip", 0)
                    .await?;
                client
                    .result(&item, subindex, info.port.to_string().as_bytes(), "socket/port", 0)
                    .await?;
            }
            println!("{} {}", "✓ Registered shared server".green(), info.name);
        }
        ReportCommands::ServerEnded { name } => {
            if client.shared_server_ended(&name).await? {
                println!("{} {}", "✓ Stopped shared server".green(), name);
            } else {
                bail!("Shared server '{}' could not be stopped", name);
            }
        }
        ReportCommands::ServerInfo { name } => {
            let info = client
                .shared_server_info(&name)
                .await?
                .with_context(|| format!("Unknown shared server '{}'", name))?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}

/// File results travel rooted at `__PDG_DIR__`; other tags are sent verbatim
fn result_data(data: &str, tag: &str) -> String {
    let is_file = tag.is_empty() || tag.starts_with("file");
    if is_file && !data.starts_with(tokens::DIR) {
        delocalize_path(data)
    } else {
        data.to_string()
    }
}

fn parse_attr_value(value: &str) -> AttrValue {
    if let Ok(int) = value.parse::<i64>() {
        AttrValue::Int(int)
    } else if let Ok(float) = value.parse::<f64>() {
        AttrValue::Float(float)
    } else {
        AttrValue::String(value.to_string())
    }
}
