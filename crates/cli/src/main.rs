//! `ditto-edge` entry point.
//!
//! Composition root: parses flags, installs tracing, builds an
//! [`edge_client::EdgeClient`] with an optional container runner from the
//! `containers` crate, and runs one subcommand. Results are printed to stdout
//! as pretty JSON; logs go to stderr.

mod args;
mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use containers::{ComposeCliRunner, DockerCliRunner};
use dql::{ContainerRunner, DocumentService, Query};
use edge_client::EdgeClient;
use serde::Serialize;
use tracing::{error, info};

use crate::args::{filters, parse_object, Cli, Command, ContainerMode};
use crate::telemetry::Telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let telemetry = Telemetry::init(cli.log_json)?;

    let result = run(cli).await;
    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "command failed");
    }

    telemetry.shutdown();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut client = EdgeClient::new(cli.client_config()).context("invalid connection settings")?;

    if let Some(mode) = cli.container.manage_container {
        let options = cli.container.options()?;
        let runner: Arc<dyn ContainerRunner> = match mode {
            ContainerMode::Plain => {
                Arc::new(DockerCliRunner::new().with_program(&cli.container.docker_program))
            }
            ContainerMode::Compose => Arc::new(
                ComposeCliRunner::new()
                    .with_program(&cli.container.docker_program)
                    .with_compose_file_from(&options),
            ),
        };
        info!(?mode, container = %options.container_name, "container management enabled");
        client = client.with_container(runner, options);
    }

    match cli.command {
        Command::Init => {
            client.init_db().await?;
            info!(started = client.started_container(), "edge server ready");
        }
        Command::Close => client.close().await?,
        Command::Status => print(&client.status().await?)?,
        Command::Insert {
            collection,
            document,
        } => print(&client.create_document(&collection, parse_object(&document)?).await?)?,
        Command::Get { collection, id } => print(&client.get_record(&collection, &id).await?)?,
        Command::List { collection, list } => {
            print(&client.get_records(&collection, &list.options()).await?)?
        }
        Command::Update {
            collection,
            id,
            patch,
        } => print(
            &client
                .update_record(&collection, &id, parse_object(&patch)?)
                .await?,
        )?,
        Command::Delete { collection, id } => {
            print(&client.delete_record(&collection, &id).await?)?
        }
        Command::DeleteAll { collection } => {
            print(&client.delete_all_records(&collection).await?)?
        }
        Command::Latest {
            collection,
            sort_by,
        } => print(&client.latest_record(&collection, &sort_by).await?)?,
        Command::Search {
            collection,
            filters: pairs,
            list,
        } => print(
            &client
                .search(&collection, &filters(&pairs), &list.options())
                .await?,
        )?,
        Command::Exec { statement, args } => {
            let query = match args {
                Some(raw) => Query::with_args(statement, parse_object(&raw)?),
                None => Query::new(statement),
            };
            print(&client.execute(&query).await?)?
        }
    }
    Ok(())
}

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
