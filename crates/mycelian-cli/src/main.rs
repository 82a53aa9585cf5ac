mod cli;

use clap::Parser;
use mycelian_client::{CancellationToken, MemoryClient, NewContextSnapshot, NewEntry, SearchQuery};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let client = MemoryClient::from_env()?;

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_cancel.cancel();
        }
    });

    let result = run(&client, cli.command, cancel).await;
    client.close().await;
    result
}

async fn run(client: &MemoryClient, command: Command, cancel: CancellationToken) -> anyhow::Result<()> {
    match command {
        Command::AppendEntry { memory_id, role, content, metadata } => {
            let metadata = parse_metadata(metadata)?;
            let ack = client
                .append_entry(&memory_id, NewEntry { role, content, metadata }, cancel)
                .await?;
            print_json(&ack)
        }
        Command::PutContext { memory_id, summary, metadata } => {
            let metadata = parse_metadata(metadata)?;
            let ack = client
                .put_context_snapshot(&memory_id, NewContextSnapshot { summary, metadata }, cancel)
                .await?;
            print_json(&ack)
        }
        Command::DeleteEntry { memory_id, entry_id } => {
            let ack = client.delete_entry(&memory_id, &entry_id, cancel).await?;
            print_json(&ack)
        }
        Command::DeleteContext { memory_id } => {
            let ack = client.delete_context_snapshot(&memory_id, cancel).await?;
            print_json(&ack)
        }
        Command::ListEntries { memory_id } => {
            let entries = client.list_entries(&memory_id).await?;
            print_json(&entries)
        }
        Command::GetContext { memory_id } => {
            let ctx = client.get_context(&memory_id).await?;
            print_json(&ctx)
        }
        Command::Search { memory_id, query, limit } => {
            let mut q = SearchQuery::new(query);
            q.limit = limit;
            let hits = client.search(&memory_id, q).await?;
            print_json(&hits)
        }
        Command::PromptTemplate { name } => {
            let template = client.get_prompt_template(&name).await?;
            print_json(&template)
        }
        Command::AwaitConsistency { memory_id } => {
            client.await_consistency(&memory_id, cancel).await?;
            println!("ok");
            Ok(())
        }
    }
}

fn parse_metadata(raw: Option<String>) -> anyhow::Result<Option<serde_json::Value>> {
    raw.map(|s| serde_json::from_str(&s)).transpose().map_err(Into::into)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
