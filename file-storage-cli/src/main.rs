mod cli;

use std::io::Write;

use anyhow::Context;
use clap::Parser;
use file_storage::{FileStorage, StorageConfig};
use tracing_subscriber::{fmt, EnvFilter};

use cli::{Cli, Command};

/// Set to `json` for structured log output
const LOG_FORMAT_VAR: &str = "LOG_FORMAT";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_VAR).is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    // Logs go to stderr so downloads can be piped from stdout
    if json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn run(storage: &FileStorage, command: Command) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();

    match command {
        Command::List { bucket } => {
            let keys = storage.list(&bucket).await?;
            serde_json::to_writer_pretty(&mut stdout, &keys)?;
            writeln!(stdout)?;
        }
        Command::Upload { bucket, key, path } => {
            let content = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let stored_key = storage.upload(&bucket, &key, content).await?;
            writeln!(stdout, "{stored_key}")?;
        }
        Command::Download {
            bucket,
            key,
            output,
        } => {
            let content = storage.download(&bucket, &key).await?;
            match output {
                Some(path) => tokio::fs::write(&path, &content)
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => stdout.write_all(&content)?,
            }
        }
        Command::Delete { bucket, keys } => {
            storage.delete(&bucket, &keys).await?;
        }
        Command::ListBuckets => {
            let buckets = storage.list_buckets().await?;
            serde_json::to_writer_pretty(&mut stdout, &buckets)?;
            writeln!(stdout)?;
        }
        Command::CreateBucket { bucket } => {
            storage.create_bucket(&bucket).await?;
        }
        Command::BucketExists { bucket } => {
            let exists = storage.bucket_exists(&bucket).await?;
            writeln!(stdout, "{exists}")?;
        }
        Command::DeleteBucket { bucket } => {
            storage.delete_bucket(&bucket).await?;
        }
    }

    stdout.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is not an error
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = StorageConfig::from_env().context("failed to load storage configuration")?;
    let storage = FileStorage::from_config(&config)?;

    run(&storage, cli.command).await
}
