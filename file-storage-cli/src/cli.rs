//! Command line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "file-storage",
    about = "File and bucket operations on an S3-compatible storage",
    long_about = "File and bucket operations on an S3-compatible storage.\n\n\
    Credentials are read from S3_ACCESS_ID, S3_SECRET_KEY, S3_TOKEN, S3_REGION and S3_ENDPOINT \
    (a .env file in the working directory is loaded first).",
    after_help = "Examples:\n  \
    file-storage list backups\n  \
    file-storage upload backups test/voucher.pdf ./voucher.pdf\n  \
    file-storage delete backups test/a.jpeg test/b.jpeg"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the files of a bucket (keys with an extension only)
    List { bucket: String },
    /// Upload a local file
    Upload {
        bucket: String,
        key: String,
        /// Local file to upload
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Download a file
    Download {
        bucket: String,
        key: String,
        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Delete files with a single batch request
    Delete {
        bucket: String,
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// List the buckets of the account
    ListBuckets,
    /// Create a bucket in the configured region
    CreateBucket { bucket: String },
    /// Check whether a bucket exists
    BucketExists { bucket: String },
    /// Delete an empty bucket
    DeleteBucket { bucket: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delete_with_many_keys() {
        let cli = Cli::parse_from(["file-storage", "delete", "backups", "a.txt", "b.txt"]);
        match cli.command {
            Command::Delete { bucket, keys } => {
                assert_eq!(bucket, "backups");
                assert_eq!(keys, vec!["a.txt".to_string(), "b.txt".to_string()]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_delete_requires_keys() {
        assert!(Cli::try_parse_from(["file-storage", "delete", "backups"]).is_err());
    }

    #[test]
    fn test_parse_download_output() {
        let cli = Cli::parse_from([
            "file-storage",
            "download",
            "backups",
            "a.txt",
            "--output",
            "/tmp/a.txt",
        ]);
        assert!(matches!(
            cli.command,
            Command::Download { output: Some(_), .. }
        ));
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
