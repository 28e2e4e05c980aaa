use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
mod auth;
use sealbox::{Config, FileStore, Sealbox, UnlockCheck, encoding, format};
use std::future::Future;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "sealbox")]
#[command(version, about = "Protect files with a single password.")]
struct Cli {
    /// Directory holding sealed records
    #[arg(long, global = true, value_name = "DIR", env = "SEALBOX_DIR")]
    store: Option<PathBuf>,

    /// PBKDF2 iterations for newly sealed files (default: 600000)
    #[arg(long, global = true, env = "SEALBOX_ITERATIONS")]
    iterations: Option<u32>,

    /// Check the password against every record instead of the first one
    #[arg(long, global = true, default_value_t = false)]
    verify_all: bool,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Encrypts a file into the store
    #[command(arg_required_else_help = true)]
    Add {
        file: PathBuf,
        /// Record name (default: the file name)
        #[arg(long)]
        name: Option<String>,
        /// Opaque content-type tag stored with the record
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Decrypts a stored file
    #[command(arg_required_else_help = true)]
    Get {
        name: String,
        /// Write to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Lists stored files, oldest first
    List,

    /// Removes a stored file
    #[command(arg_required_else_help = true)]
    Remove { name: String },

    /// Prints a record in portable JSON form
    #[command(arg_required_else_help = true)]
    Export { name: String },

    /// Adds a record from portable JSON
    #[command(arg_required_else_help = true)]
    Import { file: PathBuf },

    /// Checks the password against the store
    Unlock,

    /// Deletes every stored file
    Reset {
        /// Confirm deletion
        #[arg(long, default_value_t = false)]
        yes: bool,
    },

    /// Prints the SHA-256 fingerprint of a file (base64)
    #[command(arg_required_else_help = true)]
    Fingerprint { file: PathBuf },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "sealbox=debug" } else { "sealbox=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.store {
        Some(dir) => Config::new(dir.clone()),
        None => Config::with_default_dir()?,
    };
    let config = match cli.iterations {
        Some(n) => config.iterations(n)?,
        None => config,
    };
    let check = if cli.verify_all {
        UnlockCheck::EveryRecord
    } else {
        UnlockCheck::FirstRecord
    };
    Ok(config.unlock_check(check))
}

/// Wait for `fut`, giving up on Ctrl-C.
async fn cancellable<T>(fut: impl Future<Output = sealbox::Result<T>>) -> Result<T> {
    tokio::select! {
        res = fut => Ok(res?),
        _ = tokio::signal::ctrl_c() => bail!("cancelled"),
    }
}

async fn unlock(sb: &Sealbox<FileStore>) -> Result<()> {
    let password = auth::read_password()?;
    cancellable(sb.attempt_unlock(password)).await
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = resolve_config(&cli)?;
    let sb = Sealbox::from_config(&config);

    match cli.command {
        Commands::Add {
            file,
            name,
            content_type,
        } => {
            let name = match name {
                Some(n) => n,
                None => file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .context("cannot derive a name from the path; pass --name")?,
            };
            let data = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            unlock(&sb).await?;
            let record = cancellable(sb.save_file(&name, &data, content_type.as_deref())).await?;
            println!("stored '{}' ({} bytes)", record.identifier(), record.size_bytes());
        }
        Commands::Get { name, output } => {
            unlock(&sb).await?;
            let opened = cancellable(sb.open_file(&name)).await?;
            if !opened.integrity_ok {
                eprintln!("warning: fingerprint mismatch for '{name}'; do not trust this content");
            }
            match output {
                Some(path) => {
                    std::fs::write(&path, opened.plaintext.as_slice())
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("wrote '{name}' to {}", path.display());
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&opened.plaintext)?;
                    stdout.flush()?;
                }
            }
        }
        Commands::List => {
            let records = cancellable(sb.list_files()).await?;

            if records.is_empty() {
                println!("No files stored.");
                return Ok(());
            }

            let name_width = records
                .iter()
                .map(|r| r.identifier().len())
                .chain(std::iter::once("Name".len()))
                .max()
                .unwrap_or(0);

            println!("{:<name_width$}  {:>12}  Created", "Name", "Size");
            println!("{:-<name_width$}  {:->12}  {:-<20}", "", "", "");

            for r in records {
                println!(
                    "{:<name_width$}  {:>12}  {}",
                    r.identifier(),
                    r.size_bytes(),
                    r.created_at().format("%Y-%m-%d %H:%M:%S")
                );
            }
        }
        Commands::Remove { name } => {
            cancellable(sb.delete_file(&name)).await?;
            println!("'{name}' removed successfully");
        }
        Commands::Export { name } => {
            let record = cancellable(sb.get_record(&name)).await?;
            println!("{}", format::to_json(&record)?);
        }
        Commands::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let record = format::from_json(&text).context("invalid record file")?;
            let name = record.identifier().to_string();
            unlock(&sb).await?;
            cancellable(sb.import_record(record)).await?;
            println!("imported '{name}'");
        }
        Commands::Unlock => {
            unlock(&sb).await?;
            println!("password accepted");
        }
        Commands::Reset { yes } => {
            if !yes {
                bail!("refusing to delete every stored file without --yes");
            }
            let removed = cancellable(sb.reset()).await?;
            println!("removed {removed} file(s)");
        }
        Commands::Fingerprint { file } => {
            let data = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            println!("{}", encoding::encode(&sealbox::fingerprint(&data)));
        }
    }

    Ok(())
}
