use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use stitchd::{config::StoreConfig, rest, seed, storage::Storage, AppContext};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "stitchd",
    about = "stitchd — storefront API server for AI-generated t-shirt designs",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port
    #[arg(long, env = "STITCHD_PORT")]
    port: Option<u16>,

    /// Data directory for the SQLite database and config.toml
    #[arg(long, env = "STITCHD_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "STITCHD_LOG")]
    log: Option<String>,

    /// Bind address (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "STITCHD_BIND")]
    bind_address: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "STITCHD_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the storefront API server (default when no subcommand given).
    ///
    /// Examples:
    ///   stitchd serve
    ///   stitchd
    Serve,
    /// Populate the database with a demo catalog and demo accounts.
    ///
    /// Creates sizes S-XXL, four colors, three products with a full
    /// inventory grid, two demo shoppers, and an admin account
    /// (admin@example.com / admin123).
    ///
    /// Examples:
    ///   stitchd seed
    ///   stitchd seed --force
    Seed {
        /// Wipe existing data before seeding
        #[arg(long)]
        force: bool,
    },
    /// Create an admin account (or promote an existing user).
    ///
    /// Examples:
    ///   stitchd create-admin --email ops@example.com --password s3cret123 --name "Ops"
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "Admin")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = StoreConfig::new(
        args.port,
        args.data_dir.clone(),
        args.log.clone(),
        args.bind_address.clone(),
    );

    let _log_guard = init_tracing(&config.log, &config.log_format, args.log_file.as_deref());

    let storage = Storage::new_with_slow_query(
        &config.data_dir,
        config.observability.slow_query_threshold_ms,
    )
    .await?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let pruned = storage.prune_expired().await?;
            if pruned > 0 {
                info!(pruned, "pruned expired sessions and tokens");
            }

            let ctx = AppContext::new(config, storage)?;
            info!(
                version = env!("CARGO_PKG_VERSION"),
                data_dir = %ctx.config.data_dir.display(),
                "starting stitchd"
            );
            rest::serve(Arc::new(ctx)).await
        }
        Command::Seed { force } => {
            let ctx = AppContext::new(config, storage)?;
            seed::seed_demo(&ctx, force).await
        }
        Command::CreateAdmin {
            email,
            password,
            name,
        } => {
            let user = seed::ensure_admin(&storage, &email, &password, &name).await?;
            println!("admin ready: {} ({})", user.email, user.id);
            Ok(())
        }
    }
}

/// Initialise the tracing subscriber.
///
/// Returns the file appender guard when logging to a file — dropping it
/// flushes buffered log lines, so it must live for the whole program.
fn init_tracing(
    log_level: &str,
    log_format: &str,
    log_file: Option<&std::path::Path>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let use_json = log_format == "json";

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let filename = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("stitchd.log"));

        // Ensure the directory exists before tracing-appender tries to open it.
        if let Err(e) = std::fs::create_dir_all(dir) {
            // Fall back to stdout-only — don't panic on a bad log path.
            eprintln!(
                "warn: could not create log directory '{}': {e} — falling back to stdout",
                dir.display()
            );
            if use_json {
                tracing_subscriber::fmt().json().with_env_filter(log_level).init();
            } else {
                tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
            }
            return None;
        }

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        if use_json {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().json())
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().compact())
                .with(fmt::layer().with_writer(non_blocking))
                .init();
        }

        Some(guard)
    } else if use_json {
        tracing_subscriber::fmt().json().with_env_filter(log_level).init();
        None
    } else {
        tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
        None
    }
}
