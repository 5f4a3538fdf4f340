use std::ffi::{CString, OsStr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use sqlite_vec_init::config::{InitMode, Settings};
use sqlite_vec_init::{ext, hook, store};

#[derive(Parser)]
#[command(
    name = "sqlite-vec-init",
    about = "Initialize and check the sqlite-vec extension on SQLite connections",
    version
)]
struct Cli {
    /// Database path (":memory:" for an in-memory database)
    #[arg(long, short = 'd', env = "SQLITE_VEC_DATABASE")]
    database: Option<String>,

    /// How sqlite-vec is attached: manual (per connection) or auto (auto-extension)
    #[arg(long = "init-mode", env = "SQLITE_VEC_INIT_MODE", value_enum)]
    init_mode: Option<InitMode>,

    /// TOML config file; command-line flags take precedence
    #[arg(long, short = 'c', env = "SQLITE_VEC_CONFIG")]
    config: Option<PathBuf>,

    /// Log file path
    #[arg(long = "log-file", env = "SQLITE_VEC_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Enable debug mode
    #[arg(long, env = "SQLITE_VEC_DEBUG")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the SQLite and sqlite-vec versions
    Version,
    /// Create a scratch vec0 table and run a KNN query against it
    Smoke {
        /// Vector dimension
        #[arg(long)]
        dim: Option<usize>,

        /// Number of neighbors to return
        #[arg(long, short = 'k')]
        limit: Option<usize>,
    },
    /// Call the SQLITE_EXTRA_INIT hook and print its status code
    Hook {
        /// Text argument passed to the hook (ignored by it)
        arg: Option<String>,
    },
}

impl Cli {
    fn to_settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_toml_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => Settings::default(),
        };
        if let Some(database) = &self.database {
            settings.database = database.clone();
        }
        if let Some(mode) = self.init_mode {
            settings.init_mode = mode;
        }
        if let Commands::Smoke { dim, limit } = &self.command {
            if let Some(dim) = dim {
                settings.dimension = *dim;
            }
            if let Some(limit) = limit {
                settings.knn_limit = *limit;
            }
        }
        settings.validate()?;
        Ok(settings)
    }
}

fn setup_logging(log_file: Option<&PathBuf>, debug: bool) -> Option<WorkerGuard> {
    use tracing_subscriber::EnvFilter;

    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    if let Some(log_path) = log_file {
        let dir = log_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let _ = std::fs::create_dir_all(dir);
        let file_name = log_path
            .file_name()
            .unwrap_or(OsStr::new("sqlite-vec-init.log"));

        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        Some(guard)
    } else {
        // stdout is reserved for command output
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        None
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(cli.log_file.as_ref(), cli.debug);

    match &cli.command {
        Commands::Hook { arg } => run_hook(arg.as_deref()),
        Commands::Version => run_version(&cli.to_settings()?),
        Commands::Smoke { .. } => run_smoke(&cli.to_settings()?),
    }
}

fn run_hook(arg: Option<&str>) -> Result<()> {
    let arg = arg
        .map(CString::new)
        .transpose()
        .context("Hook argument contains a NUL byte")?;
    let code = hook::extra_init(arg.as_deref());
    info!("{} returned {}", hook::EXTRA_INIT_SYMBOL, code);
    println!("{code}");
    Ok(())
}

fn run_version(settings: &Settings) -> Result<()> {
    let conn = ext::open(settings).context("Failed to open database")?;
    let version = store::vec_version(&conn)?;
    println!("sqlite {}", store::sqlite_version());
    println!("sqlite-vec {version}");
    Ok(())
}

fn run_smoke(settings: &Settings) -> Result<()> {
    let conn = ext::open(settings).context("Failed to open database")?;
    let neighbors = store::smoke_test(&conn, settings.dimension, settings.knn_limit)
        .context("Smoke test failed")?;
    println!("{}", serde_json::to_string_pretty(&neighbors)?);
    Ok(())
}
