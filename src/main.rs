use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vndb_lookup::config::{
    default_config_path, find_config_file, get_config, load_config, save_config, Config,
    CONFIG_FILE_NAME,
};
use vndb_lookup::{CharacterRecord, RoleGroup, SourceError, VndbClient};

/// vndb-lookup - Look up visual novel characters on VNDB
#[derive(Parser, Debug)]
#[command(name = "vndb-lookup")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Look up visual novel characters and their voice actors on VNDB", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Leave descriptions in VNDB markup instead of converting to markdown
    #[arg(long, global = true)]
    raw: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Best match for a keyword, with voice actors
    #[command(alias = "s")]
    Search {
        /// Search keyword
        keyword: String,
    },

    /// Character by VNDB id (e.g. c17), with voice actors
    Id {
        /// Character id
        id: String,
    },

    /// All matches for a keyword, without voice actors
    #[command(alias = "l")]
    List {
        /// Search keyword
        keyword: String,
    },

    /// A random well-rated character
    #[command(alias = "r")]
    Random {
        /// Role group: main (1) or side (2)
        #[arg(long, default_value = "")]
        role: String,
    },

    /// Database statistics
    Stats,

    /// Configuration helpers
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write the default configuration
    Init {
        /// Destination (default: user config directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Print the effective configuration
    Show,
}

/// Character as printed by the CLI
#[derive(Serialize)]
struct CharacterView<'a> {
    #[serde(flatten)]
    record: &'a CharacterRecord,
    description_markdown: Option<String>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_character(record: &CharacterRecord, raw: bool) -> Result<()> {
    let view = CharacterView {
        record,
        description_markdown: if raw { None } else { record.description_markdown() },
    };
    print_json(&view)
}

fn init_logging(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("vndb_lookup={}", level)),
    );
    let json = cli.json_logs || config.logging.format.as_deref() == Some("json");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    if let Some(path) = &cli.config {
        return load_config(path).with_context(|| format!("loading {}", path.display()));
    }
    if let Some(path) = find_config_file() {
        return load_config(&path).with_context(|| format!("loading {}", path.display()));
    }
    Ok(get_config()?)
}

/// Destination of `config init`, if that is the command.
///
/// `config init` runs before any existing config is loaded so it can replace
/// a broken file.
fn init_target(cli: &Cli) -> Option<PathBuf> {
    match &cli.command {
        Commands::Config {
            action: ConfigAction::Init { path },
        } => Some(
            path.clone()
                .or_else(default_config_path)
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME)),
        ),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = init_target(&cli) {
        init_logging(&cli, &Config::default());
        save_config(&Config::default(), &path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let config = resolve_config(&cli)?;
    init_logging(&cli, &config);

    if let Commands::Config { .. } = &cli.command {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let client = VndbClient::from_config(&config)?;

    let outcome = match &cli.command {
        Commands::Search { keyword } => client.character_by_fuzzy(keyword).await.map(Some),
        Commands::Id { id } => client.character_by_id(id).await.map(Some),
        Commands::Random { role } => client
            .sample_random(RoleGroup::from_selector(role))
            .await
            .map(Some),
        Commands::List { keyword } => {
            let list = client.character_list_by_fuzzy(keyword).await?;
            if list.is_empty() && !cli.quiet {
                eprintln!("No characters found");
            }
            for record in &list {
                print_character(record, cli.raw)?;
            }
            return Ok(());
        }
        Commands::Stats => {
            let stats = client.stats().await?;
            return print_json(&stats);
        }
        Commands::Config { .. } => Ok(None),
    };

    match outcome {
        Ok(Some(record)) => print_character(&record, cli.raw),
        Ok(None) => Ok(()),
        Err(SourceError::NoContent) => {
            if !cli.quiet {
                eprintln!("No character found");
            }
            std::process::exit(2);
        }
        Err(err) => Err(err.into()),
    }
}
