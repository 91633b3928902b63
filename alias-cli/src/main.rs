// alias-cli/src/main.rs
mod commands;
mod logging;
mod output;

use alias_sync::{AliasId, Config, FilterMode};
use anyhow::Result;
use clap::{Parser, Subcommand};
use output::{ExitCode, OutputFormat};

#[derive(Parser)]
#[command(name = "aliases")]
#[command(about = "Manage SimpleLogin email aliases from the command line", long_about = None)]
struct Cli {
    /// Force JSON output
    #[arg(long, global = true, conflicts_with = "human")]
    json: bool,
    /// Force human-readable output
    #[arg(long, global = true)]
    human: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store and validate an API key
    Setup,
    /// List aliases
    List {
        /// Which aliases to show: all, active or inactive
        #[arg(short, long, default_value = "all")]
        filter: FilterMode,
        /// Load every page instead of only the first
        #[arg(long)]
        all: bool,
    },
    /// Enable an alias
    Enable {
        /// Alias ID
        id: AliasId,
    },
    /// Disable an alias
    Disable {
        /// Alias ID
        id: AliasId,
    },
    /// Flip an alias between enabled and disabled
    Toggle {
        /// Alias ID
        id: AliasId,
    },
    /// Delete an alias permanently
    Delete {
        /// Alias ID
        id: AliasId,
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.human {
            OutputFormat::Human
        } else {
            OutputFormat::Auto
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.output_format();

    let code = match cli.command {
        Commands::Setup => {
            logging::init_tracing(None);
            commands::run_setup().await?
        }
        command => {
            let config = Config::load()?;
            logging::init_tracing(Some(&config));
            run(command, &config, format).await?
        }
    };

    if code != ExitCode::Success {
        std::process::exit(code.code());
    }
    Ok(())
}

async fn run(command: Commands, config: &Config, format: OutputFormat) -> Result<ExitCode> {
    let engine = alias_sync::connect(config)?;

    match command {
        Commands::Setup => commands::run_setup().await,
        Commands::List { filter, all } => {
            commands::list_aliases(&engine, filter, all, format).await
        }
        Commands::Enable { id } => commands::set_alias_state(&engine, id, Some(true), format).await,
        Commands::Disable { id } => {
            commands::set_alias_state(&engine, id, Some(false), format).await
        }
        Commands::Toggle { id } => commands::set_alias_state(&engine, id, None, format).await,
        Commands::Delete { id, force } => {
            commands::delete_alias(&engine, id, force, format).await
        }
    }
}
