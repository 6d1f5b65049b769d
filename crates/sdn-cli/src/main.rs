//! Proxmox VE SDN CLI (pvesdn)

use anyhow::Result;
use clap::{Parser, Subcommand};
use pve_shared_types::ZoneType;
use pvesdn::commands::{
    ApplyCommand, ConfigCommand, DeleteCommand, ListCommand, PingCommand, ShowCommand,
};
use pvesdn::context::CliContext;
use pvesdn::output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pvesdn")]
#[command(about = "Proxmox VE SDN Zone Management CLI")]
#[command(version)]
#[command(long_about = "
Proxmox VE SDN Zone Management CLI

Manages the Software-Defined Networking zones of a Proxmox VE cluster
through the cluster API. Zones are described declaratively in JSON, YAML
or TOML documents and applied with create, update or replace as needed.

Examples:
  pvesdn list                              # List all zones
  pvesdn list --type evpn --format json    # List EVPN zones as JSON
  pvesdn show zone1 --format yaml          # Show a zone as an apply-able document
  pvesdn apply -f zone1.yaml --dry-run     # Show what would change
  pvesdn apply -f zone1.yaml               # Create or update the zone
  pvesdn delete zone1                      # Remove a zone
  pvesdn -c /etc/pve/sdn-client.toml ping  # Check API connectivity
")]
struct Cli {
    /// Client configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List SDN zones
    List {
        /// Only list zones of this type
        #[arg(short = 't', long = "type")]
        zone_type: Option<ZoneType>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show a SDN zone
    Show {
        /// Zone name
        zone: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Create or update a SDN zone from a document
    Apply {
        /// Zone document (.json, .yaml, .yml or .toml)
        #[arg(short, long)]
        file: PathBuf,

        /// Only show the planned changes
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete a SDN zone
    Delete {
        /// Zone name
        zone: String,
    },

    /// Check that the cluster API is reachable
    Ping,

    /// Show the effective client configuration
    Config {
        /// Print the API token secret instead of masking it
        #[arg(long)]
        show_secret: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let result = match CliContext::bootstrap(cli.config.as_deref()) {
        Ok(context) => match cli.command {
            Commands::List { zone_type, format } => {
                ListCommand::new(context).execute(zone_type, format).await
            }
            Commands::Show { zone, format } => ShowCommand::new(context).execute(&zone, format).await,
            Commands::Apply { file, dry_run } => {
                ApplyCommand::new(context).execute(&file, dry_run).await
            }
            Commands::Delete { zone } => DeleteCommand::new(context).execute(&zone).await,
            Commands::Ping => PingCommand::new(context).execute().await,
            Commands::Config { show_secret } => ConfigCommand::new(context).execute(show_secret),
        },
        Err(e) => Err(e),
    };

    // Handle errors with appropriate exit codes
    match result {
        Ok(()) => {
            log::info!("Command completed successfully");
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);

            if cli.verbose || cli.debug {
                for cause in e.chain().skip(1) {
                    eprintln!("  Caused by: {}", cause);
                }
            }
            std::process::exit(1);
        }
    }
}
