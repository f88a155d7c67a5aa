mod angles;
mod batch;
mod config_cmd;
mod reps;
mod segment;
mod topology;

use anyhow::Result;
use clap::{Parser, Subcommand};
use motion_segmentation::config::Config;
use std::path::PathBuf;

use crate::config::{self, ConfigSource};

pub use angles::AnglesCommand;
pub use batch::BatchCommand;
pub use reps::RepsCommand;
pub use segment::SegmentCommand;
pub use topology::TopologyCommand;

#[derive(Parser)]
#[command(name = "motion-seg")]
#[command(about = "Segment pose-estimation recordings into motion phases", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to configuration file
    #[arg(long, global = true, env = "MOTION_SEG_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment one recording
    Segment(SegmentCommand),

    /// Print the joint angles of a recording
    Angles(AnglesCommand),

    /// Count repetitions of a configured exercise
    Reps(RepsCommand),

    /// Segment every recording in a directory
    Batch(BatchCommand),

    /// Show the skeleton topology in use
    Topology(TopologyCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigSubcommands),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Show the active configuration
    Show,

    /// Initialize configuration with defaults
    Init {
        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Check a configuration file without running anything
    Validate {
        /// File to check, defaults to the active configuration
        path: Option<PathBuf>,
    },
}

/// Everything a command needs from the global flags
pub struct CommandContext {
    pub config: Config,
    pub source: ConfigSource,
    pub json: bool,
}

impl Cli {
    fn context(&self) -> Result<CommandContext> {
        let (config, source) = config::load(self.config.as_deref())?;
        Ok(CommandContext {
            config,
            source,
            json: self.json,
        })
    }

    pub async fn execute(self) -> Result<()> {
        if self.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        match &self.command {
            Commands::Segment(cmd) => cmd.execute(&self.context()?).await,
            Commands::Angles(cmd) => cmd.execute(&self.context()?).await,
            Commands::Reps(cmd) => cmd.execute(&self.context()?).await,
            Commands::Batch(cmd) => cmd.execute(&self.context()?).await,
            Commands::Topology(cmd) => cmd.execute(&self.context()?).await,
            Commands::Config(subcmd) => match subcmd {
                ConfigSubcommands::Show => config_cmd::show_config(&self.context()?).await,
                ConfigSubcommands::Init { force } => config_cmd::init_config(*force).await,
                ConfigSubcommands::Validate { path } => {
                    config_cmd::validate_config(path.as_deref().or(self.config.as_deref())).await
                }
            },
            Commands::Completions { shell } => {
                generate_completions(*shell);
                Ok(())
            }
        }
    }
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
