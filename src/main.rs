use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use repofleet::runner::DEFAULT_MAX_PARALLEL;
use repofleet::workspace::TargetKind;

mod cmd;

#[derive(Parser)]
#[command(name = "fleet")]
#[command(version, about = "Run commands and gather reports across a fleet of project repositories")]
pub struct Cli {
    /// Verbose diagnostic output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a command against multiple projects
    RunMany {
        /// Path to the workspace file
        #[arg(short, long, default_value = "fleet.json")]
        config: PathBuf,

        /// Restrict the run to a named profile
        #[arg(short, long)]
        profile: Option<String>,

        /// Which directory of each project the command runs in
        #[arg(short = 't', long, value_enum, default_value_t = TargetKind::Dir)]
        kind: TargetKind,

        /// The command to run
        #[arg(long)]
        cmd: String,

        /// Run targets one at a time instead of in parallel
        #[arg(short, long)]
        sequential: bool,

        /// Suppress per-target output
        #[arg(short, long)]
        quiet: bool,

        /// Maximum concurrently running subprocesses
        #[arg(long, default_value_t = DEFAULT_MAX_PARALLEL)]
        max_parallel: usize,

        /// Exit codes besides 0 to treat as success (comma-separated)
        #[arg(long)]
        allow_codes: Option<String>,
    },
    /// Classify the directories under the workspace root
    Analyze {
        /// Path to the workspace file
        #[arg(short, long, default_value = "fleet.json")]
        config: PathBuf,
    },
    /// Scan a directory for git repositories and write a starter workspace file
    Init {
        /// Directory to scan
        root: PathBuf,

        /// Where to write the workspace file (default: <root>/fleet.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the workspace file instead of writing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Aggregate commit authorship across repositories
    GitStats {
        /// Path to the workspace file
        #[arg(short, long, default_value = "fleet.json")]
        config: PathBuf,

        /// Restrict the report to a named profile
        #[arg(short, long)]
        profile: Option<String>,

        /// Teams file with author normalization rules
        #[arg(long)]
        teams: Option<PathBuf>,

        /// Maximum concurrently running subprocesses
        #[arg(long, default_value_t = DEFAULT_MAX_PARALLEL)]
        max_parallel: usize,
    },
    /// Report npm vulnerabilities and outdated packages
    NpmAudit {
        /// Workspace file; audits every node-web project when given
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Single directory to audit instead
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,

        /// Dependency classes for npm to omit (dev, optional, peer)
        #[arg(short, long)]
        omit: Option<String>,

        /// Maximum concurrently running subprocesses
        #[arg(long, default_value_t = DEFAULT_MAX_PARALLEL)]
        max_parallel: usize,
    },
    /// Validate tools and workspace configuration
    CheckHealth {
        /// Path to the workspace file
        #[arg(short, long, default_value = "fleet.json")]
        config: PathBuf,
    },
    /// List remote repositories of an Azure DevOps organization
    RemoteRepos {
        /// ADO organization name
        #[arg(short, long)]
        organization: String,

        /// ADO project name; optional with --hierarchy
        #[arg(short, long)]
        project: Option<String>,

        /// ADO login
        #[arg(short, long, env = "FLEET_ADO_LOGIN")]
        login: String,

        /// ADO personal access token
        #[arg(short, long, env = "FLEET_ADO_TOKEN", hide_env_values = true)]
        token: String,

        /// Walk every project of the organization and render repo tables
        #[arg(long)]
        hierarchy: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::RunMany {
            config,
            profile,
            kind,
            cmd,
            sequential,
            quiet,
            max_parallel,
            allow_codes,
        } => {
            cmd::cmd_run_many(
                config,
                profile.as_deref(),
                *kind,
                cmd,
                *sequential,
                *quiet,
                *max_parallel,
                allow_codes.as_deref(),
            )
            .await?;
        }
        Commands::Analyze { config } => cmd::cmd_analyze(config)?,
        Commands::Init {
            root,
            output,
            dry_run,
        } => cmd::cmd_init(root, output.as_deref(), *dry_run)?,
        Commands::GitStats {
            config,
            profile,
            teams,
            max_parallel,
        } => {
            cmd::cmd_git_stats(config, profile.as_deref(), teams.as_deref(), *max_parallel)
                .await?;
        }
        Commands::NpmAudit {
            config,
            directory,
            omit,
            max_parallel,
        } => {
            cmd::cmd_npm_audit(config.as_deref(), directory, omit.as_deref(), *max_parallel)
                .await?;
        }
        Commands::CheckHealth { config } => cmd::cmd_check_health(config).await?,
        Commands::RemoteRepos {
            organization,
            project,
            login,
            token,
            hierarchy,
        } => {
            cmd::cmd_remote_repos(
                organization,
                project.as_deref(),
                login,
                token,
                *hierarchy,
            )
            .await?;
        }
    }

    Ok(())
}
