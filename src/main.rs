//! Browser Sentry - Extension and Privacy Audit CLI
//!
//! Scores installed browser extensions by granted capability, host access
//! and install provenance, audits browser privacy settings, and rolls
//! everything up into one security posture score.

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use browser_sentry::Config;

mod cli;

/// Browser Sentry - extension and privacy-setting security audit
#[derive(Parser)]
#[command(name = "browser-sentry")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Browser profile snapshot to audit (overrides config)
    #[arg(long, global = true)]
    profile: Option<String>,

    /// State database path (overrides config)
    #[arg(long, global = true)]
    store: Option<String>,

    /// Config file path
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full audit pass and print the results
    Scan,

    /// Show the current security posture
    Status,

    /// Export a JSON audit report
    Report {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Tag an extension by usage, or list assigned tags
    Tag {
        /// Extension id
        id: Option<String>,

        /// Tag to assign (actively-used, rarely-used, can-remove)
        tag: Option<String>,

        /// Remove the extension's tag
        #[arg(long)]
        clear: bool,

        /// List all assigned tags
        #[arg(short, long)]
        list: bool,
    },

    /// Track the manual hardening checklist
    Check {
        /// Check id
        id: Option<String>,

        /// Mark the check verified
        #[arg(long)]
        verified: bool,

        /// Mark the check unverified
        #[arg(long)]
        unverified: bool,

        /// List all checks grouped by category
        #[arg(short, long)]
        list: bool,
    },

    /// Manage the browser settings audit
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Print the scoring reference tables
    Rules,

    /// Watch the profile for changes and rescan
    Watch {
        /// Seconds between profile polls
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Opt in and request settings access
    Enable {
        /// Grant without the interactive prompt
        #[arg(long)]
        yes: bool,
    },
    /// Opt out and revoke settings access
    Disable,
    /// Show the latest settings audit
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = Config::load(cli.config.as_deref().map(std::path::Path::new))?;
    if let Some(profile) = cli.profile {
        config.profile_path = profile;
    }
    if let Some(store) = cli.store {
        config.store_path = store;
    }

    let ctx = cli::CliContext::connect(config)?;

    match cli.command {
        Commands::Scan => {
            cli::scan::run(&ctx).await?;
        }
        Commands::Status => {
            cli::status::run(&ctx).await?;
        }
        Commands::Report { output } => {
            cli::report::run(&ctx, output.as_deref()).await?;
        }
        Commands::Tag {
            id,
            tag,
            clear,
            list,
        } => {
            cli::tag::run(&ctx, id.as_deref(), tag.as_deref(), clear, list).await?;
        }
        Commands::Check {
            id,
            verified,
            unverified,
            list,
        } => {
            cli::check::run(&ctx, id.as_deref(), verified, unverified, list).await?;
        }
        Commands::Settings { action } => match action {
            SettingsAction::Enable { yes } => cli::settings::enable(&ctx, yes).await?,
            SettingsAction::Disable => cli::settings::disable(&ctx).await?,
            SettingsAction::Show => cli::settings::show(&ctx).await?,
        },
        Commands::Rules => {
            cli::rules::run().await?;
        }
        Commands::Watch { interval } => {
            cli::watch::run(&ctx, interval).await?;
        }
    }

    Ok(())
}
