mod studio;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::studio::InputArgs;

#[derive(Debug, Parser)]
#[command(name = "launchpad-cli")]
#[command(about = "Draft, simulate and queue short-form content workflows")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the baseline workflow template
    Template,
    /// Print the channel catalog
    Channels,
    /// Generate viral angles for the given inputs
    Angles {
        #[command(flatten)]
        inputs: InputArgs,
    },
    /// Recalibrate, draft and simulate a workflow
    Preview {
        #[command(flatten)]
        inputs: InputArgs,
        /// 1-based index of the angle to draft for
        #[arg(long, default_value_t = 1)]
        angle: usize,
        /// Queue the drafted workflow for posting
        #[arg(long)]
        autopost: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = launchpad_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("launchpad-cli ready; run with --help to list commands");
        return Ok(());
    };

    let output = match command {
        Commands::Template => studio::run_template(&config)?,
        Commands::Channels => studio::run_channels()?,
        Commands::Angles { inputs } => studio::run_angles(&config, &inputs).await?,
        Commands::Preview {
            inputs,
            angle,
            autopost,
        } => studio::run_preview(&config, &inputs, angle, autopost).await?,
    };
    println!("{output}");

    Ok(())
}
