use anyhow::Result;
use clap::{Parser, Subcommand};
use flapq::util::{write_default_configs, Summary};
use std::path::PathBuf;

/// Inspect and prepare flapq training state
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print an overview of the Q-table and training session in a directory
    Summary {
        /// Directory with q_values.json and training_values.json
        #[arg(long, default_value = "data")]
        dir: PathBuf,
    },

    /// Write the default agent and trainer configurations
    Config {
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match args.command {
        Command::Summary { dir } => println!("{}", Summary::from_dir(&dir)?),
        Command::Config { out } => write_default_configs(&out)?,
    }

    Ok(())
}
