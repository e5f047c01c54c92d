use anyhow::Result;
use clap::{CommandFactory, Parser};
use colored::Colorize;

use moonchat::app::{run_repl_mode, run_single_shot, setup_from_cli};
use moonchat::{Cli, MissingCredentialError};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    if let Some(shell) = cli.generate {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
        return Ok(());
    }

    // Nothing to ask and no interactive session requested
    if !cli.interactive && cli.inputs.is_empty() {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    }

    let app = match setup_from_cli(&cli) {
        Ok(app) => app,
        Err(e) => {
            if e.downcast_ref::<MissingCredentialError>().is_some() {
                eprintln!("{} An API key is required to continue", "❌".bright_red());
            }
            eprintln!("{} {:#}", "Error:".bright_red().bold(), e);
            std::process::exit(1);
        }
    };

    if cli.interactive {
        if !cli.inputs.is_empty() {
            eprintln!(
                "{} Ignoring {} positional input(s) in interactive mode",
                "⚠️".yellow(),
                cli.inputs.len()
            );
        }
        run_repl_mode(app).await
    } else {
        run_single_shot(app, &cli.inputs).await
    }
}
