//! Process entry points: web server, database maintenance, version.

mod db;
mod web;

use crate::config::BuildInfo;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "webapp", about = "A database connected web application.")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the web server
    #[command(visible_alias = "w")]
    Web(web::WebArgs),
    /// Manage the database
    #[command(subcommand)]
    Db(db::DbCommand),
    /// Print build and version information
    #[command(visible_alias = "v")]
    Version,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Web(args) => web::run(args).await,
        Command::Db(command) => db::run(command).await,
        Command::Version => {
            println!("{}", serde_json::to_string_pretty(&BuildInfo::current())?);
            Ok(())
        }
    }
}
