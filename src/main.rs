//! GnuCash Web main entry point

use anyhow::Context;
use clap::Parser;
use gnucash_web_api::start_server;
use gnucash_web_config::Config;
use gnucash_web_core::SqliteBookStore;
use std::path::PathBuf;
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "gnucash-web")]
#[command(version)]
#[command(about = "A small web interface for browsing GnuCash books", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.to_details());
            return Err(e).with_context(|| format!("Failed to load {}", args.config.display()));
        }
    };

    // RUST_LOG wins over the configured level
    let env = env_logger::Env::default().default_filter_or(config.logging.level.as_str());
    env_logger::Builder::from_env(env).init();
    log::info!("Config loaded from {}", args.config.display());

    let rt = Runtime::new()?;
    rt.block_on(start_server(config, SqliteBookStore::new()))
        .context("Server error")?;

    Ok(())
}
