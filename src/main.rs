//! static-cache CLI - administer the static page cache

use clap::{CommandFactory, Parser};

mod cli;
mod output;

use cli::{Cli, CommandContext, Commands, GlobalOptions};
use static_cache::Result;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Version => {
            println!("static-cache version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "static-cache", &mut std::io::stdout());
            Ok(())
        }
        Commands::Write {
            host,
            path,
            no_cache,
        } => cli::cache::write(&CommandContext::new(&opts)?, &host, &path, no_cache),
        Commands::Clear { mode } => cli::cache::clear(&CommandContext::new(&opts)?, mode),
        Commands::Track { entry, bust_on } => {
            cli::cache::track(&CommandContext::new(&opts)?, &entry, bust_on)
        }
        Commands::Status => cli::status::run(&CommandContext::new(&opts)?),
        Commands::Path => cli::cache::path(&CommandContext::new(&opts)?),
    }
}
