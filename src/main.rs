use clap::Parser;
use miette::Result;
use unatlas::cli::{Cli, Commands};
use unatlas::output::{Printer, Verbosity};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbosity = cli.verbosity();

    let default_level = if verbosity == Verbosity::Verbose { "debug" } else { "warn" };
    env_logger::init_from_env(env_logger::Env::default().default_filter_or(default_level));

    let printer = Printer::with_verbosity(verbosity);

    match cli.command {
        Commands::Extract(args) => {
            unatlas::cli::extract::run(args, &printer)?;
        }
        Commands::List(args) => unatlas::cli::list::run(args, &printer)?,
        Commands::Completions(args) => unatlas::cli::completions::run(args)?,
    }

    Ok(())
}
