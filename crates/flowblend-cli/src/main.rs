use clap::Parser;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

use flowblend_cli::{Cli, Commands};

mod commands;

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install log subscriber: {err}");
    }

    let result = match &cli.command {
        Commands::Solve {
            case,
            out,
            format,
            solver,
        } => commands::solve::handle(case, out.as_ref(), *format, solver),
        Commands::Validate { case, strict } => commands::validate::handle(case, *strict),
        Commands::Graph { command } => commands::graph::handle(command),
        Commands::Batch { cases, out, solver } => {
            commands::batch::handle(cases, out.as_ref(), solver)
        }
        Commands::Completions { shell, out } => {
            commands::completions::handle(*shell, out.as_deref())
        }
    };

    if let Err(err) = result {
        error!("{err:#}");
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
