mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use config::Config;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::*;

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "freedump=debug,freedump_cli=debug"
    } else {
        "freedump=info,freedump_cli=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Configure {
            show,
            transfer_size,
            codec,
            output_directory,
        } => {
            commands::configure::handle(show, transfer_size, codec, output_directory)?;
        }

        Commands::Dump {
            process,
            output,
            transfer_size,
            codec,
            protection,
        } => {
            let config = Config::load()?;
            let transfer = config.transfer(transfer_size, codec)?;
            let output = config.output_directory(output);
            commands::dump::handle(&process, &output, transfer, &protection)?;
        }

        Commands::Read {
            info,
            address,
            size,
        } => {
            commands::read::snapshot(&info, address, size)?;
        }

        Commands::Remote {
            process,
            address,
            size,
            codec,
        } => {
            let transfer = Config::load()?.transfer(None, codec)?;
            commands::read::remote(&process, address, size, transfer)?;
        }

        Commands::Ranges {
            info,
            process,
            protection,
        } => match (info, process) {
            (Some(info), _) => {
                commands::ranges::from_snapshot(&info, protection.as_deref())?;
            }
            (None, Some(process)) => {
                commands::ranges::from_process(&process, protection.as_deref())?;
            }
            (None, None) => unreachable!("clap requires --info or --process"),
        },
    }

    Ok(())
}
