extern crate pretty_env_logger;

#[macro_use]
extern crate log;

use clap::Parser;
use digiclust::{cluster_main, Cli, Commands, DigiclustParams};

fn setup_logging(debug: bool) {
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    pretty_env_logger::formatted_timed_builder()
        .filter_level(level)
        .init();
}

fn validate_args<T: DigiclustParams>(args: &T) {
    setup_logging(args.debug());
    info!("starting");
    info!("params: {:#?}", args);
    if !args.validate() {
        error!("please fix arguments");
        std::process::exit(1);
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Cluster(args) => {
            validate_args(&args);
            match cluster_main(args) {
                Ok(summary) => info!(
                    "{:?} after {} iterations",
                    summary.stop,
                    summary.iterations.len()
                ),
                Err(e) => {
                    error!("{}", e);
                    std::process::exit(1);
                }
            }
        }
    }
    info!("finished");
}
