use clap::Parser;
use env_logger::Env;
use log::{debug, warn};
use snafu::ErrorCompat;

mod args;
mod digest;

use crate::args::{Args, Command};

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();
    debug!("args: {:?}", args);

    let res = digest::load_config(args.config.as_deref()).and_then(|config| {
        match &args.command {
            Command::Aggregate(a) => digest::run_aggregate(a, config.as_ref()),
            Command::Report(a) => digest::run_report(a, config.as_ref()),
            Command::Table(a) => digest::run_table(a, config.as_ref()),
        }
    });

    if let Err(e) = res {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
