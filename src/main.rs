mod cli;
mod config;
mod core;
mod domain;
mod fits;
mod render;
mod wcs;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = cli::Args::parse();
    match core::app::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("tdsplotslit: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
