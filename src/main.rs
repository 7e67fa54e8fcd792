use clap::Parser;
use log::{info, warn};
use snafu::ErrorCompat;

mod args;
mod pipeline;

fn main() {
    let args = args::Args::parse();

    let env = if args.verbose {
        env_logger::Env::default().default_filter_or("debug")
    } else {
        env_logger::Env::default().default_filter_or("info")
    };
    env_logger::Builder::from_env(env).init();
    info!("args: {:?}", args);

    if let Err(e) = pipeline::run(&args) {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured: {}", e);
        let mut source = std::error::Error::source(&*e);
        while let Some(s) = source {
            eprintln!("  caused by: {}", s);
            source = std::error::Error::source(s);
        }
        if let Some(bt) = ErrorCompat::backtrace(&*e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
