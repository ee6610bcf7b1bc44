use clap::Parser;
use log::{debug, info};

use snafu::ErrorCompat;
use survey_report::report::config_reader::{read_config, ReportConfig};
use survey_report::report::{run_files, ReportResult};

mod args;

fn run(args: &args::Args) -> ReportResult<()> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => ReportConfig::default(),
    };
    if args.keep_going {
        config.isolate_failures = true;
    }
    debug!("main: config: {:?}", config);

    let written = run_files(&args.inputs, &args.out, &config)?;
    info!("main: done");
    println!("{}", written.display());
    Ok(())
}

fn main() {
    let args = args::Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    debug!("main: args: {:?}", args);

    if let Err(e) = run(&args) {
        eprintln!("An error occurred: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("{}", bt);
        }
        std::process::exit(1);
    }
}
