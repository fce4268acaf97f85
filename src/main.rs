// src/main.rs

use watchy::errors::WatchyError;
use watchy::report::report_error;
use watchy::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level, args.silent, args.no_color) {
        eprintln!("watchy error: {err:?}");
        std::process::exit(1);
    }

    if let Err(err) = run(args).await {
        if let Some(WatchyError::MissingCommand) = err.downcast_ref::<WatchyError>() {
            eprintln!("{}", cli::usage());
        }
        report_error(format!("{err:#}"));
        std::process::exit(1);
    }
}
