use clipfetch_core::logging;

mod cli;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible; a read-only state dir should not stop a batch.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    if let Err(err) = cli::run_from_args().await {
        eprintln!("clipfetch error: {:#}", err);
        std::process::exit(1);
    }
}
