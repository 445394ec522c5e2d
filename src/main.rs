//! Binary entry point for the `template-compress` command-line tool.
//!
//! Parses arguments, initializes logging from `RUST_LOG`, dispatches to the
//! `compress` / `decompress` subcommand, and translates the result into a
//! process exit code (§6): 0 success, 1 ingest/persistence failure, 2 empty
//! input for `compress`.

use clap::Parser;
use template_compress::cli::args::{Cli, Command};
use template_compress::cli::commands::{run_compress, run_decompress};

const DEFAULT_DATABASE_URL: &str = "file://./data";

fn database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let database_url = database_url();
    match cli.command {
        Command::Compress {
            device_id,
            limit,
            save_result,
            visualize,
        } => run_compress(
            &database_url,
            &device_id,
            limit,
            save_result.as_ref(),
            visualize,
        ),
        Command::Decompress {
            compression_id,
            device_id,
            start_date,
            end_date,
            output,
            list,
        } => run_decompress(
            &database_url,
            compression_id,
            device_id.as_deref(),
            start_date.as_deref(),
            end_date.as_deref(),
            output.as_ref(),
            list,
        ),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("template-compress: {e:#}");
            1
        }
    };
    std::process::exit(exit_code);
}
