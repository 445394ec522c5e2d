//! Command-line argument parsing for the `template-compress` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "template-compress",
    version,
    about = "Lossy, template-based compression for time-series sensor streams"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read samples for a device, compress them, and persist the record.
    Compress {
        #[arg(long = "device-id")]
        device_id: String,
        /// Maximum number of samples to read from the ingest store.
        #[arg(long, default_value_t = usize::MAX)]
        limit: usize,
        /// Write the compressed record as pretty-printed JSON to this file.
        #[arg(long = "save-result", value_name = "FILE")]
        save_result: Option<PathBuf>,
        /// Print a short textual summary of the run.
        #[arg(long)]
        visualize: bool,
    },
    /// Locate one or more records and emit decoded blocks.
    Decompress {
        #[arg(long = "compression-id")]
        compression_id: Option<u64>,
        #[arg(long = "device-id")]
        device_id: Option<String>,
        #[arg(long = "start-date")]
        start_date: Option<String>,
        #[arg(long = "end-date")]
        end_date: Option<String>,
        /// Write decoded (timestamp, value) pairs to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Print record metadata only; do not decode.
        #[arg(long)]
        list: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compress_subcommand() {
        let cli = Cli::parse_from([
            "template-compress",
            "compress",
            "--device-id",
            "sensor-1",
            "--limit",
            "500",
            "--save-result",
            "out/record.json",
        ]);
        match cli.command {
            Command::Compress {
                device_id,
                limit,
                save_result,
                visualize,
            } => {
                assert_eq!(device_id, "sensor-1");
                assert_eq!(limit, 500);
                assert_eq!(save_result, Some(PathBuf::from("out/record.json")));
                assert!(!visualize);
            }
            _ => panic!("expected Compress"),
        }
    }

    #[test]
    fn save_result_defaults_to_not_saving() {
        let cli = Cli::parse_from([
            "template-compress",
            "compress",
            "--device-id",
            "sensor-1",
        ]);
        match cli.command {
            Command::Compress { save_result, .. } => assert_eq!(save_result, None),
            _ => panic!("expected Compress"),
        }
    }

    #[test]
    fn parses_decompress_with_date_range() {
        let cli = Cli::parse_from([
            "template-compress",
            "decompress",
            "--device-id",
            "sensor-1",
            "--start-date",
            "2024-01-01",
            "--end-date",
            "2024-01-02",
        ]);
        match cli.command {
            Command::Decompress {
                device_id,
                start_date,
                end_date,
                ..
            } => {
                assert_eq!(device_id.as_deref(), Some("sensor-1"));
                assert_eq!(start_date.as_deref(), Some("2024-01-01"));
                assert_eq!(end_date.as_deref(), Some("2024-01-02"));
            }
            _ => panic!("expected Decompress"),
        }
    }

    #[test]
    fn parses_decompress_list_flag() {
        let cli = Cli::parse_from(["template-compress", "decompress", "--list"]);
        match cli.command {
            Command::Decompress { list, .. } => assert!(list),
            _ => panic!("expected Decompress"),
        }
    }
}
