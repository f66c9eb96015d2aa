// SPDX-FileCopyrightText: 2019 Elektor
// SPDX-FileCopyrightText: 2024 Gabriel Marcano
//
// SPDX-License-Identifier: BSD-3-Clause

//! # c2prog
//!
//! This CLI uploads Intel HEX files to Silicon Labs C8051 parts through a serial C2 programmer.
//! The programmer is reset through DTR, then sent the file one record at a time. Each record must
//! be acknowledged before the next is sent. The end-of-file record is always sent last so the
//! programmer resets the target, even if the upload was cut short.

use c2_tools::upload;
use c2_tools::{Error, Options, Outcome, Settings, DEFAULT_BAUD};

use clap::Parser;
use log::{error, info, LevelFilter};

use std::io;
use std::num;
use std::path::PathBuf;
use std::process::ExitCode;
use std::result;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about = "HEX file uploader for C2 programmers.", long_about = None)]
struct Cli {
    /// Serial port name the C2 programmer is attached to.
    port: String,
    /// Input file in Intel HEX format.
    file: PathBuf,
    #[command(flatten)]
    /// Echo every record and acknowledgement; repeat to raise the log level.
    verbose: clap_verbosity_flag::Verbosity,
    #[arg(short, long, default_value_t = DEFAULT_BAUD)]
    /// The baud rate the programmer listens at.
    baud: u32,
    #[arg(short, long, value_parser = parse_duration, default_value = "5000")]
    /// How long to wait for each acknowledgement, in milliseconds.
    timeout: Duration,
}

fn parse_duration(arg: &str) -> result::Result<Duration, num::ParseIntError> {
    let milliseconds = arg.parse()?;
    Ok(Duration::from_millis(milliseconds))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    info!(
        "Script version: {}.{}",
        env!("CARGO_PKG_VERSION_MAJOR"),
        env!("CARGO_PKG_VERSION_MINOR")
    );

    let settings = Settings {
        baud: cli.baud,
        timeout: cli.timeout,
        ..Settings::default()
    };
    // Any -v asks for the echo.
    let options = Options {
        echo: cli.verbose.log_level_filter() > LevelFilter::Error,
        progress: true,
    };

    let result = upload::run(
        &cli.port,
        &cli.file,
        &settings,
        options,
        &mut io::stdout().lock(),
    );
    let status = match result {
        Ok(Outcome::Complete { .. }) => ExitCode::SUCCESS,
        Ok(Outcome::TimedOut { record }) => {
            error!("Upload aborted at record {record}, the target was only partially programmed");
            ExitCode::FAILURE
        }
        Err(error) => {
            match &error {
                Error::PortOpen { .. } => {
                    error!("{error}. Verify the right serial port is selected.")
                }
                Error::ImageOpen { .. } | Error::ImageRead { .. } => error!("{error}"),
                Error::Serial(_) | Error::Io(_) => {
                    error!("{error}");
                    error!("Upload failed");
                }
            }
            ExitCode::FAILURE
        }
    };

    println!("Done.");
    status
}
