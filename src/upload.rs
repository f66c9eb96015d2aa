// SPDX-FileCopyrightText: 2019 Elektor
// SPDX-FileCopyrightText: 2024 Gabriel Marcano
//
// SPDX-License-Identifier: BSD-3-Clause

//! Upload sequence: reset the programmer, stream the image, reset the target.

use crate::c2prog::{self, C2Prog, Link, Result, Settings};
use crate::image::Image;

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};

use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::Instant;

/// Operator facing choices for an upload.
#[derive(Clone, Copy, Debug, Default)]
pub struct Options {
    /// Echo every record sent and every acknowledgement received.
    pub echo: bool,
    /// Show a progress bar while streaming.
    pub progress: bool,
}

/// How the streaming of an image ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Every record was acknowledged.
    Complete { records: usize },
    /// The record with this 1-based number was sent but never acknowledged. Later records were
    /// not sent.
    TimedOut { record: usize },
}

/// Resets the programmer through DTR and waits for it to come up.
pub fn phase_connect(
    link: &mut (impl Link + ?Sized),
    settings: &Settings,
    console: &mut impl Write,
) -> Result<()> {
    info!("Phase: Connect");

    link.set_dtr(false)?;
    link.set_dtr(true)?;
    writeln!(console, "Connecting...")?;
    thread::sleep(settings.settle);

    // Whatever the bootloader printed while starting up is not an ack.
    link.discard_input()?;
    debug!("Discarded boot output");

    Ok(())
}

/// Sends the image one record at a time, waiting for the ack of each before the next.
///
/// Stops at the first record whose ack does not arrive within the read timeout.
pub fn phase_stream(
    link: &mut (impl C2Prog + ?Sized),
    image: &Image,
    options: Options,
    console: &mut impl Write,
) -> Result<Outcome> {
    info!("Phase: Stream");

    let progress_bar = if options.progress && !options.echo {
        ProgressBar::new(image.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    if let Ok(style) = ProgressStyle::with_template("{bar:^20.red/white.bold} {percent:>3}%") {
        progress_bar.set_style(style);
    }
    progress_bar.tick();

    for (index, record) in image.records().iter().enumerate() {
        if options.echo {
            writeln!(console, "{record}")?;
        }
        link.send_record(record)?;

        let Some(ack) = link.get_ack()? else {
            progress_bar.abandon();
            warn!("No ack for record {}", index + 1);
            writeln!(console, "Operation timed out, aborting")?;
            return Ok(Outcome::TimedOut { record: index + 1 });
        };
        if options.echo {
            writeln!(console, "{}", String::from_utf8_lossy(&[ack]))?;
        }
        progress_bar.set_position(index as u64 + 1);
    }
    progress_bar.finish();

    Ok(Outcome::Complete {
        records: image.len(),
    })
}

/// Sends the reset record. No ack is expected.
pub fn phase_reset(link: &mut (impl C2Prog + ?Sized), settings: &Settings) -> Result<()> {
    info!("Phase: Reset");
    link.send_record(settings.reset_record)
}

/// Streams the image and then resets the target, whether or not the stream got through.
///
/// # Errors
/// Any link failure during streaming, returned after the reset record has been attempted.
pub fn upload(
    link: &mut (impl C2Prog + ?Sized),
    image: &Image,
    settings: &Settings,
    options: Options,
    console: &mut impl Write,
) -> Result<Outcome> {
    let start_time = Instant::now();
    let streamed = phase_stream(&mut *link, image, options, console);
    if let Err(error) = phase_reset(&mut *link, settings) {
        warn!("Failed to send reset record: {error}");
    }

    let outcome = streamed?;
    if let Outcome::Complete { records } = outcome {
        info!(
            "Sent {} records in {:.2} s",
            records,
            start_time.elapsed().as_secs_f64()
        );
    }
    Ok(outcome)
}

/// Runs a full programming session over an already open link.
///
/// The image is only read once the programmer has been reset. Nothing is written to the link
/// if the image can't be read.
pub fn run_with(
    link: &mut (impl Link + ?Sized),
    file: &Path,
    settings: &Settings,
    options: Options,
    console: &mut impl Write,
) -> Result<Outcome> {
    phase_connect(&mut *link, settings, console)?;
    let image = Image::open(file)?;
    upload(link, &image, settings, options, console)
}

/// Runs a full programming session on the named serial port.
///
/// # Errors
/// [c2prog::Error::PortOpen] before anything else is touched if the port can't be opened.
pub fn run(
    port: &str,
    file: &Path,
    settings: &Settings,
    options: Options,
    console: &mut impl Write,
) -> Result<Outcome> {
    let mut serial = c2prog::open(port, settings)?;
    run_with(&mut *serial, file, settings, options, console)
}
