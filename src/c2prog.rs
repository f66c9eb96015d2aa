// SPDX-FileCopyrightText: 2019 Elektor
// SPDX-FileCopyrightText: 2024 Gabriel Marcano
//
// SPDX-License-Identifier: BSD-3-Clause

//! C2 programmer access routines.

use byteorder::ReadBytesExt;
use byteorder::WriteBytesExt;

use log::{debug, trace};
use serialport::SerialPort;

use std::error;
use std::fmt;
use std::io;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::result;
use std::time::Duration;

pub type Result<T> = result::Result<T, Error>;

/// Baud rate the programmer sketch listens at.
pub const DEFAULT_BAUD: u32 = 115_200;

/// How long to wait for the acknowledgement of a record.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Time the programmer needs to boot after a DTR reset.
pub const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Intel HEX end-of-file record. The programmer resets the C2 target when it sees it.
pub const RESET_RECORD: &str = ":00000001FF";

/// Errors that can be emitted by the programmer and related functions.
#[derive(Debug)]
pub enum Error {
    /// The serial port to the programmer could not be opened.
    PortOpen {
        port: String,
        source: serialport::Error,
    },
    /// The firmware image could not be opened.
    ImageOpen { path: PathBuf, source: io::Error },
    /// The firmware image was opened, but could not be read as text.
    ImageRead { path: PathBuf, source: io::Error },
    Serial(serialport::Error),
    Io(io::Error),
}

impl From<serialport::Error> for Error {
    fn from(err: serialport::Error) -> Self {
        Self::Serial(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PortOpen { port, source } => {
                write!(f, "Could not open serial port: {port} ({source})")
            }
            Self::ImageOpen { path, source } => {
                write!(f, "Invalid filename or file path: {} ({source})", path.display())
            }
            Self::ImageRead { path, source } => {
                write!(f, "Could not read file: {} ({source})", path.display())
            }
            Self::Serial(err) => write!(f, "Serial port error: {err}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::PortOpen { source, .. } | Self::Serial(source) => Some(source),
            Self::ImageOpen { source, .. } | Self::ImageRead { source, .. } | Self::Io(source) => {
                Some(source)
            }
        }
    }
}

/// Fixed parameters of a programming session, decided once at startup.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Baud rate of the serial link.
    pub baud: u32,
    /// Read timeout, bounds the wait for each acknowledgement.
    pub timeout: Duration,
    /// Delay between the DTR reset and the first record.
    pub settle: Duration,
    /// Record sent after the image to release the target.
    pub reset_record: &'static str,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            baud: DEFAULT_BAUD,
            timeout: DEFAULT_TIMEOUT,
            settle: SETTLE_DELAY,
            reset_record: RESET_RECORD,
        }
    }
}

/// Opens the serial port the programmer is attached to.
///
/// # Errors
/// [Error::PortOpen] naming the port if it is missing, busy, or otherwise unusable.
pub fn open(port: &str, settings: &Settings) -> Result<Box<dyn SerialPort>> {
    debug!(
        "Opening {} at {} baud, timeout {:?}",
        port, settings.baud, settings.timeout
    );
    serialport::new(port, settings.baud)
        .timeout(settings.timeout)
        .open()
        .map_err(|source| Error::PortOpen {
            port: port.to_string(),
            source,
        })
}

/// The side channel of the link to the programmer: the DTR line, wired to the programmer's
/// reset, and the receive buffer.
pub trait Link: Read + Write {
    /// Drives the DTR line.
    fn set_dtr(&mut self, level: bool) -> Result<()>;

    /// Drops anything received but not yet read.
    fn discard_input(&mut self) -> Result<()>;
}

impl<T: SerialPort + ?Sized> Link for T {
    fn set_dtr(&mut self, level: bool) -> Result<()> {
        self.write_data_terminal_ready(level)?;
        Ok(())
    }

    fn discard_input(&mut self) -> Result<()> {
        self.clear(serialport::ClearBuffer::Input)?;
        Ok(())
    }
}

/// A trait for sending records to and receiving acknowledgements from the C2 programmer.
///
/// Records are Intel HEX lines sent as-is, without a line terminator. The programmer answers
/// each record with a single byte once it is done with it. The value of the byte carries no
/// meaning, only its arrival does.
pub trait C2Prog: ReadBytesExt + WriteBytesExt {
    /// Sends a record to the programmer.
    fn send_record(&mut self, record: &str) -> Result<()> {
        trace!("Sending record: {}", record);
        self.write_all(record.as_bytes())?;
        self.flush()?;
        Ok(())
    }

    /// Waits for the acknowledgement of the last record.
    ///
    /// Returns `None` if nothing arrived before the read timeout expired.
    ///
    /// # Errors
    /// [Error::Io] on any read failure other than a timeout.
    fn get_ack(&mut self) -> Result<Option<u8>> {
        match self.read_u8() {
            Ok(ack) => {
                trace!("Got ack: {:#04X}", ack);
                Ok(Some(ack))
            }
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::UnexpectedEof
                ) =>
            {
                debug!("No ack: {}", err);
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl<T: ReadBytesExt + WriteBytesExt + ?Sized> C2Prog for T {}
