// SPDX-FileCopyrightText: 2024 Gabriel Marcano
//
// SPDX-License-Identifier: BSD-3-Clause

//! Firmware images, as the list of text records handed to the programmer.

use crate::c2prog::{Error, Result};

use log::debug;

use std::fs::File;
use std::io;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

/// An Intel HEX image.
///
/// Records are not parsed or checked here, the programmer does that. Each line of the file is
/// one record, with trailing whitespace and line terminators removed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Image {
    records: Vec<String>,
}

impl Image {
    /// Reads an image from a file.
    ///
    /// # Errors
    /// [Error::ImageOpen] if the file can't be opened, [Error::ImageRead] if it can't be read
    /// as text.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| Error::ImageOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let image = Self::from_reader(BufReader::new(file)).map_err(|source| Error::ImageRead {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Read {} records from {}", image.len(), path.display());
        Ok(image)
    }

    /// Reads an image from any buffered reader.
    ///
    /// Lines may end in `\n`, `\r\n` or a lone `\r`, and endings can be mixed in one file.
    pub fn from_reader(mut reader: impl BufRead) -> io::Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        let records = text
            .replace("\r\n", "\n")
            .replace('\r', "\n")
            .lines()
            .map(|line| line.trim_end().to_string())
            .collect();
        Ok(Self { records })
    }

    /// The records, in file order.
    pub fn records(&self) -> &[String] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the image has no records at all.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    #[test]
    fn trailing_whitespace_is_trimmed() {
        let image = Image::from_reader(":0300300002337A1E \t\r\n:00000001FF\n".as_bytes()).unwrap();
        assert_eq!(image.records(), [":0300300002337A1E", ":00000001FF"]);
    }

    #[test]
    fn leading_whitespace_and_blank_lines_are_kept() {
        let image = Image::from_reader("  LINE1\n\nLINE3".as_bytes()).unwrap();
        assert_eq!(image.records(), ["  LINE1", "", "LINE3"]);
    }

    #[test]
    fn carriage_return_ends_a_line() {
        let image = Image::from_reader("LINE1\rLINE2\rLINE3\r".as_bytes()).unwrap();
        assert_eq!(image.records(), ["LINE1", "LINE2", "LINE3"]);
    }

    #[test]
    fn mixed_line_endings() {
        let image = Image::from_reader("LINE1\r\nLINE2\rLINE3\nLINE4\r\r\nLINE6".as_bytes()).unwrap();
        assert_eq!(
            image.records(),
            ["LINE1", "LINE2", "LINE3", "LINE4", "", "LINE6"]
        );
    }

    #[test]
    fn empty_file_is_an_empty_image() {
        let image = Image::from_reader(&b""[..]).unwrap();
        assert!(image.is_empty());
    }

    #[test]
    fn open_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "LINE1").unwrap();
        writeln!(file, "LINE2").unwrap();
        let image = Image::open(file.path()).unwrap();
        assert_eq!(image.records(), ["LINE1", "LINE2"]);
    }

    #[test]
    fn missing_file_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.hex");
        let err = Image::open(&path).unwrap_err();
        assert!(matches!(&err, Error::ImageOpen { path: p, .. } if *p == path));
        assert!(err.to_string().contains("missing.hex"));
    }

    #[test]
    fn binary_file_is_a_read_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xFF, 0xFE, b'\n']).unwrap();
        assert!(matches!(
            Image::open(file.path()),
            Err(Error::ImageRead { .. })
        ));
    }
}
