// SPDX-FileCopyrightText: 2024 Gabriel Marcano
//
// SPDX-License-Identifier: BSD-3-Clause

//! This crate contains routines for uploading firmware to Silicon Labs C8051 parts through a
//! serial C2 programmer, such as an Arduino running a C2 bridge sketch.
//!
//! The programmer does all of the C2 work. The host only resets it by toggling DTR, streams the
//! Intel HEX file one record at a time, waits for a single acknowledgement byte after each
//! record, and finally sends the end-of-file record so the programmer releases the target.
//!
//! A binary companion crate is provided, `c2prog`, that drives a programmer attached to a
//! serial port.

pub mod c2prog;
pub mod image;
pub mod upload;

pub use c2prog::*;
pub use image::Image;
pub use upload::{Options, Outcome};
