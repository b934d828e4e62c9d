//! Decoding of Meteosat Second Generation images distributed as xRIT
//! (HRIT/LRIT) segment files.
//!
//! A product is named by a [`ProductName`], found on disk with [`locate`]
//! and turned into an [`Image`] by an [`ImageAssembler`]:
//!
//! ```no_run
//! use xrit::{DecodeOptions, ProductName, decode};
//!
//! let name: ProductName = "/data/hrit/H:MSG2:IR_108:200611141200".parse()?;
//! let image = decode(&name, &DecodeOptions::default())?;
//! println!("{}x{} {}", image.columns(), image.lines(), image.default_file_name());
//! # Ok::<(), xrit::XritError>(())
//! ```

mod address;
mod assembler;
mod cache;
mod calibration;
pub mod codetables;
mod data;
mod error;
pub mod facts;
mod header;
mod helpers;
mod image;
mod locator;
mod projection;
mod prologue;
mod stream;
mod time;
mod writer;

pub use crate::{
    address::*, assembler::*, cache::*, calibration::*, data::*, error::*, header::*, image::*,
    locator::*, projection::*, prologue::*, time::*, writer::*,
};
