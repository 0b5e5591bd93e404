//! Writing of Android compiled resource tables (`resources.arsc`).
//!
//! Build a [`Table`] out of packages, type specs, types and entries, then hand
//! it to [`write_to`], [`to_bytes`] or [`write`].

mod components;
mod error;
mod writer;

pub use components::*;
pub use error::{Error, Result};
pub use writer::{to_bytes, write, write_to, StringEncoding, StringPool, StringPoolBuilder};
