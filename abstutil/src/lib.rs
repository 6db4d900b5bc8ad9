//! Small utilities shared by the marking crates: logging setup, JSON file IO, and a few
//! collections.

#[macro_use]
extern crate log;

mod collections;
mod io;
pub mod logger;

pub use crate::collections::{wraparound_get, MultiMap};
pub use crate::io::{deserialize_btreemap, read_json, serialize_btreemap, to_json, write_json};
