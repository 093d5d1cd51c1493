//! Source parsers and importers
//!
//! Each submodule owns one input format end to end: scanning/parsing the raw
//! files into record structs, then writing them through the store inside one
//! transaction per import unit.

pub mod chatgpt;
pub mod claude;
pub mod memory;
pub mod voice;
