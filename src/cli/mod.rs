//! Command line interface for building and querying catalog indexes.

pub mod args;
pub mod commands;
