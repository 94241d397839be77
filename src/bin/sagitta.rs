//! Sagitta CLI binary.

use std::process;

use clap::Parser;
use sagitta::cli::{args::SagittaArgs, commands::execute_command};

fn main() {
    let args = SagittaArgs::parse();

    if let Err(e) = execute_command(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
