// CLASSIFICATION: COMMUNITY
// Filename: main.rs v1.1
// Date Modified: 2026-10-19
// Author: Lukas Bower

//! Entry point for the `lkdc` sample driver.

use clap::Parser;
use lkdc::binlib::lkdc_main::{self, Cli};

fn main() {
    env_logger::init();
    if let Err(err) = lkdc_main::run(Cli::parse()) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
