//! PrestaShop release creator.
//!
//! Stages the committed source tree, prunes it, writes the checksum manifest
//! and produces `prestashop_<version>.zip` (or a release directory).

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let exit_code = match prestashop_release::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
