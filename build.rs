//! Renders the relay's man page at build time.
//!
//! The page is generated straight from the clap definition in `src/cli.rs`,
//! so the documented flags cannot drift from the parsed ones.

use std::{fs, path::PathBuf};

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli.rs"]
mod cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=src/cli.rs");

    let out_dir = PathBuf::from("target/generated-man");
    fs::create_dir_all(&out_dir)?;

    let mut page = Vec::new();
    Man::new(cli::Cli::command()).render(&mut page)?;
    fs::write(out_dir.join("lsp-relay.1"), page)?;

    Ok(())
}
