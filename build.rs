//! Renders the `drydock(1)` manual page into `OUT_DIR`.
//!
//! Release packaging collects the page from there; nothing is written into
//! the source tree.

use std::env;
use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli/mod.rs"]
mod cli;

const MAN_PAGE: &str = "drydock.1";
const WATCHED: [&str; 2] = ["build.rs", "src/cli/mod.rs"];

fn main() -> Result<(), Box<dyn Error>> {
    let mut stdout = io::stdout().lock();
    for path in WATCHED {
        writeln!(stdout, "cargo:rerun-if-changed={path}")?;
    }

    let out_dir = env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "OUT_DIR was not set"))?;
    write_man_page(&out_dir)
}

fn write_man_page(out_dir: &Path) -> Result<(), Box<dyn Error>> {
    let mut page = Vec::new();
    Man::new(cli::Cli::command()).render(&mut page)?;
    fs::write(out_dir.join(MAN_PAGE), page)?;
    Ok(())
}
