//! figsync command-line entry point.

use anyhow::Result;

fn main() -> Result<()> {
    figsync::cli::run()
}
