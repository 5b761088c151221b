//! Service Entry Point
//!
//! `main` does exactly one thing: hand the argument vector, untouched, to
//! the bootstrap routine along with the default composition root. Exits
//! non-zero when boot fails.

use anyhow::Result;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    hexboot::launch(hexboot::scaffold(), args)?;
    Ok(())
}
