use anyhow::{Context, Result};
use clap_complete::{generate, Shell};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use flowblend_cli::build_cli_command;

const BIN_NAME: &str = "flowblend";

pub fn handle(shell: Shell, out: Option<&Path>) -> Result<()> {
    let mut sink: Box<dyn Write> = match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = File::create(path)
                .with_context(|| format!("creating completion file {}", path.display()))?;
            Box::new(file)
        }
        None => Box::new(io::stdout()),
    };
    generate(shell, &mut build_cli_command(), BIN_NAME, &mut sink);
    sink.flush()?;
    if let Some(path) = out {
        println!("Wrote {shell:?} completion to {}", path.display());
    }
    Ok(())
}
