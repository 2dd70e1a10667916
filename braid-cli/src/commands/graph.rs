//! `braid graph` - emit the node tree as DOT.

use anyhow::{Context, Result};
use braid_core::Analyzer;
use std::path::{Path, PathBuf};

pub fn run(log: &Path, output: Option<PathBuf>) -> Result<()> {
    let mut analyzer = Analyzer::new();
    analyzer
        .read(log)
        .with_context(|| format!("reading {}", log.display()))?;

    let output = output.unwrap_or_else(|| {
        let mut path = log.as_os_str().to_owned();
        path.push(".dot");
        PathBuf::from(path)
    });

    analyzer
        .write_graph(&output, None)
        .with_context(|| format!("writing {}", output.display()))?;

    println!("{}", output.display());
    Ok(())
}
