//! `braid format` - render a log as text.

use anyhow::{Context, Result};
use braid_core::format::{FormatOptions, Formatter};
use std::path::{Path, PathBuf};

pub fn run(log: &Path, out_dir: Option<&Path>, indent: usize) -> Result<()> {
    let mut formatter = Formatter::new().with_options(FormatOptions {
        region_indent: indent,
        ..FormatOptions::default()
    });

    if let Some(out_dir) = out_dir {
        std::fs::create_dir_all(out_dir)
            .with_context(|| format!("creating output directory {}", out_dir.display()))?;
        let out_dir = out_dir.to_owned();
        formatter = formatter.with_filename_formatter(move |log_path, stream| {
            let stem = log_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "log".to_owned());
            out_dir.join(PathBuf::from(format!("{stem}_{stream}.txt")))
        });
    }

    let written = formatter
        .format(log)
        .with_context(|| format!("formatting {}", log.display()))?;

    for path in &written {
        println!("{}", path.display());
    }
    tracing::info!(files = written.len(), "formatting finished");
    Ok(())
}
