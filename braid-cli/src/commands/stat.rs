//! `braid stat` - node statistics of a log.

use anyhow::{Context, Result};
use braid_core::{Analyzer, NodeKind};
use std::path::Path;

pub fn run(log: &Path) -> Result<()> {
    let mut analyzer = Analyzer::new();
    analyzer
        .read(log)
        .with_context(|| format!("reading {}", log.display()))?;

    let nodes = analyzer.nodes();
    let regions = nodes
        .iter()
        .filter(|node| node.kind == NodeKind::Region)
        .count();
    let messages = nodes
        .iter()
        .filter(|node| node.kind == NodeKind::Message)
        .count();

    println!("streams:  {}", analyzer.stream_count());
    println!("regions:  {regions}");
    println!("messages: {messages}");
    println!("nodes:    {}", nodes.len());
    println!("ordered:  {}", analyzer.message_order());

    for (i, stream) in nodes
        .iter()
        .filter(|node| node.kind == NodeKind::Stream)
        .enumerate()
    {
        println!("stream {i}: {} direct children", stream.child_count);
    }
    Ok(())
}
