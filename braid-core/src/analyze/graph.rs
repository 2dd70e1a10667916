//! DOT digraph emission for the node tree.

use super::analyzer::Analyzer;
use super::node::NodeKind;
use super::tree::Tree;
use crate::error::{BraidError, Result};
use std::fmt::Write as _;
use std::path::Path;

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

fn label_of(analyzer: &Analyzer, index: usize) -> String {
    let node = &analyzer.nodes()[index];
    match node.kind {
        NodeKind::Log => "Log".to_owned(),
        NodeKind::Stream => "Stream".to_owned(),
        NodeKind::Region => node
            .format
            .and_then(|key| analyzer.format(key))
            .map(|info| info.descriptor.message.clone())
            .unwrap_or_else(|| "Region".to_owned()),
        NodeKind::Message => node
            .format
            .and_then(|key| analyzer.format(key))
            .map(|info| info.descriptor.message.clone())
            .unwrap_or_default(),
    }
}

fn emit(out: &mut String, analyzer: &Analyzer, tree: Option<&Tree<'_>>, parent: usize, index: usize) {
    let _ = writeln!(out, "  n{parent} -> n{index};");

    if let Some(tree) = tree {
        if !tree.flags()[index].is_enabled() {
            let _ = writeln!(
                out,
                "  n{index} [label=\"{}\", style=filled, fillcolor=red];",
                escape(&label_of(analyzer, index))
            );
            return;
        }
    }

    let _ = writeln!(
        out,
        "  n{index} [label=\"{}\"];",
        escape(&label_of(analyzer, index))
    );

    let node = &analyzer.nodes()[index];
    if let Some(first) = node.first_child {
        for child in first..first + node.child_count {
            emit(out, analyzer, tree, index, child);
        }
    }
}

/// Write the tree rooted at the analyzer's log node as a DOT digraph.
pub(crate) fn write_graph(analyzer: &Analyzer, path: &Path, tree: Option<&Tree<'_>>) -> Result<()> {
    let mut out = String::new();
    out.push_str("digraph log {\n");
    out.push_str("  n0 [label=\"Log\"];\n");

    let root = &analyzer.nodes()[0];
    if let Some(first) = root.first_child {
        for child in first..first + root.child_count {
            emit(&mut out, analyzer, tree, 0, child);
        }
    }

    out.push_str("}\n");
    std::fs::write(path, out).map_err(|e| BraidError::Io {
        path: path.to_owned(),
        cause: e.to_string(),
    })
}
