//! Tree output

use std::fmt::Write as _;

use conntree_model::{ConnectionTree, ConstantId, NodeKind};

/// Indented text listing of `tree`
pub(crate) fn render_tree(tree: &ConnectionTree) -> String {
    let mut out = String::new();
    let root = tree.root();
    let _ = writeln!(out, "{} [{}]", root.name, root.id());
    render_children(tree, tree.root_id(), 1, &mut out);
    out
}

fn render_children(tree: &ConnectionTree, parent: &ConstantId, depth: usize, out: &mut String) {
    for node in tree.children(parent) {
        let indent = "  ".repeat(depth);
        let mut line = match node.kind() {
            NodeKind::Container { expanded } => {
                format!("{indent}{} {}", if *expanded { "-" } else { "+" }, node.name)
            }
            _ => format!(
                "{indent}{} ({:?} {}:{})",
                node.name,
                node.info.protocol,
                node.info.hostname,
                node.info.effective_port()
            ),
        };
        if node.favorite {
            line.push_str(" *favorite");
        }
        if node.please_connect {
            line.push_str(" *connect");
        }
        let _ = writeln!(out, "{line}");
        render_children(tree, node.id(), depth + 1, out);
    }
}

/// JSON of `tree` with passwords removed
pub(crate) fn tree_json(tree: &ConnectionTree) -> serde_json::Result<String> {
    let mut redacted = tree.clone();
    for node in redacted.iter_mut() {
        node.info.password = None;
    }
    serde_json::to_string_pretty(&redacted)
}
