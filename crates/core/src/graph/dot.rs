//! Graphviz DOT emission.

use crate::graph::assemble::{Graph, GraphStyle};

/// Escape text for a quoted DOT string used as a record label.
///
/// Record shapes treat `{ } | < >` as field syntax, so they are escaped too.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '"' | '\\' | '{' | '}' | '|' | '<' | '>' => {
                out.push('\\');
                out.push(ch);
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape text for a quoted DOT id.
fn escape_id(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render `graph` as a `digraph G` document.
pub fn render_dot(graph: &Graph, style: &GraphStyle) -> String {
    let mut out = String::from("digraph G {\n");
    out.push_str(&format!("  graph [rankdir=\"{}\"];\n", escape_id(&style.rankdir)));
    out.push_str(&format!(
        "  node [shape=record, style=filled, color=lightgreen, fillcolor=\"{}\", fontname=\"{}\", fontsize=\"{}\", size=\"6,6\"];\n",
        escape_id(&style.region_fill),
        escape_id(&style.font),
        escape_id(&style.font_size)
    ));
    out.push_str(&format!("  edge [fontname=\"{}\"];\n", escape_id(&style.font)));

    if graph.is_empty() {
        out.push_str("  // no regions or capabilities in this trace\n");
    }

    for node in &graph.nodes {
        out.push_str(&format!(
            "  \"{}\" [label=\"{}\", fillcolor=\"{}\", rank=\"{}\"];\n",
            escape_id(&node.id),
            escape(&node.label),
            escape_id(&node.fill_color),
            escape_id(&node.rank)
        ));
    }
    for edge in &graph.edges {
        out.push_str(&format!(
            "  \"{}\" -> \"{}\" [label=\"{}\", penwidth=\"{}\"];\n",
            escape_id(&edge.src),
            escape_id(&edge.dest),
            escape_id(&edge.label),
            edge.penwidth()
        ));
    }
    out.push_str("}\n");
    out
}
