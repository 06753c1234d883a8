use super::{Graph, NodeKind};

/// Formats a `Graph` as a Graphviz DOT document for debugging.
///
/// Nodes keep declaration order; suspending nodes are drawn as boxes and
/// conditional edges carry their condition as the edge label.
pub fn to_dot(graph: &Graph, name: &str) -> String {
    let mut output = format!("digraph \"{}\" {{\n", escape(name));
    output.push_str("    rankdir=TB;\n");

    for node in graph.nodes() {
        let shape = match node.kind {
            NodeKind::Start | NodeKind::End => "ellipse",
            _ if node.suspends() => "box",
            _ => "note",
        };
        let mut label = format!("{}\\n[{}]", escape(&node.id), node.kind);
        if let Some(input) = &node.input {
            label.push_str(&format!("\\n<{}>", input.name()));
        }
        let peripheries = if node.id == graph.start_id() { 2 } else { 1 };
        output.push_str(&format!(
            "    \"{}\" [label=\"{}\", shape={}, peripheries={}];\n",
            escape(&node.id),
            label,
            shape,
            peripheries
        ));
    }

    for edge in graph.edges() {
        let attributes = match &edge.condition {
            Some(condition) => format!(" [label=\"{}\"]", escape(condition)),
            None => String::new(),
        };
        output.push_str(&format!(
            "    \"{}\" -> \"{}\"{};\n",
            escape(&edge.source),
            escape(&edge.target),
            attributes
        ));
    }

    output.push_str("}\n");
    output
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
