//! DOT export of operations and relations

use std::fmt::Write;

use crate::features::node_registry::{Graph, RelationSource};

/// Operations clustered per ID node; cyclic relations drawn red and dashed
pub fn to_graphviz(graph: &Graph, label: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph depgraph {{");
    let _ = writeln!(out, "  rankdir=LR;");
    let _ = writeln!(out, "  label={:?};", label);
    let _ = writeln!(out, "  node [shape=box, fontsize=10];");

    if graph.time_source().is_some() {
        let _ = writeln!(out, "  time [label=\"Time Source\", shape=ellipse];");
    }

    for (index, id_node) in graph.id_nodes().iter().enumerate() {
        let _ = writeln!(out, "  subgraph cluster_{} {{", index);
        let _ = writeln!(out, "    label={:?};", format!("{} ({})", id_node.name, id_node.id_type));
        for component in id_node.components() {
            for op in component.operations() {
                let node = graph.operation(*op);
                let style = if node.is_pinned() { ", style=bold" } else { "" };
                let _ = writeln!(
                    out,
                    "    op{} [label={:?}{}];",
                    op.0,
                    format!("{}\n{}", component.node_type(), node.key),
                    style
                );
            }
        }
        let _ = writeln!(out, "  }}");
    }

    for relation in graph.relations() {
        let from = match relation.from {
            RelationSource::TimeSource => "time".to_string(),
            RelationSource::Operation(op) => format!("op{}", op.0),
        };
        let style = if relation.is_cyclic() {
            ", color=red, style=dashed"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "  {} -> op{} [label={:?}{}];",
            from, relation.to.0, relation.name, style
        );
    }
    let _ = writeln!(out, "}}");
    out
}
