//! Debug visualization of the pass dependency relation.

use anyhow::Result;
use petgraph::dot::Dot;
use petgraph::graph::DiGraph;

use crate::graph::render_graph::RenderGraph;

/// Implemented for graphs that can render themselves in `dot` format for
/// inspection with GraphViz.
pub trait GraphViz {
    /// Get the string representation of this graph in `dot` format.
    fn dot(&self) -> Result<String>;
}

impl GraphViz for RenderGraph<'_> {
    fn dot(&self) -> Result<String> {
        let mut graph = DiGraph::<&str, &str>::new();
        let nodes: Vec<_> = self
            .pass_infos()
            .iter()
            .map(|pass| graph.add_node(pass.name().as_str()))
            .collect();
        for (from, to, resource) in self.dependency_edges() {
            graph.add_edge(nodes[from], nodes[to], resource.as_str());
        }
        Ok(format!("{}", Dot::new(&graph)))
    }
}
