//! Circular-dependency detection (spec §3 CIRCULAR_DEPENDENCY, §4.5): Tarjan
//! SCC over the resolved IMPORTS and INHERITS_FROM subgraphs, each analyzed
//! independently. A self-loop (a single node with an edge to itself) counts
//! as a cycle of size one.

use std::collections::HashMap;

use codegraph_model::{EdgeType, GraphBatch, QualifiedName, RelationshipRecord};
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;

/// Run Tarjan SCC over `edges` (source, target pairs) and emit one
/// CIRCULAR_DEPENDENCY edge per adjacent pair of nodes in every
/// multi-node strongly connected component.
pub fn detect_cycles(edges: &[(QualifiedName, QualifiedName)]) -> GraphBatch {
    let mut batch = GraphBatch::default();
    if edges.is_empty() {
        return batch;
    }

    fn intern<'a>(s: &'a str, interned: &mut HashMap<&'a str, u32>, by_index: &mut Vec<&'a str>) -> u32 {
        if let Some(&id) = interned.get(s) {
            return id;
        }
        let id = by_index.len() as u32;
        by_index.push(s);
        interned.insert(s, id);
        id
    }

    let mut interned: HashMap<&str, u32> = HashMap::new();
    let mut by_index: Vec<&str> = Vec::new();

    let mut graph: DiGraphMap<u32, ()> = DiGraphMap::new();
    for (src, dst) in edges {
        let a = intern(src.as_str(), &mut interned, &mut by_index);
        let b = intern(dst.as_str(), &mut interned, &mut by_index);
        graph.add_edge(a, b, ());
    }

    for component in tarjan_scc(&graph) {
        let is_cycle = component.len() > 1 || graph.contains_edge(component[0], component[0]);
        if !is_cycle {
            continue;
        }
        for window in component.windows(2) {
            let a = QualifiedName::from_raw(by_index[window[0] as usize].to_string());
            let b = QualifiedName::from_raw(by_index[window[1] as usize].to_string());
            batch.relationships.push(RelationshipRecord::new(EdgeType::CircularDependency, &a, &b));
        }
        if component.len() > 1 {
            let first = QualifiedName::from_raw(by_index[*component.last().unwrap() as usize].to_string());
            let last = QualifiedName::from_raw(by_index[component[0] as usize].to_string());
            batch.relationships.push(RelationshipRecord::new(EdgeType::CircularDependency, &first, &last));
        }
    }

    batch
}
