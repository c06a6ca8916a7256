use indexmap::{IndexMap, IndexSet};

use crate::dominators::{Dominators, Graph};

#[derive(Debug)]
pub struct NaturalLoop<G: Graph> {
    body: IndexSet<G::Node>,
}

impl<G: Graph> NaturalLoop<G> {
    /// The header comes first, followed by the rest of the body in discovery order.
    pub fn body(&self) -> impl Iterator<Item = G::Node> + '_ {
        self.body.iter().copied()
    }
}

#[derive(Debug)]
pub struct NaturalLoops<G: Graph> {
    loops: Vec<NaturalLoop<G>>,
    depths: IndexMap<G::Node, usize>,
}

impl<G: Graph> NaturalLoops<G> {
    pub fn new(graph: &G, dominators: &Dominators<G>) -> Self {
        // Classic dominator-based loop finder: an edge A -> B where B dominates A makes B a
        // loop header and A a backward branching block. All back edges into the same header
        // form one loop. The body is everything that reaches a footer without passing through
        // the header.
        let mut headers: IndexMap<G::Node, Vec<G::Node>> = IndexMap::new();

        for block_index in 0..graph.num_nodes() {
            let Some(header) = graph.node(block_index) else {
                continue;
            };

            for &footer in graph.predecessors(header).iter() {
                if dominators.dominates(header, footer) {
                    headers.entry(header).or_default().push(footer);
                }
            }
        }

        let mut loops = Vec::with_capacity(headers.len());

        for (header, footers) in headers {
            let mut body = IndexSet::new();
            body.insert(header);

            let mut worklist = vec![];
            for footer in footers {
                if body.insert(footer) {
                    worklist.push(footer);
                }
            }

            while let Some(block) = worklist.pop() {
                for &predecessor in graph.predecessors(block).iter() {
                    if !dominators.is_reachable(predecessor) {
                        continue;
                    }

                    if body.insert(predecessor) {
                        worklist.push(predecessor);
                    }
                }
            }

            loops.push(NaturalLoop { body });
        }

        let mut depths = IndexMap::new();
        for l in &loops {
            for block in l.body() {
                *depths.entry(block).or_insert(0) += 1;
            }
        }

        Self { loops, depths }
    }

    pub fn num_loops(&self) -> usize {
        self.loops.len()
    }

    /// Number of loops containing `block`. Zero for straight-line code.
    pub fn loop_depth(&self, block: G::Node) -> usize {
        self.depths.get(&block).copied().unwrap_or(0)
    }
}
