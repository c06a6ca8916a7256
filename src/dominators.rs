use std::{borrow::Cow, fmt::Debug, hash::Hash};

use indexmap::{IndexMap, IndexSet};

pub trait Graph {
    type Node: Copy
        + Clone
        + PartialEq
        + Eq
        + PartialOrd
        + Ord
        + Hash
        + Debug
        + From<usize>
        + Into<usize>;

    fn num_nodes(&self) -> usize;
    fn node(&self, index: usize) -> Option<Self::Node>;
    fn node_index(&self, node: Self::Node) -> usize;
    fn root(&self) -> Self::Node;
    fn successors(&self, block: Self::Node) -> Cow<[Self::Node]>;
    fn predecessors(&self, block: Self::Node) -> Cow<[Self::Node]>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphVisitOrder {
    Pre,
    Post,
}

#[derive(Clone, Debug)]
struct DomBlockData<N> {
    idom_kids: Vec<N>,
    pre_number: usize,
    post_number: usize,
}

impl<N> DomBlockData<N> {
    fn new() -> Self {
        Self {
            idom_kids: vec![],
            pre_number: usize::MAX,
            post_number: usize::MAX,
        }
    }
}

/// Dominator tree of the nodes reachable from the graph root.
///
/// Immediate dominators are found with the iterative algorithm of Cooper, Harvey and Kennedy
/// ("A Simple, Fast Dominance Algorithm"), walking reverse post-order until nothing changes.
/// Dominance queries then use pre/post numbering of the dominator tree, so they are O(1).
/// Nodes that are not reachable from the root are dominated by nothing and dominate nothing.
pub struct Dominators<G: Graph> {
    data: IndexMap<G::Node, DomBlockData<G::Node>>,
}

impl<G: Graph> Dominators<G> {
    pub fn new(graph: &G) -> Self {
        let mut data = IndexMap::new();

        if graph.num_nodes() == 0 {
            return Self { data };
        }

        let rpo = reverse_post_order(graph);
        let mut rpo_number = vec![usize::MAX; graph.num_nodes()];
        for (i, node) in rpo.iter().enumerate() {
            rpo_number[graph.node_index(*node)] = i;
        }

        let mut idom: Vec<Option<usize>> = vec![None; rpo.len()];
        idom[0] = Some(0);

        let intersect = |idom: &[Option<usize>], mut a: usize, mut b: usize| -> usize {
            while a != b {
                while a > b {
                    a = idom[a].unwrap_or(0);
                }
                while b > a {
                    b = idom[b].unwrap_or(0);
                }
            }
            a
        };

        let mut changed = true;
        while changed {
            changed = false;

            for i in 1..rpo.len() {
                let mut new_idom = None;

                for pred in graph.predecessors(rpo[i]).iter() {
                    let p = rpo_number[graph.node_index(*pred)];
                    if p == usize::MAX || idom[p].is_none() {
                        continue;
                    }

                    new_idom = Some(match new_idom {
                        None => p,
                        Some(current) => intersect(&idom, p, current),
                    });
                }

                if new_idom.is_some() && idom[i] != new_idom {
                    idom[i] = new_idom;
                    changed = true;
                }
            }
        }

        for (i, node) in rpo.iter().enumerate() {
            data.entry(*node).or_insert_with(DomBlockData::new);

            if i == 0 {
                continue;
            }

            if let Some(parent) = idom[i] {
                let parent = rpo[parent];
                data.entry(parent)
                    .or_insert_with(DomBlockData::new)
                    .idom_kids
                    .push(*node);
            }
        }

        let mut next_pre_number = 0;
        let mut next_post_number = 0;

        let mut worklist = vec![(graph.root(), GraphVisitOrder::Pre)];

        while let Some((node, order)) = worklist.pop() {
            let Some(entry) = data.get_mut(&node) else {
                continue;
            };

            match order {
                GraphVisitOrder::Pre => {
                    entry.pre_number = next_pre_number;
                    next_pre_number += 1;

                    worklist.push((node, GraphVisitOrder::Post));
                    for kid in entry.idom_kids.iter().copied() {
                        worklist.push((kid, GraphVisitOrder::Pre));
                    }
                }

                GraphVisitOrder::Post => {
                    entry.post_number = next_post_number;
                    next_post_number += 1;
                }
            }
        }

        Self { data }
    }

    pub fn is_reachable(&self, node: G::Node) -> bool {
        self.data.contains_key(&node)
    }

    pub fn strictly_dominates(&self, from: G::Node, to: G::Node) -> bool {
        match (self.data.get(&from), self.data.get(&to)) {
            (Some(from), Some(to)) => {
                to.pre_number > from.pre_number && to.post_number < from.post_number
            }
            _ => false,
        }
    }

    pub fn dominates(&self, from: G::Node, to: G::Node) -> bool {
        (from == to && self.is_reachable(from)) || self.strictly_dominates(from, to)
    }
}

/// Reverse post-order of the nodes reachable from the root.
pub fn reverse_post_order<G: Graph>(graph: &G) -> Vec<G::Node> {
    let mut result = Vec::with_capacity(graph.num_nodes());

    if graph.num_nodes() == 0 {
        return result;
    }

    let mut seen = IndexSet::new();
    let mut worklist = vec![(graph.root(), GraphVisitOrder::Pre)];

    while let Some((node, order)) = worklist.pop() {
        match order {
            GraphVisitOrder::Pre => {
                if !seen.insert(node) {
                    continue;
                }

                worklist.push((node, GraphVisitOrder::Post));
                for succ in graph.successors(node).iter().rev() {
                    if !seen.contains(succ) {
                        worklist.push((*succ, GraphVisitOrder::Pre));
                    }
                }
            }

            GraphVisitOrder::Post => result.push(node),
        }
    }

    result.reverse();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{block::BlockId, function::Function};

    #[test]
    fn diamond_with_unreachable_block() {
        // bb0 -> bb1 | bb2 -> bb3, bb4 -> bb3 is dead
        let mut func = Function::new("diamond");
        let blocks: Vec<BlockId> = (0..5).map(|_| func.add_block(None)).collect();
        func.add_successor(blocks[0], (blocks[1], Default::default()));
        func.add_successor(blocks[0], (blocks[2], Default::default()));
        func.add_successor(blocks[1], (blocks[3], Default::default()));
        func.add_successor(blocks[2], (blocks[3], Default::default()));
        func.add_successor(blocks[4], (blocks[3], Default::default()));

        let dominators = Dominators::new(&func);

        assert_eq!(reverse_post_order(&func)[0], blocks[0]);
        assert!(dominators.strictly_dominates(blocks[0], blocks[3]));
        assert!(!dominators.dominates(blocks[1], blocks[3]));
        assert!(!dominators.dominates(blocks[2], blocks[3]));
        assert!(dominators.dominates(blocks[3], blocks[3]));

        assert!(!dominators.is_reachable(blocks[4]));
        assert!(!dominators.dominates(blocks[4], blocks[4]));
        assert!(!dominators.dominates(blocks[0], blocks[4]));
    }
}
