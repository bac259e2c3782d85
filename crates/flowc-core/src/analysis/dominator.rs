use super::cfg::ControlFlowGraph;
use crate::block::BlockId;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct DominatorTree {
    dominators: HashMap<BlockId, HashSet<BlockId>>,
    idom: HashMap<BlockId, BlockId>,
}

impl DominatorTree {
    /// Iterative dataflow over reverse postorder. Small functions only, so
    /// the quadratic set representation is fine.
    pub fn from_cfg(cfg: &ControlFlowGraph) -> Self {
        let entry = cfg.entry;
        let blocks = Self::reverse_postorder(cfg);

        let mut dominators: HashMap<BlockId, HashSet<BlockId>> = HashMap::new();
        dominators.insert(entry, HashSet::from([entry]));
        let all: HashSet<BlockId> = blocks.iter().copied().collect();
        for &block in &blocks {
            if block != entry {
                dominators.insert(block, all.clone());
            }
        }

        let mut changed = true;
        while changed {
            changed = false;

            for &block in &blocks {
                if block == entry {
                    continue;
                }

                let mut new_dom: Option<HashSet<BlockId>> = None;
                for &pred in cfg.predecessors(block) {
                    if let Some(pred_dom) = dominators.get(&pred) {
                        new_dom = Some(match new_dom {
                            Some(acc) => acc.intersection(pred_dom).copied().collect(),
                            None => pred_dom.clone(),
                        });
                    }
                }

                if let Some(mut new_dom) = new_dom {
                    new_dom.insert(block);
                    if dominators.get(&block) != Some(&new_dom) {
                        dominators.insert(block, new_dom);
                        changed = true;
                    }
                }
            }
        }

        let mut idom = HashMap::new();
        for &block in &blocks {
            if block == entry {
                continue;
            }
            let doms = &dominators[&block];
            for &candidate in doms {
                if candidate == block {
                    continue;
                }
                let is_immediate = doms.iter().all(|&other| {
                    other == block
                        || other == candidate
                        || !dominators
                            .get(&candidate)
                            .map_or(false, |c| c.contains(&other))
                });
                if is_immediate {
                    idom.insert(block, candidate);
                    break;
                }
            }
        }

        Self { dominators, idom }
    }

    pub fn dominates(&self, dominator: BlockId, block: BlockId) -> bool {
        self.dominators
            .get(&block)
            .map(|doms| doms.contains(&dominator))
            .unwrap_or(false)
    }

    pub fn immediate_dominator(&self, block: BlockId) -> Option<BlockId> {
        self.idom.get(&block).copied()
    }

    fn reverse_postorder(cfg: &ControlFlowGraph) -> Vec<BlockId> {
        let mut visited = HashSet::new();
        let mut postorder = Vec::new();
        Self::dfs(cfg, cfg.entry, &mut visited, &mut postorder);
        postorder.reverse();
        postorder
    }

    fn dfs(
        cfg: &ControlFlowGraph,
        block: BlockId,
        visited: &mut HashSet<BlockId>,
        postorder: &mut Vec<BlockId>,
    ) {
        if !visited.insert(block) {
            return;
        }
        for &succ in cfg.successors(block) {
            Self::dfs(cfg, succ, visited, postorder);
        }
        postorder.push(block);
    }
}
