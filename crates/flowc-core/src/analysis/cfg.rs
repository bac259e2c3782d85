use crate::block::BlockId;
use crate::function::FunctionBody;
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    pub edges: HashMap<BlockId, Vec<BlockId>>,
    pub reverse_edges: HashMap<BlockId, Vec<BlockId>>,
    pub entry: BlockId,
}

impl ControlFlowGraph {
    pub fn from_body(body: &FunctionBody) -> Self {
        let mut edges = HashMap::new();
        let mut reverse_edges: HashMap<BlockId, Vec<BlockId>> = HashMap::new();

        for (block_id, block) in &body.blocks {
            let successors = block.successors();
            edges.insert(*block_id, successors.clone());

            for succ in successors {
                reverse_edges.entry(succ).or_default().push(*block_id);
            }
        }

        Self {
            edges,
            reverse_edges,
            entry: body.entry_block,
        }
    }

    pub fn predecessors(&self, block: BlockId) -> &[BlockId] {
        self.reverse_edges
            .get(&block)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn successors(&self, block: BlockId) -> &[BlockId] {
        self.edges.get(&block).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn reachable_blocks(&self) -> HashSet<BlockId> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(self.entry);

        while let Some(current) = queue.pop_front() {
            if visited.insert(current) {
                for &succ in self.successors(current) {
                    queue.push_back(succ);
                }
            }
        }

        visited
    }

    pub fn is_reachable(&self, block: BlockId) -> bool {
        self.reachable_blocks().contains(&block)
    }
}
