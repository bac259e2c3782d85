use super::cfg::ControlFlowGraph;
use super::dominator::DominatorTree;
use crate::block::{BlockId, Terminator};
use crate::function::Function;
use crate::instructions::Instruction;
use crate::module::Module;
use crate::values::{TempId, Value};
use crate::{IrError, Result};
use std::collections::{HashMap, HashSet};

/// Well-formedness rules enforced on a finished function:
///
/// - every block carries exactly one terminator, and it is valid;
/// - branch targets exist;
/// - stack allocations live only in the entry block;
/// - phis lead their block and their incoming blocks are exactly the
///   predecessors;
/// - calls resolve to a known callee and match its signature;
/// - each temp is defined once, and every use is dominated by its
///   definition.
pub fn verify_function(module: &Module, function: &Function) -> Result<()> {
    let mut problems = Vec::new();
    let name = function.name();
    let body = &function.body;

    for (block_id, block) in &body.blocks {
        if !block.is_terminated() {
            problems.push(format!("{}: {} has no terminator", name, block_id));
        }
        for target in block.successors() {
            if !body.blocks.contains_key(&target) {
                problems.push(format!(
                    "{}: {} branches to unknown {}",
                    name, block_id, target
                ));
            }
        }
        if *block_id != body.entry_block {
            for inst in &block.instructions {
                if inst.is_alloca() {
                    problems.push(format!(
                        "{}: allocation outside entry block in {}",
                        name, block_id
                    ));
                }
            }
        }
        let mut seen_non_phi = false;
        for inst in &block.instructions {
            if inst.is_phi() {
                if seen_non_phi {
                    problems.push(format!(
                        "{}: phi after non-phi instruction in {}",
                        name, block_id
                    ));
                }
            } else {
                seen_non_phi = true;
            }
        }
        match &block.terminator {
            Terminator::Return(Some(_)) if function.signature.ret.is_void() => {
                problems.push(format!("{}: value returned from void function", name));
            }
            Terminator::Return(None) if !function.signature.ret.is_void() => {
                problems.push(format!(
                    "{}: missing return value in {} (function returns {})",
                    name, block_id, function.signature.ret
                ));
            }
            _ => {}
        }
    }

    let cfg = ControlFlowGraph::from_body(body);
    let reachable = cfg.reachable_blocks();
    let dom = DominatorTree::from_cfg(&cfg);

    for (block_id, block) in &body.blocks {
        if !reachable.contains(block_id) {
            continue;
        }
        for inst in &block.instructions {
            if let Instruction::Phi { incomings, .. } = inst {
                let preds: HashSet<BlockId> = cfg.predecessors(*block_id).iter().copied().collect();
                let incoming: HashSet<BlockId> = incomings.iter().map(|(b, _)| *b).collect();
                if incoming != preds {
                    problems.push(format!(
                        "{}: phi in {} covers {:?} but predecessors are {:?}",
                        name, block_id, incoming, preds
                    ));
                }
            }
            if let Instruction::Call { callee, args, .. } = inst {
                match module.signature_of(callee) {
                    None => {
                        problems.push(format!("{}: call to unknown function {}", name, callee));
                    }
                    Some(sig) => {
                        let fixed = sig.params.len();
                        let ok = if sig.is_variadic {
                            args.len() >= fixed
                        } else {
                            args.len() == fixed
                        };
                        if !ok {
                            problems.push(format!(
                                "{}: call to {} passes {} arguments, signature has {}",
                                name,
                                callee,
                                args.len(),
                                fixed
                            ));
                        }
                    }
                }
            }
        }
    }

    verify_dominance(function, &dom, &reachable, &mut problems);

    if problems.is_empty() {
        Ok(())
    } else {
        Err(IrError::VerificationFailed(problems.join("; ")))
    }
}

pub fn verify_module(module: &Module) -> Result<()> {
    let mut problems = Vec::new();
    for function in module.functions.values() {
        if let Err(IrError::VerificationFailed(msg)) = verify_function(module, function) {
            problems.push(msg);
        }
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(IrError::VerificationFailed(problems.join("; ")))
    }
}

/// Location of a temp definition inside a function body.
struct DefSite {
    block: BlockId,
    index: usize,
}

fn verify_dominance(
    function: &Function,
    dom: &DominatorTree,
    reachable: &HashSet<BlockId>,
    problems: &mut Vec<String>,
) {
    let name = function.name();
    let mut defs: HashMap<TempId, DefSite> = HashMap::new();

    for (block_id, block) in &function.body.blocks {
        for (index, inst) in block.instructions.iter().enumerate() {
            if let Some(Value::Temp(id)) = inst.result() {
                if defs
                    .insert(
                        *id,
                        DefSite {
                            block: *block_id,
                            index,
                        },
                    )
                    .is_some()
                {
                    problems.push(format!("{}: {} defined more than once", name, id));
                }
            }
        }
    }

    let dominated = |def: &DefSite, use_block: BlockId, use_index: usize| -> bool {
        if def.block == use_block {
            def.index < use_index
        } else {
            dom.dominates(def.block, use_block)
        }
    };

    for (block_id, block) in &function.body.blocks {
        if !reachable.contains(block_id) {
            continue;
        }
        let end = block.instructions.len();

        for (index, inst) in block.instructions.iter().enumerate() {
            if let Instruction::Phi { incomings, .. } = inst {
                // A phi uses each incoming value at the end of the matching
                // predecessor, not at its own position.
                for (pred, value) in incomings {
                    if let Value::Temp(id) = value {
                        match defs.get(id) {
                            Some(def) => {
                                if def.block != *pred && !dom.dominates(def.block, *pred) {
                                    problems.push(format!(
                                        "{}: phi incoming {} from {} not dominated by its definition",
                                        name, id, pred
                                    ));
                                }
                            }
                            None => problems.push(format!("{}: use of undefined {}", name, id)),
                        }
                    }
                }
                continue;
            }

            for operand in inst.operands() {
                if let Value::Temp(id) = operand {
                    match defs.get(id) {
                        Some(def) => {
                            if !dominated(def, *block_id, index) {
                                problems.push(format!(
                                    "{}: use of {} in {} not dominated by its definition",
                                    name, id, block_id
                                ));
                            }
                        }
                        None => problems.push(format!("{}: use of undefined {}", name, id)),
                    }
                }
            }
        }

        let terminator_uses: Vec<&Value> = match &block.terminator {
            Terminator::Branch { condition, .. } => vec![condition],
            Terminator::Return(Some(value)) => vec![value],
            _ => Vec::new(),
        };
        for value in terminator_uses {
            if let Value::Temp(id) = value {
                match defs.get(id) {
                    Some(def) => {
                        if !dominated(def, *block_id, end) {
                            problems.push(format!(
                                "{}: terminator of {} uses {} before its definition",
                                name, block_id, id
                            ));
                        }
                    }
                    None => problems.push(format!("{}: use of undefined {}", name, id)),
                }
            }
        }
    }
}
