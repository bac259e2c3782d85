/*! Structural analysis over finished IR.
 *
 * The verifier is the last line of defense against malformed lowering: it walks the CFG,
 * computes dominators, and rejects functions whose blocks, phis or calls break the IR's
 * well-formedness rules.
 */

pub mod cfg;
pub mod dominator;
pub mod verify;

pub use cfg::ControlFlowGraph;
pub use dominator::DominatorTree;
pub use verify::{verify_function, verify_module};
