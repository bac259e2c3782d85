/*! Unified interface for the FlowScript compiler.
 *
 * Single import for everything you need: parsing source into an AST, lowering to IR, and
 * emitting the text listing. Batteries-included entry point for embedding the compiler.
 */

pub use flowc_core as core;
pub use flowc_emit as emit;
pub use flowc_parser as parser;
pub use flowc_transform as transform;

pub use flowc_core::{
    BasicBlock, BlockId, Function, Instruction, Module, Terminator, Type, Value,
};

pub use flowc_emit::FlowIrEmitter;

pub use flowc_parser::parse;

pub use flowc_transform::transform_flowscript_to_ir;
