/*! Core IR types and builders for the FlowScript compiler.
 *
 * Code generation needs a structured target where control flow and data flow are explicit.
 * This crate provides the building blocks to construct, inspect and verify the SSA-shaped IR
 * that the AST lowering produces: typed values, basic blocks with single terminators, and a
 * module of functions.
 */

pub mod analysis;
pub mod block;
pub mod builder;
pub mod format;
pub mod function;
pub mod instructions;
pub mod ir_persist;
pub mod module;
pub mod types;
pub mod values;

pub use block::{BasicBlock, BlockId, Terminator};
pub use builder::FunctionBuilder;
pub use function::{Function, FunctionBody, FunctionSignature, Parameter};
pub use instructions::{IcmpPred, Instruction};
pub use module::{GlobalVariable, Module, StringConstant};
pub use types::{FunctionType, Type};
pub use values::{Constant, GlobalId, ParamId, TempId, Value};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IrError {
    #[error("Type error: {0}")]
    TypeError(String),
    #[error("Invalid instruction: {0}")]
    InvalidInstruction(String),
    #[error("Builder error: {0}")]
    BuilderError(String),
    #[error("Function not found: {0}")]
    FunctionNotFound(String),
    #[error("Verification failed: {0}")]
    VerificationFailed(String),
}

pub type Result<T> = std::result::Result<T, IrError>;

#[cfg(test)]
mod tests;
