/*! Lowering from the FlowScript AST to IR.
 *
 * The parser gives you an AST, but that's just syntax. This crate walks the tree and builds
 * IR that captures semantics: lexical scopes become storage slots, pipelines become threaded
 * arguments, and conditionals, short-circuit operators and bounded loops become explicit
 * control flow over basic blocks.
 */

pub mod flowscript_to_ir;

pub use flowscript_to_ir::{
    generate, generate_program, transform_flowscript_to_ir, CodegenError, GeneratedModule,
};
