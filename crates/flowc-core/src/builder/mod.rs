/*! Fluent API for constructing IR programmatically.
 *
 * Hand-wiring IR structures is tedious and error-prone. The builder handles temp numbering,
 * block sealing and entry-block allocation placement automatically, letting the code
 * generator focus on lowering logic rather than bookkeeping.
 */

pub mod function_builder;

pub use function_builder::FunctionBuilder;
