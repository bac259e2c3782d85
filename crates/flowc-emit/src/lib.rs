/*! Turn generated IR into text on disk.
 *
 * The driver compiles a source file and leaves a readable `.ll`-style listing next to it.
 * This crate renders a module into that listing and knows where the listing belongs.
 */

pub mod config;
pub mod emitter;
pub mod output;

pub use config::EmitConfig;
pub use emitter::{EmitContext, FlowIrEmitter};
pub use output::{ll_path_for, write_next_to_source};
