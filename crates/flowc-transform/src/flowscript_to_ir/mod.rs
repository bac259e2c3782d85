/*! Convert the FlowScript AST to IR.
 *
 * The generator walks the root statement list inside a synthetic `main`
 * function, maintaining lexical scopes, mutable storage slots and the
 * implicit value threaded by the pipe operator. Function definitions found
 * anywhere become independent module functions; everything else becomes code
 * in `main`.
 */

mod context;
mod control_flow;
mod errors;
mod expression;
mod function;
mod pipeline;
mod print;
mod scope;
mod statements;

pub use context::GeneratorContext;
pub use errors::CodegenError;
pub use scope::{Binding, ScopeId, SymbolTable};

use anyhow::Result;
use flowc_core::analysis::{verify_function, verify_module};
use flowc_core::{FunctionBuilder, FunctionSignature, IrError, Module, Type};
use flowc_parser::ast::Program;

/// The lowering routines, split by concern across this module's files. The
/// struct itself is stateless; all generator state lives in
/// [`GeneratorContext`] and the per-function [`FunctionBuilder`].
pub struct AstLowerer;

impl AstLowerer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AstLowerer {
    fn default() -> Self {
        Self::new()
    }
}

pub struct GeneratedModule {
    pub module: Module,
    pub diagnostics: Vec<CodegenError>,
}

impl GeneratedModule {
    pub fn errors(&self) -> impl Iterator<Item = &CodegenError> {
        self.diagnostics.iter().filter(|d| !d.is_warning())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &CodegenError> {
        self.diagnostics.iter().filter(|d| d.is_warning())
    }
}

/// Lower a parsed program. Always produces a module; whatever went wrong is
/// in the diagnostics. A statement that fails to lower does not abort the
/// compilation, later statements still get a chance.
pub fn generate_program(program: &Program) -> GeneratedModule {
    let mut module = Module::new("flowscript");
    let mut diagnostics = {
        let mut ctx = GeneratorContext::new(&mut module);
        let mut lowerer = AstLowerer::new();

        let mut main = FunctionBuilder::new(FunctionSignature::new("main", Vec::new(), Type::I32));
        let global = ctx.symbols.global();
        let saved_scope = ctx.enter_scope(global);

        lowerer.lower_statement_list(&program.statements, &mut ctx, &mut main);

        if !main.is_terminated() {
            if let Err(e) = main.ret(FunctionBuilder::const_int(0)) {
                ctx.error(CodegenError::Builder {
                    line: 0,
                    message: e.to_string(),
                });
            }
        }

        ctx.leave_scope(saved_scope);

        let function = main.build();
        if let Err(IrError::VerificationFailed(message)) = verify_function(ctx.module, &function) {
            ctx.error(CodegenError::FunctionVerification {
                line: 0,
                name: "main".to_string(),
                message,
            });
        }
        if ctx.module.get_function("main").is_some() {
            ctx.module.replace_function(function);
        } else if let Err(e) = ctx.module.add_function(function) {
            ctx.error(e.into());
        }

        std::mem::take(&mut ctx.diagnostics)
    };

    if let Err(IrError::VerificationFailed(message)) = verify_module(&module) {
        diagnostics.push(CodegenError::ModuleVerification(message));
    }

    GeneratedModule {
        module,
        diagnostics,
    }
}

/// Lower a parsed program, failing if any diagnostic was an error.
pub fn generate(program: &Program) -> Result<Module> {
    let generated = generate_program(program);
    let errors: Vec<CodegenError> = generated.errors().cloned().collect();
    if !errors.is_empty() {
        return Err(CodegenError::Multiple(errors).into());
    }
    Ok(generated.module)
}

/// Parse and lower in one step.
pub fn transform_flowscript_to_ir(source: &str) -> Result<Module> {
    let program = flowc_parser::parse(source)
        .map_err(|e| anyhow::anyhow!("Failed to parse source:\n{}", e))?;
    generate(&program)
}

#[cfg(test)]
mod tests;
