use super::context::GeneratorContext;
use super::errors::CodegenError;
use super::scope::Binding;
use super::AstLowerer;
use flowc_core::analysis::verify_function;
use flowc_core::{
    FunctionBuilder, FunctionSignature, IrError, Parameter, Type, Value,
};
use flowc_parser::ast::{Node, NodeKind};

impl AstLowerer {
    /// Lower a function definition into an independent module function.
    ///
    /// Parameters and the return value are all the scalar integer for now.
    /// The function handle lands in the global scope no matter where the
    /// definition appears textually, and the body's scope is parented at the
    /// global scope, never the scope of the code around the definition.
    pub fn lower_function_def(
        &mut self,
        node: &Node,
        ctx: &mut GeneratorContext,
    ) -> Option<Value> {
        let NodeKind::FunctionDef { name, params, body } = &node.kind else {
            return None;
        };

        let signature = FunctionSignature::new(
            name.clone(),
            params
                .iter()
                .map(|p| Parameter::new(p.clone(), Type::I32))
                .collect(),
            Type::I32,
        );

        // Register the signature and the global binding up front so the body
        // can call the function recursively.
        ctx.module.declare_function(signature.clone());
        ctx.symbols.define(
            ctx.symbols.global(),
            name.clone(),
            Binding::function(name, Type::Function(Box::new(signature.function_type()))),
        );

        let mut fb = FunctionBuilder::new(signature);
        let global = ctx.symbols.global();
        let saved_scope = ctx.enter_scope(global);

        // Spill every incoming parameter to a stack slot so the body can
        // treat parameters and locals uniformly.
        for (index, param_name) in params.iter().enumerate() {
            if let Some(incoming) = fb.param(index) {
                let slot = fb.entry_alloca(Type::I32);
                fb.store(slot.clone(), incoming);
                ctx.define(param_name.as_str(), Binding::param(slot, Type::I32));
            }
        }

        self.lower_statement_list(body, ctx, &mut fb);

        if !fb.is_terminated() {
            let result = if fb.signature().ret.is_void() {
                fb.ret_void()
            } else {
                fb.ret(FunctionBuilder::const_int(0))
            };
            self.seal(result, node.line, ctx);
        }

        ctx.leave_scope(saved_scope);

        let function = fb.build();
        if let Err(IrError::VerificationFailed(message)) = verify_function(ctx.module, &function) {
            // Non-fatal: the module may still be emitted.
            ctx.error(CodegenError::FunctionVerification {
                line: node.line,
                name: name.clone(),
                message,
            });
        }
        ctx.module.replace_function(function);

        Some(Value::FunctionRef(name.clone()))
    }

    /// Lower a direct call. When a pipeline threads a value in, it becomes
    /// the first actual argument and counts toward the arity check.
    pub fn lower_call(
        &mut self,
        name: &str,
        args: &[Node],
        piped: Option<Value>,
        line: u32,
        ctx: &mut GeneratorContext,
        fb: &mut FunctionBuilder,
    ) -> Option<Value> {
        // Functions live in a flat namespace: resolution consults the global
        // scope only.
        if ctx.lookup_global(name).map(|b| b.is_function()) != Some(true) {
            ctx.error(CodegenError::UnknownFunction {
                line,
                name: name.to_string(),
            });
            return None;
        }
        let (expected, ret) = match ctx.module.signature_of(name) {
            Some(sig) => (sig.params.len(), sig.ret.clone()),
            None => {
                ctx.error(CodegenError::UnknownFunction {
                    line,
                    name: name.to_string(),
                });
                return None;
            }
        };

        let actual = args.len() + usize::from(piped.is_some());
        if actual != expected {
            ctx.error(CodegenError::ArityMismatch {
                line,
                name: name.to_string(),
                expected,
                actual,
            });
            return None;
        }

        let mut values = Vec::with_capacity(actual);
        if let Some(piped) = piped {
            values.push(piped);
        }
        for arg in args {
            values.push(self.lower_expression(arg, ctx, fb)?);
        }

        fb.call(name, values, ret)
    }
}
