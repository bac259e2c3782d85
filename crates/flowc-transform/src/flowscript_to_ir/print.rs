use super::context::GeneratorContext;
use super::errors::CodegenError;
use super::AstLowerer;
use flowc_core::{FunctionBuilder, FunctionSignature, Parameter, Type, Value};
use flowc_parser::ast::{Node, NodeKind};

impl AstLowerer {
    /// Variadic bridge to the host's printf. The argument is the explicit
    /// expression or, when absent, the current piped value. The format
    /// string is chosen from the argument's IR type; each format lives in
    /// one read-only global, interned by the module.
    pub fn lower_print(
        &mut self,
        node: &Node,
        ctx: &mut GeneratorContext,
        fb: &mut FunctionBuilder,
    ) -> Option<Value> {
        let NodeKind::Print(expr) = &node.kind else {
            return None;
        };
        let line = node.line;

        let argument = match expr {
            Some(expr) => self.lower_expression(expr, ctx, fb),
            None => match ctx.piped_value.clone() {
                Some(piped) => Some(piped),
                None => {
                    ctx.error(CodegenError::PrintWithoutArgument { line });
                    return None;
                }
            },
        };
        let mut argument = argument?;

        self.declare_printf(ctx);

        let arg_ty = fb.value_type(&argument).unwrap_or(Type::I32);
        let format = match arg_ty {
            Type::I1 | Type::I8 | Type::I32 => "%d\n",
            Type::F32 => {
                argument = fb.fpext(argument, Type::F64);
                "%f\n"
            }
            Type::F64 => "%f\n",
            Type::Ptr(ref inner) if **inner == Type::I8 => "%s\n",
            ref other => {
                ctx.error(CodegenError::PrintUnhandledType {
                    line,
                    ty: other.to_string(),
                });
                let format = self.format_string(
                    "Value(type_unhandled_by_print)\n",
                    ".fmt_unknown_ln",
                    ctx,
                    fb,
                );
                return fb.call("printf", vec![format], Type::I32);
            }
        };

        let label = match format {
            "%d\n" => ".fmt_int_ln",
            "%f\n" => ".fmt_float_ln",
            _ => ".fmt_str_ln",
        };
        let format = self.format_string(format, label, ctx, fb);
        fb.call("printf", vec![format, argument], Type::I32)
    }

    /// Declared lazily on first use: `(i8*, ...) -> i32`.
    fn declare_printf(&self, ctx: &mut GeneratorContext) {
        if !ctx.module.is_declared("printf") && ctx.module.get_function("printf").is_none() {
            ctx.module.declare_function(FunctionSignature::variadic(
                "printf",
                vec![Parameter::new("format", Type::I8.pointer_to())],
                Type::I32,
            ));
        }
    }

    fn format_string(
        &self,
        data: &str,
        label: &str,
        ctx: &mut GeneratorContext,
        fb: &mut FunctionBuilder,
    ) -> Value {
        let value = ctx.module.global_string(data, label);
        fb.register_value_type(value.clone(), Type::I8.pointer_to());
        value
    }
}
