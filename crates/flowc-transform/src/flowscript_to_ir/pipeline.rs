use super::context::GeneratorContext;
use super::errors::CodegenError;
use super::AstLowerer;
use flowc_core::{FunctionBuilder, Value};
use flowc_parser::ast::{Node, NodeKind};

impl AstLowerer {
    /// The pipe threads the left value into the right operator. Dispatch by
    /// the right operator's shape:
    ///
    /// - call: the left value becomes an explicit leading argument;
    /// - conditional: lowered as-is, with the piped value available in the
    ///   generator state;
    /// - for-each: the left AST node is the loop's range, handed over as an
    ///   explicit parameter;
    /// - print: reads the piped value when it has no argument of its own.
    ///
    /// Anything else on the right is a compile error.
    pub fn lower_pipeline(
        &mut self,
        node: &Node,
        ctx: &mut GeneratorContext,
        fb: &mut FunctionBuilder,
    ) -> Option<Value> {
        let NodeKind::Pipeline { left, right } = &node.kind else {
            return None;
        };

        // The left value is absent when the left side is a range; ranges are
        // structural and feed the loop as an AST node instead.
        let left_value = self.lower_expression(left, ctx, fb);

        let saved_piped = ctx.piped_value.take();
        ctx.piped_value = left_value.clone();

        let result = match &right.kind {
            NodeKind::Call { name, args } => {
                self.lower_call(name, args, left_value, right.line, ctx, fb)
            }
            NodeKind::IfElse { .. } => self.lower_if_else(right, ctx, fb),
            NodeKind::ForEach { .. } => self.lower_for_each(right, Some(left.as_ref()), ctx, fb),
            NodeKind::Print(_) => self.lower_print(right, ctx, fb),
            _ => {
                ctx.error(CodegenError::InvalidPipelineTarget { line: right.line });
                None
            }
        };

        ctx.piped_value = saved_piped;
        result
    }
}
