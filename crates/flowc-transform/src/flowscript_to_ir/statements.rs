use super::context::GeneratorContext;
use super::AstLowerer;
use flowc_core::{FunctionBuilder, Value};
use flowc_parser::ast::{Node, NodeKind};

impl AstLowerer {
    /// Lower a statement list in source order. Once the current block has a
    /// terminator, the remaining statements are unreachable and silently
    /// dropped rather than emitted into a fresh block.
    pub fn lower_statement_list(
        &mut self,
        statements: &[Node],
        ctx: &mut GeneratorContext,
        fb: &mut FunctionBuilder,
    ) {
        for statement in statements {
            if fb.is_terminated() {
                return;
            }

            match &statement.kind {
                NodeKind::FunctionDef { .. } => {
                    self.lower_function_def(statement, ctx);
                }
                NodeKind::Return(_) => {
                    self.lower_return(statement, ctx, fb);
                    return;
                }
                NodeKind::ForEach { .. } => {
                    self.lower_for_each(statement, None, ctx, fb);
                }
                _ => {
                    self.lower_expression(statement, ctx, fb);
                }
            }
        }
    }

    pub fn lower_return(
        &mut self,
        node: &Node,
        ctx: &mut GeneratorContext,
        fb: &mut FunctionBuilder,
    ) -> Option<Value> {
        let NodeKind::Return(value) = &node.kind else {
            return None;
        };
        match value {
            Some(expr) => {
                let result = self.lower_expression(expr, ctx, fb)?;
                self.seal(fb.ret(result), node.line, ctx)?;
            }
            None => {
                self.seal(fb.ret_void(), node.line, ctx)?;
            }
        }
        None
    }
}
