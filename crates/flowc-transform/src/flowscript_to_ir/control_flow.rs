use super::context::GeneratorContext;
use super::errors::CodegenError;
use super::scope::Binding;
use super::AstLowerer;
use flowc_core::{FunctionBuilder, IcmpPred, Type, Value};
use flowc_parser::ast::{Node, NodeKind};

impl AstLowerer {
    /// Conditionals produce no value. The builder ends up positioned at the
    /// merge block; if both arms terminated, the merge block picks up its
    /// terminator from whatever is lowered next or from the enclosing
    /// function's implicit return.
    pub fn lower_if_else(
        &mut self,
        node: &Node,
        ctx: &mut GeneratorContext,
        fb: &mut FunctionBuilder,
    ) -> Option<Value> {
        let NodeKind::IfElse {
            condition,
            then_body,
            else_body,
        } = &node.kind
        else {
            return None;
        };
        let line = node.line;

        let cond_value = self.lower_expression(condition, ctx, fb)?;
        let cond_bool = self.to_bool(cond_value, fb);

        let then_block = fb.create_block();
        let else_block = else_body.as_ref().map(|_| fb.create_block());
        let merge_block = fb.create_block();

        self.seal(
            fb.cond_br(cond_bool, then_block, else_block.unwrap_or(merge_block)),
            line,
            ctx,
        )?;

        self.seal(fb.switch_to_block(then_block), line, ctx)?;
        self.lower_statement_list(then_body, ctx, fb);
        if !fb.is_terminated() {
            self.seal(fb.br(merge_block), line, ctx)?;
        }

        if let (Some(else_body), Some(else_block)) = (else_body, else_block) {
            self.seal(fb.switch_to_block(else_block), line, ctx)?;
            self.lower_statement_list(else_body, ctx, fb);
            if !fb.is_terminated() {
                self.seal(fb.br(merge_block), line, ctx)?;
            }
        }

        self.seal(fb.switch_to_block(merge_block), line, ctx)?;
        None
    }

    /// Bounded ascending iteration over a half-open range: the body runs for
    /// start <= i < end, zero times when start >= end.
    ///
    /// The range is either the loop's own range node or, when the loop sits
    /// on the right of a pipeline, the pipeline's left operand passed in as
    /// an explicit parameter.
    pub fn lower_for_each(
        &mut self,
        node: &Node,
        piped_range: Option<&Node>,
        ctx: &mut GeneratorContext,
        fb: &mut FunctionBuilder,
    ) -> Option<Value> {
        let NodeKind::ForEach { range, var, body } = &node.kind else {
            return None;
        };
        let line = node.line;

        let range_node = match piped_range.or(range.as_deref()) {
            Some(n) => n,
            None => {
                ctx.error(CodegenError::LoopWithoutRange { line });
                return None;
            }
        };
        let NodeKind::Range { start, end } = &range_node.kind else {
            ctx.error(CodegenError::LoopWithoutRange { line });
            return None;
        };

        let start_value = self.lower_expression(start, ctx, fb)?;
        let end_value = self.lower_expression(end, ctx, fb)?;

        let slot = fb.entry_alloca(Type::I32);

        let saved_scope = ctx.enter_scope(ctx.current_scope);
        ctx.define(var.as_str(), Binding::slot(slot.clone(), Type::I32));
        let saved_continue = ctx.loop_continue;
        let saved_break = ctx.loop_break;

        let result = self.emit_loop(slot, start_value, end_value, body, line, ctx, fb);

        ctx.loop_continue = saved_continue;
        ctx.loop_break = saved_break;
        ctx.leave_scope(saved_scope);
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_loop(
        &mut self,
        slot: Value,
        start: Value,
        end: Value,
        body: &[Node],
        line: u32,
        ctx: &mut GeneratorContext,
        fb: &mut FunctionBuilder,
    ) -> Option<Value> {
        fb.store(slot.clone(), start);

        let cond_block = fb.create_block();
        let body_block = fb.create_block();
        let inc_block = fb.create_block();
        let end_block = fb.create_block();

        ctx.loop_continue = Some(inc_block);
        ctx.loop_break = Some(end_block);

        self.seal(fb.br(cond_block), line, ctx)?;

        self.seal(fb.switch_to_block(cond_block), line, ctx)?;
        let current = fb.load(slot.clone(), Type::I32);
        let keep_going = fb.icmp(IcmpPred::Slt, current.clone(), end);
        self.seal(fb.cond_br(keep_going, body_block, end_block), line, ctx)?;

        self.seal(fb.switch_to_block(body_block), line, ctx)?;
        // The loop index doubles as the piped value, so bodies can consume
        // it as a pipe source.
        let saved_piped = ctx.piped_value.take();
        ctx.piped_value = Some(current);
        self.lower_statement_list(body, ctx, fb);
        ctx.piped_value = saved_piped;
        if !fb.is_terminated() {
            self.seal(fb.br(inc_block), line, ctx)?;
        }

        self.seal(fb.switch_to_block(inc_block), line, ctx)?;
        let before = fb.load(slot.clone(), Type::I32);
        let next = fb.add(before, FunctionBuilder::const_int(1), Type::I32);
        fb.store(slot, next);
        self.seal(fb.br(cond_block), line, ctx)?;

        self.seal(fb.switch_to_block(end_block), line, ctx)?;
        None
    }
}
