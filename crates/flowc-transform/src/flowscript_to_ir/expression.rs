use super::context::GeneratorContext;
use super::errors::CodegenError;
use super::scope::Binding;
use super::AstLowerer;
use flowc_core::{FunctionBuilder, IcmpPred, Type, Value};
use flowc_parser::ast::{BinaryOp, Node, NodeKind, UnaryOp};

impl AstLowerer {
    /// Lower one expression to a single IR value. Returns `None` when the
    /// expression failed to lower (a diagnostic has been recorded) or when
    /// the construct has no value (conditionals, loops, ranges).
    pub fn lower_expression(
        &mut self,
        node: &Node,
        ctx: &mut GeneratorContext,
        fb: &mut FunctionBuilder,
    ) -> Option<Value> {
        match &node.kind {
            NodeKind::Number(value) => Some(FunctionBuilder::const_int(*value)),
            NodeKind::Identifier(name) => self.lower_identifier(name, node.line, ctx, fb),
            NodeKind::Binary { op, left, right } => {
                self.lower_binary(*op, left, right, node.line, ctx, fb)
            }
            NodeKind::Unary { op, operand } => self.lower_unary(*op, operand, ctx, fb),
            NodeKind::Assignment { target, value } => {
                self.lower_assignment(target, value, node.line, ctx, fb)
            }
            NodeKind::Call { name, args } => {
                self.lower_call(name, args, None, node.line, ctx, fb)
            }
            NodeKind::Pipeline { .. } => self.lower_pipeline(node, ctx, fb),
            NodeKind::IfElse { .. } => self.lower_if_else(node, ctx, fb),
            NodeKind::ForEach { .. } => self.lower_for_each(node, None, ctx, fb),
            NodeKind::Range { start, end } => {
                // A range has no scalar value; it is structural. Both bounds
                // are still lowered so errors inside them surface.
                self.lower_expression(start, ctx, fb);
                self.lower_expression(end, ctx, fb);
                None
            }
            NodeKind::Print(_) => self.lower_print(node, ctx, fb),
            NodeKind::Return(_) => {
                self.lower_return(node, ctx, fb);
                None
            }
            NodeKind::FunctionDef { .. } => self.lower_function_def(node, ctx),
        }
    }

    fn lower_identifier(
        &mut self,
        name: &str,
        line: u32,
        ctx: &mut GeneratorContext,
        fb: &mut FunctionBuilder,
    ) -> Option<Value> {
        let binding = match ctx.lookup(name) {
            Some(binding) => binding.clone(),
            None => {
                ctx.error(CodegenError::UndeclaredIdentifier {
                    line,
                    name: name.to_string(),
                });
                return None;
            }
        };

        // Storage handles are loaded; function handles are returned as-is.
        if binding.is_function() {
            Some(binding.handle)
        } else {
            Some(fb.load(binding.handle, binding.ty))
        }
    }

    fn lower_binary(
        &mut self,
        op: BinaryOp,
        left: &Node,
        right: &Node,
        line: u32,
        ctx: &mut GeneratorContext,
        fb: &mut FunctionBuilder,
    ) -> Option<Value> {
        if op.is_short_circuit() {
            return self.lower_short_circuit(op, left, right, line, ctx, fb);
        }

        let lhs = self.lower_expression(left, ctx, fb)?;
        let rhs = self.lower_expression(right, ctx, fb)?;

        let value = match op {
            BinaryOp::Add => fb.add(lhs, rhs, Type::I32),
            BinaryOp::Sub => fb.sub(lhs, rhs, Type::I32),
            BinaryOp::Mul => fb.mul(lhs, rhs, Type::I32),
            BinaryOp::Div => fb.sdiv(lhs, rhs, Type::I32),
            BinaryOp::Eq => fb.icmp(IcmpPred::Eq, lhs, rhs),
            BinaryOp::Ne => fb.icmp(IcmpPred::Ne, lhs, rhs),
            BinaryOp::Lt => fb.icmp(IcmpPred::Slt, lhs, rhs),
            BinaryOp::Gt => fb.icmp(IcmpPred::Sgt, lhs, rhs),
            BinaryOp::Le => fb.icmp(IcmpPred::Sle, lhs, rhs),
            BinaryOp::Ge => fb.icmp(IcmpPred::Sge, lhs, rhs),
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        };
        Some(value)
    }

    /// `and`/`or` must not evaluate the right side eagerly. The right
    /// operand is lowered into its own region, entered only when the left
    /// value demands it, and the results meet in a phi.
    fn lower_short_circuit(
        &mut self,
        op: BinaryOp,
        left: &Node,
        right: &Node,
        line: u32,
        ctx: &mut GeneratorContext,
        fb: &mut FunctionBuilder,
    ) -> Option<Value> {
        let lhs = self.lower_expression(left, ctx, fb)?;
        let lhs_bool = self.to_bool(lhs, fb);
        let left_block = fb.current_block();

        let eval_right = fb.create_block();
        let merge = fb.create_block();

        match op {
            // For `and` a false left short-circuits to the merge; for `or`
            // a true left does.
            BinaryOp::And => self.seal(fb.cond_br(lhs_bool, eval_right, merge), line, ctx)?,
            BinaryOp::Or => self.seal(fb.cond_br(lhs_bool, merge, eval_right), line, ctx)?,
            _ => unreachable!("only and/or are short-circuit"),
        }

        self.seal(fb.switch_to_block(eval_right), line, ctx)?;
        let rhs = self
            .lower_expression(right, ctx, fb)
            .unwrap_or_else(|| FunctionBuilder::const_bool(false));
        let rhs_bool = self.to_bool(rhs, fb);
        // Lowering the right side may have opened further blocks (nested
        // short-circuits, calls that expand); the phi's predecessor is the
        // block that is current now, not `eval_right`.
        let right_end = fb.current_block();
        self.seal(fb.br(merge), line, ctx)?;

        self.seal(fb.switch_to_block(merge), line, ctx)?;
        let incomings = match op {
            BinaryOp::And => vec![
                (right_end, rhs_bool),
                (left_block, FunctionBuilder::const_bool(false)),
            ],
            BinaryOp::Or => vec![
                (left_block, FunctionBuilder::const_bool(true)),
                (right_end, rhs_bool),
            ],
            _ => unreachable!(),
        };
        Some(fb.phi(Type::I1, incomings))
    }

    fn lower_unary(
        &mut self,
        op: UnaryOp,
        operand: &Node,
        ctx: &mut GeneratorContext,
        fb: &mut FunctionBuilder,
    ) -> Option<Value> {
        let value = self.lower_expression(operand, ctx, fb)?;
        let result = match op {
            UnaryOp::Not => {
                let zero = self.zero_like(&value, fb);
                fb.icmp(IcmpPred::Eq, value, zero)
            }
            UnaryOp::Neg => fb.neg(value, Type::I32),
        };
        Some(result)
    }

    fn lower_assignment(
        &mut self,
        target: &str,
        value: &Node,
        line: u32,
        ctx: &mut GeneratorContext,
        fb: &mut FunctionBuilder,
    ) -> Option<Value> {
        let rhs = self.lower_expression(value, ctx, fb)?;
        let rhs_ty = fb.value_type(&rhs).unwrap_or(Type::I32);

        match ctx.lookup(target).cloned() {
            None => {
                // First assignment declares the variable. The slot goes into
                // the entry block so the allocation dominates every use on
                // every path, even though the store happens here.
                let slot = fb.entry_alloca(rhs_ty.clone());
                fb.store(slot.clone(), rhs.clone());
                ctx.define(target, Binding::slot(slot, rhs_ty));
            }
            Some(binding) => {
                let is_storage = !binding.is_function()
                    && fb
                        .value_type(&binding.handle)
                        .map(|t| t.is_pointer())
                        .unwrap_or(matches!(binding.handle, Value::Global(_)));
                if !is_storage {
                    ctx.error(CodegenError::ImmutableTarget {
                        line,
                        name: target.to_string(),
                    });
                    return None;
                }
                if rhs_ty != binding.ty {
                    // Reported as a warning; generation proceeds and the
                    // verifier rejects the IR if it is truly incompatible.
                    ctx.error(CodegenError::AssignmentTypeMismatch {
                        line,
                        name: target.to_string(),
                        expected: binding.ty.to_string(),
                        actual: rhs_ty.to_string(),
                    });
                }
                fb.store(binding.handle, rhs.clone());
            }
        }

        // The assignment's value is the right side, enabling chains.
        Some(rhs)
    }

    /// Convert to `i1` by comparing against zero, unless already a boolean.
    pub(super) fn to_bool(&mut self, value: Value, fb: &mut FunctionBuilder) -> Value {
        if fb.value_type(&value) == Some(Type::I1) {
            return value;
        }
        let zero = self.zero_like(&value, fb);
        fb.icmp(IcmpPred::Ne, value, zero)
    }

    fn zero_like(&self, value: &Value, fb: &FunctionBuilder) -> Value {
        match fb.value_type(value) {
            Some(Type::I1) => FunctionBuilder::const_bool(false),
            _ => FunctionBuilder::const_int(0),
        }
    }

    /// Report a builder failure and yield `None` so the caller cascades.
    pub(super) fn seal(
        &self,
        result: flowc_core::Result<()>,
        line: u32,
        ctx: &mut GeneratorContext,
    ) -> Option<()> {
        match result {
            Ok(()) => Some(()),
            Err(e) => {
                ctx.error(CodegenError::Builder {
                    line,
                    message: e.to_string(),
                });
                None
            }
        }
    }
}
