use crate::block::{BlockId, Terminator};
use crate::function::{Function, FunctionSignature};
use crate::instructions::{IcmpPred, Instruction};
use crate::types::Type;
use crate::values::{Constant, ParamId, TempId, Value};
use crate::{IrError, Result};
use std::collections::HashMap;

/// Builds one function: owns the body under construction, a cursor naming the
/// current insertion block, and the type of every value emitted so far.
///
/// The builder deliberately does not borrow the module. Lowering a nested
/// function definition creates a second builder while the outer one is
/// parked on the caller's stack frame; module access (globals, signatures,
/// string constants) stays with the caller.
pub struct FunctionBuilder {
    function: Function,
    cursor: BlockId,
    value_types: HashMap<Value, Type>,
}

impl FunctionBuilder {
    pub fn new(signature: FunctionSignature) -> Self {
        let function = Function::new(signature);
        let cursor = function.entry_block();
        let mut builder = Self {
            function,
            cursor,
            value_types: HashMap::new(),
        };
        for (idx, param) in builder.function.signature.params.iter().enumerate() {
            builder
                .value_types
                .insert(Value::Param(ParamId(idx as u32)), param.ty.clone());
        }
        builder
    }

    pub fn signature(&self) -> &FunctionSignature {
        &self.function.signature
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn build(self) -> Function {
        self.function
    }

    pub fn param(&self, index: usize) -> Option<Value> {
        if index < self.function.signature.params.len() {
            Some(Value::Param(ParamId(index as u32)))
        } else {
            None
        }
    }

    // --- blocks and cursor ---

    pub fn entry_block(&self) -> BlockId {
        self.function.entry_block()
    }

    pub fn create_block(&mut self) -> BlockId {
        self.function.body.create_block()
    }

    pub fn switch_to_block(&mut self, block: BlockId) -> Result<()> {
        if !self.function.body.blocks.contains_key(&block) {
            return Err(IrError::BuilderError(format!(
                "Block {} does not exist in function {}",
                block,
                self.function.name()
            )));
        }
        self.cursor = block;
        Ok(())
    }

    pub fn current_block(&self) -> BlockId {
        self.cursor
    }

    pub fn is_terminated(&self) -> bool {
        self.function
            .body
            .get_block(self.cursor)
            .map(|b| b.is_terminated())
            .unwrap_or(false)
    }

    pub fn block_terminator(&self, block: BlockId) -> Option<&Terminator> {
        self.function.body.get_block(block).map(|b| &b.terminator)
    }

    // --- values ---

    fn new_temp(&mut self, ty: Type) -> Value {
        let id = self.function.body.next_temp();
        let value = Value::Temp(TempId(id));
        self.value_types.insert(value.clone(), ty);
        value
    }

    /// Static type of a value as recorded at emission. Constants carry their
    /// own type; anything else must have been produced by this builder or
    /// registered explicitly.
    pub fn value_type(&self, value: &Value) -> Option<Type> {
        value
            .constant_type()
            .or_else(|| self.value_types.get(value).cloned())
    }

    /// Record the type of an external value (a module global, a function
    /// reference) so later emission can dispatch on it.
    pub fn register_value_type(&mut self, value: Value, ty: Type) {
        self.value_types.insert(value, ty);
    }

    pub fn const_int(value: i64) -> Value {
        Value::Constant(Constant::Int(value))
    }

    pub fn const_bool(value: bool) -> Value {
        Value::Constant(Constant::Bool(value))
    }

    // --- instruction emission ---

    fn push(&mut self, inst: Instruction) {
        if let Some(block) = self.function.body.get_block_mut(self.cursor) {
            block.add_instruction(inst);
        }
    }

    pub fn add(&mut self, left: Value, right: Value, ty: Type) -> Value {
        let result = self.new_temp(ty.clone());
        self.push(Instruction::Add {
            result: result.clone(),
            left,
            right,
            ty,
        });
        result
    }

    pub fn sub(&mut self, left: Value, right: Value, ty: Type) -> Value {
        let result = self.new_temp(ty.clone());
        self.push(Instruction::Sub {
            result: result.clone(),
            left,
            right,
            ty,
        });
        result
    }

    pub fn mul(&mut self, left: Value, right: Value, ty: Type) -> Value {
        let result = self.new_temp(ty.clone());
        self.push(Instruction::Mul {
            result: result.clone(),
            left,
            right,
            ty,
        });
        result
    }

    pub fn sdiv(&mut self, left: Value, right: Value, ty: Type) -> Value {
        let result = self.new_temp(ty.clone());
        self.push(Instruction::SDiv {
            result: result.clone(),
            left,
            right,
            ty,
        });
        result
    }

    pub fn neg(&mut self, operand: Value, ty: Type) -> Value {
        let result = self.new_temp(ty.clone());
        self.push(Instruction::Neg {
            result: result.clone(),
            operand,
            ty,
        });
        result
    }

    pub fn icmp(&mut self, pred: IcmpPred, left: Value, right: Value) -> Value {
        let result = self.new_temp(Type::I1);
        self.push(Instruction::Icmp {
            result: result.clone(),
            pred,
            left,
            right,
        });
        result
    }

    /// Allocate a stack slot in the entry block, after any allocations
    /// already there and before all other instructions. Keeping every slot
    /// at the top of entry makes the allocation dominate all of its uses
    /// regardless of which block the first store lands in.
    pub fn entry_alloca(&mut self, ty: Type) -> Value {
        let result = self.new_temp(ty.clone().pointer_to());
        let entry = self.function.body.entry_block;
        if let Some(block) = self.function.body.get_block_mut(entry) {
            let insert_at = block
                .instructions
                .iter()
                .position(|inst| !inst.is_alloca())
                .unwrap_or(block.instructions.len());
            block.instructions.insert(
                insert_at,
                Instruction::Alloca {
                    result: result.clone(),
                    ty,
                },
            );
        }
        result
    }

    pub fn load(&mut self, ptr: Value, ty: Type) -> Value {
        let result = self.new_temp(ty.clone());
        self.push(Instruction::Load {
            result: result.clone(),
            ptr,
            ty,
        });
        result
    }

    pub fn store(&mut self, ptr: Value, value: Value) {
        self.push(Instruction::Store { ptr, value });
    }

    pub fn fpext(&mut self, value: Value, to: Type) -> Value {
        let result = self.new_temp(to.clone());
        self.push(Instruction::FpExt {
            result: result.clone(),
            value,
            to,
        });
        result
    }

    pub fn phi(&mut self, ty: Type, incomings: Vec<(BlockId, Value)>) -> Value {
        let result = self.new_temp(ty.clone());
        self.push(Instruction::Phi {
            result: result.clone(),
            ty,
            incomings,
        });
        result
    }

    /// Direct call; returns the result value unless the callee returns void.
    pub fn call(&mut self, callee: &str, args: Vec<Value>, ret: Type) -> Option<Value> {
        let result = if ret.is_void() {
            None
        } else {
            Some(self.new_temp(ret))
        };
        self.push(Instruction::Call {
            result: result.clone(),
            callee: callee.to_string(),
            args,
        });
        result
    }

    // --- terminators ---

    fn seal(&mut self, terminator: Terminator) -> Result<()> {
        let cursor = self.cursor;
        let block = self
            .function
            .body
            .get_block_mut(cursor)
            .ok_or_else(|| IrError::BuilderError(format!("No block {} to seal", cursor)))?;
        if block.is_terminated() {
            return Err(IrError::BuilderError(format!(
                "Block {} already sealed",
                cursor
            )));
        }
        block.set_terminator(terminator);
        Ok(())
    }

    pub fn br(&mut self, target: BlockId) -> Result<()> {
        self.seal(Terminator::Jump(target))
    }

    pub fn cond_br(&mut self, condition: Value, then_block: BlockId, else_block: BlockId) -> Result<()> {
        self.seal(Terminator::Branch {
            condition,
            then_block,
            else_block,
        })
    }

    pub fn ret(&mut self, value: Value) -> Result<()> {
        self.seal(Terminator::Return(Some(value)))
    }

    pub fn ret_void(&mut self) -> Result<()> {
        self.seal(Terminator::Return(None))
    }
}
