use crate::types::Type;
use crate::values::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::block::BlockId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Instruction {
    Add {
        result: Value,
        left: Value,
        right: Value,
        ty: Type,
    },
    Sub {
        result: Value,
        left: Value,
        right: Value,
        ty: Type,
    },
    Mul {
        result: Value,
        left: Value,
        right: Value,
        ty: Type,
    },
    /// Signed division.
    SDiv {
        result: Value,
        left: Value,
        right: Value,
        ty: Type,
    },
    Neg {
        result: Value,
        operand: Value,
        ty: Type,
    },

    /// Signed integer comparison, result is always `i1`.
    Icmp {
        result: Value,
        pred: IcmpPred,
        left: Value,
        right: Value,
    },

    /// Stack slot in the enclosing function; the result is of type `ty*`.
    Alloca {
        result: Value,
        ty: Type,
    },
    Load {
        result: Value,
        ptr: Value,
        ty: Type,
    },
    Store {
        ptr: Value,
        value: Value,
    },

    Phi {
        result: Value,
        ty: Type,
        incomings: Vec<(BlockId, Value)>,
    },

    /// Floating-point widening, used by the print bridge to pass `float`
    /// arguments through a variadic call.
    FpExt {
        result: Value,
        value: Value,
        to: Type,
    },

    /// Direct call through the callee's registered signature.
    Call {
        result: Option<Value>,
        callee: String,
        args: Vec<Value>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IcmpPred {
    Eq,
    Ne,
    Slt,
    Sgt,
    Sle,
    Sge,
}

impl fmt::Display for IcmpPred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IcmpPred::Eq => "eq",
            IcmpPred::Ne => "ne",
            IcmpPred::Slt => "slt",
            IcmpPred::Sgt => "sgt",
            IcmpPred::Sle => "sle",
            IcmpPred::Sge => "sge",
        };
        write!(f, "{}", s)
    }
}

impl Instruction {
    pub fn result(&self) -> Option<&Value> {
        match self {
            Instruction::Add { result, .. }
            | Instruction::Sub { result, .. }
            | Instruction::Mul { result, .. }
            | Instruction::SDiv { result, .. }
            | Instruction::Neg { result, .. }
            | Instruction::Icmp { result, .. }
            | Instruction::Alloca { result, .. }
            | Instruction::Load { result, .. }
            | Instruction::Phi { result, .. }
            | Instruction::FpExt { result, .. } => Some(result),
            Instruction::Call { result, .. } => result.as_ref(),
            Instruction::Store { .. } => None,
        }
    }

    pub fn is_alloca(&self) -> bool {
        matches!(self, Instruction::Alloca { .. })
    }

    pub fn is_phi(&self) -> bool {
        matches!(self, Instruction::Phi { .. })
    }

    /// Values read by this instruction. Phi incomings are reported too;
    /// the verifier treats them separately because they are used at the
    /// end of the predecessor, not at the phi itself.
    pub fn operands(&self) -> Vec<&Value> {
        match self {
            Instruction::Add { left, right, .. }
            | Instruction::Sub { left, right, .. }
            | Instruction::Mul { left, right, .. }
            | Instruction::SDiv { left, right, .. }
            | Instruction::Icmp { left, right, .. } => vec![left, right],
            Instruction::Neg { operand, .. } => vec![operand],
            Instruction::FpExt { value, .. } => vec![value],
            Instruction::Alloca { .. } => Vec::new(),
            Instruction::Load { ptr, .. } => vec![ptr],
            Instruction::Store { ptr, value } => vec![ptr, value],
            Instruction::Phi { incomings, .. } => incomings.iter().map(|(_, v)| v).collect(),
            Instruction::Call { args, .. } => args.iter().collect(),
        }
    }
}
