use crate::types::Type;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Temp(TempId),
    Param(ParamId),
    Global(GlobalId),
    FunctionRef(String),
    Constant(Constant),
}

impl Value {
    pub fn is_constant(&self) -> bool {
        matches!(self, Value::Constant(_))
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Value::Constant(c) => Some(c),
            _ => None,
        }
    }

    /// Intrinsic type of the value, when it does not depend on builder state.
    pub fn constant_type(&self) -> Option<Type> {
        match self {
            Value::Constant(Constant::Int(_)) => Some(Type::I32),
            Value::Constant(Constant::Bool(_)) => Some(Type::I1),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Temp(id) => write!(f, "{}", id),
            Value::Param(id) => write!(f, "{}", id),
            Value::Global(id) => write!(f, "{}", id),
            Value::FunctionRef(name) => write!(f, "@{}", name),
            Value::Constant(c) => write!(f, "{}", c),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TempId(pub u32);

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamId(pub u32);

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlobalId(pub u32);

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@g{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constant {
    /// The scalar integer of the surface language, 32-bit signed.
    Int(i64),
    Bool(bool),
    Null,
}

impl Constant {
    pub fn zero(ty: &Type) -> Option<Self> {
        match ty {
            Type::I1 => Some(Constant::Bool(false)),
            Type::I8 | Type::I32 => Some(Constant::Int(0)),
            Type::Ptr(_) => Some(Constant::Null),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Constant::Int(v) => Some(*v),
            Constant::Bool(b) => Some(if *b { 1 } else { 0 }),
            Constant::Null => None,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{}", v),
            Constant::Bool(b) => write!(f, "{}", b),
            Constant::Null => write!(f, "null"),
        }
    }
}
