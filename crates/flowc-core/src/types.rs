use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Void,
    I1,
    I8,
    I32,
    F32,
    F64,
    Ptr(Box<Type>),
    Function(Box<FunctionType>),
}

impl Type {
    pub fn pointer_to(self) -> Type {
        Type::Ptr(Box::new(self))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::I1 | Type::I8 | Type::I32)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::F32 | Type::F64)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Ptr(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn bit_width(&self) -> Option<u16> {
        match self {
            Type::I1 => Some(1),
            Type::I8 => Some(8),
            Type::I32 => Some(32),
            _ => None,
        }
    }

    /// Element type behind a pointer, if this is one.
    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Ptr(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionType> {
        match self {
            Type::Function(ft) => Some(ft),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::I1 => write!(f, "i1"),
            Type::I8 => write!(f, "i8"),
            Type::I32 => write!(f, "i32"),
            Type::F32 => write!(f, "float"),
            Type::F64 => write!(f, "double"),
            Type::Ptr(inner) => write!(f, "{}*", inner),
            Type::Function(ft) => write!(f, "{}", ft),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionType {
    pub params: Vec<Type>,
    pub ret: Type,
    pub is_variadic: bool,
}

impl FunctionType {
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        Self {
            params,
            ret,
            is_variadic: false,
        }
    }

    pub fn variadic(params: Vec<Type>, ret: Type) -> Self {
        Self {
            params,
            ret,
            is_variadic: true,
        }
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .params
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let varargs = match (self.is_variadic, self.params.is_empty()) {
            (true, true) => "...",
            (true, false) => ", ...",
            (false, _) => "",
        };
        write!(f, "({}{}) -> {}", params, varargs, self.ret)
    }
}
