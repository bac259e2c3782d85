use crate::function::{Function, FunctionSignature};
use crate::types::Type;
use crate::values::{GlobalId, Value};
use crate::{IrError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A compiled module: functions, external declarations, zero-initialized
/// global cells and interned read-only string constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub functions: IndexMap<String, Function>,
    pub declarations: IndexMap<String, FunctionSignature>,
    pub globals: Vec<GlobalVariable>,
    pub strings: Vec<StringConstant>,
    next_global_id: u32,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: IndexMap::new(),
            declarations: IndexMap::new(),
            globals: Vec::new(),
            strings: Vec::new(),
            next_global_id: 0,
        }
    }

    pub fn add_function(&mut self, function: Function) -> Result<()> {
        let name = function.signature.name.clone();
        if self.functions.contains_key(&name) {
            return Err(IrError::BuilderError(format!(
                "Function {} already exists",
                name
            )));
        }
        // A definition supersedes an earlier forward declaration.
        self.declarations.shift_remove(&name);
        self.functions.insert(name, function);
        Ok(())
    }

    /// Replace any existing definition; surface-level redefinition follows
    /// the same update-in-place rule as scope bindings.
    pub fn replace_function(&mut self, function: Function) {
        let name = function.signature.name.clone();
        self.declarations.shift_remove(&name);
        self.functions.insert(name, function);
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Get-or-add an external declaration. Lazily declaring host functions
    /// (printf) goes through here.
    pub fn declare_function(&mut self, signature: FunctionSignature) -> &FunctionSignature {
        let name = signature.name.clone();
        self.declarations.entry(name).or_insert(signature)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.declarations.contains_key(name)
    }

    /// Callable signature by name: defined functions first, then externals.
    pub fn signature_of(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions
            .get(name)
            .map(|f| &f.signature)
            .or_else(|| self.declarations.get(name))
    }

    fn next_global(&mut self) -> GlobalId {
        let id = GlobalId(self.next_global_id);
        self.next_global_id += 1;
        id
    }

    /// Zero-initialized module-level cell; the returned value is a pointer
    /// to the cell.
    pub fn add_global(&mut self, name: impl Into<String>, ty: Type) -> Value {
        let id = self.next_global();
        self.globals.push(GlobalVariable {
            id,
            name: name.into(),
            ty,
        });
        Value::Global(id)
    }

    /// Read-only string constant, interned by content. The returned value is
    /// an `i8*` pointing at the data.
    pub fn global_string(&mut self, data: &str, label: &str) -> Value {
        if let Some(existing) = self.strings.iter().find(|s| s.data == data) {
            return Value::Global(existing.id);
        }
        let id = self.next_global();
        self.strings.push(StringConstant {
            id,
            name: label.to_string(),
            data: data.to_string(),
        });
        Value::Global(id)
    }

    /// Type of a global value as seen by instructions: a pointer to the
    /// stored element for variables, `i8*` for strings.
    pub fn global_type(&self, id: GlobalId) -> Option<Type> {
        if let Some(var) = self.globals.iter().find(|g| g.id == id) {
            return Some(var.ty.clone().pointer_to());
        }
        if self.strings.iter().any(|s| s.id == id) {
            return Some(Type::I8.pointer_to());
        }
        None
    }

    pub fn global_variable(&self, id: GlobalId) -> Option<&GlobalVariable> {
        self.globals.iter().find(|g| g.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalVariable {
    pub id: GlobalId,
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StringConstant {
    pub id: GlobalId,
    pub name: String,
    pub data: String,
}
