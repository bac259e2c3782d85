use flowc_core::{Type, Value};
use std::collections::HashMap;

/// Index into the scope arena. Scope 0 is always the global scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(pub usize);

/// What a name resolves to: a storage handle (pointer into a stack slot or
/// module cell) or a function reference, plus the stored element type.
#[derive(Debug, Clone)]
pub struct Binding {
    pub handle: Value,
    pub ty: Type,
    pub is_param: bool,
}

impl Binding {
    pub fn slot(handle: Value, ty: Type) -> Self {
        Self {
            handle,
            ty,
            is_param: false,
        }
    }

    pub fn param(handle: Value, ty: Type) -> Self {
        Self {
            handle,
            ty,
            is_param: true,
        }
    }

    pub fn function(name: &str, ty: Type) -> Self {
        Self {
            handle: Value::FunctionRef(name.to_string()),
            ty,
            is_param: false,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self.handle, Value::FunctionRef(_))
    }
}

#[derive(Debug)]
struct Scope {
    symbols: HashMap<String, Binding>,
    parent: Option<ScopeId>,
}

/// The chain of lexical scopes, stored as an arena so parent links survive
/// pushes. Scopes nest strictly: every push is matched by a pop before the
/// surrounding construct finishes lowering, so the arena behaves as a stack.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                symbols: HashMap::new(),
                parent: None,
            }],
        }
    }

    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn push(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            symbols: HashMap::new(),
            parent: Some(parent),
        });
        id
    }

    /// Drops the given scope. Scopes are popped in LIFO order; popping
    /// anything but the innermost scope indicates a lowering bug and is
    /// ignored.
    pub fn pop(&mut self, scope: ScopeId) {
        if scope.0 != 0 && scope.0 == self.scopes.len() - 1 {
            self.scopes.pop();
        }
    }

    /// Insert into the given scope. Redefining a name that already exists
    /// there updates the binding in place.
    pub fn define(&mut self, scope: ScopeId, name: impl Into<String>, binding: Binding) {
        if let Some(s) = self.scopes.get_mut(scope.0) {
            s.symbols.insert(name.into(), binding);
        }
    }

    /// Walk from the given scope outward; the first match wins.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Binding> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scopes.get(id.0)?;
            if let Some(binding) = scope.symbols.get(name) {
                return Some(binding);
            }
            current = scope.parent;
        }
        None
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_slot(id: u32) -> Binding {
        Binding::slot(
            Value::Temp(flowc_core::TempId(id)),
            Type::I32,
        )
    }

    #[test]
    fn test_lookup_walks_parent_chain() {
        let mut table = SymbolTable::new();
        table.define(table.global(), "x", int_slot(0));

        let inner = table.push(table.global());
        assert!(table.lookup(inner, "x").is_some());
        assert!(table.lookup(table.global(), "missing").is_none());
    }

    #[test]
    fn test_inner_definition_shadows_outer() {
        let mut table = SymbolTable::new();
        table.define(table.global(), "x", int_slot(0));

        let inner = table.push(table.global());
        table.define(inner, "x", int_slot(1));

        let found = table.lookup(inner, "x").unwrap();
        assert_eq!(found.handle, Value::Temp(flowc_core::TempId(1)));
        // The outer binding is untouched.
        let outer = table.lookup(table.global(), "x").unwrap();
        assert_eq!(outer.handle, Value::Temp(flowc_core::TempId(0)));
    }

    #[test]
    fn test_redefinition_updates_in_place() {
        let mut table = SymbolTable::new();
        let global = table.global();
        table.define(global, "x", int_slot(0));
        table.define(global, "x", int_slot(5));

        let found = table.lookup(global, "x").unwrap();
        assert_eq!(found.handle, Value::Temp(flowc_core::TempId(5)));
    }

    #[test]
    fn test_function_scope_skips_caller_locals() {
        let mut table = SymbolTable::new();
        let global = table.global();

        // main's scope holds a local; a function body scope parented at
        // global must not see it.
        let main_scope = table.push(global);
        table.define(main_scope, "local", int_slot(0));
        table.define(global, "shared", int_slot(1));

        let func_scope = table.push(global);
        assert!(table.lookup(func_scope, "local").is_none());
        assert!(table.lookup(func_scope, "shared").is_some());

        table.pop(func_scope);
        table.pop(main_scope);
        assert_eq!(table.depth(), 1);
    }

    #[test]
    fn test_lookup_is_stable_without_intervening_define() {
        let mut table = SymbolTable::new();
        let global = table.global();
        table.define(global, "x", int_slot(3));

        let first = table.lookup(global, "x").unwrap().handle.clone();
        let second = table.lookup(global, "x").unwrap().handle.clone();
        assert_eq!(first, second);
    }
}
