use super::errors::CodegenError;
use super::scope::{Binding, ScopeId, SymbolTable};
use flowc_core::{BlockId, Module, Value};

/// Mutable generator state threaded through the whole lowering.
///
/// The piped value and the loop targets follow a save/restore discipline:
/// every routine that changes one of them keeps the previous value on its own
/// call frame and puts it back on all return paths. The current scope obeys
/// the same rule through [`GeneratorContext::enter_scope`] and
/// [`GeneratorContext::leave_scope`].
pub struct GeneratorContext<'m> {
    pub module: &'m mut Module,
    pub symbols: SymbolTable,
    pub current_scope: ScopeId,
    /// The value carried left-to-right across `|>`, when inside a pipeline
    /// or a loop body.
    pub piped_value: Option<Value>,
    /// Where `continue` would go. The surface grammar has no continue yet;
    /// the slot exists so loop lowering already maintains it.
    pub loop_continue: Option<BlockId>,
    /// Where `break` would go.
    pub loop_break: Option<BlockId>,
    pub diagnostics: Vec<CodegenError>,
}

impl<'m> GeneratorContext<'m> {
    pub fn new(module: &'m mut Module) -> Self {
        let symbols = SymbolTable::new();
        let current_scope = symbols.global();
        Self {
            module,
            symbols,
            current_scope,
            piped_value: None,
            loop_continue: None,
            loop_break: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn error(&mut self, error: CodegenError) {
        self.diagnostics.push(error);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| !d.is_warning())
    }

    /// Push a child of `parent` and make it current; returns the scope that
    /// was current before, to be handed back to [`Self::leave_scope`].
    pub fn enter_scope(&mut self, parent: ScopeId) -> ScopeId {
        let saved = self.current_scope;
        self.current_scope = self.symbols.push(parent);
        saved
    }

    pub fn leave_scope(&mut self, saved: ScopeId) {
        let finished = self.current_scope;
        self.current_scope = saved;
        self.symbols.pop(finished);
    }

    pub fn define(&mut self, name: impl Into<String>, binding: Binding) {
        self.symbols.define(self.current_scope, name, binding);
    }

    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.symbols.lookup(self.current_scope, name)
    }

    pub fn lookup_global(&self, name: &str) -> Option<&Binding> {
        self.symbols.lookup(self.symbols.global(), name)
    }
}
