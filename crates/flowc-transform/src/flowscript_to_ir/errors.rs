use thiserror::Error;

/// One diagnostic from code generation. Every variant that originates at a
/// source construct carries its line; the renderer prefixes messages with it.
#[derive(Error, Debug, Clone)]
pub enum CodegenError {
    #[error("Line {line}: Undeclared identifier '{name}'")]
    UndeclaredIdentifier { line: u32, name: String },

    #[error("Line {line}: Call to undefined function '{name}'")]
    UnknownFunction { line: u32, name: String },

    #[error("Line {line}: Incorrect number of arguments for function '{name}': expected {expected}, got {actual}")]
    ArityMismatch {
        line: u32,
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Line {line}: Cannot assign to '{name}': not a mutable variable")]
    ImmutableTarget { line: u32, name: String },

    #[error("Line {line}: Type mismatch in assignment to '{name}': expected {expected}, got {actual}")]
    AssignmentTypeMismatch {
        line: u32,
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Line {line}: Invalid operator on the right side of a pipeline")]
    InvalidPipelineTarget { line: u32 },

    #[error("Line {line}: For-each loop requires a range")]
    LoopWithoutRange { line: u32 },

    #[error("Line {line}: print() called with no argument, neither explicit nor piped")]
    PrintWithoutArgument { line: u32 },

    #[error("Line {line}: print() called with unhandled type {ty}")]
    PrintUnhandledType { line: u32, ty: String },

    #[error("Line {line}: IR builder error: {message}")]
    Builder { line: u32, message: String },

    #[error("Line {line}: Verification of function '{name}' failed: {message}")]
    FunctionVerification {
        line: u32,
        name: String,
        message: String,
    },

    #[error("Module verification failed: {0}")]
    ModuleVerification(String),

    #[error("Multiple errors occurred: {0:?}")]
    Multiple(Vec<CodegenError>),
}

impl CodegenError {
    /// Warnings are reported but do not fail the compilation; the module
    /// verifier is the backstop for anything they let through.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            CodegenError::AssignmentTypeMismatch { .. }
                | CodegenError::PrintUnhandledType { .. }
                | CodegenError::FunctionVerification { .. }
        )
    }
}

impl From<flowc_core::IrError> for CodegenError {
    fn from(err: flowc_core::IrError) -> Self {
        CodegenError::Builder {
            line: 0,
            message: err.to_string(),
        }
    }
}
