use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitConfig {
    /// Emit `;`-prefixed header comments (module name, global names).
    pub emit_comments: bool,
    pub indent: IndentStyle,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            emit_comments: true,
            indent: IndentStyle::Spaces(4),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IndentStyle {
    Spaces(usize),
    Tabs,
}

impl IndentStyle {
    pub fn as_str(&self) -> String {
        match self {
            IndentStyle::Spaces(n) => " ".repeat(*n),
            IndentStyle::Tabs => "\t".to_string(),
        }
    }
}
