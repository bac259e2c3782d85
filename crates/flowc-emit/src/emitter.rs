use crate::config::EmitConfig;
use anyhow::Result;
use flowc_core::format::{format_instruction, format_terminator};
use flowc_core::{Function, Module};
use std::io::Write;

pub type EmitResult = Result<()>;

#[derive(Debug, Clone)]
pub struct EmitContext {
    pub indent_level: usize,
    pub indent_chars: String,
}

impl EmitContext {
    pub fn new(config: &EmitConfig) -> Self {
        Self {
            indent_level: 0,
            indent_chars: config.indent.as_str(),
        }
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    fn prefix(&self) -> String {
        self.indent_chars.repeat(self.indent_level)
    }
}

/// Renders a module into the `.ll`-style listing the driver writes next to
/// the compiled source.
pub struct FlowIrEmitter {
    config: EmitConfig,
}

impl FlowIrEmitter {
    pub fn new() -> Self {
        Self {
            config: EmitConfig::default(),
        }
    }

    pub fn with_config(config: EmitConfig) -> Self {
        Self { config }
    }

    pub fn emit_to_string(&self, module: &Module) -> Result<String> {
        let mut buffer = Vec::new();
        let mut context = EmitContext::new(&self.config);
        self.emit_module(module, &mut buffer, &mut context)?;
        Ok(String::from_utf8(buffer)?)
    }

    pub fn emit_module<W: Write>(
        &self,
        module: &Module,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        if self.config.emit_comments {
            writeln!(writer, "; ModuleID = '{}'", module.name)?;
            writeln!(writer)?;
        }

        for string in &module.strings {
            writeln!(
                writer,
                "{} = private constant str \"{}\"",
                string.id,
                escape(&string.data)
            )?;
        }
        for global in &module.globals {
            write!(writer, "{} = global {} zeroinitializer", global.id, global.ty)?;
            if self.config.emit_comments {
                write!(writer, " ; {}", global.name)?;
            }
            writeln!(writer)?;
        }
        if !module.strings.is_empty() || !module.globals.is_empty() {
            writeln!(writer)?;
        }

        for declaration in module.declarations.values() {
            writeln!(
                writer,
                "declare @{}{}",
                declaration.name,
                declaration.function_type()
            )?;
        }
        if !module.declarations.is_empty() {
            writeln!(writer)?;
        }

        let mut first = true;
        for function in module.functions.values() {
            if !first {
                writeln!(writer)?;
            }
            first = false;
            self.emit_function(function, writer, context)?;
        }

        Ok(())
    }

    pub fn emit_function<W: Write>(
        &self,
        function: &Function,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        write!(writer, "function @{}(", function.signature.name)?;
        for (i, param) in function.signature.params.iter().enumerate() {
            if i > 0 {
                write!(writer, ", ")?;
            }
            write!(writer, "p{}: {}", i, param.ty)?;
            if self.config.emit_comments {
                write!(writer, " /* {} */", param.name)?;
            }
        }
        writeln!(writer, ") -> {} {{", function.signature.ret)?;

        context.indent();
        for block in function.body.blocks.values() {
            writeln!(writer, "{}:", block.id)?;
            for inst in &block.instructions {
                writeln!(writer, "{}{}", context.prefix(), format_instruction(inst))?;
            }
            writeln!(
                writer,
                "{}{}",
                context.prefix(),
                format_terminator(&block.terminator)
            )?;
        }
        context.dedent();

        writeln!(writer, "}}")?;
        Ok(())
    }
}

impl Default for FlowIrEmitter {
    fn default() -> Self {
        Self::new()
    }
}

fn escape(data: &str) -> String {
    data.chars()
        .flat_map(|c| match c {
            '\n' => "\\0A".chars().collect::<Vec<_>>(),
            '"' => "\\22".chars().collect(),
            '\\' => "\\5C".chars().collect(),
            c => vec![c],
        })
        .collect()
}
