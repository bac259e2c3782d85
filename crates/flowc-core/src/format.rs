use crate::{
    block::{BasicBlock, Terminator},
    function::Function,
    instructions::Instruction,
    module::Module,
};
use std::fmt::Write;

pub fn format_module(module: &Module) -> String {
    let mut output = String::new();

    writeln!(&mut output, "; Module: {}", module.name).unwrap();

    for string in &module.strings {
        writeln!(
            &mut output,
            "{} = constant str \"{}\"",
            string.id,
            escape(&string.data)
        )
        .unwrap();
    }
    for global in &module.globals {
        writeln!(
            &mut output,
            "{} = global {} zeroinitializer ; {}",
            global.id, global.ty, global.name
        )
        .unwrap();
    }
    for decl in module.declarations.values() {
        writeln!(
            &mut output,
            "declare @{}{}",
            decl.name,
            decl.function_type()
        )
        .unwrap();
    }

    for function in module.functions.values() {
        writeln!(&mut output).unwrap();
        write!(&mut output, "{}", format_function(function)).unwrap();
    }

    output
}

pub fn format_function(function: &Function) -> String {
    let mut output = String::new();

    write!(&mut output, "function @{}(", function.signature.name).unwrap();
    for (i, param) in function.signature.params.iter().enumerate() {
        if i > 0 {
            write!(&mut output, ", ").unwrap();
        }
        write!(&mut output, "p{}: {}", i, param.ty).unwrap();
    }
    writeln!(&mut output, ") -> {} {{", function.signature.ret).unwrap();

    for block in function.body.blocks.values() {
        write!(&mut output, "{}", format_block(block)).unwrap();
    }

    writeln!(&mut output, "}}").unwrap();

    output
}

fn format_block(block: &BasicBlock) -> String {
    let mut output = String::new();

    writeln!(&mut output, "{}:", block.id).unwrap();
    for inst in &block.instructions {
        writeln!(&mut output, "    {}", format_instruction(inst)).unwrap();
    }
    writeln!(&mut output, "    {}", format_terminator(&block.terminator)).unwrap();

    output
}

pub fn format_instruction(inst: &Instruction) -> String {
    match inst {
        Instruction::Add {
            result,
            left,
            right,
            ty,
        } => format!("{} = add {} {}, {}", result, ty, left, right),
        Instruction::Sub {
            result,
            left,
            right,
            ty,
        } => format!("{} = sub {} {}, {}", result, ty, left, right),
        Instruction::Mul {
            result,
            left,
            right,
            ty,
        } => format!("{} = mul {} {}, {}", result, ty, left, right),
        Instruction::SDiv {
            result,
            left,
            right,
            ty,
        } => format!("{} = sdiv {} {}, {}", result, ty, left, right),
        Instruction::Neg { result, operand, ty } => {
            format!("{} = neg {} {}", result, ty, operand)
        }
        Instruction::Icmp {
            result,
            pred,
            left,
            right,
        } => format!("{} = icmp {} {}, {}", result, pred, left, right),
        Instruction::Alloca { result, ty } => format!("{} = alloca {}", result, ty),
        Instruction::Load { result, ptr, ty } => {
            format!("{} = load {}, {}", result, ty, ptr)
        }
        Instruction::Store { ptr, value } => format!("store {}, {}", value, ptr),
        Instruction::Phi {
            result,
            ty,
            incomings,
        } => {
            let arms = incomings
                .iter()
                .map(|(block, value)| format!("[{}: {}]", block, value))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} = phi {} {}", result, ty, arms)
        }
        Instruction::FpExt { result, value, to } => {
            format!("{} = fpext {} to {}", result, value, to)
        }
        Instruction::Call {
            result,
            callee,
            args,
        } => {
            let args_str = args
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            match result {
                Some(result) => format!("{} = call @{}({})", result, callee, args_str),
                None => format!("call @{}({})", callee, args_str),
            }
        }
    }
}

pub fn format_terminator(term: &Terminator) -> String {
    match term {
        Terminator::Jump(target) => format!("jump {}", target),
        Terminator::Branch {
            condition,
            then_block,
            else_block,
        } => format!("brif {}, {}, {}", condition, then_block, else_block),
        Terminator::Return(None) => "return".to_string(),
        Terminator::Return(Some(value)) => format!("return {}", value),
        Terminator::Invalid => "<unterminated>".to_string(),
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
