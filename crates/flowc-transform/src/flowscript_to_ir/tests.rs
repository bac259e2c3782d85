use super::{generate, generate_program, transform_flowscript_to_ir, CodegenError};
use flowc_core::analysis::{verify_module, ControlFlowGraph};
use flowc_core::{BlockId, Function, Instruction, Module, Terminator, Value};
use flowc_parser::ast::{Node, NodeKind, Program};

fn compile(source: &str) -> Module {
    match transform_flowscript_to_ir(source) {
        Ok(module) => module,
        Err(e) => panic!("compilation failed for {:?}: {:#}", source, e),
    }
}

fn compile_err(source: &str) -> Vec<CodegenError> {
    let program = flowc_parser::parse(source).unwrap();
    let generated = generate_program(&program);
    assert!(
        generated.errors().next().is_some(),
        "expected errors for {:?}",
        source
    );
    generated.diagnostics
}

fn main_of(module: &Module) -> &Function {
    module.get_function("main").unwrap()
}

fn instructions_of(function: &Function) -> impl Iterator<Item = (BlockId, &Instruction)> {
    function
        .body
        .blocks
        .iter()
        .flat_map(|(id, block)| block.instructions.iter().map(move |i| (*id, i)))
}

fn calls_to<'a>(function: &'a Function, callee: &str) -> Vec<(BlockId, &'a Vec<Value>)> {
    instructions_of(function)
        .filter_map(|(block, inst)| match inst {
            Instruction::Call { callee: c, args, .. } if c == callee => Some((block, args)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_literal_piped_into_print() {
    let module = compile("5 |> print();");

    assert!(module.is_declared("printf"));
    assert!(module.strings.iter().any(|s| s.data == "%d\n"));

    let main = main_of(&module);
    let calls = calls_to(main, "printf");
    assert_eq!(calls.len(), 1);
    let (_, args) = &calls[0];
    assert_eq!(args.len(), 2);
    assert_eq!(args[1], Value::Constant(flowc_core::Constant::Int(5)));
}

#[test]
fn test_assignment_then_piped_print() {
    let module = compile("result = 10 + 2; result |> print();");
    let main = main_of(&module);

    let entry = main.body.get_block(main.entry_block()).unwrap();
    assert!(
        entry.instructions[0].is_alloca(),
        "the implicit declaration allocates in entry"
    );
    assert!(instructions_of(main).any(|(_, i)| matches!(i, Instruction::Add { .. })));
    assert!(instructions_of(main).any(|(_, i)| matches!(i, Instruction::Store { .. })));
    assert!(instructions_of(main).any(|(_, i)| matches!(i, Instruction::Load { .. })));
    assert_eq!(calls_to(main, "printf").len(), 1);
}

#[test]
fn test_range_for_each_loop_shape() {
    let module = compile("range(1,4) |> for each { item |> print(); }");
    let main = main_of(&module);

    // entry + cond + body + inc + end
    assert_eq!(main.body.blocks.len(), 5);

    // The loop comparison is signed-less-than against the end bound:
    // iteration covers start <= i < end.
    let has_slt = instructions_of(main).any(|(_, i)| {
        matches!(
            i,
            Instruction::Icmp {
                pred: flowc_core::IcmpPred::Slt,
                ..
            }
        )
    });
    assert!(has_slt);

    // The print call sits in the body block, which both enters from the
    // condition and exits to the increment.
    let cfg = ControlFlowGraph::from_body(&main.body);
    let (print_block, _) = calls_to(main, "printf")[0];
    let preds = cfg.predecessors(print_block);
    assert_eq!(preds.len(), 1);
    let succs = cfg.successors(print_block);
    assert_eq!(succs.len(), 1);

    // The increment adds one and loops back to the condition.
    let inc_block = succs[0];
    assert!(cfg.successors(inc_block).contains(&preds[0]));

    verify_module(&module).unwrap();
}

#[test]
fn test_function_definition_and_piped_call() {
    let module = compile("func add(a,b) { return a+b; } add(3,4) |> print();");

    let add = module.get_function("add").unwrap();
    assert_eq!(add.signature.params.len(), 2);

    // Parameters are spilled to entry slots.
    let entry = add.body.get_block(add.entry_block()).unwrap();
    let allocas = entry.instructions.iter().filter(|i| i.is_alloca()).count();
    assert_eq!(allocas, 2);

    let main = main_of(&module);
    let add_calls = calls_to(main, "add");
    assert_eq!(add_calls.len(), 1);
    assert_eq!(add_calls[0].1.len(), 2);

    // The call's result is what reaches printf.
    let printf_calls = calls_to(main, "printf");
    assert_eq!(printf_calls.len(), 1);
    assert!(matches!(printf_calls[0].1[1], Value::Temp(_)));
}

#[test]
fn test_if_else_with_merge() {
    let module = compile("x = 0; if 1 < 2 { x = 10; } else { x = 20; } x |> print();");
    let main = main_of(&module);

    // entry + then + else + merge
    assert_eq!(main.body.blocks.len(), 4);

    let entry = main.body.get_block(main.entry_block()).unwrap();
    let Terminator::Branch {
        then_block,
        else_block,
        ..
    } = &entry.terminator
    else {
        panic!("entry must end in a conditional branch");
    };

    let then = main.body.get_block(*then_block).unwrap();
    let els = main.body.get_block(*else_block).unwrap();
    assert!(then
        .instructions
        .iter()
        .any(|i| matches!(i, Instruction::Store { value, .. }
            if *value == Value::Constant(flowc_core::Constant::Int(10)))));
    assert!(els
        .instructions
        .iter()
        .any(|i| matches!(i, Instruction::Store { value, .. }
            if *value == Value::Constant(flowc_core::Constant::Int(20)))));

    // Both arms fall through to the same merge block.
    assert!(matches!(then.terminator, Terminator::Jump(m) if main.body.get_block(m).is_some()));
    verify_module(&module).unwrap();
}

#[test]
fn test_if_without_else_branches_to_merge() {
    let module = compile("x = 0; if x { x = 1; }");
    let main = main_of(&module);

    // entry + then + merge; the false edge goes straight to merge.
    assert_eq!(main.body.blocks.len(), 3);
    let entry = main.body.get_block(main.entry_block()).unwrap();
    let Terminator::Branch {
        then_block,
        else_block,
        ..
    } = &entry.terminator
    else {
        panic!("expected conditional branch");
    };
    let then = main.body.get_block(*then_block).unwrap();
    assert!(matches!(then.terminator, Terminator::Jump(m) if m == *else_block));
}

#[test]
fn test_short_circuit_and_materializes_control_flow() {
    let module = compile(
        "func side(n) { return n; }\nfunc f(a) { return a and side(1); }\nf(1) |> print();",
    );
    let f = module.get_function("f").unwrap();

    // The call to side() must not live in the entry block: it only runs
    // when `a` is nonzero.
    let side_calls = calls_to(f, "side");
    assert_eq!(side_calls.len(), 1);
    let (call_block, _) = side_calls[0];
    assert_ne!(call_block, f.entry_block());

    // The entry branches on the left operand; the false edge skips the
    // block holding the call.
    let entry = f.body.get_block(f.entry_block()).unwrap();
    let Terminator::Branch {
        then_block,
        else_block,
        ..
    } = &entry.terminator
    else {
        panic!("expected branch on left operand");
    };
    assert_eq!(*then_block, call_block);

    // The merge holds a phi whose false arm comes from entry.
    let merge = f.body.get_block(*else_block).unwrap();
    let Some(Instruction::Phi { incomings, .. }) = merge.instructions.first() else {
        panic!("merge must begin with a phi");
    };
    assert!(incomings.iter().any(|(block, value)| *block == f.entry_block()
        && *value == Value::Constant(flowc_core::Constant::Bool(false))));

    verify_module(&module).unwrap();
}

#[test]
fn test_short_circuit_or_phi_carries_true() {
    let module = compile("func g(a) { return a or 0; } g(1) |> print();");
    let g = module.get_function("g").unwrap();

    let phi = instructions_of(g)
        .find_map(|(_, i)| match i {
            Instruction::Phi { incomings, .. } => Some(incomings),
            _ => None,
        })
        .unwrap();
    assert!(phi.iter().any(|(block, value)| *block == g.entry_block()
        && *value == Value::Constant(flowc_core::Constant::Bool(true))));
}

#[test]
fn test_dead_call_in_short_circuit_is_still_lowered() {
    // The language does not prune dead code at parse time: the unreachable
    // right side of `0 and crash()` is lowered and its unknown callee is a
    // compile error.
    let diagnostics = compile_err("func sc(n) { return 0 and crash(); } sc(1) |> print();");
    assert!(diagnostics
        .iter()
        .any(|d| matches!(d, CodegenError::UnknownFunction { name, .. } if name == "crash")));
}

#[test]
fn test_arity_check_counts_piped_argument() {
    let module = compile("func inc(n) { return n + 1; } 5 |> inc() |> print();");
    let main = main_of(&module);
    assert_eq!(calls_to(main, "inc")[0].1.len(), 1);

    // Without the piped value the same call is under-applied.
    let diagnostics = compile_err("func inc(n) { return n + 1; } inc();");
    assert!(diagnostics.iter().any(|d| matches!(
        d,
        CodegenError::ArityMismatch {
            expected: 1,
            actual: 0,
            ..
        }
    )));

    // And a piped value on a call that is already saturated overflows.
    let diagnostics = compile_err("func inc(n) { return n + 1; } 5 |> inc(7);");
    assert!(diagnostics.iter().any(|d| matches!(
        d,
        CodegenError::ArityMismatch {
            expected: 1,
            actual: 2,
            ..
        }
    )));
}

#[test]
fn test_piped_value_becomes_leading_argument() {
    let module = compile("func sub2(a,b) { return a-b; } 10 |> sub2(3) |> print();");
    let main = main_of(&module);

    let args = calls_to(main, "sub2")[0].1;
    assert_eq!(args[0], Value::Constant(flowc_core::Constant::Int(10)));
    assert_eq!(args[1], Value::Constant(flowc_core::Constant::Int(3)));
}

#[test]
fn test_undeclared_identifier_is_reported() {
    let diagnostics = compile_err("ghost |> print();");
    assert!(diagnostics
        .iter()
        .any(|d| matches!(d, CodegenError::UndeclaredIdentifier { name, .. } if name == "ghost")));
}

#[test]
fn test_loop_variable_scope_ends_with_loop() {
    let diagnostics = compile_err("range(0,3) |> for each i { i |> print(); } i |> print();");
    assert!(diagnostics
        .iter()
        .any(|d| matches!(d, CodegenError::UndeclaredIdentifier { name, .. } if name == "i")));
}

#[test]
fn test_piped_value_is_restored_after_pipeline() {
    // The second print has neither an explicit nor a piped argument; the
    // pipeline before it must not leak its value.
    let diagnostics = compile_err("5 |> print(); print();");
    assert!(diagnostics
        .iter()
        .any(|d| matches!(d, CodegenError::PrintWithoutArgument { .. })));
}

#[test]
fn test_function_scope_cannot_see_caller_locals() {
    let diagnostics = compile_err("secret = 41; func peek() { return secret; } peek() |> print();");
    assert!(diagnostics
        .iter()
        .any(|d| matches!(d, CodegenError::UndeclaredIdentifier { name, .. } if name == "secret")));
}

#[test]
fn test_assignment_to_function_name_is_rejected() {
    let diagnostics = compile_err("func f() { return 1; } f = 5;");
    assert!(diagnostics
        .iter()
        .any(|d| matches!(d, CodegenError::ImmutableTarget { name, .. } if name == "f")));
}

#[test]
fn test_for_each_without_range_is_rejected() {
    let diagnostics = compile_err("for each { print(1); }");
    assert!(diagnostics
        .iter()
        .any(|d| matches!(d, CodegenError::LoopWithoutRange { .. })));
}

#[test]
fn test_invalid_pipeline_target_is_rejected() {
    // The parser cannot produce this shape; build the AST by hand.
    let program = Program {
        statements: vec![Node::new(
            NodeKind::Pipeline {
                left: Box::new(Node::new(NodeKind::Number(1), 1)),
                right: Box::new(Node::new(NodeKind::Number(2), 1)),
            },
            1,
        )],
    };
    let generated = generate_program(&program);
    assert!(generated
        .diagnostics
        .iter()
        .any(|d| matches!(d, CodegenError::InvalidPipelineTarget { .. })));
}

#[test]
fn test_implicit_return_zero() {
    let module = compile("func noop() { x = 1; } noop() |> print();");
    let noop = module.get_function("noop").unwrap();

    let returns: Vec<_> = noop
        .body
        .blocks
        .values()
        .filter_map(|b| match &b.terminator {
            Terminator::Return(v) => Some(v.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(returns.len(), 1);
    assert_eq!(
        returns[0],
        Some(Value::Constant(flowc_core::Constant::Int(0)))
    );
}

#[test]
fn test_main_gets_implicit_return() {
    let module = compile("x = 1;");
    let main = main_of(&module);
    let entry = main.body.get_block(main.entry_block()).unwrap();
    assert!(matches!(
        &entry.terminator,
        Terminator::Return(Some(Value::Constant(flowc_core::Constant::Int(0))))
    ));
}

#[test]
fn test_every_block_is_terminated() {
    let source = "x = 0;\n\
                  if x { x = 1; } else { x = 2; }\n\
                  range(0,2) |> for each { item |> print(); }\n\
                  func h(a) { if a { return 1; } return 2; }\n\
                  h(1) |> print();";
    let module = compile(source);
    for function in module.functions.values() {
        for block in function.body.blocks.values() {
            assert!(
                block.is_terminated(),
                "{} in {} lacks a terminator",
                block.id,
                function.name()
            );
        }
    }
    verify_module(&module).unwrap();
}

#[test]
fn test_allocas_confined_to_entry() {
    let source = "a = 1; if a { b = 2; } else { c = 3; } range(0,2) |> for each { d = item; }";
    let module = compile(source);
    let main = main_of(&module);

    for (block_id, block) in &main.body.blocks {
        if *block_id != main.entry_block() {
            assert!(
                block.instructions.iter().all(|i| !i.is_alloca()),
                "allocation escaped the entry block"
            );
        }
    }
    // One slot each for a, b, c and d, plus the loop index.
    let entry = main.body.get_block(main.entry_block()).unwrap();
    assert_eq!(
        entry.instructions.iter().filter(|i| i.is_alloca()).count(),
        5
    );
}

#[test]
fn test_chained_assignment() {
    let module = compile("x = y = 3; x |> print(); y |> print();");
    let main = main_of(&module);
    let entry = main.body.get_block(main.entry_block()).unwrap();
    assert_eq!(
        entry.instructions.iter().filter(|i| i.is_alloca()).count(),
        2
    );
    verify_module(&module).unwrap();
}

#[test]
fn test_type_mismatch_assignment_is_a_warning() {
    let program = flowc_parser::parse("x = 1; x = 1 < 2; x |> print();").unwrap();
    let generated = generate_program(&program);
    assert!(generated.errors().next().is_none());
    assert!(generated.warnings().any(|d| matches!(
        d,
        CodegenError::AssignmentTypeMismatch { name, .. } if name == "x"
    )));
}

#[test]
fn test_nested_function_definitions_register_globally() {
    let module =
        compile("func outer() { func inner() { return 2; } return inner(); } outer() |> print();");
    assert!(module.get_function("outer").is_some());
    assert!(module.get_function("inner").is_some());
    verify_module(&module).unwrap();
}

#[test]
fn test_statements_after_return_are_dropped() {
    let module = compile("func early() { return 1; x = 2; } early() |> print();");
    let early = module.get_function("early").unwrap();
    assert!(
        !instructions_of(early).any(|(_, i)| matches!(i, Instruction::Store { .. })),
        "unreachable assignment must not be emitted"
    );
}

#[test]
fn test_failed_statement_does_not_abort_compilation() {
    let program = flowc_parser::parse("ghost |> print(); 5 |> print();").unwrap();
    let generated = generate_program(&program);

    // The first statement failed, the second still lowered.
    assert!(generated.errors().next().is_some());
    let main = generated.module.get_function("main").unwrap();
    let printf_calls = instructions_of(main)
        .filter(|(_, i)| matches!(i, Instruction::Call { callee, .. } if callee == "printf"))
        .count();
    assert_eq!(printf_calls, 1);
}

#[test]
fn test_generated_modules_verify() {
    let sources = [
        "5 |> print();",
        "result = 10 + 2; result |> print();",
        "range(1,4) |> for each { item |> print(); }",
        "func add(a,b) { return a+b; } add(3,4) |> print();",
        "x = 0; if 1 < 2 { x = 10; } else { x = 20; } x |> print();",
        "x = not 0; y = -5; z = x and (y < 0 or y > 10); z |> print();",
    ];
    for source in sources {
        let module = compile(source);
        verify_module(&module).unwrap();
    }
}

#[test]
fn test_generate_fails_on_errors() {
    let program = flowc_parser::parse("ghost |> print();").unwrap();
    let err = generate(&program).unwrap_err();
    assert!(err.to_string().contains("Multiple errors"));
}
