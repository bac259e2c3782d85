use crate::analysis::{verify_function, verify_module};
use crate::block::BlockId;
use crate::builder::FunctionBuilder;
use crate::function::{Function, FunctionSignature, Parameter};
use crate::instructions::{IcmpPred, Instruction};
use crate::module::Module;
use crate::types::Type;
use crate::values::{TempId, Value};
use crate::IrError;

fn scalar_sig(name: &str, params: &[&str]) -> FunctionSignature {
    FunctionSignature::new(
        name,
        params.iter().map(|p| Parameter::new(*p, Type::I32)).collect(),
        Type::I32,
    )
}

fn expect_failure(module: &Module, function: &Function, needle: &str) {
    match verify_function(module, function) {
        Err(IrError::VerificationFailed(msg)) => {
            assert!(
                msg.contains(needle),
                "expected failure mentioning {:?}, got: {}",
                needle,
                msg
            );
        }
        other => panic!("expected verification failure, got {:?}", other.err()),
    }
}

#[test]
fn test_unterminated_block_is_rejected() {
    let module = Module::new("test");
    let function = Function::new(scalar_sig("open", &[]));
    expect_failure(&module, &function, "no terminator");
}

#[test]
fn test_branch_to_unknown_block_is_rejected() {
    let module = Module::new("test");
    let mut func = FunctionBuilder::new(scalar_sig("wild", &[]));
    func.br(BlockId(9)).unwrap();
    let function = func.build();
    expect_failure(&module, &function, "unknown");
}

#[test]
fn test_alloca_outside_entry_is_rejected() {
    let module = Module::new("test");
    let mut func = FunctionBuilder::new(scalar_sig("late", &[]));
    let other = func.create_block();
    func.br(other).unwrap();
    func.switch_to_block(other).unwrap();
    func.ret(FunctionBuilder::const_int(0)).unwrap();

    let mut function = func.build();
    function
        .body
        .get_block_mut(other)
        .unwrap()
        .instructions
        .push(Instruction::Alloca {
            result: Value::Temp(TempId(90)),
            ty: Type::I32,
        });
    expect_failure(&module, &function, "outside entry");
}

#[test]
fn test_phi_with_wrong_predecessors_is_rejected() {
    let module = Module::new("test");
    let mut func = FunctionBuilder::new(scalar_sig("badphi", &["x"]));

    let x = func.param(0).unwrap();
    let a = func.create_block();
    let b = func.create_block();
    let merge = func.create_block();

    let cond = func.icmp(IcmpPred::Ne, x, FunctionBuilder::const_int(0));
    func.cond_br(cond, a, b).unwrap();
    func.switch_to_block(a).unwrap();
    func.br(merge).unwrap();
    func.switch_to_block(b).unwrap();
    func.br(merge).unwrap();

    func.switch_to_block(merge).unwrap();
    // Only one of the two predecessors is covered.
    let phi = func.phi(Type::I32, vec![(a, FunctionBuilder::const_int(1))]);
    func.ret(phi).unwrap();

    let function = func.build();
    expect_failure(&module, &function, "predecessors");
}

#[test]
fn test_call_arity_mismatch_is_rejected() {
    let mut module = Module::new("test");

    let mut callee = FunctionBuilder::new(scalar_sig("callee", &["a", "b"]));
    let a = callee.param(0).unwrap();
    callee.ret(a).unwrap();
    module.add_function(callee.build()).unwrap();

    let mut caller = FunctionBuilder::new(scalar_sig("caller", &[]));
    let r = caller
        .call("callee", vec![FunctionBuilder::const_int(1)], Type::I32)
        .unwrap();
    caller.ret(r).unwrap();
    let function = caller.build();

    expect_failure(&module, &function, "arguments");
}

#[test]
fn test_variadic_call_accepts_extra_arguments() {
    let mut module = Module::new("test");
    module.declare_function(FunctionSignature::variadic(
        "printf",
        vec![Parameter::new("format", Type::I8.pointer_to())],
        Type::I32,
    ));

    let fmt = module.global_string("%d\n", ".fmt_int");
    let mut func = FunctionBuilder::new(scalar_sig("printer", &[]));
    func.register_value_type(fmt.clone(), Type::I8.pointer_to());
    let r = func
        .call("printf", vec![fmt, FunctionBuilder::const_int(5)], Type::I32)
        .unwrap();
    func.ret(r).unwrap();
    let function = func.build();

    verify_function(&module, &function).unwrap();
}

#[test]
fn test_call_to_unknown_function_is_rejected() {
    let module = Module::new("test");
    let mut func = FunctionBuilder::new(scalar_sig("orphan_call", &[]));
    let r = func.call("missing", Vec::new(), Type::I32).unwrap();
    func.ret(r).unwrap();
    let function = func.build();
    expect_failure(&module, &function, "unknown function");
}

#[test]
fn test_use_without_dominating_definition_is_rejected() {
    let module = Module::new("test");
    let mut func = FunctionBuilder::new(scalar_sig("floating", &[]));
    let ghost = Value::Temp(TempId(77));
    let r = func.add(ghost, FunctionBuilder::const_int(1), Type::I32);
    func.ret(r).unwrap();
    let function = func.build();
    expect_failure(&module, &function, "undefined");
}

#[test]
fn test_definition_in_one_arm_does_not_dominate_merge() {
    let module = Module::new("test");
    let mut func = FunctionBuilder::new(scalar_sig("onesided", &["x"]));

    let x = func.param(0).unwrap();
    let a = func.create_block();
    let b = func.create_block();
    let merge = func.create_block();

    let cond = func.icmp(IcmpPred::Ne, x.clone(), FunctionBuilder::const_int(0));
    func.cond_br(cond, a, b).unwrap();

    func.switch_to_block(a).unwrap();
    let only_here = func.add(x, FunctionBuilder::const_int(1), Type::I32);
    func.br(merge).unwrap();

    func.switch_to_block(b).unwrap();
    func.br(merge).unwrap();

    func.switch_to_block(merge).unwrap();
    // Using the value defined only along the `a` arm.
    let r = func.add(only_here, FunctionBuilder::const_int(2), Type::I32);
    func.ret(r).unwrap();

    let function = func.build();
    expect_failure(&module, &function, "not dominated");
}

#[test]
fn test_return_type_mismatch_is_rejected() {
    let module = Module::new("test");
    let mut func = FunctionBuilder::new(scalar_sig("silent", &[]));
    func.ret_void().unwrap();
    let function = func.build();
    expect_failure(&module, &function, "missing return value");
}

#[test]
fn test_verify_module_aggregates_functions() {
    let mut module = Module::new("test");

    let mut good = FunctionBuilder::new(scalar_sig("good", &[]));
    good.ret(FunctionBuilder::const_int(0)).unwrap();
    module.add_function(good.build()).unwrap();

    let bad = Function::new(scalar_sig("bad", &[]));
    module.add_function(bad).unwrap();

    let err = verify_module(&module).unwrap_err();
    assert!(err.to_string().contains("bad"));
    assert!(!err.to_string().contains("good:"));
}
