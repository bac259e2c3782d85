use crate::analysis::verify_function;
use crate::builder::FunctionBuilder;
use crate::function::{FunctionSignature, Parameter};
use crate::instructions::{IcmpPred, Instruction};
use crate::module::Module;
use crate::types::Type;
use crate::values::Value;

fn scalar_sig(name: &str, params: &[&str]) -> FunctionSignature {
    FunctionSignature::new(
        name,
        params.iter().map(|p| Parameter::new(*p, Type::I32)).collect(),
        Type::I32,
    )
}

#[test]
fn test_arithmetic_emission() {
    let mut module = Module::new("test");
    let mut func = FunctionBuilder::new(scalar_sig("calc", &["a", "b"]));

    let a = func.param(0).unwrap();
    let b = func.param(1).unwrap();
    let sum = func.add(a.clone(), b.clone(), Type::I32);
    let diff = func.sub(sum.clone(), b, Type::I32);
    let prod = func.mul(diff.clone(), a, Type::I32);
    let quot = func.sdiv(prod, FunctionBuilder::const_int(2), Type::I32);
    func.ret(quot).unwrap();

    let function = func.build();
    module.add_function(function).unwrap();
    verify_function(&module, module.get_function("calc").unwrap()).unwrap();

    let f = module.get_function("calc").unwrap();
    let entry = f.body.get_block(f.entry_block()).unwrap();
    assert_eq!(entry.instructions.len(), 4);
    assert!(entry.is_terminated());
}

#[test]
fn test_value_types_are_tracked() {
    let mut func = FunctionBuilder::new(scalar_sig("typed", &["x"]));

    let x = func.param(0).unwrap();
    assert_eq!(func.value_type(&x), Some(Type::I32));

    let cmp = func.icmp(IcmpPred::Slt, x.clone(), FunctionBuilder::const_int(10));
    assert_eq!(func.value_type(&cmp), Some(Type::I1));

    let slot = func.entry_alloca(Type::I32);
    assert_eq!(func.value_type(&slot), Some(Type::I32.pointer_to()));

    let loaded = func.load(slot, Type::I32);
    assert_eq!(func.value_type(&loaded), Some(Type::I32));

    assert_eq!(
        func.value_type(&FunctionBuilder::const_int(7)),
        Some(Type::I32)
    );
}

#[test]
fn test_entry_alloca_stays_ahead_of_code() {
    let mut func = FunctionBuilder::new(scalar_sig("slots", &["n"]));

    let n = func.param(0).unwrap();
    let first = func.entry_alloca(Type::I32);
    func.store(first.clone(), n.clone());

    // A later allocation must still land in the alloca prefix, before the
    // store that is already in entry.
    let second = func.entry_alloca(Type::I32);
    func.store(second, FunctionBuilder::const_int(0));
    func.ret(FunctionBuilder::const_int(0)).unwrap();

    let function = func.build();
    let entry = function.body.get_block(function.entry_block()).unwrap();

    let first_non_alloca = entry
        .instructions
        .iter()
        .position(|i| !i.is_alloca())
        .unwrap();
    assert_eq!(first_non_alloca, 2);
    assert!(entry.instructions[..2].iter().all(|i| i.is_alloca()));
}

#[test]
fn test_call_returns_value_for_non_void() {
    let mut func = FunctionBuilder::new(scalar_sig("caller", &[]));

    let result = func.call("callee", vec![FunctionBuilder::const_int(1)], Type::I32);
    assert!(result.is_some());
    func.ret(result.unwrap()).unwrap();

    let void_result = {
        let mut other = FunctionBuilder::new(scalar_sig("other", &[]));
        let r = other.call("sink", Vec::new(), Type::Void);
        other.ret(FunctionBuilder::const_int(0)).unwrap();
        r
    };
    assert!(void_result.is_none());
}

#[test]
fn test_sealing_twice_is_rejected() {
    let mut func = FunctionBuilder::new(scalar_sig("sealed", &[]));
    func.ret(FunctionBuilder::const_int(0)).unwrap();
    assert!(func.ret(FunctionBuilder::const_int(1)).is_err());
    assert!(func.is_terminated());
}

#[test]
fn test_switch_to_unknown_block_fails() {
    let mut func = FunctionBuilder::new(scalar_sig("blocks", &[]));
    assert!(func.switch_to_block(crate::block::BlockId(42)).is_err());

    let b = func.create_block();
    func.switch_to_block(b).unwrap();
    assert_eq!(func.current_block(), b);
}

#[test]
fn test_module_globals_and_strings() {
    let mut module = Module::new("globals");

    let cell = module.add_global("counter", Type::I32);
    let Value::Global(id) = cell else {
        panic!("expected global value")
    };
    assert_eq!(module.global_type(id), Some(Type::I32.pointer_to()));

    let s1 = module.global_string("%d\n", ".fmt_int");
    let s2 = module.global_string("%d\n", ".fmt_int");
    assert_eq!(s1, s2, "string constants are interned by content");
    assert_eq!(module.strings.len(), 1);
}

#[test]
fn test_instruction_result_and_operands() {
    let inst = Instruction::Add {
        result: Value::Temp(crate::values::TempId(0)),
        left: FunctionBuilder::const_int(1),
        right: FunctionBuilder::const_int(2),
        ty: Type::I32,
    };
    assert!(inst.result().is_some());
    assert_eq!(inst.operands().len(), 2);

    let store = Instruction::Store {
        ptr: Value::Temp(crate::values::TempId(1)),
        value: FunctionBuilder::const_int(3),
    };
    assert!(store.result().is_none());
}
