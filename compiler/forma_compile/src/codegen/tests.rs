use crate::{compile, Builtin, CodeFlags, CompareOp, CompileErrorKind, Const, Op};
use forma_ir::Name;
use pretty_assertions::assert_eq;

fn names(list: &[&str]) -> Vec<Name> {
    list.iter().map(|s| Name::intern(s)).collect()
}

fn compile_ok(source: &str) -> crate::CodeObject {
    compile(source).unwrap_or_else(|e| panic!("compile failed: {e}"))
}

fn compile_err(source: &str) -> CompileErrorKind {
    match compile(source) {
        Ok(code) => panic!("expected compile error, got:\n{code}"),
        Err(e) => e.kind,
    }
}

#[test]
fn construct_bytecode() {
    let code = compile_ok("fn construct(self, _0, _1) { self._0 = _0; self._1 = _1; }");
    assert_eq!(code.varnames(), names(&["self", "_0", "_1"]).as_slice());
    assert_eq!(code.names(), names(&["_0", "_1"]).as_slice());
    assert_eq!(code.argcount(), 3);
    assert_eq!(
        code.ops(),
        &[
            Op::LoadFast(1),
            Op::LoadFast(0),
            Op::StoreAttr(0),
            Op::LoadFast(2),
            Op::LoadFast(0),
            Op::StoreAttr(1),
            Op::LoadConst(0),
            Op::Return,
        ]
    );
    assert_eq!(code.consts(), &[Const::None]);
}

#[test]
fn nameof_and_attributes_share_one_names_entry() {
    let code = compile_ok(
        r#"fn display(self) { return concat(typename(self), "(", nameof(_0), "=", repr(self._0), ")"); }"#,
    );
    assert_eq!(code.names(), names(&["_0"]).as_slice());
    assert!(code.ops().contains(&Op::LoadNameStr(0)));
    assert!(code.ops().contains(&Op::LoadAttr(0)));
    assert!(code.ops().contains(&Op::BuildString(6)));
    assert!(code.ops().contains(&Op::CallBuiltin(Builtin::TypeName)));
}

#[test]
fn constants_are_deduplicated() {
    let code = compile_ok(r#"fn f(self) { return concat(", ", ", ", "x"); }"#);
    let strings: Vec<_> = code
        .consts()
        .iter()
        .filter(|c| matches!(c, Const::Str(_)))
        .collect();
    assert_eq!(strings.len(), 2);
}

#[test]
fn if_without_else_jumps_past_body() {
    let code = compile_ok("fn eq(self, other) { if type(self) is type(other) { return true; } return NotApplicable; }");
    let ops = code.ops();
    let Some(Op::PopJumpIfFalse(target)) = ops.iter().find(|op| matches!(op, Op::PopJumpIfFalse(_))) else {
        panic!("no conditional jump in:\n{code}");
    };
    // The jump lands on the `NotApplicable` load right after `return true;`.
    assert!(matches!(ops[*target as usize], Op::LoadConst(_)));
    assert!(matches!(ops[*target as usize - 1], Op::Return));
    assert!(ops.contains(&Op::Compare(CompareOp::Is)));
}

#[test]
fn if_else_patches_both_jumps() {
    let code = compile_ok("fn f(self, a) { if a { return 1; } else { return 2; } }");
    let jumps: Vec<_> = code
        .ops()
        .iter()
        .filter_map(|op| match op {
            Op::Jump(t) | Op::PopJumpIfFalse(t) => Some(*t),
            _ => None,
        })
        .collect();
    assert_eq!(jumps.len(), 2);
    assert!(jumps.iter().all(|&t| t > 0 && (t as usize) <= code.ops().len()));
}

#[test]
fn generator_flag() {
    let code = compile_ok("gen fn iter(self) { yield self._0; }");
    assert_eq!(code.flags(), CodeFlags::GENERATOR);
    assert!(code.is_generator());
}

#[test]
fn zero_field_templates_compile() {
    let code = compile_ok("fn construct(self) { }");
    assert!(code.names().is_empty());
    assert_eq!(code.argcount(), 1);
    let code = compile_ok("fn eq(self, other) { if type(self) is type(other) { return () == (); } return NotApplicable; }");
    assert!(code.ops().contains(&Op::BuildTuple(0)));
}

#[test]
fn semantic_errors() {
    assert_eq!(
        compile_err("fn f(self) { return missing; }"),
        CompileErrorKind::UnboundName("missing".into())
    );
    assert_eq!(
        compile_err("fn f(self) { return frob(self); }"),
        CompileErrorKind::UnknownBuiltin("frob".into())
    );
    assert_eq!(
        compile_err("fn f(self) { return repr(self, self); }"),
        CompileErrorKind::BuiltinArity {
            name: "repr",
            expected: 1,
            found: 2
        }
    );
    assert_eq!(
        compile_err("fn f(self) { return nameof(self.x); }"),
        CompileErrorKind::NameofTarget
    );
    assert_eq!(
        compile_err("fn f(self, a, a) { }"),
        CompileErrorKind::DuplicateParam("a".into())
    );
    assert_eq!(
        compile_err("fn f(self) { yield 1; }"),
        CompileErrorKind::YieldOutsideGenerator
    );
}

#[test]
fn replace_names_keeps_instructions() {
    let code = compile_ok("fn construct(self, _0) { self._0 = _0; }");
    let renamed = code
        .replace_names(names(&["width"]), names(&["self", "width"]))
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(renamed.ops(), code.ops());
    assert_eq!(renamed.consts(), code.consts());
    assert_eq!(renamed.names(), names(&["width"]).as_slice());
    // The source object is untouched.
    assert_eq!(code.names(), names(&["_0"]).as_slice());
}

#[test]
fn replace_names_rejects_length_change() {
    let code = compile_ok("fn construct(self, _0) { self._0 = _0; }");
    let err = code
        .replace_names(names(&["a", "b"]), names(&["self", "a"]))
        .err()
        .map(|e| (e.table, e.expected, e.found));
    assert_eq!(err, Some(("names", 1, 2)));
}

#[test]
fn disassembly_mentions_names() {
    let code = compile_ok("fn construct(self, _0) { self._0 = _0; }");
    let listing = code.to_string();
    assert!(listing.starts_with("fn construct(self, _0)\n"));
    assert!(listing.contains("StoreAttr 0 (_0)"));
}
