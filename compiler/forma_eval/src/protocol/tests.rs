use std::sync::Arc;

use forma_compile::compile;
use forma_ir::BehaviorKind;
use pretty_assertions::assert_eq;

use super::*;
use crate::{EvalError, Function, Method, RecordType, Value};

fn compiled(source: &str) -> Method {
    let code = compile(source).unwrap_or_else(|e| panic!("compile failed: {e}"));
    Method::Compiled(Function::new(code))
}

/// A two-field record type equipped by hand with compiled behaviors.
fn pair_type(name: &str) -> Arc<RecordType> {
    let ty = RecordType::builder(name)
        .field("a", "int")
        .field("b", "int")
        .build();
    ty.attach(
        BehaviorKind::Construct,
        compiled("fn construct(self, a, b) { self.a = a; self.b = b; }"),
    );
    ty.attach(
        BehaviorKind::Display,
        compiled(
            r#"fn display(self) { return concat(typename(self), "(", nameof(a), "=", repr(self.a), ", ", nameof(b), "=", repr(self.b), ")"); }"#,
        ),
    );
    ty.attach(
        BehaviorKind::Equality,
        compiled(
            "fn eq(self, other) { if type(self) is type(other) { return (self.a, self.b,) == (other.a, other.b,); } return NotApplicable; }",
        ),
    );
    ty
}

fn make(ty: &Arc<RecordType>, a: i64, b: i64) -> Value {
    construct(ty, &[Value::int(a), Value::int(b)])
        .unwrap_or_else(|e| panic!("construct failed: {e}"))
}

#[test]
fn repr_of_builtins() {
    assert_eq!(repr(&Value::None).ok(), Some("None".to_owned()));
    assert_eq!(repr(&Value::Bool(true)).ok(), Some("True".to_owned()));
    assert_eq!(repr(&Value::int(-7)).ok(), Some("-7".to_owned()));
    assert_eq!(repr(&Value::Float(2.0)).ok(), Some("2.0".to_owned()));
    assert_eq!(repr(&Value::Float(0.5)).ok(), Some("0.5".to_owned()));
    assert_eq!(repr(&Value::string("hi")).ok(), Some("'hi'".to_owned()));
    assert_eq!(repr(&Value::string("it's")).ok(), Some("\"it's\"".to_owned()));
    assert_eq!(repr(&Value::string("a\nb")).ok(), Some("'a\\nb'".to_owned()));
    assert_eq!(repr(&Value::tuple(vec![])).ok(), Some("()".to_owned()));
    assert_eq!(
        repr(&Value::tuple(vec![Value::int(1)])).ok(),
        Some("(1,)".to_owned())
    );
    assert_eq!(
        repr(&Value::tuple(vec![Value::int(1), Value::string("x")])).ok(),
        Some("(1, 'x')".to_owned())
    );
}

#[test]
fn repr_uses_display_behavior() {
    let ty = pair_type("Pair");
    let p = make(&ty, 3, 4);
    assert_eq!(repr(&p).ok(), Some("Pair(a=3, b=4)".to_owned()));
    assert_eq!(repr(&Value::Type(p.type_ref())).ok(), Some("<class 'Pair'>".to_owned()));
}

#[test]
fn repr_of_floats_switches_to_exponent_form_at_the_extremes() {
    let float = |x: f64| repr(&Value::Float(x)).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(float(1e16), "1e+16");
    assert_eq!(float(-2.5e20), "-2.5e+20");
    assert_eq!(float(1.5e300), "1.5e+300");
    assert_eq!(float(1e-5), "1e-05");
    assert_eq!(float(-3.25e-7), "-3.25e-07");
    assert_eq!(float(1e-100), "1e-100");
    assert_eq!(float(9_999_999_999_999_998.0), "9999999999999998.0");
    assert_eq!(float(1e-4), "0.0001");
    assert_eq!(float(123.25), "123.25");
    assert_eq!(float(0.0), "0.0");
    assert_eq!(float(-0.0), "-0.0");
    assert_eq!(float(f64::NAN), "nan");
    assert_eq!(float(f64::NEG_INFINITY), "-inf");
}

#[test]
fn float_fields_never_display_like_ints() {
    let ty = pair_type("F");
    let f = construct(&ty, &[Value::Float(1e16), Value::Float(1e-5)])
        .unwrap_or_else(|e| panic!("construct failed: {e}"));
    assert_eq!(repr(&f).ok(), Some("F(a=1e+16, b=1e-05)".to_owned()));
}

#[test]
fn repr_without_display_is_generic() {
    let ty = RecordType::builder("Opaque").build();
    let v = construct(&ty, &[]).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(repr(&v).ok(), Some("<Opaque object>".to_owned()));
}

#[test]
fn display_must_return_a_string() {
    let ty = RecordType::builder("Odd")
        .method(BehaviorKind::Display, |_| Ok(Value::int(1)))
        .build();
    let v = construct(&ty, &[]).unwrap_or_else(|e| panic!("{e}"));
    assert!(matches!(repr(&v), Err(EvalError::BadReturn { behavior: "display", .. })));
}

#[test]
fn construct_checks_argument_count() {
    let ty = pair_type("Pair");
    let err = construct(&ty, &[Value::int(1)]).err();
    assert_eq!(
        err.map(|e| e.to_string()),
        Some("construct() missing 1 required positional argument: 'b'".to_owned())
    );
    let err = construct(&ty, &[Value::int(1), Value::int(2), Value::int(3)]).err();
    assert_eq!(
        err.map(|e| e.to_string()),
        Some("construct() takes 3 positional arguments but 4 were given".to_owned())
    );

    let bare = RecordType::builder("Bare").build();
    assert!(construct(&bare, &[]).is_ok());
    assert!(matches!(
        construct(&bare, &[Value::None]),
        Err(EvalError::ArgumentCount { expected: 0, found: 1, .. })
    ));
}

#[test]
fn builtin_comparisons() {
    assert_eq!(compare(&Value::int(1), &Value::Float(1.0)).ok(), Some(Comparison::Equal));
    assert_eq!(compare(&Value::Bool(true), &Value::int(1)).ok(), Some(Comparison::Equal));
    assert_eq!(compare(&Value::int(1), &Value::int(2)).ok(), Some(Comparison::NotEqual));
    assert_eq!(
        compare(&Value::int(1), &Value::string("1")).ok(),
        Some(Comparison::NotApplicable)
    );
    assert_eq!(equals(&Value::int(1), &Value::string("1")).ok(), Some(false));
    let t = Value::tuple(vec![Value::int(1), Value::string("x")]);
    let u = Value::tuple(vec![Value::Float(1.0), Value::string("x")]);
    assert_eq!(equals(&t, &u).ok(), Some(true));
}

#[test]
fn records_compare_by_fields_within_one_type() {
    let ty = pair_type("Pair");
    assert_eq!(equals(&make(&ty, 1, 2), &make(&ty, 1, 2)).ok(), Some(true));
    assert_eq!(equals(&make(&ty, 1, 2), &make(&ty, 2, 1)).ok(), Some(false));
}

#[test]
fn nan_fields_never_compare_equal() {
    let ty = pair_type("F");
    let nan_record = || {
        construct(&ty, &[Value::Float(f64::NAN), Value::Float(0.0)])
            .unwrap_or_else(|e| panic!("construct failed: {e}"))
    };
    assert_eq!(equals(&Value::Float(f64::NAN), &Value::Float(f64::NAN)).ok(), Some(false));
    assert_eq!(equals(&nan_record(), &nan_record()).ok(), Some(false));

    let nan = Value::Float(f64::NAN);
    let t = Value::tuple(vec![nan.clone(), Value::int(1)]);
    let u = Value::tuple(vec![nan, Value::int(1)]);
    assert_eq!(equals(&t, &u).ok(), Some(false));
}

#[test]
fn shared_heap_fields_short_circuit_equality() {
    let ty = pair_type("Pair");
    let inner = make(&ty, 1, 2);
    let t = Value::tuple(vec![inner.clone(), Value::string("x")]);
    let u = Value::tuple(vec![inner, Value::string("x")]);
    assert_eq!(equals(&t, &u).ok(), Some(true));
}

#[test]
fn records_do_not_equal_tuples_or_other_types() {
    let pair = pair_type("Pair");
    let other = pair_type("Other");
    let p = make(&pair, 3, 4);
    let q = make(&other, 3, 4);
    let t = Value::tuple(vec![Value::int(3), Value::int(4)]);

    assert_eq!(compare(&p, &t).ok(), Some(Comparison::NotApplicable));
    assert_eq!(equals(&p, &t).ok(), Some(false));
    assert_eq!(equals(&t, &p).ok(), Some(false));
    assert_eq!(compare(&p, &q).ok(), Some(Comparison::NotApplicable));
    assert_eq!(equals(&p, &q).ok(), Some(false));
    assert_eq!(equals(&p, &p).ok(), Some(true));
}

#[test]
fn reflected_comparison_is_consulted() {
    let loose = RecordType::builder("Loose")
        .method(BehaviorKind::Equality, |_| Ok(Value::Bool(true)))
        .build();
    let v = construct(&loose, &[]).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(compare(&Value::int(5), &v).ok(), Some(Comparison::NotApplicable));
    assert_eq!(equals(&Value::int(5), &v).ok(), Some(true));
}

#[test]
fn hashing() {
    let one = hash(&Value::int(1)).ok();
    assert_eq!(one, hash(&Value::Float(1.0)).ok());
    assert_eq!(one, hash(&Value::Bool(true)).ok());
    let ab = Value::tuple(vec![Value::int(1), Value::int(2)]);
    let ba = Value::tuple(vec![Value::int(2), Value::int(1)]);
    assert_ne!(hash(&ab).ok(), hash(&ba).ok());

    let ty = RecordType::builder("Plain").build();
    let v = construct(&ty, &[]).unwrap_or_else(|e| panic!("{e}"));
    let w = construct(&ty, &[]).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(hash(&v).ok(), hash(&v.clone()).ok());
    assert_ne!(hash(&v).ok(), hash(&w).ok());
}

#[test]
fn hash_behavior_must_return_int() {
    let ty = RecordType::builder("H")
        .method(BehaviorKind::Hashing, |_| Ok(Value::string("nope")))
        .build();
    let v = construct(&ty, &[]).unwrap_or_else(|e| panic!("{e}"));
    assert!(matches!(hash(&v), Err(EvalError::BadReturn { behavior: "hash", .. })));
}

#[test]
fn iteration() {
    let ty = pair_type("Pair");
    assert!(matches!(iterate(&make(&ty, 1, 2)), Err(EvalError::NotIterable(_))));
    ty.attach(
        BehaviorKind::Iteration,
        compiled("gen fn iter(self) { yield self.a; yield self.b; }"),
    );
    assert_eq!(
        iterate(&make(&ty, 1, 2)).ok(),
        Some(vec![Value::int(1), Value::int(2)])
    );
    assert_eq!(
        iterate(&Value::string("ab")).ok(),
        Some(vec![Value::string("a"), Value::string("b")])
    );
    assert!(matches!(iterate(&Value::int(3)), Err(EvalError::NotIterable(_))));
}

#[test]
fn positional_matching() {
    let ty = pair_type("Pair");
    ty.set_match_args(Arc::from(ty.declared_fields()));
    let p = make(&ty, 7, 8);

    assert_eq!(
        match_positional(&p, &ty, 2).ok(),
        Some(Some(vec![Value::int(7), Value::int(8)]))
    );
    assert_eq!(match_positional(&p, &ty, 1).ok(), Some(Some(vec![Value::int(7)])));
    assert_eq!(match_positional(&Value::int(7), &ty, 1).ok(), Some(None));
    assert!(matches!(
        match_positional(&p, &ty, 3),
        Err(EvalError::TooManyPositional { allowed: 2, found: 3, .. })
    ));
}

#[test]
fn deep_record_chains_do_not_overflow() {
    let ty = RecordType::builder("Link").field("next", "Link").build();
    ty.attach(
        BehaviorKind::Construct,
        compiled("fn construct(self, next) { self.next = next; }"),
    );
    ty.attach(
        BehaviorKind::Equality,
        compiled(
            "fn eq(self, other) { if type(self) is type(other) { return (self.next,) == (other.next,); } return NotApplicable; }",
        ),
    );
    let chain = || {
        (0..2_000).try_fold(Value::None, |next, _| construct(&ty, &[next]))
    };
    let (a, b) = match (chain(), chain()) {
        (Ok(a), Ok(b)) => (a, b),
        _ => panic!("construct failed"),
    };
    assert_eq!(equals(&a, &b).ok(), Some(true));
}
