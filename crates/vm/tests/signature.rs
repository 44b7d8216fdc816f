mod common;

use types::{Category, Reg};
use vm::error::{ArgumentMismatch, SignatureError};
use vm::kernel::signature::{compiled, SigMask, Signature};

fn sig(text: &str) -> Signature {
    Signature::compile(text).expect("signature compiles")
}

#[test]
fn test_scenario_integer_object_then_integers() {
    let signature = sig("io(i*)");
    assert!(signature.matches_categories(&[Category::Integer, Category::Object]));
    assert!(signature.matches_categories(&[
        Category::Integer,
        Category::Object,
        Category::Integer,
        Category::Integer,
    ]));
    assert!(!signature.matches_categories(&[Category::Object, Category::Object]));
    assert_eq!(signature.min_args(), 2);
    assert_eq!(signature.max_args(), None);
}

#[test]
fn test_mismatch_reports_position_and_expected_set() {
    let mut state = common::state();
    state.instantiate_script(5).expect("instantiate");
    let object = state.script_object(5, 1).expect("object");

    let signature = sig("io(i*)");
    assert_eq!(
        signature.check(&state.heap, &[object, object]),
        Err(ArgumentMismatch::WrongType {
            position: 0,
            expected: SigMask::INTEGER | SigMask::NULL,
            found: Category::Object,
        })
    );
    assert_eq!(signature.check(&state.heap, &[Reg::int(1), object, Reg::int(2)]), Ok(()));
    assert_eq!(
        signature.check(&state.heap, &[Reg::int(1)]),
        Err(ArgumentMismatch::TooFew { expected: 2, found: 1 })
    );
}

#[test]
fn test_empty_lists() {
    assert!(sig("").matches_categories(&[]));
    assert!(sig("(i)").matches_categories(&[]));
    assert!(sig("(.*)").matches_categories(&[]));
    assert!(!sig("i").matches_categories(&[]));
    assert!(!sig("i*").matches_categories(&[]));
    assert!(!sig("").matches_categories(&[Category::Integer]));
}

#[test]
fn test_integer_letter_accepts_null() {
    let signature = sig("i");
    assert!(signature.matches_categories(&[Category::Null]));
    assert!(signature.matches_categories(&[Category::Integer]));
    assert!(!signature.matches_categories(&[Category::Reference]));
    assert!(!sig("0").matches_categories(&[Category::Integer]));
}

#[test]
fn test_any_rejects_invalid_only() {
    let any = sig(".");
    for category in [
        Category::Integer,
        Category::Null,
        Category::Object,
        Category::List,
        Category::Node,
        Category::Reference,
        Category::Uninitialized,
    ] {
        assert!(any.matches_categories(&[category]), "{category}");
    }
    assert!(!any.matches_categories(&[Category::Invalid]));
    assert!(sig("u").matches_categories(&[Category::Uninitialized]));
}

#[test]
fn test_either_or_groups() {
    let signature = sig("[ol]n");
    assert!(signature.matches_categories(&[Category::Object, Category::Node]));
    assert!(signature.matches_categories(&[Category::List, Category::Node]));
    assert!(!signature.matches_categories(&[Category::Node, Category::Node]));
    assert_eq!(signature.slots()[0].to_string(), "[ol]");
}

#[test]
fn test_too_many_arguments() {
    let signature = sig("i(i)");
    assert!(signature.matches_categories(&[Category::Integer, Category::Integer]));
    assert!(!signature.matches_categories(&[Category::Integer; 3]));
    assert_eq!(signature.max_args(), Some(2));
}

#[test]
fn test_invalid_argument_fails_check() {
    let state = common::state();
    let dangling = Reg::from_raw(0x700, 4);
    assert_eq!(
        sig(".").check(&state.heap, &[dangling]),
        Err(ArgumentMismatch::InvalidReference { position: 0, reg: dangling })
    );
}

#[test]
fn test_slot_flags() {
    let signature = sig("ii(i*)");
    let slots = signature.slots();
    assert!(slots[0].needs_more());
    assert!(!slots[1].needs_more());
    assert!(slots[2].is_optional());
    assert!(slots[2].more_may_follow());
}

#[test]
fn test_compile_errors() {
    assert!(matches!(Signature::compile("i(i"), Err(SignatureError::Unbalanced { found: '(', .. })));
    assert!(matches!(Signature::compile("[io"), Err(SignatureError::Unbalanced { found: '[', .. })));
    assert!(matches!(Signature::compile("i)"), Err(SignatureError::Unbalanced { position: 1, .. })));
    assert!(matches!(Signature::compile("io]"), Err(SignatureError::Unbalanced { .. })));
    assert!(matches!(Signature::compile("*i"), Err(SignatureError::MoreWithoutType { position: 0, .. })));
    assert!(matches!(Signature::compile("i**"), Err(SignatureError::MoreWithoutType { position: 2, .. })));
    assert!(matches!(Signature::compile("(i)i"), Err(SignatureError::MandatoryAfterOptional { position: 3, .. })));
    assert!(matches!(Signature::compile("[oo]"), Err(SignatureError::DuplicateType { found: 'o', .. })));
    assert!(matches!(Signature::compile("i*i"), Err(SignatureError::SlotAfterMore { position: 2, .. })));
    assert!(matches!(Signature::compile("x"), Err(SignatureError::UnknownType { found: 'x', .. })));
    assert!(matches!(Signature::compile("[]"), Err(SignatureError::EmptyGroup { position: 0, .. })));
    assert!(matches!(Signature::compile("((i))"), Err(SignatureError::NestedOptional { position: 1, .. })));
}

#[test]
fn test_compiled_signatures_are_shared() {
    let a = compiled("l.").expect("compiles");
    let b = compiled("l.").expect("compiles");
    assert!(std::sync::Arc::ptr_eq(&a, &b));
    assert!(compiled("l(").is_err());
}
