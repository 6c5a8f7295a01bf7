//! Integration tests for Error types
//!
//! Tests error construction, display, context, and error kinds.

use retort_foundation::{Error, ErrorContext, ErrorKind, FactId};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_duplicate_identifier() {
    let err = Error::duplicate_identifier(FactId::new(2));
    assert!(matches!(err.kind, ErrorKind::DuplicateIdentifier(_)));
    assert!(format!("{err}").contains("f-2"));
}

#[test]
fn error_unknown_fact() {
    let err = Error::unknown_fact(FactId::new(9));
    assert!(matches!(err.kind, ErrorKind::UnknownFact(id) if id == FactId::new(9)));
}

#[test]
fn error_unknown_wme() {
    let err = Error::unknown_wme("(b1 on b2)");
    assert_eq!(format!("{err}"), "unknown wme: (b1 on b2)");
}

#[test]
fn error_productions() {
    let dup = Error::duplicate_production("stack");
    assert!(matches!(dup.kind, ErrorKind::DuplicateProduction(ref n) if n == "stack"));
    let unknown = Error::unknown_production("p-3");
    assert!(format!("{unknown}").contains("p-3"));
}

#[test]
fn error_callback_and_internal() {
    assert!(format!("{}", Error::callback("boom")).contains("boom"));
    assert!(format!("{}", Error::internal("bad")).starts_with("internal error"));
}

// =============================================================================
// Preconditions
// =============================================================================

#[test]
fn precondition_kinds() {
    assert!(Error::unknown_fact(FactId::new(0)).is_precondition());
    assert!(Error::stale_match("p-0 t-1").is_precondition());
    assert!(!Error::callback("boom").is_precondition());
    assert!(!Error::unsupported_negation("mismatch").is_precondition());
    assert!(!Error::internal("bad").is_precondition());
}

// =============================================================================
// Context
// =============================================================================

#[test]
fn error_with_context() {
    let err = Error::callback("boom")
        .with_context(ErrorContext::new().with_source("stack").with_frame("filter big"));
    let ctx = err.context.as_ref().unwrap();
    assert_eq!(ctx.source.as_deref(), Some("stack"));
    assert_eq!(ctx.stack, vec!["filter big".to_string()]);
    assert!(ctx.to_string().contains("in filter big"));
}
