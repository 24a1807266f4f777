//! Unit tests for the fatal error trap.

use std::panic::{self, AssertUnwindSafe};

use rstest::rstest;

use super::*;
use crate::tests::support::{SharedSink, unwind_instead_of_abort};

fn trap(policy: FatalPolicy) -> (FatalErrorTrap, SharedSink) {
    let sink = SharedSink::default();
    let trap = FatalErrorTrap::with_sink(policy, Box::new(sink.clone()), unwind_instead_of_abort);
    (trap, sink)
}

#[rstest]
#[case::message(Some("stack exhausted"), "*** FATAL ERROR: stack exhausted\n")]
#[case::absent(None, "*** FATAL ERROR: no message\n")]
#[case::blank(Some("  \n"), "*** FATAL ERROR: no message\n")]
fn report_writes_single_diagnostic(#[case] message: Option<&str>, #[case] expected: &str) {
    let (trap, sink) = trap(FatalPolicy::Contain);
    trap.report(message);
    assert_eq!(sink.contents(), expected);
}

#[test]
fn abort_policy_writes_before_terminating() {
    let (trap, sink) = trap(FatalPolicy::Abort);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| trap.trip(Some("heap corrupted"))));
    assert!(outcome.is_err(), "abort policy must terminate");
    assert_eq!(sink.contents(), "*** FATAL ERROR: heap corrupted\n");
}

#[test]
fn contain_policy_returns_to_caller() {
    let (trap, sink) = trap(FatalPolicy::Contain);
    trap.trip(None);
    trap.trip(Some("second"));
    assert_eq!(
        sink.contents(),
        "*** FATAL ERROR: no message\n*** FATAL ERROR: second\n"
    );
}

#[rstest]
#[case::static_str(Box::new("boom"), Some("boom"))]
#[case::owned(Box::new(String::from("owned boom")), Some("owned boom"))]
#[case::other(Box::new(7_u32), None)]
fn panic_payloads_are_decoded(
    #[case] payload: Box<dyn std::any::Any + Send>,
    #[case] expected: Option<&str>,
) {
    assert_eq!(panic_message(payload.as_ref()).as_deref(), expected);
}
