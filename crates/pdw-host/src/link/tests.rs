//! Unit tests for the session-scoped host link.

use std::rc::Rc;

use mockall::mock;
use mockall::predicate::eq;
use rstest::{fixture, rstest};

use super::*;

mock! {
    pub Console {}

    impl Host for Console {
        fn cmd(&self, command: &str) -> Result<String, HostError>;
        fn print(&self, text: &str);
    }
}

#[fixture]
fn link() -> HostLink {
    HostLink::new()
}

#[rstest]
fn detached_link_reports_no_active_host(link: HostLink) {
    assert!(!link.is_attached());
    let err = link.cmd("pdf").expect_err("detached link must fail");
    assert!(matches!(err, HostError::NoActiveHost));
    assert!(matches!(link.print("x"), Err(HostError::NoActiveHost)));
}

#[rstest]
fn attached_link_forwards_commands(link: HostLink) {
    let mut host = MockConsole::new();
    host.expect_cmd()
        .with(eq("e asm.arch"))
        .times(1)
        .returning(|_| Ok(String::from("wasm\n")));

    let _attached = link.attach(Rc::new(host)).expect("attach");
    assert_eq!(link.cmd("e asm.arch").expect("cmd"), "wasm\n");
}

#[rstest]
fn clones_share_the_attachment(link: HostLink) {
    let mut host = MockConsole::new();
    host.expect_print().with(eq("hello")).times(1).return_const(());

    let callback_copy = link.clone();
    let attached = link.attach(Rc::new(host)).expect("attach");
    callback_copy.print("hello").expect("print through clone");
    drop(attached);

    assert!(!callback_copy.is_attached());
    assert!(matches!(
        callback_copy.cmd("pdf"),
        Err(HostError::NoActiveHost)
    ));
}

#[rstest]
fn second_attachment_is_refused(link: HostLink) {
    let _first = link.attach(Rc::new(MockConsole::new())).expect("attach");
    let err = link
        .attach(Rc::new(MockConsole::new()))
        .expect_err("second attach must fail");
    assert!(matches!(err, HostError::AlreadyAttached));
}

#[rstest]
fn guard_detaches_during_unwind(link: HostLink) {
    let inner = link.clone();
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
        let _attached = inner.attach(Rc::new(MockConsole::new())).expect("attach");
        panic!("script bridge failed mid-session");
    }));

    assert!(outcome.is_err());
    assert!(!link.is_attached());
}

#[rstest]
fn link_can_be_reattached_after_detach(link: HostLink) {
    drop(link.attach(Rc::new(MockConsole::new())).expect("first attach"));
    let _second = link
        .attach(Rc::new(MockConsole::new()))
        .expect("reattach after detach");
    assert!(link.is_attached());
}
