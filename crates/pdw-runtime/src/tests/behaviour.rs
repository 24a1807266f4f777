//! Behaviour-driven tests for command dispatch.

use std::rc::Rc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use pdw_host::Host;

use super::support::{BOOTSTRAP, ECHO_ENTRY, RecordingHost, ScriptDir};
use crate::session::{BOOTSTRAP_SCRIPT, ENTRY_SCRIPT, MISSING_ENTRY_POINT};
use crate::{
    DispatchError, Dispatched, Dispatcher, RootPolicy, SessionOptions, SessionOutcome, usage,
};

// ---------------------------------------------------------------------------
// Test world
// ---------------------------------------------------------------------------

struct TestWorld {
    bundle: ScriptDir,
    recording: Rc<RecordingHost>,
    dispatcher: Option<Dispatcher>,
    result: Option<Result<Dispatched, DispatchError>>,
}

impl TestWorld {
    fn new() -> Self {
        Self {
            bundle: ScriptDir::new(),
            recording: RecordingHost::new().shared(),
            dispatcher: None,
            result: None,
        }
    }

    fn dispatched(&self) -> &Dispatched {
        self.result
            .as_ref()
            .expect("no line dispatched")
            .as_ref()
            .expect("dispatch failed")
    }
}

#[fixture]
fn world() -> TestWorld {
    TestWorld::new()
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("a script bundle with an echoing entry point")]
fn given_echo_bundle(world: &mut TestWorld) {
    world.bundle.write(BOOTSTRAP_SCRIPT, BOOTSTRAP);
    world.bundle.write(ENTRY_SCRIPT, ECHO_ENTRY);
}

#[given("an empty script bundle")]
fn given_empty_bundle(world: &mut TestWorld) {
    world.bundle = ScriptDir::new();
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when("the host sends {line}")]
fn when_host_sends(world: &mut TestWorld, line: String) {
    let dispatcher = world.dispatcher.take().unwrap_or_else(|| {
        Dispatcher::new(
            SessionOptions::default(),
            RootPolicy::Pinned(world.bundle.root()),
        )
    });
    let host: Rc<dyn Host> = world.recording.clone();
    world.result = Some(dispatcher.dispatch(&host, line.trim_matches('"')));
    world.dispatcher = Some(dispatcher);
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("a session completes")]
fn then_session_completes(world: &mut TestWorld) {
    assert_eq!(
        world.dispatched(),
        &Dispatched::Session(SessionOutcome::Completed)
    );
}

#[then("the session reports a missing entry point")]
fn then_entry_point_missing(world: &mut TestWorld) {
    assert_eq!(
        world.dispatched(),
        &Dispatched::Session(SessionOutcome::EntryPointMissing)
    );
    assert!(world.recording.console().starts_with(MISSING_ENTRY_POINT));
}

#[then("no session runs")]
fn then_no_session(world: &mut TestWorld) {
    assert_eq!(world.dispatched(), &Dispatched::Handled);
}

#[then("the line is announced and forwarded")]
fn then_announced(world: &mut TestWorld) {
    let dispatched = world.dispatched();
    assert_eq!(dispatched, &Dispatched::Announced);
    assert!(dispatched.forwards_to_host());
}

#[then("the entry point received {tokens}")]
fn then_entry_point_received(world: &mut TestWorld, tokens: String) {
    let expected: Vec<&str> = tokens.trim_matches('"').split_whitespace().collect();
    let console = world.recording.console();
    let line = console.lines().last().expect("entry point printed nothing");
    let received: Vec<String> = serde_json::from_str(line).expect("argument array");
    assert_eq!(received, expected);
}

#[then("the console shows the usage text")]
fn then_usage_printed(world: &mut TestWorld) {
    assert_eq!(world.recording.console(), usage());
}

#[then("the console mentions {text}")]
fn then_console_mentions(world: &mut TestWorld, text: String) {
    let console = world.recording.console();
    assert!(
        console.contains(text.trim_matches('"')),
        "console did not mention {text}: {console:?}"
    );
}

#[then("the host link is detached")]
fn then_link_detached(world: &mut TestWorld) {
    let dispatcher = world.dispatcher.as_ref().expect("dispatcher not created");
    assert!(!dispatcher.link().is_attached());
}

// ---------------------------------------------------------------------------
// Scenario registration
// ---------------------------------------------------------------------------

#[scenario(path = "tests/features/dispatch.feature")]
fn dispatch_behaviour(world: TestWorld) {
    let _ = world;
}
