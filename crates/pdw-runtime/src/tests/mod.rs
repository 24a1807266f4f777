//! Crate-level integration and BDD tests.

use std::rc::Rc;

use pdw_host::{Host, SettingsOverlay};

use crate::session::{BOOTSTRAP_SCRIPT, ENTRY_SCRIPT};
use crate::{Dispatched, Dispatcher, RootPolicy, SessionOptions, SessionOutcome};

mod behaviour;
pub(crate) mod support;

use support::{BOOTSTRAP, RecordingHost, ScriptDir};

#[test]
fn scripts_read_overlay_settings_through_the_host() {
    let bundle = ScriptDir::new().with(BOOTSTRAP_SCRIPT, BOOTSTRAP).with(
        ENTRY_SCRIPT,
        "function r2dec_main(args) {\n\
             console.log(r2cmd('e pdw.casts').trim(), r2cmd('e pdw.theme').trim());\n\
         }",
    );
    let recording = RecordingHost::new().shared();
    let host: Rc<dyn Host> = Rc::new(SettingsOverlay::new(Rc::clone(&recording)));
    let dispatcher = Dispatcher::new(SessionOptions::default(), RootPolicy::Pinned(bundle.root()));

    let written = dispatcher
        .dispatch(&host, "e pdw.casts=true")
        .expect("dispatch");
    assert_eq!(written, Dispatched::NotHandled);
    host.cmd("e pdw.casts=true").expect("overlay write");

    let outcome = dispatcher.dispatch(&host, "pdw").expect("dispatch");

    assert_eq!(outcome, Dispatched::Session(SessionOutcome::Completed));
    assert_eq!(recording.console(), "true default\n");
    assert!(recording.commands().is_empty(), "overlay should answer settings");
}
