//! Application-level orchestration.
//!
//! The form controller owns form state and the submission contract; the write
//! loop runs store writes on the runtime on behalf of the UI thread. UI/CLI
//! layers call into this module to keep responsibilities separated.

mod controller;
mod form;

#[cfg_attr(not(feature = "tui"), allow(unused_imports))]
pub(crate) use controller::{run_controller, FormEvent, UiCommand};
pub(crate) use form::FormController;
#[cfg_attr(not(feature = "tui"), allow(unused_imports))]
pub(crate) use form::PendingSubmission;
