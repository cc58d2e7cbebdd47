//! Stateful keyboard session: touch recognition, action dispatch and text
//! change inference.
//!
//! `KeyboardSession` owns the layout's keys, the `ActionDispatcher` and one
//! virtual timeline. The host feeds it timed touch events and field change
//! notifications; the session applies editing actions through a
//! [`TextEditor`] and reports effects (feedback, app launches) back.

pub mod buffer;
pub mod dispatcher;
pub mod editor;
pub mod lifecycle;
pub mod simple_key;
pub mod text_change;

mod session;

#[cfg(test)]
mod tests;

pub use buffer::BufferEditor;
pub use dispatcher::{ActionDispatcher, Effect};
pub use editor::{Candidate, ComposingState, SystemOperation, TextEditor};
pub use lifecycle::{Outcome, PressLifecycle, PressState, Suggest};
pub use session::{KeyId, KeyboardSession};
pub use simple_key::SimpleKeyLifecycle;
pub use text_change::TextChange;
