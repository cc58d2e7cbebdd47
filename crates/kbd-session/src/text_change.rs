//! Inferring what the user did from two snapshots of the host field.
//!
//! The host calls `notify_something_will_change` with the text around the
//! cursor before a change it did not ask the keyboard for, and
//! `notify_something_did_change` afterwards. Comparing the two tells cursor
//! moves, selections, cuts and undo apart.

use kbd_core::state::BarState;
use kbd_core::text::{grapheme_count, SurroundingText};
use tracing::{debug, debug_span, warn};

use crate::dispatcher::ActionDispatcher;
use crate::editor::TextEditor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextChange {
    /// The keyboard caused the change itself.
    SystemOperation,
    /// The field was cleared while live conversion was composing (the host
    /// submitted the text).
    LiveConversionSubmitted,
    Selected { text: String, length_limit: usize },
    Deselected,
    CursorMoved { offset: i64 },
    LiveConversionStopped,
    /// Nothing observable changed.
    Tapped,
    /// A whole selected line was deselected.
    LineDeselected,
    Cut { text: String },
    /// Undo, redo or a similar edit that kept the text after the cursor.
    HistoryNavigated,
    CursorJumped,
}

impl<E: TextEditor> ActionDispatcher<E> {
    pub fn notify_something_will_change(&mut self, before: SurroundingText) {
        if self.pending_snapshot.is_some() {
            warn!(?before, "text change already pending, snapshot dropped");
            return;
        }
        self.pending_snapshot = Some(before);
    }

    pub fn notify_something_did_change(&mut self, after: SurroundingText) -> Option<TextChange> {
        let _span = debug_span!("text_change", ?after).entered();
        let change = match self.pending_snapshot.take() {
            Some(before) => Some(self.classify(before, after.clone())),
            None => {
                debug!("no snapshot before the change, nothing to compare");
                None
            }
        };
        debug!(?change, "text change");
        self.state_mut().set_surrounding_text(after);
        self.refresh_enter_key_state();
        change
    }

    fn classify(&mut self, before: SurroundingText, after: SurroundingText) -> TextChange {
        let before = SurroundingText {
            left: self.editor().adjust_left_string(&before.left),
            ..before
        };
        let after = SurroundingText {
            left: self.editor().adjust_left_string(&after.left),
            ..after
        };

        if let Some(operation) = self.editor_mut().take_previous_system_operation() {
            debug!(?operation, "change caused by the keyboard");
            return TextChange::SystemOperation;
        }

        let composing = self.editor().composing_state();
        if composing.live_conversion
            && !composing.text.is_empty()
            && !composing.is_selected
            && before != after
        {
            if after.whole().is_empty() {
                self.editor_mut().stop_composition();
                return self.text_changed(TextChange::LiveConversionSubmitted);
            }
            self.editor_mut().commit_composition_silently();
        }

        if after.has_selection() {
            let length_limit = self.state().selection_length_limit();
            self.editor_mut().user_selected_text(&after.center, length_limit);
            self.state_mut().bar_state = BarState::None;
            return self.text_changed(TextChange::Selected {
                text: after.center,
                length_limit,
            });
        }

        if before.whole() == after.whole() {
            if before.has_selection() {
                self.editor_mut().user_deselected_text();
                return self.text_changed(TextChange::Deselected);
            }
            if before.left != after.left {
                let offset = grapheme_count(&after.left) as i64 - grapheme_count(&before.left) as i64;
                let actions = self.editor_mut().user_moved_cursor(offset);
                self.register_actions(actions);
                return TextChange::CursorMoved { offset };
            }
            if composing.live_conversion {
                self.editor_mut().stop_composition();
                return self.text_changed(TextChange::LiveConversionStopped);
            }
            return self.text_changed(TextChange::Tapped);
        }

        if before.left == "\n" && before.center == after.whole() {
            self.editor_mut().user_deselected_text();
            return self.text_changed(TextChange::LineDeselected);
        }
        if before.outer() == after.outer() {
            self.editor_mut().user_cut_text(&before.center);
            return self.text_changed(TextChange::Cut {
                text: before.center,
            });
        }
        // Undo and redo rewrite the text before the cursor and keep the rest,
        // including a line break replacing an empty left side.
        if before.right == after.right {
            self.editor_mut().stop_composition();
            return self.text_changed(TextChange::HistoryNavigated);
        }
        let actions = self.editor_mut().user_jumped_cursor();
        self.register_actions(actions);
        self.text_changed(TextChange::CursorJumped)
    }

    fn text_changed(&mut self, change: TextChange) -> TextChange {
        let state = self.state_mut();
        state.text_changed_count += 1;
        let count = state.text_changed_count;
        self.editor_mut()
            .reset_post_composition_predictions_if_necessary(count);
        change
    }
}
