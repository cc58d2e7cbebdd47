//! In-memory text field with a cursor, a selection and a trailing composition.

use std::collections::BTreeMap;

use unicode_segmentation::UnicodeSegmentation;

use kbd_core::action::{Action, CharacterForm, CharacterTypeChange, ScanDirection};
use kbd_core::state::{EnterKeyState, KeyboardLanguage, ReturnKeyType};
use kbd_core::text::{grapheme_count, SurroundingText};

use crate::editor::{Candidate, ComposingState, SystemOperation, TextEditor};

/// Word boundaries for smooth delete.
const SMOOTH_DELETE_STOPS: &[&str] = &["、", "。", "！", "？", ".", ",", "!", "?", "\n", " ", "\u{3000}"];

/// Plain text field. Japanese input composes at the end of the left side
/// until `enter`; everything else is inserted directly.
///
/// Every edit bumps the text-changed count and leaves a system-operation
/// marker behind. `set_field` models a change made by the user or the host
/// application and leaves no marker.
#[derive(Debug, Clone, Default)]
pub struct BufferEditor {
    left: String,
    selected: String,
    right: String,
    /// Number of graphemes at the end of `left` that are still composing.
    composing: usize,
    live_conversion: bool,
    clipboard: String,
    return_key_type: ReturnKeyType,
    language: KeyboardLanguage,
    text_changed_count: u64,
    previous_operation: Option<SystemOperation>,
    closed: bool,
}

impl BufferEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(left: &str, selected: &str, right: &str) -> Self {
        Self {
            left: left.to_string(),
            selected: selected.to_string(),
            right: right.to_string(),
            ..Self::default()
        }
    }

    pub fn set_live_conversion(&mut self, enabled: bool) {
        self.live_conversion = enabled;
    }

    pub fn set_clipboard(&mut self, text: impl Into<String>) {
        self.clipboard = text.into();
    }

    pub fn set_return_key_type(&mut self, return_key_type: ReturnKeyType) {
        self.return_key_type = return_key_type;
    }

    /// Replace the field contents as the user or host app would.
    pub fn set_field(&mut self, text: SurroundingText) {
        self.composing = self.composing.min(grapheme_count(&text.left));
        self.left = text.left;
        self.selected = text.center;
        self.right = text.right;
    }

    pub fn text(&self) -> String {
        format!("{}{}{}", self.left, self.selected, self.right)
    }

    pub fn composing_text(&self) -> &str {
        &self.left[tail_start(&self.left, self.composing)..]
    }

    pub fn language(&self) -> KeyboardLanguage {
        self.language
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn mark(&mut self, operation: SystemOperation) {
        self.text_changed_count += 1;
        self.previous_operation = Some(operation);
    }

    fn remove_tail(&mut self, at: usize) -> String {
        let removed = self.left.split_off(at);
        self.composing = self.composing.saturating_sub(grapheme_count(&removed));
        removed
    }

    fn collapse_selection(&mut self, toward_left: bool) {
        let selected = std::mem::take(&mut self.selected);
        if toward_left {
            self.right.insert_str(0, &selected);
        } else {
            self.left.push_str(&selected);
        }
    }
}

/// Byte index where the last `n` graphemes of `s` start.
fn tail_start(s: &str, n: usize) -> usize {
    if n == 0 {
        return s.len();
    }
    s.grapheme_indices(true)
        .rev()
        .nth(n - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Byte index where the first `n` graphemes of `s` end.
fn head_end(s: &str, n: usize) -> usize {
    s.grapheme_indices(true)
        .nth(n)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

fn is_target(g: &str, targets: &[String]) -> bool {
    targets.iter().any(|t| t == g)
}

/// Start of the run before the end of `s`: the last grapheme plus every
/// preceding one up to the nearest target.
fn backward_span(s: &str, targets: &[String]) -> usize {
    let mut at = s.len();
    for (n, (i, g)) in s.grapheme_indices(true).rev().enumerate() {
        if n > 0 && is_target(g, targets) {
            break;
        }
        at = i;
    }
    at
}

fn forward_span(s: &str, targets: &[String]) -> usize {
    let mut end = 0;
    for (n, (i, g)) in s.grapheme_indices(true).enumerate() {
        if n > 0 && is_target(g, targets) {
            break;
        }
        end = i + g.len();
    }
    end
}

fn smooth_delete_start(s: &str) -> usize {
    let mut graphemes = s.grapheme_indices(true).rev().peekable();
    let mut at = s.len();
    while let Some((i, g)) = graphemes.peek() {
        if !SMOOTH_DELETE_STOPS.contains(g) {
            break;
        }
        at = *i;
        graphemes.next();
    }
    for (i, g) in graphemes {
        if SMOOTH_DELETE_STOPS.contains(&g) {
            break;
        }
        at = i;
    }
    at
}

impl TextEditor for BufferEditor {
    fn surrounding_text(&self) -> SurroundingText {
        SurroundingText::new(self.left.clone(), self.selected.clone(), self.right.clone())
    }

    fn input(&mut self, text: &str, simple_insert: bool) {
        self.selected.clear();
        let composes = !simple_insert && self.language == KeyboardLanguage::JaJp && !text.contains('\n');
        if composes {
            self.composing += grapheme_count(text);
        } else {
            self.composing = 0;
        }
        self.left.push_str(text);
        self.mark(SystemOperation::Edit);
    }

    fn delete_backward(&mut self, count: i32) {
        if !self.selected.is_empty() {
            self.selected.clear();
        } else if count >= 0 {
            let at = tail_start(&self.left, count as usize);
            self.remove_tail(at);
        } else {
            let end = head_end(&self.right, count.unsigned_abs() as usize);
            self.right.drain(..end);
        }
        self.mark(SystemOperation::Edit);
    }

    fn smooth_delete(&mut self) -> String {
        let deleted = if !self.selected.is_empty() {
            std::mem::take(&mut self.selected)
        } else if self.composing > 0 {
            let at = tail_start(&self.left, self.composing);
            self.remove_tail(at)
        } else {
            let at = smooth_delete_start(&self.left);
            self.remove_tail(at)
        };
        if !deleted.is_empty() {
            self.mark(SystemOperation::Edit);
        }
        deleted
    }

    fn smart_delete(&mut self, direction: ScanDirection, targets: &[String]) -> String {
        let deleted = match direction {
            ScanDirection::Backward => {
                let at = backward_span(&self.left, targets);
                self.remove_tail(at)
            }
            ScanDirection::Forward => {
                let end = forward_span(&self.right, targets);
                self.right.drain(..end).collect()
            }
        };
        if !deleted.is_empty() {
            self.mark(SystemOperation::Edit);
        }
        deleted
    }

    fn move_cursor(&mut self, count: i32) {
        self.collapse_selection(count < 0);
        self.composing = 0;
        if count < 0 {
            let at = tail_start(&self.left, count.unsigned_abs() as usize);
            let moved = self.left.split_off(at);
            self.right.insert_str(0, &moved);
        } else {
            let end = head_end(&self.right, count as usize);
            let moved: String = self.right.drain(..end).collect();
            self.left.push_str(&moved);
        }
        self.mark(SystemOperation::MoveCursor);
    }

    fn smart_move_cursor(&mut self, direction: ScanDirection, targets: &[String]) {
        self.collapse_selection(direction == ScanDirection::Backward);
        self.composing = 0;
        match direction {
            ScanDirection::Backward => {
                let at = backward_span(&self.left, targets);
                let moved = self.left.split_off(at);
                self.right.insert_str(0, &moved);
            }
            ScanDirection::Forward => {
                let end = forward_span(&self.right, targets);
                let moved: String = self.right.drain(..end).collect();
                self.left.push_str(&moved);
            }
        }
        self.mark(SystemOperation::MoveCursor);
    }

    fn enter(&mut self) -> Vec<Action> {
        if self.composing > 0 {
            self.composing = 0;
            self.mark(SystemOperation::Edit);
        }
        Vec::new()
    }

    fn commit_composition_silently(&mut self) {
        self.composing = 0;
    }

    fn change_character(&mut self, behavior: CharacterTypeChange) {
        let at = tail_start(&self.left, 1);
        if let Some(replacement) = kana::change(&self.left[at..], behavior) {
            self.left.truncate(at);
            self.left.push_str(replacement);
            self.mark(SystemOperation::Edit);
        }
    }

    fn replace_last_characters(&mut self, table: &BTreeMap<String, String>) {
        let hit = table
            .iter()
            .filter(|(from, _)| !from.is_empty() && self.left.ends_with(from.as_str()))
            .max_by_key(|(from, _)| from.len());
        if let Some((from, to)) = hit {
            let removed = grapheme_count(from);
            let composing = self.composing;
            self.left.truncate(self.left.len() - from.len());
            self.left.push_str(to);
            if composing > 0 {
                self.composing = (composing.saturating_sub(removed) + grapheme_count(to))
                    .min(grapheme_count(&self.left));
            }
            self.mark(SystemOperation::Edit);
        }
    }

    fn paste(&mut self) {
        if self.clipboard.is_empty() {
            return;
        }
        self.selected.clear();
        self.composing = 0;
        let clip = self.clipboard.clone();
        self.left.push_str(&clip);
        self.mark(SystemOperation::Edit);
    }

    fn enter_key_state(&self) -> EnterKeyState {
        if self.composing > 0 {
            EnterKeyState::Complete
        } else {
            EnterKeyState::Return(self.return_key_type)
        }
    }

    fn text_changed_count(&self) -> u64 {
        self.text_changed_count
    }

    fn take_previous_system_operation(&mut self) -> Option<SystemOperation> {
        self.previous_operation.take()
    }

    fn composing_state(&self) -> ComposingState {
        ComposingState {
            text: self.composing_text().to_string(),
            is_selected: false,
            live_conversion: self.live_conversion,
        }
    }

    fn stop_composition(&mut self) {
        self.composing = 0;
    }

    fn complete_candidate(&mut self, candidate: &Candidate) {
        let at = tail_start(&self.left, self.composing);
        self.left.truncate(at);
        self.left.push_str(&candidate.text);
        self.composing = 0;
        self.mark(SystemOperation::Edit);
    }

    fn candidate_for_forms(&self, forms: &[CharacterForm]) -> Option<Candidate> {
        if self.composing == 0 {
            return None;
        }
        let text = self.composing_text();
        let converted = match forms.first()? {
            CharacterForm::Hiragana => kana::to_hiragana(text),
            CharacterForm::Katakana | CharacterForm::HalfwidthKatakana => kana::to_katakana(text),
            CharacterForm::Uppercase => text.to_uppercase(),
            CharacterForm::Lowercase => text.to_lowercase(),
        };
        Some(Candidate::new(converted))
    }

    fn user_moved_cursor(&mut self, _offset: i64) -> Vec<Action> {
        self.composing = 0;
        Vec::new()
    }

    fn user_jumped_cursor(&mut self) -> Vec<Action> {
        self.composing = 0;
        Vec::new()
    }

    fn set_keyboard_language(&mut self, language: KeyboardLanguage) {
        self.language = language;
    }

    fn close_keyboard(&mut self) {
        self.composing = 0;
        self.closed = true;
    }
}

mod kana {
    use kbd_core::action::CharacterTypeChange;

    /// (base, small, dakuten, handakuten); empty when the form does not exist.
    const FORMS: &[[&str; 4]] = &[
        ["あ", "ぁ", "", ""],
        ["い", "ぃ", "", ""],
        ["う", "ぅ", "ゔ", ""],
        ["え", "ぇ", "", ""],
        ["お", "ぉ", "", ""],
        ["か", "ゕ", "が", ""],
        ["き", "", "ぎ", ""],
        ["く", "", "ぐ", ""],
        ["け", "ゖ", "げ", ""],
        ["こ", "", "ご", ""],
        ["さ", "", "ざ", ""],
        ["し", "", "じ", ""],
        ["す", "", "ず", ""],
        ["せ", "", "ぜ", ""],
        ["そ", "", "ぞ", ""],
        ["た", "", "だ", ""],
        ["ち", "", "ぢ", ""],
        ["つ", "っ", "づ", ""],
        ["て", "", "で", ""],
        ["と", "", "ど", ""],
        ["は", "", "ば", "ぱ"],
        ["ひ", "", "び", "ぴ"],
        ["ふ", "", "ぶ", "ぷ"],
        ["へ", "", "べ", "ぺ"],
        ["ほ", "", "ぼ", "ぽ"],
        ["や", "ゃ", "", ""],
        ["ゆ", "ゅ", "", ""],
        ["よ", "ょ", "", ""],
        ["わ", "ゎ", "", ""],
    ];

    const BASE: usize = 0;
    const SMALL: usize = 1;
    const DAKUTEN: usize = 2;
    const HANDAKUTEN: usize = 3;

    fn toggle(row: &[&'static str; 4], current: usize, form: usize) -> Option<&'static str> {
        if current == form {
            Some(row[BASE])
        } else if row[form].is_empty() {
            None
        } else {
            Some(row[form])
        }
    }

    pub(super) fn change(ch: &str, behavior: CharacterTypeChange) -> Option<&'static str> {
        let (row, current) = FORMS.iter().find_map(|row| {
            row.iter()
                .position(|form| !form.is_empty() && *form == ch)
                .map(|i| (row, i))
        })?;
        match behavior {
            CharacterTypeChange::Default => {
                // Cycle through the forms that exist, in table order.
                (1..=4)
                    .map(|step| (current + step) % 4)
                    .find(|&i| !row[i].is_empty())
                    .map(|i| row[i])
                    .filter(|next| *next != ch)
            }
            CharacterTypeChange::Dakuten => toggle(row, current, DAKUTEN),
            CharacterTypeChange::Handakuten => toggle(row, current, HANDAKUTEN),
            CharacterTypeChange::Kogaki => toggle(row, current, SMALL),
        }
    }

    const KANA_OFFSET: u32 = 0x60;

    pub(super) fn to_katakana(s: &str) -> String {
        s.chars()
            .map(|c| match c {
                'ぁ'..='ゖ' => char::from_u32(c as u32 + KANA_OFFSET).unwrap_or(c),
                _ => c,
            })
            .collect()
    }

    pub(super) fn to_hiragana(s: &str) -> String {
        s.chars()
            .map(|c| match c {
                'ァ'..='ヶ' => char::from_u32(c as u32 - KANA_OFFSET).unwrap_or(c),
                _ => c,
            })
            .collect()
    }
}
