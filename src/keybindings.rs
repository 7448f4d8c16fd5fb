//! Customizable keyboard shortcuts for the editor.
//!
//! Each shortcut maps to exactly one engine operation. The host translates
//! its native key events into [`KeyChord`]s and feeds them to the session.

use serde::{Deserialize, Serialize};

/// Maximum number of label hotkeys (1-9 keys).
pub const MAX_LABEL_HOTKEYS: usize = 9;

/// Keys the editor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Key0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    Escape,
    Enter,
    Delete,
    Backspace,
    Space,
    Tab,
    Minus,
    Equal,
    Plus,
    Slash,
}

impl KeyCode {
    /// The digit for number keys.
    pub fn digit(&self) -> Option<usize> {
        match self {
            KeyCode::Key0 => Some(0),
            KeyCode::Key1 => Some(1),
            KeyCode::Key2 => Some(2),
            KeyCode::Key3 => Some(3),
            KeyCode::Key4 => Some(4),
            KeyCode::Key5 => Some(5),
            KeyCode::Key6 => Some(6),
            KeyCode::Key7 => Some(7),
            KeyCode::Key8 => Some(8),
            KeyCode::Key9 => Some(9),
            _ => None,
        }
    }

    /// Number key for a digit 0-9.
    pub fn from_digit(digit: usize) -> Option<KeyCode> {
        const DIGITS: [KeyCode; 10] = [
            KeyCode::Key0,
            KeyCode::Key1,
            KeyCode::Key2,
            KeyCode::Key3,
            KeyCode::Key4,
            KeyCode::Key5,
            KeyCode::Key6,
            KeyCode::Key7,
            KeyCode::Key8,
            KeyCode::Key9,
        ];
        DIGITS.get(digit).copied()
    }
}

/// A key press with the modifier that matters for shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyChord {
    pub key: KeyCode,
    /// Ctrl on Linux/Windows, Cmd on macOS.
    #[serde(default)]
    pub ctrl: bool,
}

impl KeyChord {
    pub const fn plain(key: KeyCode) -> Self {
        Self { key, ctrl: false }
    }

    pub const fn ctrl(key: KeyCode) -> Self {
        Self { key, ctrl: true }
    }
}

/// Engine operations reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShortcutAction {
    ToggleDrawMode,
    DeleteSelectedOrAll,
    Undo,
    Submit,
    ImportPredictions,
    /// Select label N (1-based).
    SelectLabel(usize),
    ResetZoom,
    ZoomIn,
    ZoomOut,
    ToggleHelp,
    Escape,
}

impl ShortcutAction {
    /// Get the display name for this action.
    pub fn name(&self) -> String {
        match self {
            ShortcutAction::ToggleDrawMode => "Toggle draw mode".to_string(),
            ShortcutAction::DeleteSelectedOrAll => "Delete selected (or all)".to_string(),
            ShortcutAction::Undo => "Undo".to_string(),
            ShortcutAction::Submit => "Submit".to_string(),
            ShortcutAction::ImportPredictions => "Import predictions".to_string(),
            ShortcutAction::SelectLabel(n) => format!("Select label {n}"),
            ShortcutAction::ResetZoom => "Reset zoom".to_string(),
            ShortcutAction::ZoomIn => "Zoom in".to_string(),
            ShortcutAction::ZoomOut => "Zoom out".to_string(),
            ShortcutAction::ToggleHelp => "Toggle help".to_string(),
            ShortcutAction::Escape => "Cancel / close".to_string(),
        }
    }
}

/// Keybinding configuration for the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub toggle_draw_mode: KeyChord,
    /// Delete has two keys so both Delete and Backspace work.
    pub delete: Vec<KeyChord>,
    pub undo: KeyChord,
    pub submit: KeyChord,
    pub import_predictions: KeyChord,
    pub reset_zoom: KeyChord,
    pub zoom_in: Vec<KeyChord>,
    pub zoom_out: KeyChord,
    pub toggle_help: KeyChord,
    pub escape: KeyChord,

    /// Hotkeys for label selection (index 0 selects label 1).
    /// None means no hotkey assigned for that slot
    pub label_hotkeys: Vec<Option<KeyChord>>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            toggle_draw_mode: KeyChord::plain(KeyCode::D),
            delete: vec![
                KeyChord::plain(KeyCode::Delete),
                KeyChord::plain(KeyCode::Backspace),
            ],
            undo: KeyChord::ctrl(KeyCode::Z),
            submit: KeyChord::plain(KeyCode::Enter),
            import_predictions: KeyChord::plain(KeyCode::A),
            reset_zoom: KeyChord::plain(KeyCode::R),
            zoom_in: vec![KeyChord::plain(KeyCode::Equal), KeyChord::plain(KeyCode::Plus)],
            zoom_out: KeyChord::plain(KeyCode::Minus),
            toggle_help: KeyChord::plain(KeyCode::H),
            escape: KeyChord::plain(KeyCode::Escape),

            // Default label hotkeys: 1-9
            label_hotkeys: (1..=MAX_LABEL_HOTKEYS)
                .map(|n| KeyCode::from_digit(n).map(KeyChord::plain))
                .collect(),
        }
    }
}

impl KeyBindings {
    /// Create new keybindings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the action that corresponds to a key press, if any.
    pub fn action_for(&self, chord: KeyChord) -> Option<ShortcutAction> {
        if chord == self.escape {
            Some(ShortcutAction::Escape)
        } else if chord == self.toggle_draw_mode {
            Some(ShortcutAction::ToggleDrawMode)
        } else if self.delete.contains(&chord) {
            Some(ShortcutAction::DeleteSelectedOrAll)
        } else if chord == self.undo {
            Some(ShortcutAction::Undo)
        } else if chord == self.submit {
            Some(ShortcutAction::Submit)
        } else if chord == self.import_predictions {
            Some(ShortcutAction::ImportPredictions)
        } else if chord == self.reset_zoom {
            Some(ShortcutAction::ResetZoom)
        } else if self.zoom_in.contains(&chord) {
            Some(ShortcutAction::ZoomIn)
        } else if chord == self.zoom_out {
            Some(ShortcutAction::ZoomOut)
        } else if chord == self.toggle_help {
            Some(ShortcutAction::ToggleHelp)
        } else {
            self.label_index_for_key(chord)
                .map(|index| ShortcutAction::SelectLabel(index + 1))
        }
    }

    /// Get the label index (0-based) that corresponds to a key press, if any.
    pub fn label_index_for_key(&self, chord: KeyChord) -> Option<usize> {
        self.label_hotkeys
            .iter()
            .take(MAX_LABEL_HOTKEYS)
            .position(|hotkey| *hotkey == Some(chord))
    }

    /// Set the hotkey for a label index.
    pub fn set_label_key(&mut self, index: usize, chord: Option<KeyChord>) {
        if index < MAX_LABEL_HOTKEYS {
            if self.label_hotkeys.len() <= index {
                self.label_hotkeys.resize(index + 1, None);
            }
            self.label_hotkeys[index] = chord;
        }
    }

    /// Every chord bound to an action, in lookup order.
    fn bound_chords(&self) -> Vec<(KeyChord, ShortcutAction)> {
        let mut chords = vec![
            (self.escape, ShortcutAction::Escape),
            (self.toggle_draw_mode, ShortcutAction::ToggleDrawMode),
        ];
        chords.extend(self.delete.iter().map(|c| (*c, ShortcutAction::DeleteSelectedOrAll)));
        chords.push((self.undo, ShortcutAction::Undo));
        chords.push((self.submit, ShortcutAction::Submit));
        chords.push((self.import_predictions, ShortcutAction::ImportPredictions));
        chords.push((self.reset_zoom, ShortcutAction::ResetZoom));
        chords.extend(self.zoom_in.iter().map(|c| (*c, ShortcutAction::ZoomIn)));
        chords.push((self.zoom_out, ShortcutAction::ZoomOut));
        chords.push((self.toggle_help, ShortcutAction::ToggleHelp));
        chords.extend(
            self.label_hotkeys
                .iter()
                .enumerate()
                .filter_map(|(i, c)| c.map(|c| (c, ShortcutAction::SelectLabel(i + 1)))),
        );
        chords
    }

    /// Check if a key is already used by any binding.
    /// Returns a description of what it's used for, if anything.
    pub fn key_conflict(&self, chord: KeyChord, exclude: Option<ShortcutAction>) -> Option<String> {
        self.bound_chords()
            .into_iter()
            .find(|(bound, action)| *bound == chord && Some(*action) != exclude)
            .map(|(_, action)| action.name())
    }

    /// Pairs of actions that share a chord; the first one always wins.
    pub fn conflicts(&self) -> Vec<(ShortcutAction, ShortcutAction)> {
        let chords = self.bound_chords();
        let mut conflicts = Vec::new();
        for (i, (chord, first)) in chords.iter().enumerate() {
            for (other_chord, second) in &chords[i + 1..] {
                if chord == other_chord && first != second {
                    conflicts.push((*first, *second));
                }
            }
        }
        conflicts
    }
}
