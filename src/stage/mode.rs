// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Deciding what a stage does on a given frame.

The two simple modes do the same thing every frame.  The compound modes alternate,
driven by a single bit of state that flips once per frame.
*/

use crate::stage::config::ConfigError;
use std::fmt::Display;
use std::str::FromStr;

/**
What a single frame of the stage does.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Copy the current frame into the buffer.
    Save,
    /// Composite the buffer onto the current frame.
    Restore,
}

impl Action {
    pub const fn toggled(self) -> Self {
        match self {
            Action::Save => Action::Restore,
            Action::Restore => Action::Save,
        }
    }
}

/**
The configured behavior of a stage.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Save every frame.
    #[default]
    Save,
    /// Restore every frame.
    Restore,
    /// Save on the first frame, restore on the next, and so on.
    SaveThenRestore,
    /// Restore on the first frame, save on the next, and so on.
    RestoreThenSave,
}

impl Mode {
    pub const ALL: [Mode; 4] = [
        Mode::Save,
        Mode::Restore,
        Mode::SaveThenRestore,
        Mode::RestoreThenSave,
    ];

    /// The canonical option name.
    pub const fn name(self) -> &'static str {
        match self {
            Mode::Save => "Save",
            Mode::Restore => "Restore",
            Mode::SaveThenRestore => "SaveThenRestore",
            Mode::RestoreThenSave => "RestoreThenSave",
        }
    }

    /// The spelling used by presets, also accepted when parsing.
    pub const fn preset_name(self) -> &'static str {
        match self {
            Mode::Save => "SAVE",
            Mode::Restore => "RESTORE",
            Mode::SaveThenRestore => "SAVERESTORE",
            Mode::RestoreThenSave => "RESTORESAVE",
        }
    }

    /// Whether the mode alternates between saving and restoring.
    pub const fn alternates(self) -> bool {
        matches!(self, Mode::SaveThenRestore | Mode::RestoreThenSave)
    }

    /**
    The alternation state a stage starts with in this mode.

    Non-alternating modes never read it, so they report [Action::Save].
    */
    pub const fn initial_alternation(self) -> Action {
        match self {
            Mode::RestoreThenSave => Action::Restore,
            Mode::Save | Mode::Restore | Mode::SaveThenRestore => Action::Save,
        }
    }

    pub(crate) fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|m| m.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s) || m.preset_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownAction {
                value: s.to_string(),
            })
    }
}

/**
Resolves the action for one frame.

Returns the effective action and the alternation state for the next frame.
Simple modes ignore and preserve `alternation`; compound modes act on it and flip it.
*/
pub const fn resolve(mode: Mode, alternation: Action) -> (Action, Action) {
    match mode {
        Mode::Save => (Action::Save, alternation),
        Mode::Restore => (Action::Restore, alternation),
        Mode::SaveThenRestore | Mode::RestoreThenSave => (alternation, alternation.toggled()),
    }
}

/**
A [Mode] together with the alternation bit it drives.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionResolver {
    mode: Mode,
    alternation: Action,
}

impl ActionResolver {
    pub const fn new(mode: Mode) -> Self {
        Self {
            mode,
            alternation: mode.initial_alternation(),
        }
    }

    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// The action an alternating mode will take on the next frame.
    pub const fn alternation(&self) -> Action {
        self.alternation
    }

    /**
    Switches to `mode`.

    Changing the mode restarts alternation from the new mode's initial state.
    Setting the mode it already has changes nothing.
    */
    pub fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            *self = Self::new(mode);
        }
    }

    /// Resolves this frame's action and advances the alternation.
    pub fn next_action(&mut self) -> Action {
        let (action, alternation) = resolve(self.mode, self.alternation);
        self.alternation = alternation;
        action
    }
}
