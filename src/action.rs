use std::path::PathBuf;

use crate::error::RugenError;
use crate::jwt::UserIdentity;
use crate::types::ResultRow;

/// Generator control that currently owns the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Control {
    Region,
    Errors,
    Seed,
    #[default]
    Table,
}

impl Control {
    pub fn next(self) -> Self {
        match self {
            Control::Region => Control::Errors,
            Control::Errors => Control::Seed,
            Control::Seed => Control::Table,
            Control::Table => Control::Region,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Control::Region => Control::Table,
            Control::Errors => Control::Region,
            Control::Seed => Control::Errors,
            Control::Table => Control::Seed,
        }
    }
}

#[derive(Debug)]
pub enum Action {
    Start,
    Quit,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    GoToTop,
    GoToBottom,
    FocusNext,
    FocusPrev,

    // Text entry
    Input(char),
    Backspace,

    // Login / register
    Submit,
    SwitchAuthScreen,
    LoggedIn(Box<UserIdentity>),
    Registered { email: String },
    AuthFailed(String),

    // Generator controls
    OpenRegionSelect,
    ShiftRegion(i32),
    AdjustErrors(i32),
    RandomSeed,
    Refresh,
    Export,

    // Popup navigation
    PopupUp,
    PopupDown,
    PopupSelect,
    ClosePopup,

    // Fetch results, tagged with the generation that issued them
    PageLoaded {
        generation: u64,
        result: Result<Vec<ResultRow>, RugenError>,
        authenticated: bool,
    },
    Exported {
        path: PathBuf,
        rows: usize,
    },

    // Session
    Logout,
    LoggedOut,

    Error(String),
    None,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_focus_cycles() {
        let mut control = Control::Region;
        for _ in 0..4 {
            control = control.next();
        }
        assert_eq!(control, Control::Region);
        assert_eq!(Control::Region.prev(), Control::Table);
        assert_eq!(Control::Table.prev().next(), Control::Table);
    }
}
