//! The closed set of decisions an agent can take.

use std::{fmt::Display, str::FromStr};

use anyhow::anyhow;

/// One decision per player per tick.
///
/// [`Action::Error`] is never sent by an agent. The engine injects it for a player whose reply
/// was missing or invalid, or who is already dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// `UP`
    Up,
    /// `DOWN`
    Down,
    /// `LEFT`
    Left,
    /// `RIGHT`
    Right,
    /// No valid decision (dead player or protocol violation)
    Error,
}

impl Action {
    /// The four actions an agent may reply with, in declaration order.
    pub const PLAYABLE: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];

    /// First letter of the protocol word, used by legend and goal renders.
    pub fn letter(self) -> char {
        match self {
            Action::Up => 'U',
            Action::Down => 'D',
            Action::Left => 'L',
            Action::Right => 'R',
            Action::Error => 'E',
        }
    }

    /// True for the engine-injected sentinel.
    pub fn is_error(self) -> bool {
        self == Action::Error
    }
}

impl FromStr for Action {
    type Err = anyhow::Error;

    /// Parses a reply line. Surrounding whitespace is ignored, case is not.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "UP" => Ok(Action::Up),
            "DOWN" => Ok(Action::Down),
            "LEFT" => Ok(Action::Left),
            "RIGHT" => Ok(Action::Right),
            other => Err(anyhow!("unknown response '{other}'")),
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::Up => "UP",
            Action::Down => "DOWN",
            Action::Left => "LEFT",
            Action::Right => "RIGHT",
            Action::Error => "ERROR",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod action_tests {
    use super::*;

    #[test]
    fn parse_protocol_words() {
        assert_eq!("UP".parse::<Action>().unwrap(), Action::Up);
        assert_eq!("DOWN\n".parse::<Action>().unwrap(), Action::Down);
        assert_eq!("  LEFT ".parse::<Action>().unwrap(), Action::Left);
        assert_eq!("RIGHT\r\n".parse::<Action>().unwrap(), Action::Right);
    }

    #[test]
    fn reject_everything_else() {
        for bad in ["", "up", "ERROR", "JUMP", "UP UP", "INITIALIZED"] {
            assert!(bad.parse::<Action>().is_err(), "'{bad}' should not parse");
        }
    }

    #[test]
    fn display_round_trips_playable_actions() {
        for action in Action::PLAYABLE {
            assert_eq!(action.to_string().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn letters() {
        let letters: String = Action::PLAYABLE.iter().map(|a| a.letter()).collect();
        assert_eq!(letters, "UDLR");
    }
}
