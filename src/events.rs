use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanDirection {
    Left,
    Right,
    Up,
    Down,
}

impl PanDirection {
    pub fn delta(self, step: i64) -> (i64, i64) {
        match self {
            Self::Left => (-step, 0),
            Self::Right => (step, 0),
            Self::Up => (0, -step),
            Self::Down => (0, step),
        }
    }
}

/// Operator input routed to the presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    NextFile,
    PrevFile,
    NextPage,
    PrevPage,
    TogglePause,
    ZoomIn,
    ZoomOut,
    ZoomReset,
    CycleFitMode,
    Reload,
    Pan(PanDirection),
    SelectFile(usize),
    /// Positive `delta` is wheel-up. `modifier` inverts the configured wheel mode.
    Wheel { delta: i32, modifier: bool },
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("invalid argument for {command}: {arg:?}")]
    BadArgument { command: &'static str, arg: String },
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err(ParseCommandError::Empty);
        };
        let cmd = match head.to_ascii_lowercase().as_str() {
            "next" | "n" => Self::NextFile,
            "prev" | "p" => Self::PrevFile,
            "next-page" | "pgdn" => Self::NextPage,
            "prev-page" | "pgup" => Self::PrevPage,
            "pause" | "space" => Self::TogglePause,
            "zoom-in" | "+" => Self::ZoomIn,
            "zoom-out" | "-" => Self::ZoomOut,
            "zoom-reset" | "0" => Self::ZoomReset,
            "fit" => Self::CycleFitMode,
            "reload" | "r" => Self::Reload,
            "left" | "a" => Self::Pan(PanDirection::Left),
            "right" | "d" => Self::Pan(PanDirection::Right),
            "up" | "w" => Self::Pan(PanDirection::Up),
            "down" | "s" => Self::Pan(PanDirection::Down),
            "quit" | "q" | "exit" => Self::Quit,
            "select" => {
                let arg = words.next().unwrap_or_default();
                let index = arg.parse().map_err(|_| ParseCommandError::BadArgument {
                    command: "select",
                    arg: arg.to_string(),
                })?;
                Self::SelectFile(index)
            }
            "wheel" => {
                let arg = words.next().unwrap_or_default();
                let delta = arg.parse().map_err(|_| ParseCommandError::BadArgument {
                    command: "wheel",
                    arg: arg.to_string(),
                })?;
                let modifier = matches!(words.next(), Some(m) if m.eq_ignore_ascii_case("shift"));
                Self::Wheel { delta, modifier }
            }
            other => return Err(ParseCommandError::Unknown(other.to_string())),
        };
        Ok(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_commands() {
        assert_eq!("next".parse(), Ok(Command::NextFile));
        assert_eq!("  PGUP ".parse(), Ok(Command::PrevPage));
        assert_eq!("a".parse(), Ok(Command::Pan(PanDirection::Left)));
        assert_eq!("q".parse(), Ok(Command::Quit));
    }

    #[test]
    fn parses_arguments() {
        assert_eq!("select 3".parse(), Ok(Command::SelectFile(3)));
        assert_eq!(
            "wheel -120 shift".parse(),
            Ok(Command::Wheel { delta: -120, modifier: true })
        );
        assert_eq!(
            "wheel 120".parse(),
            Ok(Command::Wheel { delta: 120, modifier: false })
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!("".parse::<Command>(), Err(ParseCommandError::Empty));
        assert!(matches!(
            "select -1".parse::<Command>(),
            Err(ParseCommandError::BadArgument { command: "select", .. })
        ));
        assert!(matches!(
            "dance".parse::<Command>(),
            Err(ParseCommandError::Unknown(_))
        ));
    }

    #[test]
    fn pan_deltas() {
        assert_eq!(PanDirection::Up.delta(50), (0, -50));
        assert_eq!(PanDirection::Right.delta(50), (50, 0));
    }
}
