use std::error::Error;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    /// Also an empty line
    Step { count: u32 },
    Continue,
    Registers,
    Flags,
    Memory,
    Stack,
    Where,
}

/// Error parsing a command.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandError {
    Invalid { command_name: String },
    InvalidCount { string: String },
    TooManyArguments { command_name: &'static str },
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(Command::Step { count: 1 });
        };

        let (command_name, command) = match name.to_ascii_lowercase().as_str() {
            "h" | "help" => ("help", Command::Help),
            "s" | "step" => {
                let count = match words.next() {
                    None => 1,
                    Some(string) => string
                        .parse::<u32>()
                        .ok()
                        .filter(|count| *count > 0)
                        .ok_or_else(|| CommandError::InvalidCount {
                            string: string.to_owned(),
                        })?,
                };
                ("step", Command::Step { count })
            }
            "c" | "continue" => ("continue", Command::Continue),
            "r" | "registers" => ("registers", Command::Registers),
            "f" | "flags" => ("flags", Command::Flags),
            "m" | "memory" => ("memory", Command::Memory),
            "k" | "stack" => ("stack", Command::Stack),
            "w" | "where" => ("where", Command::Where),
            _ => {
                return Err(CommandError::Invalid {
                    command_name: name.to_owned(),
                })
            }
        };

        if words.next().is_some() {
            return Err(CommandError::TooManyArguments { command_name });
        }
        Ok(command)
    }
}

impl Error for CommandError {}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid { command_name } => {
                write!(f, "Not a command: `{}`. Try `help`.", command_name)
            }
            Self::InvalidCount { string } => {
                write!(f, "Step count must be a positive integer, not `{}`.", string)
            }
            Self::TooManyArguments { command_name } => {
                write!(f, "Too many arguments for `{}`.", command_name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse(""), Ok(Command::Step { count: 1 }));
        assert_eq!(Command::parse("   "), Ok(Command::Step { count: 1 }));
        assert_eq!(Command::parse("step"), Ok(Command::Step { count: 1 }));
        assert_eq!(Command::parse(" S 12 "), Ok(Command::Step { count: 12 }));
        assert_eq!(Command::parse("continue"), Ok(Command::Continue));
        assert_eq!(Command::parse("Registers"), Ok(Command::Registers));
        assert_eq!(Command::parse("f"), Ok(Command::Flags));
        assert_eq!(Command::parse("memory"), Ok(Command::Memory));
        assert_eq!(Command::parse("stack"), Ok(Command::Stack));
        assert_eq!(Command::parse("where"), Ok(Command::Where));
        assert_eq!(Command::parse("help"), Ok(Command::Help));
    }

    #[test]
    fn rejects_bad_commands() {
        assert_eq!(
            Command::parse("jump 4"),
            Err(CommandError::Invalid {
                command_name: "jump".into()
            })
        );
        assert_eq!(
            Command::parse("step 0"),
            Err(CommandError::InvalidCount {
                string: "0".into()
            })
        );
        assert_eq!(
            Command::parse("step x"),
            Err(CommandError::InvalidCount {
                string: "x".into()
            })
        );
        assert_eq!(
            Command::parse("registers all"),
            Err(CommandError::TooManyArguments {
                command_name: "registers"
            })
        );
    }
}
