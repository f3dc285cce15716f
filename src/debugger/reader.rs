use std::io::{self, BufRead as _, IsTerminal as _};

use crate::{dprint, dprintln};

/// Must be ASCII to ensure `.len() == .chars().count()`
const PROMPT: &str = "DEBUGGER> ";

/// A trait for objects which can yield a command, by iterating a string or reading a stream.
pub trait Read {
    /// `None` indicates EOF.
    /// Returned string slice MAY include leading or trailing whitespace.
    fn read(&mut self) -> Option<&str>;
}

/// Read from argument first, if `Some`. Then read from stdin.
#[derive(Debug)]
pub struct CommandReader {
    argument: Option<Argument>,
    stdin: Stdin,
}

impl CommandReader {
    pub fn from(argument: Option<String>) -> Self {
        Self {
            argument: argument.map(Argument::from),
            stdin: Stdin::new(),
        }
    }
}

impl Read for CommandReader {
    fn read(&mut self) -> Option<&str> {
        if let Some(argument) = &mut self.argument {
            if let Some(command) = argument.read() {
                echo_command(Some(command));
                return Some(command);
            }
        }
        self.stdin.read()
    }
}

/// Command-line argument, or a single line of input.
#[derive(Debug)]
pub struct Argument {
    buffer: String,
    /// Byte index.
    cursor: usize,
}

impl Argument {
    pub fn from(source: String) -> Self {
        Self {
            buffer: source,
            cursor: 0,
        }
    }

    fn is_done(&self) -> bool {
        self.cursor >= self.buffer.len()
    }
}

impl Read for Argument {
    fn read(&mut self) -> Option<&str> {
        if self.is_done() {
            return None;
        }

        // Take characters until delimiter
        let start = self.cursor;
        let mut chars = self.buffer[self.cursor..].chars();
        while let Some(ch) = chars.next().filter(|ch| *ch != '\n' && *ch != ';') {
            self.cursor += ch.len_utf8();
        }

        let end = self.cursor;
        self.cursor += 1; // sizeof('\n' or ';')

        self.buffer.get(start..end)
    }
}

/// Line-buffered stdin. Each line may hold several `;`-separated commands.
#[derive(Debug)]
struct Stdin {
    stdin: io::Stdin,
    is_terminal: bool,
    pending: Option<Argument>,
}

impl Stdin {
    fn new() -> Self {
        let stdin = io::stdin();
        Self {
            is_terminal: stdin.is_terminal(),
            stdin,
            pending: None,
        }
    }
}

impl Read for Stdin {
    fn read(&mut self) -> Option<&str> {
        while self.pending.as_ref().map_or(true, Argument::is_done) {
            if self.is_terminal {
                dprint!(Always, "\x1b[1m{}\x1b[0m", PROMPT);
            }
            let mut line = String::new();
            match self.stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => {
                    echo_command(None);
                    return None;
                }
                Ok(_) => self.pending = Some(Argument::from(line)),
            }
        }
        let is_terminal = self.is_terminal;
        let command = self.pending.as_mut()?.read();
        if !is_terminal {
            echo_command(command);
        }
        command
    }
}

/// Print prompt and command.
fn echo_command(command: Option<&str>) {
    if command.is_some_and(|command| command.trim().is_empty()) {
        return;
    }
    dprint!(Sometimes, "\x1b[1m{}", PROMPT);
    dprintln!(
        Sometimes,
        "{}",
        command.unwrap_or("\x1b[3m(end of input)").trim()
    );
}
