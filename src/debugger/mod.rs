mod command;
mod reader;

use self::command::Command;
use self::reader::{CommandReader, Read as _};
use crate::dprintln;
use crate::output::{Condition, Output};
use crate::runtime::{Action, RunEnvironment, StepHook};

pub const HELP: &str = include_str!("help.txt");

/// Leave this as a struct, in case more options are added in the future. Plus it is more explicit.
#[derive(Debug, Default)]
pub struct DebuggerOptions {
    /// Commands to run before reading stdin
    pub command: Option<String>,
}

/// Pauses after every instruction and reads commands until told to move on.
pub struct Debugger {
    reader: CommandReader,
    /// Instructions left to run before the next pause
    remaining: u32,
}

impl Debugger {
    pub fn new(opts: DebuggerOptions) -> Self {
        Self {
            reader: CommandReader::from(opts.command),
            remaining: 0,
        }
    }

    fn print_location(env: &RunEnvironment, condition: Condition) {
        let output = Output::Debugger(condition);
        match env.current() {
            Some(instr) => output.print_str(&format!("line {}: {}\n", instr.line, instr)),
            None => output.print_str("end of program\n"),
        }
    }
}

impl StepHook for Debugger {
    fn after_step(&mut self, env: &RunEnvironment) -> Action {
        if self.remaining > 1 {
            self.remaining -= 1;
            return Action::Proceed;
        }
        self.remaining = 0;
        Self::print_location(env, Condition::Sometimes);

        loop {
            let Some(line) = self.reader.read() else {
                dprintln!(Sometimes, "Detaching debugger.");
                return Action::Detach;
            };
            let command = match Command::parse(line) {
                Ok(command) => command,
                Err(error) => {
                    dprintln!(Always, "{}", error);
                    continue;
                }
            };

            let output = Output::Debugger(Condition::Always);
            match command {
                Command::Step { count } => {
                    self.remaining = count;
                    return Action::Proceed;
                }
                Command::Continue => {
                    dprintln!(Sometimes, "Continuing without debugger.");
                    return Action::Detach;
                }
                Command::Registers => output.print_registers(env.machine()),
                Command::Flags => output.print_flags(env.machine()),
                Command::Memory => output.print_memory(env.machine()),
                Command::Stack => output.print_stack(env.machine()),
                Command::Where => Self::print_location(env, Condition::Always),
                Command::Help => dprintln!(Always, "{}", HELP),
            }
        }
    }
}
