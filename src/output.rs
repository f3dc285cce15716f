use std::cell::RefCell;
use std::str::Chars;

use colored::{ColoredString, Colorize};

use crate::error::ErrorKind;
use crate::state::Machine;
use crate::symbol::{Flag, Register};

#[macro_export]
macro_rules! dprint {
    ( $cond:expr, $fmt:literal $($tt:tt)* ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        let s = format!(
            $fmt
            $($tt)*
        );
        $crate::output::Output::Debugger($cond).print_str(&s);
    }};
}

#[macro_export]
macro_rules! dprintln {
    ( $cond:expr ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        $crate::output::Output::Debugger($cond).print_str("\n");
    }};
    ( $cond:expr, $fmt:literal $($tt:tt)* ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        let s = format!(
            concat!($fmt, "\n")
            $($tt)*
        );
        $crate::output::Output::Debugger($cond).print_str(&s);
    }};
}

#[derive(Clone, Copy, Debug)]
pub enum Output {
    /// Program results, on stdout
    Normal,
    /// Debugger chatter, on stderr
    Debugger(Condition),
    /// Non-fatal diagnostics, on stderr
    Warning,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    Always,
    /// Dropped under `--minimal`
    Sometimes,
}

struct Decolored<'a> {
    chars: Chars<'a>,
}

impl Output {
    thread_local! {
        static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
    }

    pub fn set_minimal(new_value: bool) -> bool {
        Self::IS_MINIMAL.with(|value| value.replace(new_value))
    }
    pub fn is_minimal() -> bool {
        Self::IS_MINIMAL.with(|value| *value.borrow())
    }

    pub fn print_str(&self, string: &str) {
        match self {
            Self::Normal if Self::is_minimal() => print_colorless(string),
            Self::Normal => print!("{}", string),

            Self::Debugger(condition) => match (Self::is_minimal(), *condition) {
                (false, _) => eprint!("{}", ColoredString::from(string).blue()),
                (true, Condition::Always) => eprint_colorless(string),
                (true, Condition::Sometimes) => (),
            },

            Self::Warning if Self::is_minimal() => eprint_colorless(string),
            Self::Warning => eprint!("{}", ColoredString::from(string).yellow()),
        }
    }

    pub fn print_diagnostic(&self, kind: &ErrorKind, line: usize) {
        if Self::is_minimal() {
            self.print_str(&format!("warning: line {}: {}\n", line, kind));
            return;
        }
        self.print_str(&format!("{:>12} line {}: {}\n", "Warning", line, kind));
    }

    pub fn print_registers(&self, machine: &Machine) {
        if Self::is_minimal() {
            for reg in Register::WORDS {
                self.print_str(&format!("{} {}\n", reg, machine.reg(reg)));
            }
            return;
        }

        self.print_str("\x1b[2m┌──────────────────────────────────────────┐\x1b[0m\n");
        self.print_str(
            "\x1b[2m│        \x1b[3mhex    uint     int    high  low\x1b[0m\x1b[2m │\x1b[0m\n",
        );
        for reg in Register::WORDS {
            let value = machine.reg(reg);
            self.print_str("\x1b[2m│\x1b[0m");
            self.print_str(&format!(" \x1b[1m{}\x1b[0m  ", reg));
            self.print_str(&format!("0x{:04x}  ", value));
            self.print_str(&format!("{:-6}  ", value));
            self.print_str(&format!("{:-6}  ", value as i16));
            self.print_str(&format!("0x{:02x}  0x{:02x}", value >> 8, value & 0xFF));
            self.print_str(" \x1b[2m│\x1b[0m\n");
        }
        self.print_str("\x1b[2m└──────────────────────────────────────────┘\x1b[0m\n");
    }

    pub fn print_flags(&self, machine: &Machine) {
        if Self::is_minimal() {
            for flag in Flag::ALL {
                self.print_str(&format!("{} {}\n", flag, machine.flag(flag) as u8));
            }
            return;
        }

        for flag in Flag::ALL {
            self.print_str(&format!(
                " \x1b[1m{}\x1b[0m {}",
                flag,
                machine.flag(flag) as u8
            ));
        }
        self.print_str("\n");
    }

    pub fn print_memory(&self, machine: &Machine) {
        if Self::is_minimal() {
            for (addr, value) in machine.memory() {
                self.print_str(&format!("{} {}\n", addr, value));
            }
            return;
        }

        let mut cells = machine.memory().peekable();
        if cells.peek().is_none() {
            self.print_str("\x1b[2m(no memory in use)\x1b[0m\n");
            return;
        }
        for (addr, value) in cells {
            self.print_str(&format!(
                " \x1b[1m[{:>6}]\x1b[0m  0x{:04x}  {:-6}\n",
                addr, value, value
            ));
        }
    }

    /// Bottom to top.
    pub fn print_stack(&self, machine: &Machine) {
        if Self::is_minimal() {
            for (i, value) in machine.stack().iter().enumerate() {
                self.print_str(&format!("{} {}\n", i, value));
            }
            return;
        }

        if machine.stack().is_empty() {
            self.print_str("\x1b[2m(stack is empty)\x1b[0m\n");
            return;
        }
        for (i, value) in machine.stack().iter().enumerate() {
            self.print_str(&format!(" \x1b[1m{:>3}\x1b[0m  0x{:04x}  {:-6}\n", i, value, value));
        }
    }
}

impl<'a> Decolored<'a> {
    pub fn new(string: &'a str) -> Self {
        Self {
            chars: string.chars(),
        }
    }
}

impl<'a> Iterator for Decolored<'a> {
    type Item = char;
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(ch) = self.chars.next() {
            // Skip everything between '\x1b' and 'm' (inclusive)
            if ch == '\x1b' {
                while self.chars.next().is_some_and(|ch| ch != 'm') {}
                continue;
            }
            return Some(ch);
        }
        None
    }
}

fn print_colorless(string: &str) {
    print!("{}", Decolored::new(string).collect::<String>());
}

fn eprint_colorless(string: &str) {
    eprint!("{}", Decolored::new(string).collect::<String>());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decolored() {
        assert_eq!(Decolored::new("AX 4660").collect::<String>(), "AX 4660");
        assert_eq!(
            Decolored::new("\x1b[1mAX\x1b[0m  0x1234").collect::<String>(),
            "AX  0x1234"
        );
        assert_eq!(Decolored::new("CF\x1b[0 1").collect::<String>(), "CF");
        assert_eq!(
            Decolored::new("[\x1bw[0bxyzm12]").collect::<String>(),
            "[12]"
        );
    }

    #[test]
    fn minimal_flag_is_per_thread() {
        assert!(!Output::is_minimal());
        assert!(!Output::set_minimal(true));
        assert!(Output::is_minimal());
        std::thread::spawn(|| assert!(!Output::is_minimal()))
            .join()
            .unwrap();
        Output::set_minimal(false);
    }
}
