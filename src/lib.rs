// Parsing
pub mod lexer;
pub mod parser;
pub use parser::AsmParser;
pub mod air;
pub use air::Program;

// Running
pub mod operand;
pub mod ops;
pub use ops::OpTable;
pub mod runtime;
pub use runtime::{RunEnvironment, RunOptions, Status};
pub mod state;
#[macro_use]
pub mod output;
pub mod debugger;
pub use debugger::{Debugger, DebuggerOptions};

pub mod error;
pub mod span;
pub mod symbol;

pub mod env;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 4;
