use crate::air::{Instr, Program};
use crate::error::{ErrorKind, LoadError};
use crate::ops::{Flow, OpTable};
use crate::output::Output;
use crate::parser::AsmParser;
use crate::state::Machine;

/// Knobs for a single run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Uninitialized memory reads are fatal
    pub strict: bool,
    /// Don't print warnings for uninitialized memory reads
    pub silence_warnings: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Running,
    /// Ran off the end of the program
    Completed,
    /// Stopped by HLT
    Halted,
    Faulted {
        kind: ErrorKind,
        line: usize,
    },
}

impl Status {
    pub fn is_running(&self) -> bool {
        matches!(self, Status::Running)
    }
}

/// A non-fatal condition raised by an instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub line: usize,
}

/// What a hook wants once an instruction has run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Proceed,
    /// Stop calling the hook. The program keeps running.
    Detach,
}

/// Called after every instruction with read-only access to the driver.
pub trait StepHook {
    fn after_step(&mut self, env: &RunEnvironment) -> Action;
}

/// Complete execution state: the program, the machine, and the program counter.
pub struct RunEnvironment {
    program: Program,
    table: OpTable,
    machine: Machine,
    /// Index of the next instruction
    pc: usize,
    status: Status,
    diagnostics: Vec<Diagnostic>,
    options: RunOptions,
}

impl RunEnvironment {
    pub fn new(program: Program, table: OpTable, options: RunOptions) -> Self {
        RunEnvironment {
            program,
            table,
            machine: Machine::new(options.strict),
            pc: 0,
            status: Status::Running,
            diagnostics: Vec::new(),
            options,
        }
    }

    /// Assemble `src` against `table` and prepare to run it.
    pub fn load(src: &str, table: OpTable, options: RunOptions) -> Result<Self, LoadError> {
        let program = AsmParser::new(src, &table).parse()?;
        Ok(Self::new(program, table, options))
    }

    /// Run one instruction. Does nothing once the program has stopped.
    pub fn step(&mut self) -> &Status {
        if !self.status.is_running() {
            return &self.status;
        }
        let Some(instr) = self.program.get(self.pc) else {
            self.status = Status::Completed;
            return &self.status;
        };
        let line = instr.line;

        let outcome = match self.table.get(instr.mnemonic) {
            Some(entry) => (entry.handler)(&mut self.machine, instr, &self.program),
            None => Err(ErrorKind::UnknownInstruction(instr.mnemonic.to_string())),
        };

        for kind in self.machine.drain_diagnostics() {
            if self.should_warn(&kind) {
                Output::Warning.print_diagnostic(&kind, line);
            }
            self.diagnostics.push(Diagnostic { kind, line });
        }

        match outcome {
            Ok(Flow::Continue) => self.pc += 1,
            Ok(Flow::Jump(target)) => self.pc = target,
            Ok(Flow::Halt) => self.status = Status::Halted,
            Err(kind) => self.status = Status::Faulted { kind, line },
        }
        if self.status.is_running() && self.pc >= self.program.len() {
            self.status = Status::Completed;
        }
        &self.status
    }

    /// Run until the program stops.
    pub fn run(&mut self) -> &Status {
        while self.step().is_running() {}
        &self.status
    }

    /// Run until the program stops, calling `hook` after every instruction until it detaches.
    pub fn run_with(&mut self, hook: &mut impl StepHook) -> &Status {
        let mut attached = true;
        while self.step().is_running() {
            if attached && hook.after_step(self) == Action::Detach {
                attached = false;
            }
        }
        &self.status
    }

    fn should_warn(&self, kind: &ErrorKind) -> bool {
        !(self.options.silence_warnings && matches!(kind, ErrorKind::UninitializedMemoryRead(_)))
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Next instruction to run, if any.
    pub fn current(&self) -> Option<&Instr> {
        self.program.get(self.pc)
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Every non-fatal condition raised so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
