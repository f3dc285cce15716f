use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{IntoDiagnostic, Result};

use ase::output::Output;
use ase::state::Machine;
use ase::{AsmParser, Debugger, DebuggerOptions, OpTable, Program, RunEnvironment, RunOptions};
use ase::{error, Status};

/// ase interprets a subset of 8086 assembly straight from source text.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.asm` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a `.asm` file and print the requested machine state when it stops
    Run {
        /// `.asm` file to run
        name: PathBuf,
        #[command(flatten)]
        display: Dump,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Run a `.asm` file with the step debugger
    Debug {
        /// `.asm` file to run
        name: PathBuf,
        /// Read debugger commands from argument
        #[arg(short, long)]
        command: Option<String>,
        #[command(flatten)]
        display: Dump,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Check a `.asm` file without running it
    Check {
        /// File to check
        name: PathBuf,
    },
}

/// Machine state to print once the program stops.
#[derive(clap::Args, Clone, Copy, Default)]
struct Dump {
    /// Print everything below
    #[arg(short, long)]
    all: bool,
    /// Print status flags
    #[arg(short, long)]
    flags: bool,
    /// Print memory cells in use
    #[arg(short, long)]
    memory: bool,
    /// Print general purpose registers
    #[arg(short, long)]
    registers: bool,
    /// Print the stack, bottom to top
    #[arg(short, long)]
    stack: bool,
}

#[derive(clap::Args, Clone, Copy, Default)]
struct RunArgs {
    /// Treat reads of uninitialized memory as fatal
    #[arg(long)]
    strict: bool,
    /// Produce minimal output, suited for blackbox tests
    #[arg(long)]
    minimal: bool,
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    ase::env::init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(ase::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    if let Some(command) = args.command {
        match command {
            Command::Run { name, display, run } => execute(&name, None, display, run),
            Command::Debug {
                name,
                command,
                display,
                run,
            } => execute(&name, Some(DebuggerOptions { command }), display, run),
            Command::Check { name } => {
                file_message(Green, "Checking", &name);
                let src = fs::read_to_string(&name).into_diagnostic()?;
                let table = OpTable::standard().into_diagnostic()?;
                let program = assemble(&src, &table)?;
                message(
                    Green,
                    "Success",
                    &format!("no errors found in {} instructions", program.len()),
                );
                Ok(())
            }
        }
    } else if let Some(path) = args.path {
        execute(&path, None, Dump::default(), RunArgs::default())
    } else {
        println!("\n~ {} v{VERSION} ~", "ase".bold());
        println!("{SHORT_INFO}");
        std::process::exit(0);
    }
}

#[allow(unused)]
enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message(color: MsgColor, left: &str, right: &str) {
    if Output::is_minimal() {
        return;
    }
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

fn execute(
    name: &Path,
    debugger_opts: Option<DebuggerOptions>,
    display: Dump,
    run: RunArgs,
) -> Result<()> {
    Output::set_minimal(run.minimal);

    file_message(MsgColor::Green, "Assembling", name);
    let src = fs::read_to_string(name).into_diagnostic()?;
    let table = OpTable::standard().into_diagnostic()?;
    let program = assemble(&src, &table)?;

    let options = RunOptions {
        strict: run.strict,
        silence_warnings: ase::env::is_uninit_warning_silenced(),
    };
    let mut env = RunEnvironment::new(program, table, options);

    message(MsgColor::Green, "Running", "program");
    let status = match debugger_opts {
        Some(opts) => env.run_with(&mut Debugger::new(opts)).clone(),
        None => env.run().clone(),
    };

    // State is kept after a fault, so print it either way
    display.print(env.machine());

    match status {
        Status::Faulted { kind, line } => {
            message(MsgColor::Red, "Faulted", &format!("on line {}", line));
            let span = env
                .current()
                .map(|instr| instr.fault_span(&kind))
                .unwrap_or_default();
            Err(error::report(&kind, span, &src))
        }
        Status::Halted => {
            message(MsgColor::Green, "Halted", &format!("on line {}", halt_line(&env)));
            Ok(())
        }
        Status::Completed | Status::Running => {
            file_message(MsgColor::Green, "Completed", name);
            Ok(())
        }
    }
}

fn halt_line(env: &RunEnvironment) -> usize {
    env.current().map_or(0, |instr| instr.line)
}

/// Return the assembled program, or a report pointing at the offending line
fn assemble(src: &str, table: &OpTable) -> Result<Program> {
    AsmParser::new(src, table)
        .parse()
        .map_err(|error| error.report(src))
}

impl Dump {
    fn print(&self, machine: &Machine) {
        let output = Output::Normal;
        let sections: [(bool, &str, fn(&Output, &Machine)); 4] = [
            (self.registers, "Registers", Output::print_registers),
            (self.flags, "Flags", Output::print_flags),
            (self.memory, "Memory", Output::print_memory),
            (self.stack, "Stack", Output::print_stack),
        ];
        for (enabled, title, print) in sections {
            if enabled || self.all {
                output.print_str(&format!("\x1b[1m{}\x1b[0m\n", title));
                print(&output, machine);
            }
        }
    }
}

const SHORT_INFO: &str = r"
Welcome to ase, an interpreter for a subset of 8086 assembly.
Programs run straight from source text; nothing is assembled to machine code.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
