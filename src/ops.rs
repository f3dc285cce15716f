use std::fmt;

use crate::air::{Instr, Program};
use crate::error::ErrorKind;
use crate::state::Machine;
use crate::symbol::Mnemonic;

mod arith;
mod control;
mod data;
mod flags;
mod stack;

/// What the driver should do once an instruction has run.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Flow {
    Continue,
    /// Continue from this instruction index
    Jump(usize),
    Halt,
}

pub type Handler = fn(&mut Machine, &Instr, &Program) -> Result<Flow, ErrorKind>;

#[derive(Clone, Copy)]
pub struct Entry {
    pub mnemonic: Mnemonic,
    pub handler: Handler,
    /// Number of operands the instruction takes
    pub arity: usize,
}

const fn entry(mnemonic: Mnemonic, handler: Handler, arity: usize) -> Entry {
    Entry {
        mnemonic,
        handler,
        arity,
    }
}

const ENTRIES: [Entry; Mnemonic::ALL.len()] = {
    use Mnemonic::*;
    [
        entry(Add, arith::add, 2),
        entry(Sub, arith::sub, 2),
        entry(Cmp, arith::cmp, 2),
        entry(Mul, arith::mul, 1),
        entry(Div, arith::div, 1),
        entry(Inc, arith::inc, 1),
        entry(Dec, arith::dec, 1),
        entry(Neg, arith::neg, 1),
        entry(Mov, data::mov, 2),
        entry(Xchg, data::xchg, 2),
        entry(Push, stack::push, 1),
        entry(Pop, stack::pop, 1),
        entry(Clc, flags::update, 0),
        entry(Cld, flags::update, 0),
        entry(Cli, flags::update, 0),
        entry(Stc, flags::update, 0),
        entry(Std, flags::update, 0),
        entry(Sti, flags::update, 0),
        entry(Cmc, flags::update, 0),
        entry(Lahf, flags::lahf, 0),
        entry(Sahf, flags::sahf, 0),
        entry(Jmp, control::jump, 1),
        entry(Je, control::jump, 1),
        entry(Jz, control::jump, 1),
        entry(Jne, control::jump, 1),
        entry(Jnz, control::jump, 1),
        entry(Jc, control::jump, 1),
        entry(Jnc, control::jump, 1),
        entry(Jp, control::jump, 1),
        entry(Jpe, control::jump, 1),
        entry(Jnp, control::jump, 1),
        entry(Jpo, control::jump, 1),
        entry(Jcxz, control::jump, 1),
        entry(Nop, data::nop, 0),
        entry(In, data::nop, 2),
        entry(Out, data::nop, 2),
        entry(Hlt, control::halt, 0),
        entry(Org, data::org, 1),
    ]
};

/// Mnemonic -> (handler, arity). Every mnemonic has exactly one entry.
#[derive(Clone)]
pub struct OpTable {
    entries: Vec<Option<Entry>>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TableError {
    Duplicate(Mnemonic),
    Missing(Mnemonic),
}

impl OpTable {
    /// The table of every supported instruction.
    pub fn standard() -> Result<Self, TableError> {
        Self::build(&ENTRIES)
    }

    pub fn build(entries: &[Entry]) -> Result<Self, TableError> {
        let mut table = vec![None; Mnemonic::ALL.len()];
        for entry in entries {
            let slot = &mut table[entry.mnemonic as usize];
            if slot.is_some() {
                return Err(TableError::Duplicate(entry.mnemonic));
            }
            *slot = Some(*entry);
        }
        if let Some(missing) = Mnemonic::ALL.into_iter().find(|m| table[*m as usize].is_none()) {
            return Err(TableError::Missing(missing));
        }
        Ok(OpTable { entries: table })
    }

    pub fn get(&self, mnemonic: Mnemonic) -> Option<&Entry> {
        self.entries[mnemonic as usize].as_ref()
    }

    pub fn arity(&self, mnemonic: Mnemonic) -> Option<usize> {
        self.get(mnemonic).map(|entry| entry.arity)
    }
}

impl std::error::Error for TableError {}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate(m) => write!(f, "Instruction `{}` is registered twice", m),
            Self::Missing(m) => write!(f, "Instruction `{}` has no handler", m),
        }
    }
}

/// Even parity of the low byte.
pub(crate) fn parity(value: u16) -> bool {
    (value as u8).count_ones() % 2 == 0
}
