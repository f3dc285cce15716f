use crate::air::{Instr, Program};
use crate::error::ErrorKind;
use crate::ops::Flow;
use crate::state::Machine;
use crate::symbol::{Flag, Mnemonic, Register};

/// Bit positions of the flags packed by LAHF.
const PACKED: [(Flag, u16); 5] = [
    (Flag::SF, 7),
    (Flag::ZF, 6),
    (Flag::AF, 4),
    (Flag::PF, 2),
    (Flag::CF, 0),
];

/// CLx, STx and CMx, where the last letter names the flag.
pub fn update(m: &mut Machine, instr: &Instr, _: &Program) -> Result<Flow, ErrorKind> {
    let name = instr.mnemonic.name();
    let flag = match name.as_bytes().last() {
        Some(b'C') => Flag::CF,
        Some(b'D') => Flag::DF,
        Some(b'I') => Flag::IF,
        _ => return Err(ErrorKind::UnknownInstruction(name.to_owned())),
    };
    let value = match instr.mnemonic {
        Mnemonic::Clc | Mnemonic::Cld | Mnemonic::Cli => false,
        Mnemonic::Stc | Mnemonic::Std | Mnemonic::Sti => true,
        Mnemonic::Cmc => !m.flag(flag),
        _ => return Err(ErrorKind::UnknownInstruction(name.to_owned())),
    };
    m.set_flag(flag, value);
    Ok(Flow::Continue)
}

/// Pack flags into AL. Bit 1 is always set.
pub fn lahf(m: &mut Machine, _: &Instr, _: &Program) -> Result<Flow, ErrorKind> {
    let packed = PACKED
        .iter()
        .filter(|(flag, _)| m.flag(*flag))
        .fold(0b10u16, |acc, (_, bit)| acc | (1 << bit));
    m.set_reg(Register::AL, packed);
    Ok(Flow::Continue)
}

/// Unpack AL into the flags LAHF stores.
pub fn sahf(m: &mut Machine, _: &Instr, _: &Program) -> Result<Flow, ErrorKind> {
    let packed = m.reg(Register::AL);
    for (flag, bit) in PACKED {
        m.set_flag(flag, packed & (1 << bit) != 0);
    }
    Ok(Flow::Continue)
}
