use crate::air::{Instr, Program};
use crate::error::ErrorKind;
use crate::ops::Flow;
use crate::state::Machine;
use crate::symbol::{Flag, Mnemonic, Register};

fn is_taken(m: &Machine, mnemonic: Mnemonic) -> Option<bool> {
    use Mnemonic::*;
    let taken = match mnemonic {
        Jmp => true,
        Je | Jz => m.flag(Flag::ZF),
        Jne | Jnz => !m.flag(Flag::ZF),
        Jc => m.flag(Flag::CF),
        Jnc => !m.flag(Flag::CF),
        Jp | Jpe => m.flag(Flag::PF),
        Jnp | Jpo => !m.flag(Flag::PF),
        Jcxz => m.reg(Register::CX) == 0,
        _ => return None,
    };
    Some(taken)
}

/// The label is only looked up when the jump is taken.
pub fn jump(m: &mut Machine, instr: &Instr, program: &Program) -> Result<Flow, ErrorKind> {
    let taken = is_taken(m, instr.mnemonic)
        .ok_or_else(|| ErrorKind::UnknownInstruction(instr.mnemonic.to_string()))?;
    if !taken {
        return Ok(Flow::Continue);
    }
    let target = instr.target()?;
    program
        .label(target)
        .map(Flow::Jump)
        .ok_or_else(|| ErrorKind::UnresolvedLabel(target.to_owned()))
}

pub fn halt(_: &mut Machine, _: &Instr, _: &Program) -> Result<Flow, ErrorKind> {
    Ok(Flow::Halt)
}
