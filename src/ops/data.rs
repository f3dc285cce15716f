use crate::air::{Instr, Program};
use crate::error::{ErrorKind, OperandError, SyntaxError};
use crate::operand::{operation_width, OperandKind};
use crate::ops::{parity, Flow};
use crate::state::Machine;
use crate::symbol::Flag;

/// Loading a literal into a register also sets ZF and PF for it.
pub fn mov(m: &mut Machine, instr: &Instr, _: &Program) -> Result<Flow, ErrorKind> {
    let dest = instr.operand(0)?;
    let src = instr.operand(1)?;
    dest.ensure_writable()?;
    let width = operation_width(&[dest, src])?;

    let value = src.read(m, width)?;
    dest.write(m, value, width)?;
    if let (OperandKind::Reg(_), OperandKind::Imm(_)) = (dest.kind, src.kind) {
        let value = value & width.mask() as u16;
        m.set_flag(Flag::ZF, value == 0);
        m.set_flag(Flag::PF, parity(value));
    }
    Ok(Flow::Continue)
}

pub fn xchg(m: &mut Machine, instr: &Instr, _: &Program) -> Result<Flow, ErrorKind> {
    let a = instr.operand(0)?;
    let b = instr.operand(1)?;
    if a.is_mem() && b.is_mem() {
        return Err(ErrorKind::Syntax(SyntaxError::BothOperandsMemory));
    }
    a.ensure_writable()?;
    b.ensure_writable()?;
    let width = operation_width(&[a, b])?;

    let left = a.read(m, width)?;
    let right = b.read(m, width)?;
    a.write(m, right, width)?;
    b.write(m, left, width)?;
    Ok(Flow::Continue)
}

/// Also used for IN and OUT, whose operands are accepted and ignored.
pub fn nop(_: &mut Machine, _: &Instr, _: &Program) -> Result<Flow, ErrorKind> {
    Ok(Flow::Continue)
}

/// Select the segment used for later memory operands.
pub fn org(m: &mut Machine, instr: &Instr, _: &Program) -> Result<Flow, ErrorKind> {
    let operand = instr.operand(0)?;
    let OperandKind::Imm(value) = operand.kind else {
        return Err(operand.invalid(OperandError::Unrecognized));
    };
    let segment = u16::try_from(value).map_err(|_| operand.invalid(OperandError::TooWide))?;
    m.set_segment(segment);
    Ok(Flow::Continue)
}
