use crate::air::{Instr, Program};
use crate::error::ErrorKind;
use crate::operand::operation_width;
use crate::ops::{parity, Flow};
use crate::state::Machine;
use crate::symbol::{Flag, Register, Width};

/// Raw outcome of an addition or subtraction, before flags are written.
struct Alu {
    value: u16,
    carry: bool,
    overflow: bool,
    aux: bool,
}

impl Alu {
    fn add(a: u16, b: u16, width: Width) -> Self {
        let (a, b) = (a as u32 & width.mask(), b as u32 & width.mask());
        let sum = a + b;
        let value = sum & width.mask();
        Alu {
            value: value as u16,
            carry: sum > width.mask(),
            overflow: (a ^ value) & (b ^ value) & width.sign_bit() != 0,
            aux: (a ^ b ^ value) & 0x10 != 0,
        }
    }

    fn sub(a: u16, b: u16, width: Width) -> Self {
        let (a, b) = (a as u32 & width.mask(), b as u32 & width.mask());
        let value = a.wrapping_sub(b) & width.mask();
        Alu {
            value: value as u16,
            carry: b > a,
            overflow: (a ^ b) & (a ^ value) & width.sign_bit() != 0,
            aux: (a ^ b ^ value) & 0x10 != 0,
        }
    }

    fn commit(&self, m: &mut Machine, width: Width) {
        m.set_flag(Flag::CF, self.carry);
        m.set_flag(Flag::OF, self.overflow);
        m.set_flag(Flag::AF, self.aux);
        m.set_flag(Flag::PF, parity(self.value));
        set_zero_sign(m, self.value, width);
    }
}

fn set_zero_sign(m: &mut Machine, value: u16, width: Width) {
    m.set_flag(Flag::ZF, value == 0);
    m.set_flag(Flag::SF, value as u32 & width.sign_bit() != 0);
}

fn binary(
    m: &mut Machine,
    instr: &Instr,
    alu: fn(u16, u16, Width) -> Alu,
) -> Result<Flow, ErrorKind> {
    let dest = instr.operand(0)?;
    let src = instr.operand(1)?;
    dest.ensure_writable()?;
    let width = operation_width(&[dest, src])?;

    let a = dest.read(m, width)?;
    let b = src.read(m, width)?;
    let mut result = alu(a, b, width);
    result.overflow |= width == Width::Word && src.exceeds_word();
    dest.write(m, result.value, width)?;
    result.commit(m, width);
    Ok(Flow::Continue)
}

pub fn add(m: &mut Machine, instr: &Instr, _: &Program) -> Result<Flow, ErrorKind> {
    binary(m, instr, Alu::add)
}

pub fn sub(m: &mut Machine, instr: &Instr, _: &Program) -> Result<Flow, ErrorKind> {
    binary(m, instr, Alu::sub)
}

/// Subtract without storing. Only CF and ZF change.
pub fn cmp(m: &mut Machine, instr: &Instr, _: &Program) -> Result<Flow, ErrorKind> {
    let lhs = instr.operand(0)?;
    let rhs = instr.operand(1)?;
    let width = operation_width(&[lhs, rhs])?;

    let a = lhs.read(m, width)?;
    let b = rhs.read(m, width)?;
    let result = Alu::sub(a, b, width);
    m.set_flag(Flag::CF, result.carry);
    m.set_flag(Flag::ZF, result.value == 0);
    Ok(Flow::Continue)
}

pub fn mul(m: &mut Machine, instr: &Instr, _: &Program) -> Result<Flow, ErrorKind> {
    let src = instr.operand(0)?;
    let width = operation_width(&[src])?;
    let factor = src.read(m, width)? as u32;

    let high = match width {
        Width::Byte => {
            let product = m.reg(Register::AL) as u32 * factor;
            m.set_reg(Register::AX, product as u16);
            product >> 8
        }
        Width::Word => {
            let product = m.reg(Register::AX) as u32 * factor;
            m.set_reg(Register::AX, product as u16);
            m.set_reg(Register::DX, (product >> 16) as u16);
            product >> 16
        }
    };
    m.set_flag(Flag::CF, high != 0);
    m.set_flag(Flag::OF, high != 0);
    Ok(Flow::Continue)
}

/// Registers are only written once the quotient is known to fit.
pub fn div(m: &mut Machine, instr: &Instr, _: &Program) -> Result<Flow, ErrorKind> {
    let src = instr.operand(0)?;
    let width = operation_width(&[src])?;
    let divisor = src.read(m, width)? as u32;
    if divisor == 0 {
        return Err(ErrorKind::DivideByZero);
    }

    match width {
        Width::Byte => {
            let dividend = m.reg(Register::AX) as u32;
            let quotient = dividend / divisor;
            if quotient > 0xFF {
                return Err(ErrorKind::DivideOverflow);
            }
            let remainder = dividend % divisor;
            m.set_reg(Register::AX, ((remainder << 8) | quotient) as u16);
        }
        Width::Word => {
            let dividend = (m.reg(Register::DX) as u32) << 16 | m.reg(Register::AX) as u32;
            let quotient = dividend / divisor;
            if quotient > 0xFFFF {
                return Err(ErrorKind::DivideOverflow);
            }
            m.set_reg(Register::AX, quotient as u16);
            m.set_reg(Register::DX, (dividend % divisor) as u16);
        }
    }
    Ok(Flow::Continue)
}

fn unary(m: &mut Machine, instr: &Instr, op: fn(u16) -> u16) -> Result<Flow, ErrorKind> {
    let dest = instr.operand(0)?;
    dest.ensure_writable()?;
    let width = operation_width(&[dest])?;

    let value = op(dest.read(m, width)?) & width.mask() as u16;
    dest.write(m, value, width)?;
    set_zero_sign(m, value, width);
    Ok(Flow::Continue)
}

pub fn inc(m: &mut Machine, instr: &Instr, _: &Program) -> Result<Flow, ErrorKind> {
    unary(m, instr, |v| v.wrapping_add(1))
}

pub fn dec(m: &mut Machine, instr: &Instr, _: &Program) -> Result<Flow, ErrorKind> {
    unary(m, instr, |v| v.wrapping_sub(1))
}

pub fn neg(m: &mut Machine, instr: &Instr, _: &Program) -> Result<Flow, ErrorKind> {
    unary(m, instr, |v| v.wrapping_neg())
}
