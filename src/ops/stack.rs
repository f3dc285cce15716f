use crate::air::{Instr, Program};
use crate::error::ErrorKind;
use crate::operand::operation_width;
use crate::ops::Flow;
use crate::state::Machine;

pub fn push(m: &mut Machine, instr: &Instr, _: &Program) -> Result<Flow, ErrorKind> {
    let src = instr.operand(0)?;
    let width = operation_width(&[src])?;
    let value = src.read(m, width)?;
    m.push(value)?;
    Ok(Flow::Continue)
}

/// The destination is checked before the stack is touched.
pub fn pop(m: &mut Machine, instr: &Instr, _: &Program) -> Result<Flow, ErrorKind> {
    let dest = instr.operand(0)?;
    dest.ensure_writable()?;
    let width = operation_width(&[dest])?;
    let value = m.pop()?;
    dest.write(m, value, width)?;
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::tests::exec;
    use crate::state::STACK_CAPACITY;
    use crate::symbol::Mnemonic::*;
    use crate::symbol::Register;

    #[test]
    fn push_then_pop() {
        let mut m = Machine::default();
        m.set_reg(Register::AX, 0xBEEF);
        exec(&mut m, Push, &["AX"]).unwrap();
        exec(&mut m, Pop, &["BX"]).unwrap();
        assert_eq!(m.reg(Register::BX), 0xBEEF);
        assert!(m.stack().is_empty());
    }

    #[test]
    fn pop_truncates_to_destination() {
        let mut m = Machine::default();
        exec(&mut m, Push, &["1234H"]).unwrap();
        exec(&mut m, Pop, &["CL"]).unwrap();
        assert_eq!(m.reg(Register::CX), 0x34);
    }

    #[test]
    fn underflow_and_overflow() {
        let mut m = Machine::default();
        assert_eq!(exec(&mut m, Pop, &["AX"]), Err(ErrorKind::StackUnderflow));
        for _ in 0..STACK_CAPACITY {
            exec(&mut m, Push, &["1"]).unwrap();
        }
        assert_eq!(exec(&mut m, Push, &["1"]), Err(ErrorKind::StackOverflow));
    }

    #[test]
    fn pop_into_literal_keeps_stack() {
        let mut m = Machine::default();
        exec(&mut m, Push, &["1"]).unwrap();
        assert!(exec(&mut m, Pop, &["2"]).is_err());
        assert_eq!(m.stack(), &[1]);
    }
}
