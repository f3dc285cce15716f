use crate::error::{ErrorKind, OperandError};
use crate::state::Machine;
use crate::symbol::{Flag, Register, Width};

/// A classified operand, borrowing its source text.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Operand<'a> {
    pub text: &'a str,
    pub kind: OperandKind,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OperandKind {
    Reg(Register),
    /// Offset within the current segment
    Mem(u16),
    Imm(i64),
}

impl<'a> Operand<'a> {
    /// Decide which form `text` takes. Exactly one form must match.
    pub fn classify(text: &'a str) -> Result<Self, ErrorKind> {
        let forms = [
            text.parse::<Register>().ok().map(|reg| Ok(OperandKind::Reg(reg))),
            parse_address(text),
            parse_hex(text),
            parse_decimal(text),
        ];
        let mut matches = forms.into_iter().flatten();
        let kind = match (matches.next(), matches.next()) {
            (Some(kind), None) => kind.map_err(|reason| ErrorKind::invalid(text, reason))?,
            (Some(_), Some(_)) => return Err(ErrorKind::invalid(text, OperandError::Ambiguous)),
            (None, _) => return Err(ErrorKind::invalid(text, OperandError::Unrecognized)),
        };
        Ok(Operand { text, kind })
    }

    /// Width fixed by the operand itself. Only registers have one.
    pub fn width(&self) -> Option<Width> {
        match self.kind {
            OperandKind::Reg(reg) => Some(reg.width()),
            _ => None,
        }
    }

    pub fn is_mem(&self) -> bool {
        matches!(self.kind, OperandKind::Mem(_))
    }

    pub fn is_imm(&self) -> bool {
        matches!(self.kind, OperandKind::Imm(_))
    }

    /// A literal outside the signed word range. Reading one at word width sets OF.
    pub fn exceeds_word(&self) -> bool {
        let word = i16::MIN as i64..=i16::MAX as i64;
        matches!(self.kind, OperandKind::Imm(value) if !word.contains(&value))
    }

    /// Current value at the operation width.
    pub fn read(&self, machine: &mut Machine, width: Width) -> Result<u16, ErrorKind> {
        match self.kind {
            OperandKind::Reg(reg) => Ok(machine.reg(reg)),
            OperandKind::Mem(offset) => {
                let addr = machine.physical_address(offset);
                machine.read_mem(addr, width)
            }
            OperandKind::Imm(value) => self.immediate(machine, value, width),
        }
    }

    /// Store `value`, truncated to the destination's width.
    pub fn write(&self, machine: &mut Machine, value: u16, width: Width) -> Result<(), ErrorKind> {
        match self.kind {
            OperandKind::Reg(reg) => machine.set_reg(reg, value),
            OperandKind::Mem(offset) => {
                let addr = machine.physical_address(offset);
                machine.write_mem(addr, value, width);
            }
            OperandKind::Imm(_) => return Err(self.invalid(OperandError::NotWritable)),
        }
        Ok(())
    }

    pub fn ensure_writable(&self) -> Result<(), ErrorKind> {
        if self.is_imm() {
            return Err(self.invalid(OperandError::NotWritable));
        }
        Ok(())
    }

    pub fn invalid(&self, reason: OperandError) -> ErrorKind {
        ErrorKind::invalid(self.text, reason)
    }

    fn immediate(&self, machine: &mut Machine, value: i64, width: Width) -> Result<u16, ErrorKind> {
        match width {
            Width::Byte if (-128..=255).contains(&value) => Ok(value as u16 & 0xFF),
            Width::Byte => Err(self.invalid(OperandError::TooWide)),
            Width::Word => {
                if self.exceeds_word() {
                    machine.set_flag(Flag::OF, true);
                    machine.report(ErrorKind::ImmediateOverflow(value));
                }
                Ok(value as u16)
            }
        }
    }
}

/// Width of an operation over `operands`: the register width if any, otherwise a word.
pub fn operation_width(operands: &[Operand<'_>]) -> Result<Width, ErrorKind> {
    let mut width = None;
    for operand in operands {
        match (width, operand.width()) {
            (Some(a), Some(b)) if a != b => {
                return Err(operand.invalid(OperandError::WidthMismatch));
            }
            (None, Some(b)) => width = Some(b),
            _ => (),
        }
    }
    Ok(width.unwrap_or(Width::Word))
}

fn parse_address(text: &str) -> Option<Result<OperandKind, OperandError>> {
    let inner = text.strip_prefix('[')?;
    let Some(inner) = inner.strip_suffix(']') else {
        return Some(Err(OperandError::BadAddress));
    };
    if inner.is_empty() || !inner.bytes().all(|b| b.is_ascii_digit()) {
        return Some(Err(OperandError::BadAddress));
    }
    Some(
        inner
            .parse::<u16>()
            .map(OperandKind::Mem)
            .map_err(|_| OperandError::BadAddress),
    )
}

/// `<digit><hex digits>H`, case-insensitive.
fn parse_hex(text: &str) -> Option<Result<OperandKind, OperandError>> {
    let digits = text
        .strip_suffix('H')
        .or_else(|| text.strip_suffix('h'))?;
    let first = digits.chars().next()?;
    if !first.is_ascii_digit() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(
        i64::from_str_radix(digits, 16)
            .map(OperandKind::Imm)
            .map_err(|_| OperandError::TooWide),
    )
}

fn parse_decimal(text: &str) -> Option<Result<OperandKind, OperandError>> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(
        text.parse::<i64>()
            .map(OperandKind::Imm)
            .map_err(|_| OperandError::TooWide),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(text: &str) -> Result<OperandKind, ErrorKind> {
        Operand::classify(text).map(|op| op.kind)
    }

    #[test]
    fn classifies_forms() {
        assert_eq!(kind("ax"), Ok(OperandKind::Reg(Register::AX)));
        assert_eq!(kind("CH"), Ok(OperandKind::Reg(Register::CH)));
        assert_eq!(kind("[120]"), Ok(OperandKind::Mem(120)));
        assert_eq!(kind("1234H"), Ok(OperandKind::Imm(0x1234)));
        assert_eq!(kind("0ffh"), Ok(OperandKind::Imm(0xFF)));
        assert_eq!(kind("42"), Ok(OperandKind::Imm(42)));
        assert_eq!(kind("-7"), Ok(OperandKind::Imm(-7)));
    }

    #[test]
    fn rejects_malformed() {
        for (text, reason) in [
            ("FFH", OperandError::Unrecognized),
            ("L1", OperandError::Unrecognized),
            ("-", OperandError::Unrecognized),
            ("[12", OperandError::BadAddress),
            ("[AX]", OperandError::BadAddress),
            ("[-1]", OperandError::BadAddress),
            ("[]", OperandError::BadAddress),
            ("[70000]", OperandError::BadAddress),
        ] {
            assert_eq!(kind(text), Err(ErrorKind::invalid(text, reason)), "{text}");
        }
    }

    #[test]
    fn immediate_ranges() {
        let mut m = Machine::default();
        let big = Operand::classify("1234H").unwrap();
        assert_eq!(big.read(&mut m, Width::Word), Ok(0x1234));
        assert_eq!(
            big.read(&mut m, Width::Byte),
            Err(ErrorKind::invalid("1234H", OperandError::TooWide))
        );

        let neg = Operand::classify("-1").unwrap();
        assert_eq!(neg.read(&mut m, Width::Byte), Ok(0xFF));
        assert!(!m.flag(Flag::OF));

        let huge = Operand::classify("70000").unwrap();
        assert_eq!(huge.read(&mut m, Width::Word), Ok(70000u32 as u16));
        assert!(m.flag(Flag::OF));
        assert_eq!(m.drain_diagnostics(), vec![ErrorKind::ImmediateOverflow(70000)]);
    }

    #[test]
    fn widths() {
        let ax = Operand::classify("AX").unwrap();
        let bl = Operand::classify("BL").unwrap();
        let mem = Operand::classify("[4]").unwrap();
        let imm = Operand::classify("4").unwrap();
        assert_eq!(operation_width(&[bl, imm]), Ok(Width::Byte));
        assert_eq!(operation_width(&[mem, ax]), Ok(Width::Word));
        assert_eq!(operation_width(&[mem, imm]), Ok(Width::Word));
        assert_eq!(
            operation_width(&[ax, bl]),
            Err(ErrorKind::invalid("BL", OperandError::WidthMismatch))
        );
    }

    #[test]
    fn literals_are_not_writable() {
        let mut m = Machine::default();
        let imm = Operand::classify("3").unwrap();
        assert!(imm.ensure_writable().is_err());
        assert!(imm.write(&mut m, 1, Width::Word).is_err());

        let mem = Operand::classify("[3]").unwrap();
        mem.write(&mut m, 0xABCD, Width::Byte).unwrap();
        assert_eq!(m.peek_mem(3), Some(0xCD));
    }
}
