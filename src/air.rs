use std::fmt;

use crate::error::ErrorKind;
use crate::operand::Operand;
use crate::span::Span;
use crate::symbol::{FxIndexMap, Mnemonic};

/// Assembled program: the ordered instruction list plus the label index.
/// Immutable once loaded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    instrs: Vec<Instr>,
    /// Label -> index of the instruction it names. May equal `len()` for a trailing label.
    labels: FxIndexMap<String, usize>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_instr(&mut self, instr: Instr) {
        self.instrs.push(instr);
    }

    /// Bind `label` to the next instruction pushed. Returns false if it already exists.
    pub fn add_label(&mut self, label: &str) -> bool {
        if self.labels.contains_key(label) {
            return false;
        }
        self.labels.insert(label.to_owned(), self.instrs.len());
        true
    }

    pub fn get(&self, idx: usize) -> Option<&Instr> {
        self.instrs.get(idx)
    }

    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }
}

/// Single decoded instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instr {
    pub mnemonic: Mnemonic,
    pub args: Vec<Arg>,
    /// 1-based source line
    pub line: usize,
    /// Whole instruction, mnemonic through last operand
    pub span: Span,
}

/// Raw operand text. Classified when the instruction runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Arg {
    pub text: String,
    pub span: Span,
}

impl Instr {
    pub fn arg(&self, idx: usize) -> Result<&Arg, ErrorKind> {
        self.args.get(idx).ok_or_else(|| ErrorKind::ArityMismatch {
            mnemonic: self.mnemonic,
            expected: idx + 1,
            found: self.args.len(),
        })
    }

    pub fn operand(&self, idx: usize) -> Result<Operand<'_>, ErrorKind> {
        Operand::classify(&self.arg(idx)?.text)
    }

    /// Where to point a report for `kind`: the offending operand if there is one.
    pub fn fault_span(&self, kind: &ErrorKind) -> Span {
        let ErrorKind::InvalidOperand { operand, .. } = kind else {
            return self.span;
        };
        self.args
            .iter()
            .find(|arg| arg.text == *operand)
            .map_or(self.span, |arg| arg.span)
    }

    /// Jump target name.
    pub fn target(&self) -> Result<&str, ErrorKind> {
        Ok(&self.arg(0)?.text)
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic)?;
        for (i, arg) in self.args.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}{}", sep, arg.text)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instr(mnemonic: Mnemonic, args: &[&str]) -> Instr {
        Instr {
            mnemonic,
            args: args
                .iter()
                .map(|text| Arg {
                    text: text.to_string(),
                    span: Span::default(),
                })
                .collect(),
            line: 1,
            span: Span::default(),
        }
    }

    #[test]
    fn display() {
        assert_eq!(instr(Mnemonic::Mov, &["AX", "5"]).to_string(), "MOV AX, 5");
        assert_eq!(instr(Mnemonic::Hlt, &[]).to_string(), "HLT");
    }

    #[test]
    fn labels_point_forward() {
        let mut program = Program::new();
        assert!(program.add_label("start"));
        program.add_instr(instr(Mnemonic::Nop, &[]));
        assert!(program.add_label("end"));
        assert!(!program.add_label("start"));
        assert_eq!(program.label("start"), Some(0));
        assert_eq!(program.label("end"), Some(1));
        assert_eq!(program.label("START"), None);
    }

    #[test]
    fn fault_points_at_operand() {
        let mut mov = instr(Mnemonic::Mov, &["AX", "*5"]);
        mov.span = Span::new(0, 11);
        mov.args[1].span = Span::new(8, 3);
        let bad = ErrorKind::invalid("*5", crate::error::OperandError::Unrecognized);
        assert_eq!(mov.fault_span(&bad), Span::new(8, 3));
        assert_eq!(mov.fault_span(&ErrorKind::DivideByZero), Span::new(0, 11));
    }

    #[test]
    fn jump_target() {
        assert_eq!(instr(Mnemonic::Jmp, &["loop"]).target(), Ok("loop"));
        assert!(instr(Mnemonic::Jmp, &[]).target().is_err());
    }
}
