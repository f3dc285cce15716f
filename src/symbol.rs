use std::fmt;
use std::str::FromStr;

use fxhash::FxBuildHasher;
use indexmap::IndexMap;

/// Label name -> instruction index, kept in declaration order.
pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Operation size of a register, or of an instruction as a whole.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Width {
    Byte,
    Word,
}

impl Width {
    pub fn mask(self) -> u32 {
        match self {
            Width::Byte => 0xFF,
            Width::Word => 0xFFFF,
        }
    }

    pub fn sign_bit(self) -> u32 {
        match self {
            Width::Byte => 0x80,
            Width::Word => 0x8000,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            Width::Byte => 8,
            Width::Word => 16,
        }
    }
}

/// Which part of a 16-bit register a name refers to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Half {
    Full,
    High,
    Low,
}

/// General purpose register names, including the 8-bit halves.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Register {
    AX,
    AL,
    AH,
    BX,
    BL,
    BH,
    CX,
    CL,
    CH,
    DX,
    DL,
    DH,
}

impl Register {
    /// The four full-width registers, in storage order.
    pub const WORDS: [Register; 4] = [Register::AX, Register::BX, Register::CX, Register::DX];

    /// Index of the backing 16-bit register.
    pub fn index(self) -> usize {
        use Register::*;
        match self {
            AX | AL | AH => 0,
            BX | BL | BH => 1,
            CX | CL | CH => 2,
            DX | DL | DH => 3,
        }
    }

    pub fn half(self) -> Half {
        use Register::*;
        match self {
            AX | BX | CX | DX => Half::Full,
            AH | BH | CH | DH => Half::High,
            AL | BL | CL | DL => Half::Low,
        }
    }

    pub fn width(self) -> Width {
        match self.half() {
            Half::Full => Width::Word,
            Half::High | Half::Low => Width::Byte,
        }
    }

    pub fn name(self) -> &'static str {
        use Register::*;
        match self {
            AX => "AX",
            AL => "AL",
            AH => "AH",
            BX => "BX",
            BL => "BL",
            BH => "BH",
            CX => "CX",
            CL => "CL",
            CH => "CH",
            DX => "DX",
            DL => "DL",
            DH => "DH",
        }
    }
}

impl FromStr for Register {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Register::*;
        let reg = match s.to_ascii_uppercase().as_str() {
            "AX" => AX,
            "AL" => AL,
            "AH" => AH,
            "BX" => BX,
            "BL" => BL,
            "BH" => BH,
            "CX" => CX,
            "CL" => CL,
            "CH" => CH,
            "DX" => DX,
            "DL" => DL,
            "DH" => DH,
            _ => return Err(()),
        };
        Ok(reg)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Status flags of the simulated processor.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Flag {
    /// Carry
    CF,
    /// Zero
    ZF,
    /// Sign
    SF,
    /// Overflow
    OF,
    /// Parity (even parity of the low result byte)
    PF,
    /// Direction
    DF,
    /// Interrupt enable
    IF,
    /// Auxiliary carry, tracked but never consumed
    AF,
}

impl Flag {
    pub const ALL: [Flag; 8] = [
        Flag::CF,
        Flag::ZF,
        Flag::SF,
        Flag::OF,
        Flag::PF,
        Flag::DF,
        Flag::IF,
        Flag::AF,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Flag::CF => "CF",
            Flag::ZF => "ZF",
            Flag::SF => "SF",
            Flag::OF => "OF",
            Flag::PF => "PF",
            Flag::DF => "DF",
            Flag::IF => "IF",
            Flag::AF => "AF",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every supported instruction. Resolved once when the program is loaded.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Mnemonic {
    Add,
    Sub,
    Cmp,
    Mul,
    Div,
    Inc,
    Dec,
    Neg,
    Mov,
    Xchg,
    Push,
    Pop,
    Clc,
    Cld,
    Cli,
    Stc,
    Std,
    Sti,
    Cmc,
    Lahf,
    Sahf,
    Jmp,
    Je,
    Jz,
    Jne,
    Jnz,
    Jc,
    Jnc,
    Jp,
    Jpe,
    Jnp,
    Jpo,
    Jcxz,
    Nop,
    In,
    Out,
    Hlt,
    Org,
}

impl Mnemonic {
    /// Listed in declaration order, so `ALL[m as usize] == m`.
    pub const ALL: [Mnemonic; 38] = [
        Mnemonic::Add,
        Mnemonic::Sub,
        Mnemonic::Cmp,
        Mnemonic::Mul,
        Mnemonic::Div,
        Mnemonic::Inc,
        Mnemonic::Dec,
        Mnemonic::Neg,
        Mnemonic::Mov,
        Mnemonic::Xchg,
        Mnemonic::Push,
        Mnemonic::Pop,
        Mnemonic::Clc,
        Mnemonic::Cld,
        Mnemonic::Cli,
        Mnemonic::Stc,
        Mnemonic::Std,
        Mnemonic::Sti,
        Mnemonic::Cmc,
        Mnemonic::Lahf,
        Mnemonic::Sahf,
        Mnemonic::Jmp,
        Mnemonic::Je,
        Mnemonic::Jz,
        Mnemonic::Jne,
        Mnemonic::Jnz,
        Mnemonic::Jc,
        Mnemonic::Jnc,
        Mnemonic::Jp,
        Mnemonic::Jpe,
        Mnemonic::Jnp,
        Mnemonic::Jpo,
        Mnemonic::Jcxz,
        Mnemonic::Nop,
        Mnemonic::In,
        Mnemonic::Out,
        Mnemonic::Hlt,
        Mnemonic::Org,
    ];

    pub fn name(self) -> &'static str {
        use Mnemonic::*;
        match self {
            Add => "ADD",
            Sub => "SUB",
            Cmp => "CMP",
            Mul => "MUL",
            Div => "DIV",
            Inc => "INC",
            Dec => "DEC",
            Neg => "NEG",
            Mov => "MOV",
            Xchg => "XCHG",
            Push => "PUSH",
            Pop => "POP",
            Clc => "CLC",
            Cld => "CLD",
            Cli => "CLI",
            Stc => "STC",
            Std => "STD",
            Sti => "STI",
            Cmc => "CMC",
            Lahf => "LAHF",
            Sahf => "SAHF",
            Jmp => "JMP",
            Je => "JE",
            Jz => "JZ",
            Jne => "JNE",
            Jnz => "JNZ",
            Jc => "JC",
            Jnc => "JNC",
            Jp => "JP",
            Jpe => "JPE",
            Jnp => "JNP",
            Jpo => "JPO",
            Jcxz => "JCXZ",
            Nop => "NOP",
            In => "IN",
            Out => "OUT",
            Hlt => "HLT",
            Org => "ORG",
        }
    }
}

impl FromStr for Mnemonic {
    type Err = ();

    /// Expects an already uppercased name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mnemonic::ALL
            .into_iter()
            .find(|mnemonic| mnemonic.name() == s)
            .ok_or(())
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnemonic_table_order() {
        for (i, mnemonic) in Mnemonic::ALL.iter().enumerate() {
            assert_eq!(*mnemonic as usize, i, "{mnemonic} is out of order");
            assert_eq!(mnemonic.name().parse::<Mnemonic>(), Ok(*mnemonic));
        }
        assert!("mov".parse::<Mnemonic>().is_err());
        assert!("MOVE".parse::<Mnemonic>().is_err());
    }

    #[test]
    fn register_names() {
        assert_eq!("ax".parse::<Register>(), Ok(Register::AX));
        assert_eq!("Dh".parse::<Register>(), Ok(Register::DH));
        assert!("EX".parse::<Register>().is_err());
        assert!("A".parse::<Register>().is_err());

        assert_eq!(Register::BH.index(), Register::BX.index());
        assert_eq!(Register::BH.half(), Half::High);
        assert_eq!(Register::CL.width(), Width::Byte);
        assert_eq!(Register::DX.width(), Width::Word);
    }
}
