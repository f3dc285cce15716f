use std::collections::BTreeMap;

use crate::error::ErrorKind;
use crate::symbol::{Flag, Half, Register, Width};

/// Multiplier applied to the segment when forming a physical address.
pub const SEGMENT_SCALE: u32 = 10;
/// Number of word slots on the stack.
pub const STACK_CAPACITY: usize = 128;

/// Status flags, each a single bit.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Flags {
    bits: u8,
}

impl Flags {
    fn mask(flag: Flag) -> u8 {
        1 << flag as u8
    }

    pub fn get(&self, flag: Flag) -> bool {
        self.bits & Self::mask(flag) != 0
    }

    pub fn set(&mut self, flag: Flag, value: bool) {
        if value {
            self.bits |= Self::mask(flag);
        } else {
            self.bits &= !Self::mask(flag);
        }
    }
}

/// Simulated processor: registers, flags, sparse memory, and stack.
#[derive(Clone, Debug, Default)]
pub struct Machine {
    regs: [u16; 4],
    flags: Flags,
    /// Physical address -> word cell
    mem: BTreeMap<u32, u16>,
    stack: Vec<u16>,
    segment: u16,
    /// Uninitialized reads are fatal
    strict: bool,
    /// Non-fatal conditions raised since the last drain
    diagnostics: Vec<ErrorKind>,
}

impl Machine {
    pub fn new(strict: bool) -> Self {
        Machine {
            strict,
            ..Default::default()
        }
    }

    pub fn reg(&self, reg: Register) -> u16 {
        let full = self.regs[reg.index()];
        match reg.half() {
            Half::Full => full,
            Half::High => full >> 8,
            Half::Low => full & 0xFF,
        }
    }

    /// Byte halves only ever touch their own byte.
    pub fn set_reg(&mut self, reg: Register, value: u16) {
        let full = &mut self.regs[reg.index()];
        match reg.half() {
            Half::Full => *full = value,
            Half::High => *full = (*full & 0x00FF) | ((value & 0xFF) << 8),
            Half::Low => *full = (*full & 0xFF00) | (value & 0xFF),
        }
    }

    pub fn flag(&self, flag: Flag) -> bool {
        self.flags.get(flag)
    }

    pub fn set_flag(&mut self, flag: Flag, value: bool) {
        self.flags.set(flag, value);
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn segment(&self) -> u16 {
        self.segment
    }

    pub fn set_segment(&mut self, segment: u16) {
        self.segment = segment;
    }

    pub fn physical_address(&self, offset: u16) -> u32 {
        self.segment as u32 * SEGMENT_SCALE + offset as u32
    }

    /// Read a cell at `width`. A missing cell reads as zero and raises a diagnostic.
    pub fn read_mem(&mut self, addr: u32, width: Width) -> Result<u16, ErrorKind> {
        match self.mem.get(&addr) {
            Some(&value) => Ok(value & width.mask() as u16),
            None if self.strict => Err(ErrorKind::UninitializedMemoryRead(addr)),
            None => {
                self.report(ErrorKind::UninitializedMemoryRead(addr));
                Ok(0)
            }
        }
    }

    /// Read without side effects.
    pub fn peek_mem(&self, addr: u32) -> Option<u16> {
        self.mem.get(&addr).copied()
    }

    pub fn write_mem(&mut self, addr: u32, value: u16, width: Width) {
        self.mem.insert(addr, value & width.mask() as u16);
    }

    /// Cells in ascending address order.
    pub fn memory(&self) -> impl Iterator<Item = (u32, u16)> + '_ {
        self.mem.iter().map(|(&addr, &value)| (addr, value))
    }

    pub fn push(&mut self, value: u16) -> Result<(), ErrorKind> {
        if self.stack.len() >= STACK_CAPACITY {
            return Err(ErrorKind::StackOverflow);
        }
        self.stack.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16, ErrorKind> {
        self.stack.pop().ok_or(ErrorKind::StackUnderflow)
    }

    /// Bottom to top.
    pub fn stack(&self) -> &[u16] {
        &self.stack
    }

    /// Record a non-fatal condition.
    pub fn report(&mut self, kind: ErrorKind) {
        debug_assert!(!kind.is_fatal(), "fatal errors must be returned, not reported");
        self.diagnostics.push(kind);
    }

    pub fn drain_diagnostics(&mut self) -> Vec<ErrorKind> {
        std::mem::take(&mut self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_halves_alias_word() {
        let mut m = Machine::default();
        m.set_reg(Register::AX, 0x1234);
        assert_eq!(m.reg(Register::AH), 0x12);
        assert_eq!(m.reg(Register::AL), 0x34);

        m.set_reg(Register::AL, 0xFF);
        assert_eq!(m.reg(Register::AX), 0x12FF);
        m.set_reg(Register::AH, 0x1AB);
        assert_eq!(m.reg(Register::AX), 0xABFF);
        assert_eq!(m.reg(Register::BX), 0);
    }

    #[test]
    fn flags_are_independent() {
        let mut m = Machine::default();
        m.set_flag(Flag::CF, true);
        m.set_flag(Flag::AF, true);
        assert!(m.flag(Flag::CF));
        assert!(!m.flag(Flag::ZF));
        m.set_flag(Flag::CF, false);
        assert!(!m.flag(Flag::CF));
        assert!(m.flag(Flag::AF));
    }

    #[test]
    fn segment_addressing() {
        let mut m = Machine::default();
        assert_eq!(m.physical_address(7), 7);
        m.set_segment(3);
        assert_eq!(m.physical_address(7), 37);
    }

    #[test]
    fn uninitialized_read() {
        let mut m = Machine::default();
        assert_eq!(m.read_mem(5, Width::Word), Ok(0));
        assert_eq!(
            m.drain_diagnostics(),
            vec![ErrorKind::UninitializedMemoryRead(5)]
        );
        assert!(m.drain_diagnostics().is_empty());
        assert_eq!(m.peek_mem(5), None);

        let mut strict = Machine::new(true);
        assert_eq!(
            strict.read_mem(5, Width::Word),
            Err(ErrorKind::UninitializedMemoryRead(5))
        );
    }

    #[test]
    fn memory_is_ordered() {
        let mut m = Machine::default();
        m.write_mem(30, 3, Width::Word);
        m.write_mem(10, 0x1FF, Width::Byte);
        m.write_mem(20, 2, Width::Word);
        assert_eq!(
            m.memory().collect::<Vec<_>>(),
            vec![(10, 0xFF), (20, 2), (30, 3)]
        );
        assert_eq!(m.read_mem(20, Width::Byte), Ok(2));
    }

    #[test]
    fn stack_bounds() {
        let mut m = Machine::default();
        assert_eq!(m.pop(), Err(ErrorKind::StackUnderflow));
        for i in 0..STACK_CAPACITY {
            m.push(i as u16).unwrap();
        }
        assert_eq!(m.push(0), Err(ErrorKind::StackOverflow));
        assert_eq!(m.stack().len(), STACK_CAPACITY);
        assert_eq!(m.pop(), Ok(STACK_CAPACITY as u16 - 1));
    }
}
