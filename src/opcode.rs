use std::fmt;

/// A raw instruction word with accessors for its operand fields.
///
/// Each field is isolated with its mask first and only then shifted down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode(pub u16);

impl Opcode {
    /// Top nibble, selects the instruction family
    pub fn family(self) -> u16 {
        (self.0 & 0xF000) >> 12
    }

    pub fn x(self) -> usize {
        ((self.0 & 0x0F00) >> 8) as usize
    }

    pub fn y(self) -> usize {
        ((self.0 & 0x00F0) >> 4) as usize
    }

    pub fn n(self) -> usize {
        (self.0 & 0x000F) as usize
    }

    pub fn kk(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    pub fn nnn(self) -> u16 {
        self.0 & 0x0FFF
    }

    /// Canonical dispatch key: the opcode with the operand bits that vary
    /// between instances of the same instruction masked off.
    pub fn key(self) -> u16 {
        match self.0 & 0xF000 {
            0x0000 => self.0 & 0xF0FF,
            0x8000 => self.0 & 0xF00F,
            0xE000 | 0xF000 => self.0 & 0xF0FF,
            _ => self.0 & 0xF000,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields() {
        let op = Opcode(0xD12F);
        assert_eq!(op.family(), 0xD);
        assert_eq!(op.x(), 0x1);
        assert_eq!(op.y(), 0x2);
        assert_eq!(op.n(), 0xF);
        assert_eq!(op.kk(), 0x2F);
        assert_eq!(op.nnn(), 0x12F);
    }

    #[test]
    fn test_x_is_not_shift_then_mask() {
        // 0x0F00 >> 8 would be 0x0F; masking the whole opcode with that
        // gives the low nibble instead of x
        let op = Opcode(0x6A05);
        assert_eq!(op.x(), 0xA);
        assert_ne!(op.x(), (op.0 & (0x0F00 >> 8)) as usize);
    }

    #[test]
    fn test_keys() {
        assert_eq!(Opcode(0x00E0).key(), 0x00E0);
        assert_eq!(Opcode(0x00EE).key(), 0x00EE);
        assert_eq!(Opcode(0x1234).key(), 0x1000);
        assert_eq!(Opcode(0x3A12).key(), 0x3000);
        assert_eq!(Opcode(0x9AB0).key(), 0x9000);
        assert_eq!(Opcode(0x8AB4).key(), 0x8004);
        assert_eq!(Opcode(0x8ABE).key(), 0x800E);
        assert_eq!(Opcode(0xE19E).key(), 0xE09E);
        assert_eq!(Opcode(0xFA65).key(), 0xF065);
        assert_eq!(Opcode(0xDAB5).key(), 0xD000);
    }

    #[test]
    fn test_display() {
        assert_eq!(Opcode(0x00E0).to_string(), "00E0");
    }
}
