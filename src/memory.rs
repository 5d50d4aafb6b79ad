use crate::error::{Chip8Error, Result};
use crate::fonts::FONT_SET;

pub const MEMORY_SIZE: usize = 4096;

/// Flat 4K of RAM. Every access is bounds checked so a runaway program
/// faults instead of panicking.
pub struct Memory {
    bytes: [u8; MEMORY_SIZE],
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    pub fn new() -> Memory {
        Memory {
            bytes: [0; MEMORY_SIZE],
        }
    }

    // Zero everything then put the font back at 0x000
    pub fn reset(&mut self) {
        self.bytes = [0; MEMORY_SIZE];
        self.bytes[..FONT_SET.len()].copy_from_slice(&FONT_SET);
    }

    pub fn read(&self, addr: usize) -> Result<u8> {
        self.bytes
            .get(addr)
            .copied()
            .ok_or(Chip8Error::MemoryOutOfBounds { address: addr })
    }

    pub fn write(&mut self, addr: usize, value: u8) -> Result<()> {
        let cell = self
            .bytes
            .get_mut(addr)
            .ok_or(Chip8Error::MemoryOutOfBounds { address: addr })?;
        *cell = value;
        Ok(())
    }

    /// Big-endian word at `addr`, as opcodes are stored.
    pub fn read_word(&self, addr: usize) -> Result<u16> {
        let hi = self.read(addr)?;
        let lo = self.read(addr + 1)?;
        Ok((u16::from(hi) << 8) | u16::from(lo))
    }

    pub fn slice(&self, addr: usize, len: usize) -> Result<&[u8]> {
        self.check_range(addr, len)?;
        Ok(&self.bytes[addr..addr + len])
    }

    pub fn slice_mut(&mut self, addr: usize, len: usize) -> Result<&mut [u8]> {
        self.check_range(addr, len)?;
        Ok(&mut self.bytes[addr..addr + len])
    }

    /// Copy a program into RAM. Nothing is written unless all of it fits.
    pub fn load(&mut self, data: &[u8], addr: usize) -> Result<()> {
        if addr > MEMORY_SIZE {
            return Err(Chip8Error::MemoryOutOfBounds { address: addr });
        }
        let max_size = MEMORY_SIZE - addr;
        if data.len() > max_size {
            return Err(Chip8Error::ProgramTooLarge {
                size: data.len(),
                max_size,
            });
        }
        self.bytes[addr..addr + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn check_range(&self, addr: usize, len: usize) -> Result<()> {
        if addr + len > MEMORY_SIZE {
            // report the first cell that's out of range
            let address = addr.max(MEMORY_SIZE);
            return Err(Chip8Error::MemoryOutOfBounds { address });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_loads_font() {
        let mut m = Memory::new();
        m.write(0x300, 0xAB).unwrap();
        m.reset();
        assert_eq!(m.slice(0, 80).unwrap(), &FONT_SET[..]);
        assert_eq!(m.read(0x300).unwrap(), 0);
    }

    #[test]
    fn test_read_word() {
        let mut m = Memory::new();
        m.load(&[0, 1, 2, 3, 4, 5, 6, 7], 0).unwrap();
        assert_eq!(m.read_word(0x4).unwrap(), 0x0405);
    }

    #[test]
    fn test_read_word_at_last_cell_faults() {
        let m = Memory::new();
        match m.read_word(0xFFF) {
            Err(Chip8Error::MemoryOutOfBounds { address }) => assert_eq!(address, 0x1000),
            other => panic!("expected out of bounds, got {:?}", other),
        }
    }

    #[test]
    fn test_write_out_of_bounds() {
        let mut m = Memory::new();
        assert!(m.write(0xFFF, 1).is_ok());
        assert!(matches!(
            m.write(0x1000, 1),
            Err(Chip8Error::MemoryOutOfBounds { address: 0x1000 })
        ));
    }

    #[test]
    fn test_load_too_large_leaves_memory_alone() {
        let mut m = Memory::new();
        m.reset();
        let prog = [0xFF; 9];
        match m.load(&prog, 4088) {
            Err(Chip8Error::ProgramTooLarge { size, max_size }) => {
                assert_eq!(size, 9);
                assert_eq!(max_size, 8);
            }
            other => panic!("expected too large, got {:?}", other),
        }
        assert_eq!(m.slice(4088, 8).unwrap(), &[0; 8]);
    }

    #[test]
    fn test_load_exactly_fits() {
        let mut m = Memory::new();
        m.load(&[0xAA; 8], 4088).unwrap();
        assert_eq!(m.read(0xFFF).unwrap(), 0xAA);
    }

    #[test]
    fn test_load_past_end_of_memory() {
        let mut m = Memory::new();
        assert!(matches!(
            m.load(&[], 5000),
            Err(Chip8Error::MemoryOutOfBounds { address: 5000 })
        ));
        assert!(matches!(
            m.load(&[1, 2], 0x1001),
            Err(Chip8Error::MemoryOutOfBounds { address: 0x1001 })
        ));
        // an empty program right at the end is fine
        assert!(m.load(&[], MEMORY_SIZE).is_ok());
        assert!(matches!(
            m.load(&[1], MEMORY_SIZE),
            Err(Chip8Error::ProgramTooLarge { size: 1, max_size: 0 })
        ));
    }

    #[test]
    fn test_slice_range_check() {
        let m = Memory::new();
        assert!(m.slice(4090, 6).is_ok());
        assert!(m.slice(4090, 7).is_err());
    }
}
