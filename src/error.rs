use std::io;

pub type Result<T> = std::result::Result<T, Chip8Error>;

/// Everything that can stop the interpreter. None of these are retried; a
/// faulted `Cpu` has to be reset before it will step again.
#[derive(Debug, thiserror::Error)]
pub enum Chip8Error {
    #[error("Unknown opcode {opcode:#06X} at pc {pc:#05X}")]
    UnknownOpcode { opcode: u16, pc: u16 },

    #[error("Stack overflow: call at pc {pc:#05X} with a full call stack")]
    StackOverflow { pc: u16 },

    #[error("Stack underflow: return at pc {pc:#05X} with an empty call stack")]
    StackUnderflow { pc: u16 },

    #[error("Memory access out of bounds at address {address:#06X}")]
    MemoryOutOfBounds { address: usize },

    #[error("Program is too large ({size} bytes), at most {max_size} bytes fit")]
    ProgramTooLarge { size: usize, max_size: usize },

    #[error("Invalid load base {address:#06X}")]
    InvalidLoadBase { address: u16 },

    #[error("Invalid key {key:#04X}")]
    InvalidKey { key: u8 },

    #[error("Interpreter halted after a fault at pc {pc:#05X}; reset required")]
    Halted { pc: u16 },

    #[error("Failed to read ROM: {0}")]
    Io(#[from] io::Error),
}
