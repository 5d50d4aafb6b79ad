use std::fs;
use std::path::Path;

use log::{debug, error, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{Chip8Error, Result};
use crate::framebuffer::{Framebuffer, Pixels};
use crate::instructions;
use crate::keypad::{check_key, Keypad};
use crate::memory::{Memory, MEMORY_SIZE};
use crate::opcode::Opcode;
use crate::timer::Timers;
use crate::{DEFAULT_LOAD_BASE, OPCODE_SIZE};

pub const NUM_REGISTERS: usize = 16;
pub const STACK_SIZE: usize = 16;
// VF doubles as carry, borrow and collision flag
pub const FLAG_REGISTER: usize = 0xF;

// Lowest load base that leaves the font intact
const MIN_LOAD_BASE: u16 = 80;

/// What an instruction wants done with the program counter afterwards.
///
/// Every handler returns one of these; the driver applies exactly that and
/// never moves the PC on its own.
#[derive(Debug, PartialEq)]
pub enum ProgramCounter {
    Next,
    Skip,
    Jump(u16),
    // Suspend until the host supplies a key for register x
    Wait(usize),
}

/// Result of a successful `step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    Executed,
    AwaitingKey,
}

pub struct Cpu {
    // Memory
    pub memory: Memory,

    // Registers
    pub v: [u8; NUM_REGISTERS],
    pub i: u16,  // Index register
    pub pc: u16, // Program Counter

    // 64 x 32 screen
    pub gfx: Framebuffer,

    pub timers: Timers,

    // Stack and stack pointer
    pub stack: [u16; STACK_SIZE],
    pub sp: usize,

    pub input: Keypad,

    pub(crate) rng: StdRng,
    load_base: u16,
    // pc of the instruction that faulted, if any
    fault: Option<u16>,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Cpu {
        Cpu::with_rng(StdRng::from_entropy())
    }

    /// Same as `new` but with a fixed seed for `Cxkk`.
    pub fn with_seed(seed: u64) -> Cpu {
        Cpu::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Cpu {
        let mut cpu = Cpu {
            memory: Memory::new(),
            v: [0; NUM_REGISTERS],
            i: 0,
            pc: 0,
            gfx: Framebuffer::new(),
            timers: Timers::new(),
            stack: [0; STACK_SIZE],
            sp: 0,
            input: Keypad::new(),
            rng,
            load_base: DEFAULT_LOAD_BASE,
            fault: None,
        };
        cpu.initialize();
        cpu
    }

    // Reset at the current load base, already known to be valid
    fn initialize(&mut self) {
        self.memory.reset();
        self.v = [0; NUM_REGISTERS];
        self.i = 0;
        self.pc = self.load_base;
        self.gfx.reset();
        self.timers = Timers::new();
        self.stack = [0; STACK_SIZE];
        self.sp = 0;
        self.input.reset();
        self.fault = None;
    }

    /// Put the machine back to power-on state with the PC at `load_base`.
    pub fn reset(&mut self, load_base: u16) -> Result<()> {
        let end = usize::from(load_base) + usize::from(OPCODE_SIZE);
        if load_base < MIN_LOAD_BASE || end > MEMORY_SIZE {
            return Err(Chip8Error::InvalidLoadBase { address: load_base });
        }
        self.load_base = load_base;
        self.initialize();
        debug!("reset with load base {:#05X}", load_base);
        Ok(())
    }

    pub fn load_base(&self) -> u16 {
        self.load_base
    }

    /// Copy `bytes` into memory starting at `at`.
    pub fn load_program(&mut self, bytes: &[u8], at: u16) -> Result<()> {
        self.memory.load(bytes, usize::from(at))?;
        debug!("loaded {} bytes at {:#05X}", bytes.len(), at);
        Ok(())
    }

    // Load the rom into memory at the load base
    pub fn load_rom<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let rom = fs::read(file.as_ref())?;
        self.load_program(&rom, self.load_base)
    }

    // Reads the opcode at the program counter
    pub fn read_word(&self) -> Result<u16> {
        self.memory.read_word(usize::from(self.pc))
    }

    /// Fetch, decode and execute one instruction.
    pub fn step(&mut self) -> Result<StepOutcome> {
        if let Some(pc) = self.fault {
            return Err(Chip8Error::Halted { pc });
        }
        if self.input.is_waiting() {
            return Ok(StepOutcome::AwaitingKey);
        }

        let pc = self.pc;
        let opcode = match self.read_word() {
            Ok(opcode) => opcode,
            Err(e) => {
                error!("fetch failed at pc {:#05X}: {}", pc, e);
                return Err(self.halt(pc, e));
            }
        };
        if let Err(e) = self.run_opcode(opcode) {
            error!("fault executing {:04X} at pc {:#05X}: {}", opcode, pc, e);
            return Err(self.halt(pc, e));
        }
        Ok(StepOutcome::Executed)
    }

    fn halt(&mut self, pc: u16, e: Chip8Error) -> Chip8Error {
        self.fault = Some(pc);
        self.dump_regs();
        e
    }

    /// Execute `opcode` as though it had been fetched from the PC.
    ///
    /// This is a debugging entry point: unlike `step` it ignores a recorded
    /// fault and a pending key wait, and does not record a fault on error.
    pub fn run_opcode(&mut self, opcode: u16) -> Result<()> {
        let op = Opcode(opcode);
        let key = op.key();
        trace!("pc {:#05X}: running {} (key {:04X})", self.pc, op, key);

        let handler = instructions::lookup(key).ok_or(Chip8Error::UnknownOpcode {
            opcode,
            pc: self.pc,
        })?;

        match handler(self, op)? {
            ProgramCounter::Next => self.pc += OPCODE_SIZE,
            ProgramCounter::Skip => self.pc += OPCODE_SIZE * 2,
            ProgramCounter::Jump(p) => self.pc = p,
            ProgramCounter::Wait(x) => {
                debug!("waiting for a key press into v{:X}", x);
                self.input.key_target = Some(x);
            }
        }
        Ok(())
    }

    /// One 60 Hz timer tick.
    pub fn tick_timers(&mut self) {
        self.timers.tick();
    }

    pub fn set_key_state(&mut self, key: u8, pressed: bool) -> Result<()> {
        self.input.set(key, pressed)
    }

    /// Current screen and whether it changed since the last read.
    pub fn read_framebuffer(&mut self) -> (Pixels, bool) {
        self.gfx.take()
    }

    pub fn is_awaiting_key(&self) -> bool {
        self.input.is_waiting()
    }

    /// Complete a pending `Fx0A` with `key` and move past it.
    pub fn resolve_awaited_key(&mut self, key: u8) -> Result<()> {
        check_key(key)?;
        let x = self
            .input
            .key_target
            .take()
            .ok_or(Chip8Error::InvalidKey { key })?;
        self.v[x] = key;
        self.pc += OPCODE_SIZE;
        debug!("key {:X} stored in v{:X}, resuming", key, x);
        Ok(())
    }

    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }

    pub fn dump_regs(&self) {
        debug!(
            "pc: {:#05X} i: {:#05X} sp: {} v: {:?}",
            self.pc, self.i, self.sp, self.v
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize() {
        let cpu = Cpu::new();
        assert_eq!(cpu.pc, DEFAULT_LOAD_BASE);
        assert_eq!(cpu.i, 0);
        assert_eq!(cpu.sp, 0);
        assert_eq!(cpu.memory.read(0).unwrap(), 0xF0);
        assert!(!cpu.is_faulted());
    }

    #[test]
    fn test_reset_rejects_font_overlap() {
        let mut cpu = Cpu::new();
        assert!(matches!(
            cpu.reset(0x20),
            Err(Chip8Error::InvalidLoadBase { address: 0x20 })
        ));
        assert!(cpu.reset(0xFFF).is_err());
        assert!(cpu.reset(0xFFE).is_ok());
        assert_eq!(cpu.pc, 0xFFE);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut cpu = Cpu::new();
        cpu.v[3] = 9;
        cpu.i = 0x123;
        cpu.sp = 2;
        cpu.timers.delay = 4;
        cpu.gfx.pixels[1][1] = true;
        cpu.input.keys[5] = true;
        cpu.reset(0x300).unwrap();
        assert_eq!(cpu.v, [0; NUM_REGISTERS]);
        assert_eq!(cpu.i, 0);
        assert_eq!(cpu.sp, 0);
        assert_eq!(cpu.pc, 0x300);
        assert_eq!(cpu.timers.delay, 0);
        assert!(!cpu.gfx.pixels[1][1]);
        assert!(!cpu.input.keys[5]);
    }

    #[test]
    fn test_fault_halts_until_reset() {
        let mut cpu = Cpu::new();
        cpu.load_program(&[0xFF, 0xFF], 0x200).unwrap();
        assert!(matches!(
            cpu.step(),
            Err(Chip8Error::UnknownOpcode {
                opcode: 0xFFFF,
                pc: 0x200
            })
        ));
        assert!(matches!(cpu.step(), Err(Chip8Error::Halted { pc: 0x200 })));
        cpu.reset(0x200).unwrap();
        assert!(!cpu.is_faulted());
    }

    #[test]
    fn test_resolve_without_wait() {
        let mut cpu = Cpu::new();
        assert!(cpu.resolve_awaited_key(1).is_err());
        assert_eq!(cpu.pc, DEFAULT_LOAD_BASE);
    }
}
