mod config;
mod cpu;
mod display;
mod error;
mod fonts;
mod framebuffer;
mod instructions;
mod keypad;
mod memory;
mod opcode;
mod timer;

use std::error::Error;

use log::info;

pub use config::Config;
pub use cpu::{Cpu, ProgramCounter, StepOutcome, FLAG_REGISTER, NUM_REGISTERS, STACK_SIZE};
pub use display::{map_key, DisplayDriver};
pub use error::{Chip8Error, Result};
pub use fonts::FONT_SET;
pub use framebuffer::{Framebuffer, Pixels};
pub use keypad::{Keypad, NUM_KEYS};
pub use memory::{Memory, MEMORY_SIZE};
pub use opcode::Opcode;
pub use timer::{Timers, TIMER_HZ};

pub const OPCODE_SIZE: u16 = 2;
pub const C8_WIDTH: usize = 64;
pub const C8_HEIGHT: usize = 32;
// Where ROMs conventionally live and execution starts
pub const DEFAULT_LOAD_BASE: u16 = 0x200;

/// Build a CPU from `config`, load its ROM and run it in a window.
pub fn go(config: Config) -> std::result::Result<(), Box<dyn Error>> {
    let mut cpu = match config.seed {
        Some(seed) => Cpu::with_seed(seed),
        None => Cpu::new(),
    };
    cpu.reset(config.load_base)?;
    cpu.load_rom(&config.rom)?;
    info!("loaded {}", config.rom.display());

    display::run(cpu, &config)
}
