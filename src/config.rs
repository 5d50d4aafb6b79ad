use std::num::ParseIntError;
use std::path::PathBuf;

use structopt::StructOpt;

use crate::timer::TIMER_HZ;

#[derive(Debug, StructOpt)]
#[structopt(name = "r8", about = "A CHIP-8 interpreter")]
pub struct Config {
    /// ROM file to run
    #[structopt(parse(from_os_str))]
    pub rom: PathBuf,

    /// Address the ROM is loaded at and execution starts from (hex with 0x, or decimal)
    #[structopt(long, default_value = "0x200", parse(try_from_str = parse_address))]
    pub load_base: u16,

    /// Instructions executed per second
    #[structopt(long, default_value = "500")]
    pub cpu_hz: u32,

    /// Window pixels per CHIP-8 pixel
    #[structopt(long, default_value = "10")]
    pub scale: u32,

    /// Fixed seed for the random number instruction
    #[structopt(long)]
    pub seed: Option<u64>,
}

impl Config {
    /// Instructions to run between two timer ticks, at least one.
    pub fn cycles_per_frame(&self) -> u32 {
        (self.cpu_hz / TIMER_HZ).max(1)
    }
}

fn parse_address(s: &str) -> Result<u16, ParseIntError> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    }
}
