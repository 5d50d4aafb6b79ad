//! Instruction handlers and the table that maps a canonical opcode key to
//! them. Each handler does its work and tells the driver what to do with the
//! program counter.

use rand::Rng;

use crate::cpu::{Cpu, ProgramCounter, FLAG_REGISTER, STACK_SIZE};
use crate::error::{Chip8Error, Result};
use crate::fonts::GLYPH_SIZE;
use crate::opcode::Opcode;
use crate::OPCODE_SIZE;

pub type Handler = fn(&mut Cpu, Opcode) -> Result<ProgramCounter>;

// Highest address reachable through I or PC
const ADDRESS_MASK: u16 = 0x0FFF;

/// Handler for a canonical key, as produced by `Opcode::key`.
pub fn lookup(key: u16) -> Option<Handler> {
    let handler: Handler = match key {
        // Skipping 0NNN (Jump to machine code at location NNN)
        0x00E0 => Cpu::op_00e0, // Clears the screen
        0x00EE => Cpu::op_00ee, // Return from subroutine
        0x1000 => Cpu::op_1nnn, // PC Jumps to location at nnn
        0x2000 => Cpu::op_2nnn, // Call subroutine at nnn
        0x3000 | 0x4000 | 0x5000 | 0x9000 => Cpu::op_skip,
        0x6000 => Cpu::op_6xkk, // Puts value kk into register Vx
        0x7000 => Cpu::op_7xkk, // Sets Vx = Vx + kk, wrapping
        0x8000 => Cpu::op_8xy0, // Puts value Vy into Vx
        0x8001 => Cpu::op_8xy1, // Vx |= Vy
        0x8002 => Cpu::op_8xy2, // Vx &= Vy
        0x8003 => Cpu::op_8xy3, // Vx ^= Vy
        0x8004 => Cpu::op_8xy4, // Vx = Vx + Vy; VF = carry
        0x8005 => Cpu::op_8xy5, // Vx = Vx - Vy; VF = not borrow
        0x8006 => Cpu::op_8xy6, // SHR Vx
        0x8007 => Cpu::op_8xy7, // Vx = Vy - Vx; VF = not borrow
        0x800E => Cpu::op_8xye, // SHL Vx
        0xA000 => Cpu::op_annn, // I = nnn
        0xB000 => Cpu::op_bnnn, // Jump to nnn + V0
        0xC000 => Cpu::op_cxkk, // Vx = random & kk
        0xD000 => Cpu::op_dxyn, // Draw sprite
        0xE09E => Cpu::op_ex9e, // Skip if key Vx down
        0xE0A1 => Cpu::op_exa1, // Skip if key Vx up
        0xF007 => Cpu::op_fx07, // Vx = delay timer
        0xF00A => Cpu::op_fx0a, // Wait for key into Vx
        0xF015 => Cpu::op_fx15, // delay timer = Vx
        0xF018 => Cpu::op_fx18, // sound timer = Vx
        0xF01E => Cpu::op_fx1e, // I += Vx
        0xF029 => Cpu::op_fx29, // I = glyph for Vx
        0xF033 => Cpu::op_fx33, // BCD of Vx at I
        0xF055 => Cpu::op_fx55, // Store V0..Vx at I
        0xF065 => Cpu::op_fx65, // Load V0..Vx from I
        _ => return None,
    };
    Some(handler)
}

impl Cpu {
    // Clear screen
    fn op_00e0(&mut self, _op: Opcode) -> Result<ProgramCounter> {
        self.gfx.clear();
        Ok(ProgramCounter::Next)
    }

    // Pop the caller's address and continue after its call instruction
    fn op_00ee(&mut self, _op: Opcode) -> Result<ProgramCounter> {
        if self.sp == 0 {
            return Err(Chip8Error::StackUnderflow { pc: self.pc });
        }
        self.sp -= 1;
        let p = self.stack[self.sp];
        Ok(ProgramCounter::Jump(p + OPCODE_SIZE))
    }

    // PC Jumps to location NNN
    fn op_1nnn(&mut self, op: Opcode) -> Result<ProgramCounter> {
        Ok(ProgramCounter::Jump(op.nnn()))
    }

    // Call subroutine at NNN
    fn op_2nnn(&mut self, op: Opcode) -> Result<ProgramCounter> {
        if self.sp == STACK_SIZE {
            return Err(Chip8Error::StackOverflow { pc: self.pc });
        }
        self.stack[self.sp] = self.pc;
        self.sp += 1;
        Ok(ProgramCounter::Jump(op.nnn()))
    }

    // 3xkk, 4xkk, 5xy0 and 9xy0 all land here
    fn op_skip(&mut self, op: Opcode) -> Result<ProgramCounter> {
        let vx = self.v[op.x()];
        let vy = self.v[op.y()];
        let skip = match op.family() {
            0x3 => vx == op.kk(),
            0x4 => vx != op.kk(),
            0x5 => vx == vy,
            0x9 => vx != vy,
            _ => unreachable!("skip handler dispatched for {}", op),
        };
        Ok(skip_if(skip))
    }

    // Set Vx = kk
    fn op_6xkk(&mut self, op: Opcode) -> Result<ProgramCounter> {
        self.v[op.x()] = op.kk();
        Ok(ProgramCounter::Next)
    }

    // Set Vx = Vx + kk (overflow mod 256, VF untouched)
    fn op_7xkk(&mut self, op: Opcode) -> Result<ProgramCounter> {
        let x = op.x();
        self.v[x] = self.v[x].wrapping_add(op.kk());
        Ok(ProgramCounter::Next)
    }

    // Puts Vy into Vx
    fn op_8xy0(&mut self, op: Opcode) -> Result<ProgramCounter> {
        self.v[op.x()] = self.v[op.y()];
        Ok(ProgramCounter::Next)
    }

    fn op_8xy1(&mut self, op: Opcode) -> Result<ProgramCounter> {
        self.v[op.x()] |= self.v[op.y()];
        Ok(ProgramCounter::Next)
    }

    fn op_8xy2(&mut self, op: Opcode) -> Result<ProgramCounter> {
        self.v[op.x()] &= self.v[op.y()];
        Ok(ProgramCounter::Next)
    }

    fn op_8xy3(&mut self, op: Opcode) -> Result<ProgramCounter> {
        self.v[op.x()] ^= self.v[op.y()];
        Ok(ProgramCounter::Next)
    }

    // The flag ops below write VF first and the result second, so with
    // x = F the result is what's left in VF.

    // Vx = Vx + Vy; VF = 1 if the sum passed 255
    fn op_8xy4(&mut self, op: Opcode) -> Result<ProgramCounter> {
        let (sum, carry) = self.v[op.x()].overflowing_add(self.v[op.y()]);
        self.v[FLAG_REGISTER] = carry as u8;
        self.v[op.x()] = sum;
        Ok(ProgramCounter::Next)
    }

    // Vx = Vx - Vy; VF = 1 if Vx > Vy
    fn op_8xy5(&mut self, op: Opcode) -> Result<ProgramCounter> {
        let vx = self.v[op.x()];
        let vy = self.v[op.y()];
        self.v[FLAG_REGISTER] = (vx > vy) as u8;
        self.v[op.x()] = vx.wrapping_sub(vy);
        Ok(ProgramCounter::Next)
    }

    // Vx = Vx SHR 1
    // VF gets the bit shifted out
    fn op_8xy6(&mut self, op: Opcode) -> Result<ProgramCounter> {
        let vx = self.v[op.x()];
        self.v[FLAG_REGISTER] = vx & 0x01;
        self.v[op.x()] = vx >> 1;
        Ok(ProgramCounter::Next)
    }

    // Vx = Vy - Vx; VF = 1 if Vy > Vx
    fn op_8xy7(&mut self, op: Opcode) -> Result<ProgramCounter> {
        let vx = self.v[op.x()];
        let vy = self.v[op.y()];
        self.v[FLAG_REGISTER] = (vy > vx) as u8;
        self.v[op.x()] = vy.wrapping_sub(vx);
        Ok(ProgramCounter::Next)
    }

    // Vx = Vx SHL 1
    fn op_8xye(&mut self, op: Opcode) -> Result<ProgramCounter> {
        let vx = self.v[op.x()];
        self.v[FLAG_REGISTER] = (vx >> 7) & 0x01;
        self.v[op.x()] = vx << 1;
        Ok(ProgramCounter::Next)
    }

    fn op_annn(&mut self, op: Opcode) -> Result<ProgramCounter> {
        self.i = op.nnn();
        Ok(ProgramCounter::Next)
    }

    // Jump to nnn + V0
    fn op_bnnn(&mut self, op: Opcode) -> Result<ProgramCounter> {
        let target = op.nnn() + u16::from(self.v[0]);
        Ok(ProgramCounter::Jump(check_address(target)?))
    }

    fn op_cxkk(&mut self, op: Opcode) -> Result<ProgramCounter> {
        let r: u8 = self.rng.gen();
        self.v[op.x()] = r & op.kk();
        Ok(ProgramCounter::Next)
    }

    // Draw n rows of sprite data from I at (Vx, Vy). VF reports whether any
    // lit pixel was erased anywhere in the sprite.
    fn op_dxyn(&mut self, op: Opcode) -> Result<ProgramCounter> {
        let x = usize::from(self.v[op.x()]);
        let y = usize::from(self.v[op.y()]);
        let sprite = self.memory.slice(usize::from(self.i), op.n())?;
        let collision = self.gfx.draw_sprite(x, y, sprite);
        self.v[FLAG_REGISTER] = collision as u8;
        Ok(ProgramCounter::Next)
    }

    fn op_ex9e(&mut self, op: Opcode) -> Result<ProgramCounter> {
        Ok(skip_if(self.input.is_pressed(self.v[op.x()])))
    }

    fn op_exa1(&mut self, op: Opcode) -> Result<ProgramCounter> {
        Ok(skip_if(!self.input.is_pressed(self.v[op.x()])))
    }

    fn op_fx07(&mut self, op: Opcode) -> Result<ProgramCounter> {
        self.v[op.x()] = self.timers.delay;
        Ok(ProgramCounter::Next)
    }

    // Completed later by Cpu::resolve_awaited_key
    fn op_fx0a(&mut self, op: Opcode) -> Result<ProgramCounter> {
        Ok(ProgramCounter::Wait(op.x()))
    }

    fn op_fx15(&mut self, op: Opcode) -> Result<ProgramCounter> {
        self.timers.delay = self.v[op.x()];
        Ok(ProgramCounter::Next)
    }

    fn op_fx18(&mut self, op: Opcode) -> Result<ProgramCounter> {
        self.timers.sound = self.v[op.x()];
        Ok(ProgramCounter::Next)
    }

    fn op_fx1e(&mut self, op: Opcode) -> Result<ProgramCounter> {
        self.i = check_address(self.i + u16::from(self.v[op.x()]))?;
        Ok(ProgramCounter::Next)
    }

    // Point I at the font glyph for Vx. Only the low nibble is used, so a
    // value above 0xF is clamped to a glyph instead of pointing past the font
    fn op_fx29(&mut self, op: Opcode) -> Result<ProgramCounter> {
        self.i = GLYPH_SIZE * u16::from(self.v[op.x()] & 0x0F);
        Ok(ProgramCounter::Next)
    }

    // Hundreds, tens and ones of Vx at I, I+1, I+2
    fn op_fx33(&mut self, op: Opcode) -> Result<ProgramCounter> {
        let vx = self.v[op.x()];
        let digits = self.memory.slice_mut(usize::from(self.i), 3)?;
        digits[0] = vx / 100;
        digits[1] = (vx % 100) / 10;
        digits[2] = vx % 10;
        Ok(ProgramCounter::Next)
    }

    fn op_fx55(&mut self, op: Opcode) -> Result<ProgramCounter> {
        let count = op.x() + 1;
        let dst = self.memory.slice_mut(usize::from(self.i), count)?;
        dst.copy_from_slice(&self.v[..count]);
        Ok(ProgramCounter::Next)
    }

    fn op_fx65(&mut self, op: Opcode) -> Result<ProgramCounter> {
        let count = op.x() + 1;
        let src = self.memory.slice(usize::from(self.i), count)?;
        self.v[..count].copy_from_slice(src);
        Ok(ProgramCounter::Next)
    }
}

fn skip_if(cond: bool) -> ProgramCounter {
    if cond {
        ProgramCounter::Skip
    } else {
        ProgramCounter::Next
    }
}

fn check_address(addr: u16) -> Result<u16> {
    if addr > ADDRESS_MASK {
        return Err(Chip8Error::MemoryOutOfBounds {
            address: usize::from(addr),
        });
    }
    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_family_has_a_handler() {
        for key in &[
            0x00E0, 0x00EE, 0x1000, 0x2000, 0x3000, 0x4000, 0x5000, 0x6000, 0x7000, 0x8000,
            0x8001, 0x8002, 0x8003, 0x8004, 0x8005, 0x8006, 0x8007, 0x800E, 0x9000, 0xA000,
            0xB000, 0xC000, 0xD000, 0xE09E, 0xE0A1, 0xF007, 0xF00A, 0xF015, 0xF018, 0xF01E,
            0xF029, 0xF033, 0xF055, 0xF065,
        ] {
            assert!(lookup(*key).is_some(), "no handler for {:04X}", key);
        }
    }

    #[test]
    fn test_unmapped_keys() {
        for key in &[0x0000, 0x00E1, 0x8008, 0x800F, 0xE000, 0xF000, 0xF0FF] {
            assert!(lookup(*key).is_none(), "unexpected handler for {:04X}", key);
        }
    }

    #[test]
    fn test_check_address() {
        assert_eq!(check_address(0x0FFF).unwrap(), 0x0FFF);
        assert!(check_address(0x1000).is_err());
    }
}
