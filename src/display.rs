use std::error::Error;

use ggez::conf::{WindowMode, WindowSetup};
use ggez::event::{self, EventHandler, KeyCode, KeyMods};
use ggez::graphics::{self, DrawMode, DrawParam, Mesh, MeshBuilder, Rect};
use ggez::{timer, Context, ContextBuilder, GameResult};
use glam::Vec2;
use log::{debug, error, info, warn};

use crate::config::Config;
use crate::cpu::{Cpu, StepOutcome};
use crate::error::Chip8Error;
use crate::framebuffer::Pixels;
use crate::timer::TIMER_HZ;
use crate::{C8_HEIGHT, C8_WIDTH};

/// Window host: renders the framebuffer, feeds the keypad and runs the CPU
/// and timer clocks.
pub struct DisplayDriver {
    cpu: Cpu,
    scale: f32,
    cycles_per_frame: u32,
    // rebuilt only when the interpreter reports a draw
    mesh: Option<Mesh>,
    // no audio; the buzzer only shows up in the log
    sound_on: bool,
    fault: Option<Chip8Error>,
}

impl DisplayDriver {
    pub fn new(cpu: Cpu, config: &Config) -> DisplayDriver {
        DisplayDriver {
            cpu,
            scale: config.scale as f32,
            cycles_per_frame: config.cycles_per_frame(),
            mesh: None,
            sound_on: false,
            fault: None,
        }
    }

    fn build_mesh(&self, ctx: &mut Context, pixels: &Pixels) -> GameResult<Option<Mesh>> {
        let s = self.scale;
        let mut builder = MeshBuilder::new();
        let mut lit = false;
        for (y, row) in pixels.iter().enumerate() {
            for (x, on) in row.iter().enumerate() {
                if *on {
                    let r = Rect::new(x as f32 * s, y as f32 * s, s, s);
                    builder.rectangle(DrawMode::fill(), r, graphics::WHITE);
                    lit = true;
                }
            }
        }
        // an empty mesh can't be built
        if !lit {
            return Ok(None);
        }
        Ok(Some(builder.build(ctx)?))
    }
}

impl EventHandler for DisplayDriver {
    fn update(&mut self, ctx: &mut Context) -> GameResult {
        while timer::check_update_time(ctx, TIMER_HZ) {
            self.cpu.tick_timers();
            let sound_on = self.cpu.timers.is_sound_active();
            if sound_on != self.sound_on {
                debug!("buzzer {}", if sound_on { "on" } else { "off" });
                self.sound_on = sound_on;
            }
            for _ in 0..self.cycles_per_frame {
                match self.cpu.step() {
                    Ok(StepOutcome::Executed) => {}
                    Ok(StepOutcome::AwaitingKey) => break,
                    Err(e) => {
                        error!("interpreter stopped: {}", e);
                        self.fault = Some(e);
                        event::quit(ctx);
                        return Ok(());
                    }
                }
            }
        }
        Ok(())
    }

    fn draw(&mut self, ctx: &mut Context) -> GameResult {
        let (pixels, drawn) = self.cpu.read_framebuffer();
        if drawn {
            self.mesh = self.build_mesh(ctx, &pixels)?;
        }

        graphics::clear(ctx, graphics::BLACK);
        if let Some(mesh) = &self.mesh {
            graphics::draw(ctx, mesh, DrawParam::default().dest(Vec2::new(0.0, 0.0)))?;
        }
        graphics::present(ctx)
    }

    fn key_down_event(
        &mut self,
        ctx: &mut Context,
        keycode: KeyCode,
        _keymods: KeyMods,
        _repeat: bool,
    ) {
        if keycode == KeyCode::Escape {
            event::quit(ctx);
            return;
        }
        let key = match map_key(keycode) {
            Some(k) => k,
            None => {
                warn!("can't map {:?} to a CHIP-8 key", keycode);
                return;
            }
        };
        let mut result = self.cpu.set_key_state(key, true);
        if result.is_ok() && self.cpu.is_awaiting_key() {
            result = self.cpu.resolve_awaited_key(key);
        }
        if let Err(e) = result {
            warn!("key {:X} rejected: {}", key, e);
        }
    }

    fn key_up_event(&mut self, _ctx: &mut Context, keycode: KeyCode, _keymods: KeyMods) {
        if let Some(key) = map_key(keycode) {
            if let Err(e) = self.cpu.set_key_state(key, false) {
                warn!("key {:X} rejected: {}", key, e);
            }
        }
    }
}

/// Conventional layout on the left of a QWERTY keyboard:
///
/// ```text
/// 1 2 3 4      1 2 3 C
/// Q W E R  ->  4 5 6 D
/// A S D F      7 8 9 E
/// Z X C V      A 0 B F
/// ```
pub fn map_key(keycode: KeyCode) -> Option<u8> {
    let key = match keycode {
        KeyCode::Key1 => 0x1,
        KeyCode::Key2 => 0x2,
        KeyCode::Key3 => 0x3,
        KeyCode::Key4 => 0xC,
        KeyCode::Q => 0x4,
        KeyCode::W => 0x5,
        KeyCode::E => 0x6,
        KeyCode::R => 0xD,
        KeyCode::A => 0x7,
        KeyCode::S => 0x8,
        KeyCode::D => 0x9,
        KeyCode::F => 0xE,
        KeyCode::Z => 0xA,
        KeyCode::X => 0x0,
        KeyCode::C => 0xB,
        KeyCode::V => 0xF,
        _ => return None,
    };
    Some(key)
}

/// Open a window and run `cpu` until it is closed or faults.
pub fn run(cpu: Cpu, config: &Config) -> Result<(), Box<dyn Error>> {
    let w = (C8_WIDTH as u32 * config.scale) as f32;
    let h = (C8_HEIGHT as u32 * config.scale) as f32;

    let (ref mut ctx, ref mut event_loop) = ContextBuilder::new("r8", "rust-8")
        .window_setup(WindowSetup::default().title("rust-8"))
        .window_mode(WindowMode::default().dimensions(w, h))
        .build()?;

    let mut driver = DisplayDriver::new(cpu, config);
    info!(
        "running {} at {} Hz ({} cycles per frame)",
        config.rom.display(),
        config.cpu_hz,
        driver.cycles_per_frame
    );
    event::run(ctx, event_loop, &mut driver)?;

    match driver.fault.take() {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keymap_covers_all_keys() {
        let codes = [
            KeyCode::Key1,
            KeyCode::Key2,
            KeyCode::Key3,
            KeyCode::Key4,
            KeyCode::Q,
            KeyCode::W,
            KeyCode::E,
            KeyCode::R,
            KeyCode::A,
            KeyCode::S,
            KeyCode::D,
            KeyCode::F,
            KeyCode::Z,
            KeyCode::X,
            KeyCode::C,
            KeyCode::V,
        ];
        let mut seen = [false; 16];
        for code in codes.iter() {
            let k = map_key(*code).unwrap();
            assert!(!seen[k as usize], "{:X} mapped twice", k);
            seen[k as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_unmapped_key() {
        assert_eq!(map_key(KeyCode::P), None);
        assert_eq!(map_key(KeyCode::Escape), None);
    }
}
