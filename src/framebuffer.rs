use crate::{C8_HEIGHT, C8_WIDTH};

/// One row per screen line, indexed `[y][x]`.
pub type Pixels = [[bool; C8_WIDTH]; C8_HEIGHT];

// Sprites are always one byte wide
const SPRITE_WIDTH: usize = 8;

/// The 64 x 32 monochrome screen plus the flag the host uses to know when
/// to redraw.
#[derive(Clone)]
pub struct Framebuffer {
    pub pixels: Pixels,
    pub draw_flag: bool,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framebuffer {
    pub fn new() -> Framebuffer {
        Framebuffer {
            pixels: [[false; C8_WIDTH]; C8_HEIGHT],
            draw_flag: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Framebuffer::new();
    }

    pub fn clear(&mut self) {
        self.pixels = [[false; C8_WIDTH]; C8_HEIGHT];
        self.draw_flag = true;
    }

    /// XOR a sprite onto the screen with its top left corner at `(x, y)`.
    /// Both axes wrap. Returns true if any lit pixel was switched off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let mut collision = false;
        for (row, byte) in sprite.iter().enumerate() {
            let py = (y + row) % C8_HEIGHT;
            for col in 0..SPRITE_WIDTH {
                if byte & (0x80 >> col) == 0 {
                    continue;
                }
                let px = (x + col) % C8_WIDTH;
                let pixel = &mut self.pixels[py][px];
                collision |= *pixel;
                *pixel ^= true;
            }
        }
        self.draw_flag = true;
        collision
    }

    /// Snapshot of the screen; clears the draw flag.
    pub fn take(&mut self) -> (Pixels, bool) {
        let drawn = self.draw_flag;
        self.draw_flag = false;
        (self.pixels, drawn)
    }

    #[cfg(test)]
    fn lit_count(&self) -> usize {
        self.pixels.iter().flatten().filter(|p| **p).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_sets_pixels_and_flag() {
        let mut fb = Framebuffer::new();
        let collision = fb.draw_sprite(0, 0, &[0b1000_0001]);
        assert!(!collision);
        assert!(fb.pixels[0][0]);
        assert!(fb.pixels[0][7]);
        assert!(!fb.pixels[0][1]);
        assert!(fb.draw_flag);
    }

    #[test]
    fn test_draw_wraps_both_axes() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(62, 31, &[0xF0, 0xF0]);
        // columns 62, 63, 0, 1 on rows 31 and 0
        for &y in &[31, 0] {
            for &x in &[62, 63, 0, 1] {
                assert!(fb.pixels[y][x], "pixel ({}, {}) should be lit", x, y);
            }
        }
        assert_eq!(fb.lit_count(), 8);
    }

    #[test]
    fn test_collision_is_any_overlap() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(0, 0, &[0x80]);
        // second sprite overlaps on one pixel and lights another
        assert!(fb.draw_sprite(0, 0, &[0xC0]));
        assert!(!fb.pixels[0][0]);
        assert!(fb.pixels[0][1]);
    }

    #[test]
    fn test_take_clears_flag() {
        let mut fb = Framebuffer::new();
        fb.clear();
        let (_, drawn) = fb.take();
        assert!(drawn);
        let (_, drawn) = fb.take();
        assert!(!drawn);
    }
}
