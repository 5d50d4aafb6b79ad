use crate::error::{Chip8Error, Result};

pub const NUM_KEYS: usize = 16;

/// Hex keypad state, written by the host between cycles.
///
/// `key_target` is the latch for `Fx0A`: while it holds a register index the
/// interpreter is suspended until the host hands over a key.
#[derive(Debug, Default, Clone)]
pub struct Keypad {
    pub keys: [bool; NUM_KEYS],
    pub key_target: Option<usize>,
}

impl Keypad {
    pub fn new() -> Keypad {
        Keypad::default()
    }

    pub fn reset(&mut self) {
        *self = Keypad::default();
    }

    pub fn set(&mut self, key: u8, pressed: bool) -> Result<()> {
        let k = check_key(key)?;
        self.keys[k] = pressed;
        Ok(())
    }

    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys[usize::from(key & 0x0F)]
    }

    pub fn is_waiting(&self) -> bool {
        self.key_target.is_some()
    }
}

pub fn check_key(key: u8) -> Result<usize> {
    let k = usize::from(key);
    if k >= NUM_KEYS {
        return Err(Chip8Error::InvalidKey { key });
    }
    Ok(k)
}
