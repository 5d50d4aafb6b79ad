/// Host ticks the timers at this rate, independent of the CPU clock.
pub const TIMER_HZ: u32 = 60;

/// Delay and sound countdowns. Both stop at zero.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
}

impl Timers {
    pub fn new() -> Timers {
        Timers::default()
    }

    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    // A host with a buzzer would sound while this holds
    pub fn is_sound_active(&self) -> bool {
        self.sound > 0
    }
}
