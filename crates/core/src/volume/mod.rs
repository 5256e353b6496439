use std::sync::atomic::{AtomicU32, Ordering};

/// Saturates a gain into `[0, 1]`. NaN is treated as silence.
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Music and effect gains, stored as `f32` bit patterns so they can be read
/// from any thread without locking.
#[derive(Debug)]
pub struct Gains {
    bgm: AtomicU32,
    sfx: AtomicU32,
}

impl Gains {
    pub fn new(bgm: f32, sfx: f32) -> Self {
        Self {
            bgm: AtomicU32::new(clamp_unit(bgm).to_bits()),
            sfx: AtomicU32::new(clamp_unit(sfx).to_bits()),
        }
    }

    pub fn bgm(&self) -> f32 {
        f32::from_bits(self.bgm.load(Ordering::Acquire))
    }

    pub fn sfx(&self) -> f32 {
        f32::from_bits(self.sfx.load(Ordering::Acquire))
    }

    /// Stores the clamped music gain and returns the value actually kept.
    pub fn set_bgm(&self, value: f32) -> f32 {
        let value = clamp_unit(value);
        self.bgm.store(value.to_bits(), Ordering::Release);
        value
    }

    /// Stores the clamped effects gain and returns the value actually kept.
    pub fn set_sfx(&self, value: f32) -> f32 {
        let value = clamp_unit(value);
        self.sfx.store(value.to_bits(), Ordering::Release);
        value
    }
}
