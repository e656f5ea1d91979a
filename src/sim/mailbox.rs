//! Single-slot gravity mailbox
//!
//! The sensor callback posts, the tick reads. Only the newest sample is kept:
//! a post overwrites whatever was there, so there is never a backlog and an
//! older sample can never be read after a newer one was posted.
//!
//! Both components are packed into one `AtomicU64` so a read always sees an
//! x and y from the same sample.

use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec2;

use crate::is_finite_vec;

/// Bit pattern meaning "nothing posted yet" (both halves are NaN, which
/// `post` never stores)
const EMPTY: u64 = u64::MAX;

#[inline]
fn pack(v: Vec2) -> u64 {
    ((v.x.to_bits() as u64) << 32) | v.y.to_bits() as u64
}

#[inline]
fn unpack(bits: u64) -> Vec2 {
    Vec2::new(f32::from_bits((bits >> 32) as u32), f32::from_bits(bits as u32))
}

/// Last-value-wins slot for gravity samples
#[derive(Debug)]
pub struct GravityMailbox {
    slot: AtomicU64,
}

impl Default for GravityMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl GravityMailbox {
    pub fn new() -> Self {
        Self {
            slot: AtomicU64::new(EMPTY),
        }
    }

    /// Post a sample, replacing any unread one.
    ///
    /// Non-finite samples are sensor faults and are dropped; the previous
    /// value stays. Returns whether the sample was stored.
    pub fn post(&self, sample: Vec2) -> bool {
        if !is_finite_vec(sample) {
            log::debug!("Dropping invalid gravity sample {sample:?}");
            return false;
        }
        self.slot.store(pack(sample), Ordering::Release);
        true
    }

    /// Most recent valid sample, if any has been posted
    pub fn latest(&self) -> Option<Vec2> {
        match self.slot.load(Ordering::Acquire) {
            EMPTY => None,
            bits => Some(unpack(bits)),
        }
    }

    /// Forget the stored sample
    pub fn clear(&self) {
        self.slot.store(EMPTY, Ordering::Release);
    }
}
