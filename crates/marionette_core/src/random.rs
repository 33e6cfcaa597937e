//! Injectable randomness.
//!
//! Every draw the engine makes (actor, feed item, category, reply target,
//! template, username digits) goes through [`RandomSource`], so tests can
//! pin the exact sequence with [`ScriptedRandom`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::Mutex;

pub trait RandomSource: Send + Sync {
    /// Uniform index in `0..len`. Callers never pass `len == 0`.
    fn index(&self, len: usize) -> usize;

    /// Uniform integer in `low..high`.
    fn number(&self, low: u32, high: u32) -> u32;
}

/// Process-wide thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }

    fn number(&self, low: u32, high: u32) -> u32 {
        rand::thread_rng().gen_range(low..high)
    }
}

/// Reproducible RNG for simulations.
#[derive(Debug)]
pub struct SeededRandom(Mutex<StdRng>);

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self(Mutex::new(StdRng::seed_from_u64(seed)))
    }
}

impl RandomSource for SeededRandom {
    fn index(&self, len: usize) -> usize {
        let mut rng = self.0.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen_range(0..len)
    }

    fn number(&self, low: u32, high: u32) -> u32 {
        let mut rng = self.0.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen_range(low..high)
    }
}

/// Replays a fixed list of draws, then falls back to the lowest value.
///
/// Each scripted value is reduced modulo the requested range so a script
/// never produces an out-of-range pick.
#[derive(Debug, Default)]
pub struct ScriptedRandom {
    draws: Mutex<VecDeque<usize>>,
}

impl ScriptedRandom {
    pub fn new(draws: impl IntoIterator<Item = usize>) -> Self {
        Self {
            draws: Mutex::new(draws.into_iter().collect()),
        }
    }

    fn next(&self) -> usize {
        self.draws
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(0)
    }

    /// Draws not consumed yet.
    pub fn remaining(&self) -> usize {
        self.draws.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl RandomSource for ScriptedRandom {
    fn index(&self, len: usize) -> usize {
        self.next() % len.max(1)
    }

    fn number(&self, low: u32, high: u32) -> u32 {
        let span = high.saturating_sub(low).max(1) as usize;
        low + (self.next() % span) as u32
    }
}
