//! Simulated platform position reported by the navigation sensor peer.
//!
//! Each transmitting tick moves the platform one degree north-east, wrapping
//! latitude into `[0, 91)` and longitude into `[0, 181)`, and perturbs
//! altitude by a random delta in `[-4, 10)`. Altitude is never clamped.

use std::ops::Range;

use rand::rngs::StdRng;
use rand::{RngExt as _, SeedableRng};

/// Latitude wraps modulo this value.
pub const LATITUDE_RANGE: f64 = 91.0;

/// Longitude wraps modulo this value.
pub const LONGITUDE_RANGE: f64 = 181.0;

/// Bounds of the per-tick altitude perturbation.
pub const ALTITUDE_DELTA: Range<f64> = -4.0..10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl PlatformPosition {
    pub const fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        PlatformPosition {
            latitude,
            longitude,
            altitude,
        }
    }

    /// One step of the walk with an explicit altitude delta.
    pub fn advance(&mut self, altitude_delta: f64) {
        self.latitude = (self.latitude + 1.0) % LATITUDE_RANGE;
        self.longitude = (self.longitude + 1.0) % LONGITUDE_RANGE;
        self.altitude += altitude_delta;
    }
}

impl Default for PlatformPosition {
    /// Configured start point.
    fn default() -> Self {
        PlatformPosition::new(0.0, 0.0, 10.0)
    }
}

/// Position plus the RNG that drives its altitude.
#[derive(Debug)]
pub struct PositionWalk {
    position: PlatformPosition,
    rng: StdRng,
}

impl PositionWalk {
    pub fn new(start: PlatformPosition, seed: u64) -> Self {
        PositionWalk {
            position: start,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seed from the thread RNG.
    pub fn unseeded(start: PlatformPosition) -> Self {
        Self::new(start, rand::rng().random())
    }

    pub fn position(&self) -> PlatformPosition {
        self.position
    }

    /// Return the current position, then move to the next one.
    pub fn step(&mut self) -> PlatformPosition {
        let current = self.position;
        let delta = self.rng.random_range(ALTITUDE_DELTA);
        self.position.advance(delta);
        current
    }
}
