//! Fault schedules for simulated transports.
//!
//! Two flavors, freely combined: scripted rejections consumed in order
//! (exact reproductions of a specific failure), and seeded random handshake
//! failures (soak-style runs that stay reproducible via the seed).

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug)]
struct RandomFaults {
    rng: ChaCha8Rng,
    handshake_failure_rate: f64,
}

/// A deterministic schedule of transport faults.
#[derive(Debug, Default)]
pub struct FaultPlan {
    advertise_rejections: VecDeque<String>,
    discovery_rejections: VecDeque<String>,
    connect_rejections: VecDeque<String>,
    accept_rejections: VecDeque<String>,
    handshake_failures: u32,
    random: Option<RandomFaults>,
}

impl FaultPlan {
    /// A plan with no faults.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Reject the next advertising request with this reason.
    #[must_use]
    pub fn reject_advertise(mut self, reason: impl Into<String>) -> Self {
        self.advertise_rejections.push_back(reason.into());
        self
    }

    /// Reject the next discovery request with this reason.
    #[must_use]
    pub fn reject_discovery(mut self, reason: impl Into<String>) -> Self {
        self.discovery_rejections.push_back(reason.into());
        self
    }

    /// Reject the next connection request with this reason.
    ///
    /// Chain the call to reject several requests in a row.
    #[must_use]
    pub fn reject_connect(mut self, reason: impl Into<String>) -> Self {
        self.connect_rejections.push_back(reason.into());
        self
    }

    /// Reject the next handshake accept with this reason.
    #[must_use]
    pub fn reject_accept(mut self, reason: impl Into<String>) -> Self {
        self.accept_rejections.push_back(reason.into());
        self
    }

    /// Fail the next `count` handshakes at the result stage.
    #[must_use]
    pub fn fail_handshakes(mut self, count: u32) -> Self {
        self.handshake_failures += count;
        self
    }

    /// Additionally fail a fraction of handshakes at random.
    ///
    /// The same seed always produces the same failure pattern.
    #[must_use]
    pub fn with_random_handshake_failures(mut self, seed: u64, rate: f64) -> Self {
        self.random =
            Some(RandomFaults { rng: ChaCha8Rng::seed_from_u64(seed), handshake_failure_rate: rate });
        self
    }

    pub(crate) fn take_advertise_rejection(&mut self) -> Option<String> {
        self.advertise_rejections.pop_front()
    }

    pub(crate) fn take_discovery_rejection(&mut self) -> Option<String> {
        self.discovery_rejections.pop_front()
    }

    pub(crate) fn take_connect_rejection(&mut self) -> Option<String> {
        self.connect_rejections.pop_front()
    }

    pub(crate) fn take_accept_rejection(&mut self) -> Option<String> {
        self.accept_rejections.pop_front()
    }

    pub(crate) fn handshake_should_fail(&mut self) -> bool {
        if self.handshake_failures > 0 {
            self.handshake_failures -= 1;
            return true;
        }
        match &mut self.random {
            Some(random) => random.rng.gen_bool(random.handshake_failure_rate),
            None => false,
        }
    }
}
