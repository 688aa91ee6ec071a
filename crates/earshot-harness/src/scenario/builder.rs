//! Scenario builder API.
//!
//! Declarative construction of multi-actor scenario tests. The oracle is
//! mandatory: only [`Scenario::oracle`] yields a runnable value, so a
//! scenario cannot be executed without verifying its outcome.

use std::collections::BTreeSet;

use crate::faults::FaultPlan;
use crate::scenario::{OracleFn, World};

/// Scenario under construction.
///
/// Declares the actors to bring online and the faults the radio injects.
/// Actors go online advertisers first, then discoverers, and the world runs
/// until no events remain before the oracle inspects it.
pub struct Scenario {
    name: String,
    advertisers: Vec<String>,
    discoverers: Vec<String>,
    faults: FaultPlan,
}

impl Scenario {
    /// Create a named scenario with no actors and no faults.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            advertisers: Vec::new(),
            discoverers: Vec::new(),
            faults: FaultPlan::none(),
        }
    }

    /// Add an actor that advertises under the marked display name.
    #[must_use]
    pub fn advertiser(mut self, name: impl Into<String>) -> Self {
        self.advertisers.push(name.into());
        self
    }

    /// Add an actor that scans for advertisers.
    #[must_use]
    pub fn discoverer(mut self, name: impl Into<String>) -> Self {
        self.discoverers.push(name.into());
        self
    }

    /// Set the fault plan the radio applies.
    #[must_use]
    pub fn faults(mut self, faults: FaultPlan) -> Self {
        self.faults = faults;
        self
    }

    /// Set the oracle and return a runnable scenario.
    pub fn oracle(self, oracle: OracleFn) -> RunnableScenario {
        RunnableScenario { scenario: self, oracle }
    }
}

/// A scenario with an oracle, ready to execute.
pub struct RunnableScenario {
    scenario: Scenario,
    oracle: OracleFn,
}

impl RunnableScenario {
    /// Execute the scenario.
    ///
    /// Brings every declared actor online, delivers radio events until the
    /// world is idle, then runs the oracle against the final state.
    pub fn run(self) -> Result<(), String> {
        let Scenario { name, advertisers, discoverers, faults } = self.scenario;

        if advertisers.is_empty() && discoverers.is_empty() {
            return Err(format!("Scenario '{name}': no actors declared"));
        }
        let mut seen = BTreeSet::new();
        for actor in advertisers.iter().chain(discoverers.iter()) {
            if !seen.insert(actor.as_str()) {
                return Err(format!("Scenario '{name}': duplicate actor name '{actor}'"));
            }
        }

        let mut world = World::new().with_faults(faults);
        for actor in &advertisers {
            world.add_advertiser(actor.as_str());
        }
        for actor in &discoverers {
            world.add_discoverer(actor.as_str());
        }
        for actor in advertisers.iter().chain(discoverers.iter()) {
            world.go_online(actor);
        }
        world.run_until_idle();

        (self.oracle)(&world)?;

        Ok(())
    }
}
