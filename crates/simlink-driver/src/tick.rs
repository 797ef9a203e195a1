//! The `TICK` loop: repeated two-phase clocking with an optional early stop.
//!
//! One cycle drives the in-phase value, advances, drives the out-of-phase
//! value and advances again. Before each cycle the loop stops if the cycle
//! limit is reached or the sentinel port already holds its expected value.
//! The loop is a state machine so each engine interaction is one observable
//! step.

use simlink_bits::Bits;

use crate::engine::Engine;
use crate::error::Result;
use crate::port::{GettablePort, SettablePort};

/// Early-termination condition for a tick.
#[derive(Debug, Clone)]
pub struct Sentinel {
    pub port: GettablePort,
    pub expected: Bits,
}

/// A fully resolved and decoded `TICK` command.
#[derive(Debug, Clone)]
pub struct TickPlan {
    pub ticking: SettablePort,
    pub in_phase: Bits,
    pub out_of_phase: Bits,
    pub timesteps_per_phase: i32,
    pub max_cycles: u64,
    pub sentinel: Option<Sentinel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPhase {
    CheckSentinel,
    DriveInPhase,
    AdvanceInPhase,
    DriveOutOfPhase,
    AdvanceOutOfPhase,
    Done,
}

/// Steps a [`TickPlan`] against an engine.
pub struct Ticker<'p> {
    plan: &'p TickPlan,
    phase: TickPhase,
    cycles: u64,
    sample: Option<Bits>,
}

impl<'p> Ticker<'p> {
    pub fn new(plan: &'p TickPlan) -> Result<Self> {
        let sample = plan
            .sentinel
            .as_ref()
            .map(|sentinel| sentinel.port.buffer())
            .transpose()?;
        Ok(Self {
            plan,
            phase: TickPhase::CheckSentinel,
            cycles: 0,
            sample,
        })
    }

    pub fn phase(&self) -> TickPhase {
        self.phase
    }

    /// Cycles whose out-of-phase advance has completed.
    pub fn cycles_completed(&self) -> u64 {
        self.cycles
    }

    /// Perform the current phase and move to the next one.
    pub fn step<E: Engine + ?Sized>(&mut self, engine: &mut E) -> TickPhase {
        let plan = self.plan;
        self.phase = match self.phase {
            TickPhase::CheckSentinel => {
                if self.cycles >= plan.max_cycles || self.sentinel_reached(engine) {
                    TickPhase::Done
                } else {
                    TickPhase::DriveInPhase
                }
            }
            TickPhase::DriveInPhase => {
                plan.ticking.write(engine, &plan.in_phase);
                TickPhase::AdvanceInPhase
            }
            TickPhase::AdvanceInPhase => {
                engine.advance(plan.timesteps_per_phase);
                TickPhase::DriveOutOfPhase
            }
            TickPhase::DriveOutOfPhase => {
                plan.ticking.write(engine, &plan.out_of_phase);
                TickPhase::AdvanceOutOfPhase
            }
            TickPhase::AdvanceOutOfPhase => {
                engine.advance(plan.timesteps_per_phase);
                self.cycles += 1;
                TickPhase::CheckSentinel
            }
            TickPhase::Done => TickPhase::Done,
        };
        self.phase
    }

    /// Step until done and return the number of completed cycles.
    pub fn run<E: Engine + ?Sized>(mut self, engine: &mut E) -> u64 {
        while self.step(engine) != TickPhase::Done {}
        self.cycles
    }

    fn sentinel_reached<E: Engine + ?Sized>(&mut self, engine: &mut E) -> bool {
        let (Some(sentinel), Some(sample)) = (self.plan.sentinel.as_ref(), self.sample.as_mut())
        else {
            return false;
        };
        sentinel.port.read_into(engine, sample);
        sample.same_value(&sentinel.expected)
    }
}
