//! Maps elapsed wall-clock time onto fixed simulation ticks.

use crate::{SchedulerConfig, Simulation, SimulationError, TickSummary, WorldError};
use tracing::{debug, error};

/// Real-time driver around a [`Simulation`].
///
/// Elapsed time accumulates in a backlog. Each call runs as many fixed ticks as the
/// backlog (scaled by the speed multiplier) calls for, capped by the catch-up limit,
/// and then consumes the *unscaled* time those ticks represent. Time beyond the cap
/// is dropped rather than simulated later.
#[derive(Debug)]
pub struct Scheduler {
    simulation: Simulation,
    config: SchedulerConfig,
    backlog_millis: f64,
    running: bool,
}

impl Scheduler {
    pub fn new(simulation: Simulation, config: SchedulerConfig) -> Result<Self, WorldError> {
        config.validate()?;
        Ok(Self {
            simulation,
            config,
            backlog_millis: 0.0,
            running: false,
        })
    }

    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Mutable access for tools acting between ticks.
    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.simulation
    }

    #[must_use]
    pub fn into_simulation(self) -> Simulation {
        self.simulation
    }

    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Resume real-time ticking. Time that passed while paused is not simulated.
    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            self.backlog_millis = 0.0;
            debug!(tick = self.simulation.current_tick().0, "simulation started");
        }
    }

    pub fn pause(&mut self) {
        if self.running {
            self.running = false;
            debug!(tick = self.simulation.current_tick().0, "simulation paused");
        }
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn speed(&self) -> f64 {
        self.config.speed
    }

    /// Change the simulation speed multiplier.
    pub fn set_speed(&mut self, speed: f64) -> Result<(), WorldError> {
        if !speed.is_finite() || speed < 0.0 {
            return Err(WorldError::InvalidConfig(
                "speed must be non-negative and finite",
            ));
        }
        self.config.speed = speed;
        Ok(())
    }

    /// Run one fixed tick regardless of wall-clock time or running state.
    pub fn step(&mut self) -> Result<TickSummary, SimulationError> {
        self.simulation.tick(self.config.tick_seconds())
    }

    /// Feed `elapsed_millis` of wall-clock time to the driver and run the ticks it
    /// calls for. Returns the summaries of the ticks that ran.
    ///
    /// A failing tick pauses the scheduler and returns the error.
    pub fn advance_real_time(&mut self, elapsed_millis: f64) -> Result<Vec<TickSummary>, SimulationError> {
        if !self.running || !elapsed_millis.is_finite() || elapsed_millis < 0.0 {
            return Ok(Vec::new());
        }
        self.backlog_millis += elapsed_millis;

        let tick_millis = f64::from(self.config.tick_millis);
        let represented = (self.backlog_millis / tick_millis).round().max(0.0);
        let due = (self.backlog_millis * self.config.speed / tick_millis)
            .round()
            .clamp(0.0, f64::from(self.config.max_catch_up_ticks)) as usize;

        let mut summaries = Vec::with_capacity(due);
        for _ in 0..due {
            match self.step() {
                Ok(summary) => summaries.push(summary),
                Err(err) => {
                    error!(%err, "simulation halted");
                    self.running = false;
                    return Err(err);
                }
            }
        }
        self.backlog_millis -= tick_millis * represented;
        Ok(summaries)
    }
}
