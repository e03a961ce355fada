//! Headless host plumbing: option parsing, config loading and the run loops.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use petri_core::{Scheduler, SchedulerConfig, Simulation, TickSummary, World, WorldConfig, scenario};
use tracing::{debug, info};

/// Starting layout of the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScenarioKind {
    /// Perimeter walls and three sample cells.
    Demo,
    /// Perimeter walls only.
    Bounded,
    /// No objects at all.
    Empty,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "petri", version, about = "Run a Petri cell simulation headlessly")]
pub struct AppOptions {
    /// JSON file holding a `WorldConfig`; missing fields take their defaults.
    #[arg(long, env = "PETRI_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "PETRI_SCENARIO", value_enum, default_value_t = ScenarioKind::Demo)]
    pub scenario: ScenarioKind,

    /// Run this many fixed ticks as fast as possible, then exit.
    #[arg(long, env = "PETRI_TICKS", conflicts_with = "realtime")]
    pub ticks: Option<u64>,

    /// Drive the simulation from the wall clock for this many seconds.
    #[arg(long, env = "PETRI_REALTIME_SECS")]
    pub realtime: Option<f64>,

    /// Simulation speed multiplier for real-time mode.
    #[arg(long, env = "PETRI_SPEED", default_value_t = 1.0)]
    pub speed: f64,

    #[arg(long, env = "PETRI_TICK_MILLIS", default_value_t = 16)]
    pub tick_millis: u32,

    #[arg(long, env = "PETRI_MAX_CATCH_UP", default_value_t = 10)]
    pub max_catch_up: u32,

    /// Overrides the RNG seed from the config file.
    #[arg(long, env = "PETRI_SEED")]
    pub seed: Option<u64>,

    /// Log every Nth tick summary at info level.
    #[arg(long, env = "PETRI_REPORT_EVERY", default_value_t = 60)]
    pub report_every: u64,
}

impl AppOptions {
    /// World config from the optional file with command-line overrides applied.
    pub fn world_config(&self) -> Result<WorldConfig> {
        let mut config = match &self.config {
            Some(path) => load_world_config(path)?,
            None => WorldConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.rng_seed = Some(seed);
        }
        config.validate().context("invalid world configuration")?;
        Ok(config)
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            tick_millis: self.tick_millis,
            max_catch_up_ticks: self.max_catch_up,
            speed: self.speed,
        }
    }
}

/// Parse a `WorldConfig` from a JSON file.
pub fn load_world_config(path: &Path) -> Result<WorldConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse config {}", path.display()))
}

pub fn build_world(kind: ScenarioKind, config: WorldConfig) -> Result<World> {
    let world = match kind {
        ScenarioKind::Demo => scenario::demo(config),
        ScenarioKind::Bounded => scenario::bounded(config),
        ScenarioKind::Empty => World::new(config),
    };
    world.context("failed to build the starting world")
}

/// Build the scheduler described by `options`.
pub fn bootstrap(options: &AppOptions) -> Result<Scheduler> {
    let world = build_world(options.scenario, options.world_config()?)?;
    info!(
        scenario = ?options.scenario,
        cells = world.cells().len(),
        walls = world.walls().len(),
        "world ready"
    );
    Scheduler::new(Simulation::new(world), options.scheduler_config())
        .context("invalid scheduler configuration")
}

/// Run `ticks` fixed ticks back to back. Returns the last summary.
pub fn run_fixed(scheduler: &mut Scheduler, ticks: u64, report_every: u64) -> Result<Option<TickSummary>> {
    let mut last = None;
    for _ in 0..ticks {
        let summary = scheduler.step().context("simulation fault")?;
        report(&summary, report_every);
        last = Some(summary);
    }
    Ok(last)
}

/// Feed wall-clock time to the scheduler for `seconds`, sleeping one tick length
/// between samples.
pub fn run_realtime(scheduler: &mut Scheduler, seconds: f64, report_every: u64) -> Result<Option<TickSummary>> {
    if !seconds.is_finite() || seconds < 0.0 {
        bail!("real-time duration must be non-negative and finite, got {seconds}");
    }
    let deadline = Duration::from_secs_f64(seconds);
    let pause = Duration::from_millis(u64::from(scheduler.config().tick_millis));
    let started = Instant::now();
    let mut sampled = started;
    let mut last = None;

    scheduler.start();
    while started.elapsed() < deadline {
        thread::sleep(pause);
        let now = Instant::now();
        let elapsed = now.duration_since(sampled).as_secs_f64() * 1_000.0;
        sampled = now;
        let summaries = scheduler
            .advance_real_time(elapsed)
            .context("simulation fault")?;
        debug!(elapsed_ms = elapsed, ran = summaries.len(), "scheduler sample");
        for summary in summaries {
            report(&summary, report_every);
            last = Some(summary);
        }
    }
    scheduler.pause();
    Ok(last)
}

fn report(summary: &TickSummary, every: u64) {
    if every > 0 && summary.tick.0 % every == 0 {
        info!(
            tick = summary.tick.0,
            cells = summary.cell_count,
            food = summary.food_count,
            splits = summary.splits,
            deaths = summary.deaths,
            mass = summary.total_cell_mass,
            "tick summary"
        );
    }
}
