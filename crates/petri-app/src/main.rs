use anyhow::Result;
use clap::Parser;
use petri_app::{AppOptions, bootstrap, run_fixed, run_realtime};
use tracing::{info, warn};

fn main() -> Result<()> {
    init_tracing();
    let options = AppOptions::parse();
    let mut scheduler = bootstrap(&options)?;
    info!("Starting Petri simulation host");

    let last = match (options.ticks, options.realtime) {
        (Some(ticks), _) => run_fixed(&mut scheduler, ticks, options.report_every)?,
        (None, Some(seconds)) => run_realtime(&mut scheduler, seconds, options.report_every)?,
        (None, None) => run_fixed(&mut scheduler, 600, options.report_every)?,
    };

    match last {
        Some(summary) => info!(
            tick = summary.tick.0,
            cells = summary.cell_count,
            food = summary.food_count,
            mass = summary.total_cell_mass,
            "Simulation finished"
        ),
        None => warn!("Simulation finished without running a tick"),
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
