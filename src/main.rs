use std::env;
use std::error::Error;

use log::info;

use flight_autopilot::gnc::{AscentGuidance, Attitude};
use flight_autopilot::io::csv::write_trajectory_file;
use flight_autopilot::io::FlightPlan;
use flight_autopilot::link::{Actuators, Loopback, NoopClock};
use flight_autopilot::orbital::BurnPlan;
use flight_autopilot::sim::{run_phase, EventKind, RunLimits};
use flight_autopilot::telemetry::{FuelState, Situation, Snapshot, G0};
use flight_autopilot::vehicle::FuelSupervisor;

/// Peak engine acceleration of the toy launcher, m/s^2.
const ENGINE_ACCEL: f64 = 25.0;
/// Liquid fuel units per stage and burn rate at full throttle.
const STAGE_FUEL: f64 = 600.0;
const FUEL_RATE: f64 = 5.0;

/// Point-mass launcher: attitude targets are reached instantly, fuel drains
/// with throttle, and apoapsis is the ballistic apex.
fn toy_launcher() -> impl FnMut(&mut Snapshot, &Actuators, f64) {
    let mut last_stage = i32::MAX;
    move |s: &mut Snapshot, act: &Actuators, dt: f64| {
        if s.stage != last_stage {
            last_stage = s.stage;
            s.decouple_fuel = (s.stage > 0).then(|| FuelState::new(0.0, STAGE_FUEL));
        }
        if let Attitude::PitchHeading { pitch, heading, .. } = act.attitude {
            s.pitch = pitch;
            s.heading = heading;
        }

        let burning = s.decouple_fuel.is_some_and(|f| f.liquid > 0.0);
        let accel = if burning { ENGINE_ACCEL * act.throttle } else { 0.0 };
        if let Some(fuel) = s.decouple_fuel.as_mut() {
            fuel.liquid = (fuel.liquid - FUEL_RATE * act.throttle * dt).max(0.0);
        }

        let pitch = s.pitch.to_radians();
        s.vertical_speed += (accel * pitch.sin() - G0) * dt;
        s.horizontal_speed += accel * pitch.cos() * dt;
        s.mean_altitude = (s.mean_altitude + s.vertical_speed * dt).max(0.0);
        s.surface_altitude = s.mean_altitude;
        s.apoapsis_altitude = s.mean_altitude + s.vertical_speed.max(0.0).powi(2) / (2.0 * G0);
        s.situation = if s.mean_altitude > 0.0 { Situation::Flying } else { Situation::PreLaunch };
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init();

    let mut args = env::args().skip(1);
    let plan = match args.next() {
        Some(path) => {
            info!("Loading flight plan from {path}");
            FlightPlan::from_path(path)?
        }
        None => FlightPlan::default(),
    };
    let trace_path = args.next();

    // -----------------------------------------------------------------------
    // Ascent against the in-memory vessel
    // -----------------------------------------------------------------------
    let initial = Snapshot { stage: 3, ..Snapshot::default() };
    let mut vessel = Loopback::new(initial).with_model(0.1, toy_launcher());
    let mut ascent = AscentGuidance::new(plan.ascent.clone());
    let mut supervisor = FuelSupervisor::new(plan.staging);
    let limits = RunLimits { max_ticks: Some(plan.max_ticks.unwrap_or(100_000)), record_trajectory: true };

    let report = run_phase(&mut vessel, &mut ascent, &mut supervisor, &mut NoopClock::default(), &limits)?;

    // -----------------------------------------------------------------------
    // Print results
    // -----------------------------------------------------------------------
    let last = report.trajectory.last().cloned().unwrap_or_default();
    println!();
    println!("====================================================================");
    println!("  DRY RUN: {}", report.name);
    println!("====================================================================");
    println!("  Outcome:       {:?} after {} ticks", report.outcome, report.ticks);
    println!("  Final ut:      {:>10.1} s", last.ut);
    println!("  Altitude:      {:>10.0} m", last.mean_altitude);
    println!("  Apoapsis:      {:>10.0} m", last.apoapsis_altitude);
    println!("  Stage:         {:>10}", last.stage);
    println!();
    println!("  Flight Events");
    println!("  ──────────────────────────────────────────────────────────────────");
    for event in &report.events {
        let label = match &event.kind {
            EventKind::Staged { from } => format!("STAGED from {from}"),
            other => format!("{other:?}"),
        };
        println!("  t={:>8.1}s  {label}", event.ut);
    }
    println!();

    // -----------------------------------------------------------------------
    // Circularisation burn estimate
    // -----------------------------------------------------------------------
    let thrust = 40_000.0;
    let isp = 320.0;
    let mass = 3_000.0;
    let delta_v = 900.0;
    if let Some(burn) = BurnPlan::new(delta_v, thrust, isp, mass) {
        println!("  Circularisation ({delta_v:.0} m/s, {thrust:.0} N, Isp {isp:.0} s, {mass:.0} kg)");
        println!("  ──────────────────────────────────────────────────────────────────");
        println!("  Burn time:     {:>10.1} s", burn.burn_time);
        println!("  Final mass:    {:>10.1} kg", burn.final_mass);
        println!("  Ignite at:     node - {:.1} s", burn.burn_time / 2.0);
    }
    println!("====================================================================");
    println!();

    if let Some(path) = trace_path {
        write_trajectory_file(&path, &report)?;
        info!("Wrote {} rows to {path}", report.trajectory.len());
    }
    Ok(())
}
