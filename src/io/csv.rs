use std::io::{self, Write};
use std::path::Path;

use crate::gnc::{Attitude, Setpoint};
use crate::sim::PhaseReport;

/// Write a recorded phase to CSV format.
///
/// Columns: ut, lat, lon, surface_alt, mean_alt, vertical_speed,
///          horizontal_speed, pitch, heading, roll, throttle, stage,
///          cmd_pitch, cmd_heading, cmd_throttle, cmd_brakes
///
/// Command columns are empty on ticks without a setpoint, and the attitude
/// columns are empty unless the setpoint was a pitch/heading target.
pub fn write_trajectory<W: Write>(writer: &mut W, report: &PhaseReport) -> io::Result<()> {
    writeln!(
        writer,
        "ut,lat,lon,surface_alt,mean_alt,vertical_speed,horizontal_speed,\
         pitch,heading,roll,throttle,stage,\
         cmd_pitch,cmd_heading,cmd_throttle,cmd_brakes"
    )?;

    let setpoints = report.setpoints.iter().copied().chain(std::iter::repeat(None));
    for (s, sp) in report.trajectory.iter().zip(setpoints) {
        write!(
            writer,
            "{:.3},{:.8},{:.8},{:.2},{:.2},{:.3},{:.3},{:.2},{:.2},{:.2},{:.4},{},",
            s.ut,
            s.position.latitude,
            s.position.longitude,
            s.surface_altitude,
            s.mean_altitude,
            s.vertical_speed,
            s.horizontal_speed,
            s.pitch,
            s.heading,
            s.roll,
            s.throttle,
            s.stage,
        )?;
        writeln!(writer, "{}", command_columns(sp.as_ref()))?;
    }

    Ok(())
}

fn command_columns(setpoint: Option<&Setpoint>) -> String {
    let Some(sp) = setpoint else {
        return ",,,".to_string();
    };
    let (pitch, heading) = match sp.attitude {
        Attitude::PitchHeading { pitch, heading, .. } => (format!("{pitch:.2}"), format!("{heading:.2}")),
        _ => (String::new(), String::new()),
    };
    format!("{pitch},{heading},{:.4},{}", sp.throttle, u8::from(sp.brakes))
}

/// Write a recorded phase to a CSV file at the given path.
pub fn write_trajectory_file<P: AsRef<Path>>(path: P, report: &PhaseReport) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_trajectory(&mut file, report)
}
