use crate::telemetry::G0;

/// Finite-burn timing for a single maneuver node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurnPlan {
    pub delta_v: f64,       // m/s
    pub final_mass: f64,    // kg, after the burn
    pub mass_flow: f64,     // kg/s
    pub burn_time: f64,     // s
}

impl BurnPlan {
    /// Burn duration from the rocket equation:
    ///   m1 = m0 / exp(dv / (Isp * g0)),  t = (m0 - m1) / (F / (Isp * g0))
    ///
    /// Returns `None` without usable thrust or specific impulse.
    pub fn new(delta_v: f64, thrust: f64, isp: f64, mass: f64) -> Option<Self> {
        if thrust <= 0.0 || isp <= 0.0 || mass <= 0.0 {
            return None;
        }
        let exhaust_velocity = isp * G0;
        let final_mass = mass / (delta_v / exhaust_velocity).exp();
        let mass_flow = thrust / exhaust_velocity;
        Some(Self {
            delta_v,
            final_mass,
            mass_flow,
            burn_time: (mass - final_mass) / mass_flow,
        })
    }

    /// Seconds until ignition so the burn is centred on the node.
    pub fn start_in(&self, time_to_node: f64) -> f64 {
        time_to_node - self.burn_time / 2.0
    }
}
