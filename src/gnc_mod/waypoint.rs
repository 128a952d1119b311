use std::collections::HashSet;

use log::info;

use crate::nav::distance;
use crate::telemetry::{GeoPoint, Waypoint, WaypointId};

// ---------------------------------------------------------------------------
// Ordered approach route
// ---------------------------------------------------------------------------

/// A fixed list of approach points flown back-to-front, then the stop point.
///
/// The cursor only ever decrements, and by at most one per `update`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApproachRoute {
    points: Vec<GeoPoint>,
    stop: GeoPoint,
    cursor: Option<usize>,
}

impl ApproachRoute {
    pub fn new(points: Vec<GeoPoint>, stop: GeoPoint) -> Self {
        let cursor = points.len().checked_sub(1);
        Self { points, stop, cursor }
    }

    pub fn stop(&self) -> GeoPoint {
        self.stop
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Approach points not yet passed.
    pub fn remaining(&self) -> usize {
        self.cursor.map_or(0, |i| i + 1)
    }

    /// Current point to steer at; the stop point once the list is used up.
    pub fn target(&self) -> GeoPoint {
        self.cursor.map_or(self.stop, |i| self.points[i])
    }

    /// Arrival radius: `min(2000, 5 * max_horizontal_velocity)`.
    pub fn arrival_radius(max_horizontal_velocity: f64) -> f64 {
        2_000.0_f64.min(5.0 * max_horizontal_velocity)
    }

    /// Step to the next point if `position` is inside the arrival radius of
    /// the current one. Returns true if the cursor moved.
    pub fn update(&mut self, position: GeoPoint, max_horizontal_velocity: f64) -> bool {
        let Some(i) = self.cursor else {
            return false;
        };
        if distance(position, self.points[i]) >= Self::arrival_radius(max_horizontal_velocity) {
            return false;
        }
        self.cursor = i.checked_sub(1);
        info!("Reached a waypoint! Approach index at: {:?}", self.cursor);
        true
    }
}

// ---------------------------------------------------------------------------
// Dynamic contract targets
// ---------------------------------------------------------------------------

/// Picks the nearest eligible contract waypoint and keeps it until cleared.
///
/// While a target is held the candidate list is ignored, so two almost
/// equidistant waypoints cannot make the target flap.
#[derive(Debug, Clone, Default)]
pub struct ContractSelector {
    /// Waypoints with a higher bedrock altitude are skipped, m.
    pub max_altitude_ceiling: f64,
    current: Option<Waypoint>,
    visited: HashSet<WaypointId>,
}

impl ContractSelector {
    pub fn new(max_altitude_ceiling: f64) -> Self {
        Self { max_altitude_ceiling, ..Self::default() }
    }

    pub fn current(&self) -> Option<&Waypoint> {
        self.current.as_ref()
    }

    fn eligible(&self, w: &Waypoint) -> bool {
        w.has_contract
            && w.near_surface
            && w.altitude_ceiling < self.max_altitude_ceiling
            && !self.visited.contains(&w.id)
    }

    /// Held target, or the nearest eligible candidate if none is held.
    pub fn select(&mut self, position: GeoPoint, candidates: &[Waypoint]) -> Option<&Waypoint> {
        if self.current.is_none() {
            let mut by_distance: Vec<(f64, &Waypoint)> =
                candidates.iter().map(|w| (distance(position, w.position), w)).collect();
            by_distance.sort_by(|a, b| a.0.total_cmp(&b.0));
            self.current = by_distance
                .into_iter()
                .map(|(_, w)| w)
                .find(|w| self.eligible(w))
                .cloned();
        }
        self.current.as_ref()
    }

    /// Drop the held target; it will not be selected again.
    pub fn clear(&mut self) -> Option<Waypoint> {
        let done = self.current.take()?;
        self.visited.insert(done.id);
        Some(done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::WaypointKind;

    fn route3() -> ApproachRoute {
        ApproachRoute::new(
            vec![GeoPoint::new(0.0, -1.0), GeoPoint::new(0.0, -0.5), GeoPoint::new(0.0, 0.0)],
            GeoPoint::new(0.0, -2.0),
        )
    }

    fn wp(id: u64, name: &str, lon: f64, contract: bool, ceiling: f64) -> Waypoint {
        Waypoint {
            id: WaypointId(id),
            name: name.into(),
            position: GeoPoint::new(0.0, lon),
            has_contract: contract,
            near_surface: true,
            altitude_ceiling: ceiling,
            kind: WaypointKind::Report,
        }
    }

    #[test]
    fn route_is_flown_back_to_front() {
        let r = route3();
        assert_eq!(r.cursor(), Some(2));
        assert_eq!(r.target(), GeoPoint::new(0.0, 0.0));
        assert_eq!(r.remaining(), 3);
    }

    #[test]
    fn advances_once_per_tick() {
        let mut r = route3();
        let at_last = GeoPoint::new(0.0, 0.0);
        assert!(r.update(at_last, 200.0));
        assert_eq!(r.cursor(), Some(1));
        // Still at point[2], far from point[1] (~5.2 km): no further step.
        assert!(!r.update(at_last, 200.0));
        assert_eq!(r.cursor(), Some(1));
    }

    #[test]
    fn exhausted_route_targets_stop() {
        let mut r = ApproachRoute::new(vec![GeoPoint::new(0.0, 0.0)], GeoPoint::new(0.0, -2.0));
        assert!(r.update(GeoPoint::new(0.0, 0.0), 200.0));
        assert_eq!(r.cursor(), None);
        assert_eq!(r.target(), GeoPoint::new(0.0, -2.0));
        assert!(!r.update(GeoPoint::new(0.0, -2.0), 200.0));
    }

    #[test]
    fn arrival_radius_scales_with_speed() {
        assert_eq!(ApproachRoute::arrival_radius(200.0), 1_000.0);
        assert_eq!(ApproachRoute::arrival_radius(1_000.0), 2_000.0);
    }

    #[test]
    fn picks_nearest_eligible() {
        let mut sel = ContractSelector::new(15_000.0);
        let candidates = vec![
            wp(1, "no-contract", 0.01, false, 0.0),
            wp(2, "too-high", 0.02, true, 20_000.0),
            wp(3, "far", 1.0, true, 100.0),
            wp(4, "near", 0.1, true, 100.0),
        ];
        let picked = sel.select(GeoPoint::new(0.0, 0.0), &candidates).unwrap();
        assert_eq!(picked.name, "near");
    }

    #[test]
    fn target_is_sticky_until_cleared() {
        let mut sel = ContractSelector::new(15_000.0);
        let a = wp(1, "a", 0.10, true, 0.0);
        let b = wp(2, "b", 0.11, true, 0.0);
        sel.select(GeoPoint::new(0.0, 0.0), &[a.clone(), b.clone()]);
        // Vessel drifts so that b is now nearer; a is still held.
        let held = sel.select(GeoPoint::new(0.0, 0.2), &[a, b]).unwrap();
        assert_eq!(held.name, "a");

        assert_eq!(sel.clear().unwrap().name, "a");
        let next = sel.select(GeoPoint::new(0.0, 0.0), &[wp(1, "a", 0.10, true, 0.0), wp(2, "b", 0.11, true, 0.0)]);
        assert_eq!(next.unwrap().name, "b");
    }

    #[test]
    fn nothing_left_means_none() {
        let mut sel = ContractSelector::new(15_000.0);
        assert!(sel.select(GeoPoint::new(0.0, 0.0), &[wp(1, "x", 0.1, false, 0.0)]).is_none());
        assert!(sel.clear().is_none());
    }

    #[test]
    fn sites_sharing_a_name_are_visited_separately() {
        let mut sel = ContractSelector::new(15_000.0);
        let sites = [wp(7, "Crater", 0.10, true, 0.0), wp(8, "Crater", 0.20, true, 0.0)];
        assert_eq!(sel.select(GeoPoint::new(0.0, 0.0), &sites).unwrap().id, WaypointId(7));
        sel.clear();
        assert_eq!(sel.select(GeoPoint::new(0.0, 0.0), &sites).unwrap().id, WaypointId(8));
        sel.clear();
        assert!(sel.select(GeoPoint::new(0.0, 0.0), &sites).is_none());
    }
}
