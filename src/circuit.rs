use crate::kinematics::RaceProgress;
use crate::vector::MapPoint;
use serde::{Deserialize, Serialize};

/// Two circuits are considered the same layout while every overlapping pair
/// of checkpoints lies within this distance.
pub const MATCH_TOLERANCE: f64 = 50.0;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circuit {
    pub checkpoints: Vec<MapPoint>,
}

impl Circuit {
    pub fn new(checkpoints: Vec<MapPoint>) -> Self {
        Self { checkpoints }
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    /// Checkpoint at `index` taken modulo the circuit length; negative
    /// indices count back from the end. `None` for an empty circuit.
    pub fn checkpoint(&self, index: i64) -> Option<MapPoint> {
        if self.checkpoints.is_empty() {
            return None;
        }
        let len = self.checkpoints.len() as i64;
        Some(self.checkpoints[index.rem_euclid(len) as usize])
    }

    pub fn position_of(&self, point: MapPoint) -> Option<usize> {
        self.checkpoints.iter().position(|cp| *cp == point)
    }

    /// Compares only the overlapping prefix. Empty circuits never match.
    pub fn is_potentially_identical(&self, other: &Circuit) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.checkpoints
            .iter()
            .zip(&other.checkpoints)
            .all(|(a, b)| a.distance_to(*b) <= MATCH_TOLERANCE)
    }

    /// Appends the checkpoints of `source` beyond our current length.
    pub fn copy_remaining_from(&mut self, source: &Circuit) {
        let start = self.checkpoints.len();
        if start < source.checkpoints.len() {
            self.checkpoints
                .extend_from_slice(&source.checkpoints[start..]);
        }
    }
}

/// What a single [`CircuitTracker::observe`] call changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Observation {
    /// Same checkpoint as last turn.
    Unchanged,
    /// Moved on to an already-known checkpoint.
    Advanced { index: usize, new_lap: bool },
    /// A checkpoint never seen before was appended.
    Discovered { index: usize },
}

/// Builds the circuit loop from the checkpoints the game targets turn by
/// turn, counting laps as the loop comes round.
#[derive(Clone, Debug)]
pub struct CircuitTracker {
    circuit: Circuit,
    candidates: Vec<Circuit>,
    observed: usize,
    current_index: Option<usize>,
    lap: u32,
    max_laps: u32,
    analyzed: bool,
}

impl CircuitTracker {
    /// Empty tracker that narrows `library` as checkpoints are discovered.
    pub fn new(max_laps: u32, library: Vec<Circuit>) -> Self {
        Self {
            circuit: Circuit::default(),
            candidates: library,
            observed: 0,
            current_index: None,
            lap: 1,
            max_laps,
            analyzed: false,
        }
    }

    /// Tracker for a circuit that is known up front.
    pub fn with_circuit(circuit: Circuit, max_laps: u32) -> Self {
        let mut tracker = Self::new(max_laps, Vec::new());
        tracker.register(circuit);
        tracker
    }

    pub fn register(&mut self, circuit: Circuit) {
        self.observed = circuit.len();
        self.circuit = circuit;
        self.candidates.clear();
        self.analyzed = true;
    }

    pub fn observe(&mut self, point: MapPoint) -> Observation {
        if let Some(index) = self.current_index {
            if self.circuit.checkpoints.get(index) == Some(&point) {
                return Observation::Unchanged;
            }
        }

        if let Some(index) = self.circuit.position_of(point) {
            self.current_index = Some(index);
            self.observed = self.observed.max(index + 1);
            let new_lap = index == 0;
            if new_lap {
                self.lap += 1;
                self.analyzed = true;
            }
            return Observation::Advanced { index, new_lap };
        }

        if self.analyzed {
            // The library guess was wrong; fall back to what we actually saw.
            tracing::warn!(
                observed = self.observed,
                inferred = self.circuit.len(),
                x = point.x,
                y = point.y,
                "checkpoint outside the inferred circuit, discarding library match"
            );
            self.circuit.checkpoints.truncate(self.observed);
            self.analyzed = false;
        }

        self.circuit.checkpoints.push(point);
        self.observed = self.circuit.len();
        let index = self.circuit.len() - 1;
        self.current_index = Some(index);
        self.reduce_candidates();
        Observation::Discovered { index }
    }

    fn reduce_candidates(&mut self) {
        if self.candidates.is_empty() {
            return;
        }
        let circuit = &self.circuit;
        self.candidates
            .retain(|candidate| candidate.len() >= circuit.len() && candidate.is_potentially_identical(circuit));

        if let [only] = self.candidates.as_slice() {
            let only = only.clone();
            self.circuit.copy_remaining_from(&only);
            self.candidates.clear();
            self.analyzed = true;
            tracing::debug!(
                checkpoints = self.circuit.len(),
                observed = self.observed,
                "circuit matched a library entry"
            );
        }
    }

    pub fn is_analyzed(&self) -> bool {
        self.analyzed
    }

    pub fn lap(&self) -> u32 {
        self.lap
    }

    pub fn max_laps(&self) -> u32 {
        self.max_laps
    }

    pub fn set_max_laps(&mut self, max_laps: u32) {
        self.max_laps = max_laps;
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn candidates_left(&self) -> usize {
        self.candidates.len()
    }

    pub fn progress(&self) -> RaceProgress {
        RaceProgress {
            lap: self.lap,
            checkpoint_index: self.current_index.unwrap_or(0),
        }
    }

    pub fn is_last_lap(&self) -> bool {
        self.lap_is_last(self.lap)
    }

    pub fn is_targeting_last_checkpoint(&self) -> bool {
        self.current_index
            .is_some_and(|index| self.index_is_last(index))
    }

    pub fn lap_is_last(&self, lap: u32) -> bool {
        lap >= self.max_laps
    }

    pub fn index_is_last(&self, index: usize) -> bool {
        !self.circuit.is_empty() && index == self.circuit.len() - 1
    }

    pub fn checkpoint(&self, index: i64) -> Option<MapPoint> {
        self.circuit.checkpoint(index)
    }

    /// Checkpoint `step` places after the current one, wrapping round the
    /// loop. `None` until at least one checkpoint is known.
    pub fn checkpoint_relative_to(&self, step: i64) -> Option<MapPoint> {
        let current = self.current_index? as i64;
        self.circuit.checkpoint(current + step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<MapPoint> {
        vec![
            MapPoint::new(0, 0),
            MapPoint::new(100, 0),
            MapPoint::new(100, 100),
            MapPoint::new(0, 100),
        ]
    }

    #[test]
    fn traversal_marks_lap_and_analysis() {
        let mut tracker = CircuitTracker::new(3, Vec::new());
        for cp in square() {
            assert!(matches!(tracker.observe(cp), Observation::Discovered { .. }));
            assert!(!tracker.is_analyzed());
        }
        assert_eq!(tracker.lap(), 1);
        assert!(tracker.is_targeting_last_checkpoint());

        assert_eq!(
            tracker.observe(MapPoint::new(0, 0)),
            Observation::Advanced { index: 0, new_lap: true }
        );
        assert_eq!(tracker.lap(), 2);
        assert!(tracker.is_analyzed());
        assert_eq!(tracker.circuit().len(), 4);
        assert!(!tracker.is_last_lap());
    }

    #[test]
    fn repeated_sighting_changes_nothing() {
        let mut tracker = CircuitTracker::new(3, Vec::new());
        tracker.observe(MapPoint::new(0, 0));
        assert_eq!(tracker.observe(MapPoint::new(0, 0)), Observation::Unchanged);
        assert_eq!(tracker.lap(), 1);
        assert_eq!(tracker.circuit().len(), 1);
    }

    #[test]
    fn last_lap_follows_lap_count() {
        let mut tracker = CircuitTracker::new(2, Vec::new());
        for cp in square() {
            tracker.observe(cp);
        }
        assert!(!tracker.is_last_lap());
        tracker.observe(MapPoint::new(0, 0));
        assert!(tracker.is_last_lap());
    }

    #[test]
    fn look_ahead_wraps() {
        let tracker = CircuitTracker::with_circuit(Circuit::new(square()), 3);
        assert_eq!(tracker.checkpoint_relative_to(0), None);

        let mut tracker = CircuitTracker::new(3, Vec::new());
        for cp in square() {
            tracker.observe(cp);
        }
        tracker.observe(MapPoint::new(100, 0));
        let n = tracker.circuit().len() as i64;
        assert_eq!(tracker.checkpoint_relative_to(n), tracker.checkpoint_relative_to(0));
        assert_eq!(tracker.checkpoint_relative_to(0), Some(MapPoint::new(100, 0)));
        assert_eq!(tracker.checkpoint_relative_to(1), Some(MapPoint::new(100, 100)));
        assert_eq!(tracker.checkpoint_relative_to(3), Some(MapPoint::new(0, 0)));
        assert_eq!(tracker.checkpoint_relative_to(-1), Some(MapPoint::new(0, 0)));
    }

    #[test]
    fn look_ahead_before_any_checkpoint_is_none() {
        let tracker = CircuitTracker::new(3, Vec::new());
        assert_eq!(tracker.checkpoint_relative_to(1), None);
        assert!(!tracker.is_targeting_last_checkpoint());
    }

    #[test]
    fn potential_identity_needs_both_sides() {
        let full = Circuit::new(square());
        assert!(!Circuit::default().is_potentially_identical(&full));
        assert!(!full.is_potentially_identical(&Circuit::default()));
        assert!(!Circuit::default().is_potentially_identical(&Circuit::default()));
    }

    #[test]
    fn potential_identity_compares_prefix_only() {
        let full = Circuit::new(square());
        let prefix = Circuit::new(vec![MapPoint::new(30, 40), MapPoint::new(100, 50)]);
        assert!(prefix.is_potentially_identical(&full));
        assert!(full.is_potentially_identical(&prefix));

        let off = Circuit::new(vec![MapPoint::new(0, 0), MapPoint::new(100, 51)]);
        assert!(!off.is_potentially_identical(&full));
    }

    #[test]
    fn library_match_completes_the_circuit() {
        let library = vec![
            Circuit::new(square()),
            Circuit::new(vec![
                MapPoint::new(5_000, 5_000),
                MapPoint::new(9_000, 1_000),
                MapPoint::new(2_000, 7_000),
            ]),
            Circuit::new(vec![
                MapPoint::new(0, 0),
                MapPoint::new(8_000, 0),
                MapPoint::new(8_000, 8_000),
            ]),
        ];
        let mut tracker = CircuitTracker::new(3, library);

        tracker.observe(MapPoint::new(10, 10));
        assert_eq!(tracker.candidates_left(), 2);
        assert!(!tracker.is_analyzed());

        tracker.observe(MapPoint::new(110, -5));
        assert!(tracker.is_analyzed());
        assert_eq!(tracker.circuit().len(), 4);
        assert_eq!(tracker.checkpoint_relative_to(1), Some(MapPoint::new(100, 100)));
        assert_eq!(tracker.checkpoint_relative_to(2), Some(MapPoint::new(0, 100)));
    }

    #[test]
    fn wrong_library_match_is_discarded() {
        let library = vec![Circuit::new(square())];
        let mut tracker = CircuitTracker::new(3, library);
        tracker.observe(MapPoint::new(0, 0));
        assert!(tracker.is_analyzed());
        assert_eq!(tracker.circuit().len(), 4);

        tracker.observe(MapPoint::new(7_000, 3_000));
        assert!(!tracker.is_analyzed());
        assert_eq!(
            tracker.circuit().checkpoints,
            vec![MapPoint::new(0, 0), MapPoint::new(7_000, 3_000)]
        );
        assert_eq!(tracker.current_index(), Some(1));
    }

    #[test]
    fn registered_circuit_is_analyzed() {
        let tracker = CircuitTracker::with_circuit(Circuit::new(square()), 3);
        assert!(tracker.is_analyzed());
        assert!(tracker.index_is_last(3));
        assert!(!tracker.index_is_last(2));
        assert!(tracker.lap_is_last(3));
        assert_eq!(tracker.checkpoint(5), Some(MapPoint::new(100, 0)));
    }
}
