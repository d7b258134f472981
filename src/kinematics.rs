use crate::vector::{MapPoint, Vector2};
use serde::Serialize;

/// Where a pod is in the race: current lap (1-based) and the index of the
/// checkpoint it is heading for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RaceProgress {
    pub lap: u32,
    pub checkpoint_index: usize,
}

/// Per-pod kinematic record, updated once per turn.
///
/// One pod must stick to one velocity source for its whole life: either the
/// engine-reported velocity ([`PodState::update_with_velocity`], units per
/// turn) or the position delta ([`PodState::update_from_position`], units per
/// second). Mixing them makes `speed` meaningless.
#[derive(Clone, Debug, Serialize)]
pub struct PodState {
    pub name: String,
    pub position: MapPoint,
    pub direction: Vector2,
    pub speed: f64,
    pub angular_speed: f64,
    pub max_speed: f64,
    pub max_angular_speed: f64,
    pub facing_angle: f64,
    pub boost_charges: u32,
    pub lap: u32,
    pub checkpoint_index: Option<usize>,
    initialized: bool,
}

impl PodState {
    pub fn new(name: impl Into<String>, boost_charges: u32) -> Self {
        Self {
            name: name.into(),
            position: MapPoint::default(),
            direction: Vector2::ZERO,
            speed: 0.0,
            angular_speed: 0.0,
            max_speed: 0.0,
            max_angular_speed: 0.0,
            facing_angle: 0.0,
            boost_charges,
            lap: 1,
            checkpoint_index: None,
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Update from an engine-reported velocity. `speed` is the velocity
    /// magnitude as reported, not divided by `elapsed_secs`.
    pub fn update_with_velocity(&mut self, position: MapPoint, velocity: Vector2, elapsed_secs: f64) {
        let prev_direction = self.direction;
        self.position = position;
        self.speed = velocity.magnitude();
        self.direction = velocity.normalized();
        self.angular_speed = if self.initialized {
            (self.direction - prev_direction).tangent_angle() / elapsed_secs
        } else {
            0.0
        };
        self.initialized = true;
        self.record_maxima();
    }

    /// Update from position only; velocity is the displacement since the
    /// previous update divided by `elapsed_secs`. The first call only
    /// records the position.
    pub fn update_from_position(&mut self, position: MapPoint, elapsed_secs: f64) {
        if !self.initialized {
            self.position = position;
            self.direction = Vector2::ZERO;
            self.speed = 0.0;
            self.angular_speed = 0.0;
            self.initialized = true;
            return;
        }

        let prev_direction = self.direction;
        let raw_velocity = (position - self.position).to_vector();
        self.position = position;
        self.speed = raw_velocity.magnitude() / elapsed_secs;
        self.direction = raw_velocity.normalized();
        self.angular_speed = (self.direction - prev_direction).tangent_angle() / elapsed_secs;
        self.record_maxima();
    }

    pub fn set_facing(&mut self, facing_angle: f64) {
        self.facing_angle = facing_angle;
    }

    /// Lap and index bookkeeping from an engine-reported next checkpoint id.
    pub fn track_checkpoint(&mut self, checkpoint_id: usize) {
        if self.checkpoint_index != Some(checkpoint_id) {
            if checkpoint_id == 0 {
                self.lap += 1;
            }
            self.checkpoint_index = Some(checkpoint_id);
        }
    }

    pub fn progress(&self) -> RaceProgress {
        RaceProgress {
            lap: self.lap,
            checkpoint_index: self.checkpoint_index.unwrap_or(0),
        }
    }

    /// Spends one boost charge if any remain. Charges never come back.
    pub fn take_boost(&mut self) -> bool {
        if self.boost_charges == 0 {
            return false;
        }
        self.boost_charges -= 1;
        true
    }

    fn record_maxima(&mut self) {
        self.max_speed = self.max_speed.max(self.speed);
        self.max_angular_speed = self.max_angular_speed.max(self.angular_speed.abs());
    }
}
