use crate::circuit::CircuitTracker;
use crate::config::SteeringConfig;
use crate::kinematics::{PodState, RaceProgress};
use crate::vector::{
    deg_to_rad, is_approximately_one, is_approximately_zero, wrap_degrees, MapPoint, EPSILON,
};
use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Command {
    Thrust(u8),
    Boost,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thrust(value) => write!(f, "{value}"),
            Self::Boost => write!(f, "BOOST"),
        }
    }
}

/// One output line: where to aim and how hard to push.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PodMove {
    pub target: MapPoint,
    pub command: Command,
}

impl fmt::Display for PodMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.target, self.command)
    }
}

/// The checkpoint a pod is heading for, as seen this turn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sighting {
    pub checkpoint: MapPoint,
    pub distance: f64,
    /// Bearing relative to the pod's facing, degrees, signed.
    pub bearing_deg: f64,
}

impl Sighting {
    pub fn from_facing(position: MapPoint, facing_deg: f64, checkpoint: MapPoint) -> Self {
        let to_checkpoint = (checkpoint - position).to_vector();
        Self {
            checkpoint,
            distance: to_checkpoint.magnitude(),
            bearing_deg: wrap_degrees(to_checkpoint.normalized().tangent_angle() - facing_deg),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Decision {
    pub pod_move: PodMove,
    pub dist_factor: f64,
    pub min_thrust: f64,
    pub look_ahead: bool,
}

/// Share of the braking distance (`speed * horizon`) still ahead, in `[0, 1]`.
/// A pod that is barely moving gets `1`.
pub fn distance_factor(projected_distance: f64, speed: f64, horizon: f64) -> f64 {
    if speed > EPSILON {
        (projected_distance.max(0.0) / (speed * horizon)).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// `|bearing| / 180` in `[0, 1]`.
pub fn angle_factor(bearing_deg: f64) -> f64 {
    (bearing_deg.abs() / 180.0).clamp(0.0, 1.0)
}

fn to_thrust(value: f64, min: f64, max: f64) -> u8 {
    if !value.is_finite() {
        return min.round() as u8;
    }
    value.round().max(min).min(max).clamp(0.0, 100.0) as u8
}

/// Raw-checkpoint steering with a distance/angle thrust blend.
pub fn decide_simple(pod: &mut PodState, sighting: Sighting, cfg: &SteeringConfig) -> Decision {
    let dist_factor = distance_factor(sighting.distance, pod.speed, cfg.speed_horizon);
    let angle_factor = angle_factor(sighting.bearing_deg);

    let boost_ready = pod.boost_charges > 0
        && is_approximately_zero(sighting.bearing_deg.abs())
        && is_approximately_one(dist_factor)
        && pod.speed > cfg.boost_min_speed;

    let command = if boost_ready && pod.take_boost() {
        tracing::info!(pod = %pod.name, speed = pod.speed, "boost");
        Command::Boost
    } else {
        let blend = cfg.distance_weight * dist_factor
            + (1.0 - cfg.distance_weight) * (1.0 - angle_factor);
        Command::Thrust(to_thrust(cfg.max_thrust * blend, cfg.min_thrust, cfg.max_thrust))
    };

    tracing::debug!(
        pod = %pod.name,
        distance = sighting.distance,
        bearing = sighting.bearing_deg,
        speed = pod.speed,
        max_speed = pod.max_speed,
        angular_speed = pod.angular_speed,
        max_angular_speed = pod.max_angular_speed,
        dist_factor,
        angle_factor,
        boosts_left = pod.boost_charges,
        "simple steering"
    );

    Decision {
        pod_move: PodMove {
            target: sighting.checkpoint,
            command,
        },
        dist_factor,
        min_thrust: cfg.min_thrust,
        look_ahead: false,
    }
}

/// Look-ahead steering: may switch aim to the checkpoint after the current
/// one, raises the thrust floor on straight lines, boosts on the final lap,
/// and offsets the aim point against drift.
pub fn decide_lookahead(
    pod: &mut PodState,
    sighting: Sighting,
    circuit: &CircuitTracker,
    progress: RaceProgress,
    cfg: &SteeringConfig,
) -> Decision {
    let max_thrust = cfg.max_thrust;
    let mut min_thrust = cfg.min_thrust;
    let horizon = cfg.speed_horizon;
    let braking_distance = pod.speed * horizon;

    let mut current = sighting.checkpoint;
    let mut distance = sighting.distance;
    let mut to_current = (current - pod.position).to_vector().normalized();
    let mut dist_factor = distance_factor(
        distance * deg_to_rad(sighting.bearing_deg).cos(),
        pod.speed,
        horizon,
    );
    let mut look_ahead = false;

    let lookahead_allowed = circuit.is_analyzed()
        && !circuit.lap_is_last(progress.lap)
        && !circuit.index_is_last(progress.checkpoint_index);

    if lookahead_allowed {
        let index = progress.checkpoint_index as i64;
        let movement_cosine = pod.direction.dot(to_current).max(0.0);
        let mut next = circuit.checkpoint(index + 1);

        if movement_cosine > deg_to_rad(cfg.lookahead_cone_deg).cos() && distance < braking_distance
        {
            if let (Some(ahead), Some(after)) =
                (circuit.checkpoint(index + 1), circuit.checkpoint(index + 2))
            {
                look_ahead = true;
                current = ahead;
                next = Some(after);
                let diff = (current - pod.position).to_vector();
                to_current = diff.normalized();
                distance = diff.magnitude();
                dist_factor =
                    distance_factor(distance * pod.direction.dot(to_current), pod.speed, horizon);
            }
        }

        if let Some(next) = next {
            let half_vector = (to_current + pod.direction).normalized();
            let to_next = (next - current).to_vector().normalized();
            min_thrust = (half_vector.dot(to_next) * max_thrust).clamp(0.0, max_thrust);
        }
    }

    let boost_ready = pod.boost_charges > 0
        && circuit.lap_is_last(progress.lap)
        && dist_factor > cfg.boost_min_dist_factor
        && sighting.bearing_deg.abs() < cfg.boost_max_bearing_deg;

    let command = if boost_ready && pod.take_boost() {
        tracing::info!(pod = %pod.name, lap = progress.lap, "boost");
        Command::Boost
    } else {
        let thrust = min_thrust + (max_thrust - min_thrust) * dist_factor;
        Command::Thrust(to_thrust(thrust, min_thrust, max_thrust))
    };

    let target = if cfg.calibrate_aim {
        let adjustment =
            (to_current * pod.direction.dot(to_current) - pod.direction) * braking_distance;
        (current.to_vector() + adjustment).to_point()
    } else {
        current
    };

    tracing::debug!(
        pod = %pod.name,
        distance,
        bearing = sighting.bearing_deg,
        dir_x = pod.direction.x,
        dir_y = pod.direction.y,
        speed = pod.speed,
        max_speed = pod.max_speed,
        angular_speed = pod.angular_speed,
        max_angular_speed = pod.max_angular_speed,
        dist_factor,
        look_ahead,
        min_thrust,
        max_thrust,
        boosts_left = pod.boost_charges,
        "look-ahead steering"
    );

    Decision {
        pod_move: PodMove { target, command },
        dist_factor,
        min_thrust,
        look_ahead,
    }
}
