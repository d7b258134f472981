//! Offline race physics for local evaluation.
//!
//! Each turn a pod rotates toward its target (at most 18° except on its
//! first move), adds `thrust` along its facing to its velocity, moves,
//! then loses 15% of its velocity. Positions are rounded and velocities
//! truncated at the end of the turn. Collisions are not modelled.

use crate::circuit::Circuit;
use crate::protocol::{PodReport, Protocol, RaceHeader, SingleTurn, TeamTurn, TurnInput, TEAM_SIZE};
use crate::steering::{Command, PodMove};
use crate::vector::{wrap_degrees, MapPoint, Vector2};
use anyhow::{ensure, Result};
use serde::Serialize;

pub const CHECKPOINT_RADIUS: f64 = 600.0;
pub const MAX_ROTATION_DEG: f64 = 18.0;
pub const FRICTION: f64 = 0.85;
pub const BOOST_THRUST: f64 = 650.0;
pub const TIMEOUT_TURNS: u32 = 100;

/// Distance between neighbouring pods on the start line.
const START_SPACING: f64 = 1_000.0;

#[derive(Clone, Debug, Serialize)]
pub struct SimPod {
    pub position: Vector2,
    pub velocity: Vector2,
    pub facing_deg: f64,
    pub next_checkpoint: usize,
    pub checkpoints_passed: u32,
    pub turns_since_checkpoint: u32,
    pub boosts_used: u32,
    pub thrust_total: u64,
    pub moves: u32,
    pub finished: bool,
    pub timed_out: bool,
    has_moved: bool,
}

impl SimPod {
    pub fn new(position: Vector2, facing_deg: f64) -> Self {
        Self {
            position,
            velocity: Vector2::ZERO,
            facing_deg,
            next_checkpoint: 1,
            checkpoints_passed: 0,
            turns_since_checkpoint: 0,
            boosts_used: 0,
            thrust_total: 0,
            moves: 0,
            finished: false,
            timed_out: false,
            has_moved: false,
        }
    }

    pub fn is_racing(&self) -> bool {
        !self.finished && !self.timed_out
    }

    pub fn map_position(&self) -> MapPoint {
        MapPoint::new(self.position.x as i32, self.position.y as i32)
    }

    pub fn report(&self) -> PodReport {
        PodReport {
            position: self.map_position(),
            vx: self.velocity.x as i32,
            vy: self.velocity.y as i32,
            angle: if self.has_moved {
                self.facing_deg.round().rem_euclid(360.0) as i32
            } else {
                -1
            },
            next_checkpoint_id: self.next_checkpoint,
        }
    }

    fn rotate_towards(&mut self, target: MapPoint) {
        let to_target = target.to_vector() - self.position;
        if to_target.magnitude() <= f64::EPSILON {
            return;
        }
        let desired = to_target.tangent_angle();
        if self.has_moved {
            let turn = wrap_degrees(desired - self.facing_deg)
                .clamp(-MAX_ROTATION_DEG, MAX_ROTATION_DEG);
            self.facing_deg = (self.facing_deg + turn).rem_euclid(360.0);
        } else {
            self.facing_deg = desired.rem_euclid(360.0);
        }
    }

    /// Plays one move for this pod; `total_checkpoints` passes finish the race.
    pub fn apply(&mut self, mv: &PodMove, circuit: &Circuit, total_checkpoints: u32) {
        if !self.is_racing() || circuit.is_empty() {
            return;
        }

        self.rotate_towards(mv.target);
        self.has_moved = true;
        let thrust = match mv.command {
            Command::Boost => {
                self.boosts_used += 1;
                self.thrust_total += 100;
                BOOST_THRUST
            }
            Command::Thrust(value) => {
                self.thrust_total += value as u64;
                value as f64
            }
        };
        self.moves += 1;
        self.velocity = self.velocity + Vector2::from_degrees(self.facing_deg) * thrust;

        let start = self.position;
        let end = start + self.velocity;
        let checkpoint = circuit.checkpoints[self.next_checkpoint % circuit.len()].to_vector();
        let reached = segment_distance(start, end, checkpoint) < CHECKPOINT_RADIUS;

        self.position = Vector2::new(end.x.round(), end.y.round());
        let slowed = self.velocity * FRICTION;
        self.velocity = Vector2::new(slowed.x.trunc(), slowed.y.trunc());

        if reached {
            self.checkpoints_passed += 1;
            self.turns_since_checkpoint = 0;
            self.next_checkpoint = (self.next_checkpoint + 1) % circuit.len();
            if self.checkpoints_passed >= total_checkpoints {
                self.finished = true;
            }
        } else {
            self.turns_since_checkpoint += 1;
            if self.turns_since_checkpoint >= TIMEOUT_TURNS {
                self.timed_out = true;
            }
        }
    }
}

/// Closest approach of the segment `a..b` to `point`.
fn segment_distance(a: Vector2, b: Vector2, point: Vector2) -> f64 {
    let segment = b - a;
    let length_sq = segment.dot(segment);
    if length_sq <= f64::EPSILON {
        return (point - a).magnitude();
    }
    let t = ((point - a).dot(segment) / length_sq).clamp(0.0, 1.0);
    (point - (a + segment * t)).magnitude()
}

/// One race between our pods and parked opponents.
#[derive(Clone, Debug)]
pub struct RaceSim {
    protocol: Protocol,
    circuit: Circuit,
    laps: u32,
    pods: Vec<SimPod>,
    opponents: Vec<SimPod>,
    turn: u32,
}

impl RaceSim {
    pub fn new(circuit: Circuit, laps: u32, protocol: Protocol) -> Result<Self> {
        ensure!(circuit.len() >= 2, "a race needs at least two checkpoints");
        ensure!(laps >= 1, "a race needs at least one lap");

        let start = circuit.checkpoints[0].to_vector();
        let heading = (circuit.checkpoints[1].to_vector() - start).normalized();
        let across = Vector2::new(-heading.y, heading.x);
        let facing = heading.tangent_angle();
        let slot = |offset: f64| SimPod::new(start + across * (offset * START_SPACING), facing);

        let (pods, opponents) = match protocol {
            Protocol::Single => (vec![slot(0.5)], vec![slot(-0.5)]),
            Protocol::Team => (vec![slot(0.5), slot(-0.5)], vec![slot(1.5), slot(-1.5)]),
        };

        Ok(Self {
            protocol,
            circuit,
            laps,
            pods,
            opponents,
            turn: 0,
        })
    }

    pub fn header(&self) -> RaceHeader {
        RaceHeader {
            laps: self.laps,
            circuit: self.circuit.clone(),
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn pods(&self) -> &[SimPod] {
        &self.pods
    }

    pub fn total_checkpoints(&self) -> u32 {
        self.laps * self.circuit.len() as u32
    }

    pub fn is_over(&self) -> bool {
        self.pods.iter().any(|pod| pod.finished) || self.pods.iter().all(|pod| pod.timed_out)
    }

    /// What the engine would send our side this turn.
    pub fn turn_input(&self) -> TurnInput {
        match self.protocol {
            Protocol::Single => {
                let pod = &self.pods[0];
                let checkpoint = self.circuit.checkpoints[pod.next_checkpoint];
                let to_checkpoint = checkpoint.to_vector() - pod.position;
                let bearing = wrap_degrees(to_checkpoint.tangent_angle() - pod.facing_deg);
                TurnInput::Single(SingleTurn {
                    position: pod.map_position(),
                    checkpoint,
                    checkpoint_distance: to_checkpoint.magnitude().round() as i32,
                    checkpoint_angle: bearing.round() as i32,
                    opponent: self.opponents[0].map_position(),
                })
            }
            Protocol::Team => {
                let reports = |pods: &[SimPod]| -> [PodReport; TEAM_SIZE] {
                    [pods[0].report(), pods[1].report()]
                };
                TurnInput::Team(TeamTurn {
                    own: reports(&self.pods),
                    opponents: reports(&self.opponents),
                })
            }
        }
    }

    pub fn step(&mut self, moves: &[PodMove]) -> Result<()> {
        ensure!(
            moves.len() == self.pods.len(),
            "expected {} moves, got {}",
            self.pods.len(),
            moves.len()
        );
        let total = self.total_checkpoints();
        for (pod, mv) in self.pods.iter_mut().zip(moves) {
            pod.apply(mv, &self.circuit, total);
        }
        self.turn += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_thrust(x: i32, y: i32) -> PodMove {
        PodMove {
            target: MapPoint::new(x, y),
            command: Command::Thrust(100),
        }
    }

    fn line() -> Circuit {
        Circuit::new(vec![MapPoint::new(0, 0), MapPoint::new(2_000, 0)])
    }

    #[test]
    fn straight_line_integration_and_checkpoint_pass() {
        let circuit = line();
        let mut pod = SimPod::new(Vector2::ZERO, 0.0);
        let expected_x = [100.0, 285.0, 542.0, 860.0, 1_230.0];
        for x in expected_x {
            pod.apply(&full_thrust(10_000, 0), &circuit, 4);
            assert_eq!(pod.position, Vector2::new(x, 0.0));
            assert_eq!(pod.checkpoints_passed, 0);
        }
        assert_eq!(pod.velocity, Vector2::new(314.0, 0.0));

        pod.apply(&full_thrust(10_000, 0), &circuit, 4);
        assert_eq!(pod.position, Vector2::new(1_644.0, 0.0));
        assert_eq!(pod.checkpoints_passed, 1);
        assert_eq!(pod.next_checkpoint, 0);
        assert_eq!(pod.turns_since_checkpoint, 0);
    }

    #[test]
    fn rotation_is_capped_after_the_first_move() {
        let circuit = line();
        let mut pod = SimPod::new(Vector2::new(5_000.0, 5_000.0), 0.0);
        pod.apply(&full_thrust(5_000, 0), &circuit, 4);
        assert!((pod.facing_deg - 270.0).abs() < 1e-9);

        pod.apply(&full_thrust(9_000, pod.position.y as i32), &circuit, 4);
        assert!((pod.facing_deg - 288.0).abs() < 1e-9);
    }

    #[test]
    fn boost_pushes_harder_than_full_thrust() {
        let circuit = line();
        let mut pod = SimPod::new(Vector2::new(5_000.0, 5_000.0), 0.0);
        pod.apply(
            &PodMove {
                target: MapPoint::new(9_000, 5_000),
                command: Command::Boost,
            },
            &circuit,
            4,
        );
        assert_eq!(pod.position, Vector2::new(5_650.0, 5_000.0));
        assert_eq!(pod.boosts_used, 1);
    }

    #[test]
    fn idle_pod_times_out() {
        let circuit = line();
        let mut pod = SimPod::new(Vector2::new(8_000.0, 8_000.0), 0.0);
        let idle = PodMove {
            target: MapPoint::new(0, 0),
            command: Command::Thrust(0),
        };
        for _ in 0..TIMEOUT_TURNS {
            assert!(pod.is_racing());
            pod.apply(&idle, &circuit, 4);
        }
        assert!(pod.timed_out);
        let frozen = pod.position;
        pod.apply(&full_thrust(0, 0), &circuit, 4);
        assert_eq!(pod.position, frozen);
    }

    #[test]
    fn fast_pod_cannot_skip_a_checkpoint() {
        let circuit = Circuit::new(vec![MapPoint::new(0, 0), MapPoint::new(1_000, 0)]);
        let mut pod = SimPod::new(Vector2::new(0.0, 0.0), 0.0);
        pod.velocity = Vector2::new(1_900.0, 0.0);
        pod.has_moved = true;
        pod.apply(&full_thrust(5_000, 0), &circuit, 4);
        assert_eq!(pod.checkpoints_passed, 1);
    }

    #[test]
    fn team_race_starts_on_the_line_with_unknown_facing() -> Result<()> {
        let sim = RaceSim::new(line(), 3, Protocol::Team)?;
        assert_eq!(sim.total_checkpoints(), 6);
        let TurnInput::Team(turn) = sim.turn_input() else {
            panic!("team race must produce team turns");
        };
        let ys: Vec<i32> = turn
            .own
            .iter()
            .chain(turn.opponents.iter())
            .map(|pod| pod.position.y)
            .collect();
        assert_eq!(ys, vec![500, -500, 1_500, -1_500]);
        for pod in turn.own.iter().chain(turn.opponents.iter()) {
            assert_eq!(pod.position.x, 0);
            assert_eq!(pod.angle, -1);
            assert_eq!(pod.next_checkpoint_id, 1);
        }
        Ok(())
    }

    #[test]
    fn single_race_reports_distance_and_bearing() -> Result<()> {
        let sim = RaceSim::new(line(), 1, Protocol::Single)?;
        let TurnInput::Single(turn) = sim.turn_input() else {
            panic!("single race must produce single turns");
        };
        assert_eq!(turn.position, MapPoint::new(0, 500));
        assert_eq!(turn.checkpoint, MapPoint::new(2_000, 0));
        assert_eq!(turn.checkpoint_distance, 2_062);
        assert_eq!(turn.checkpoint_angle, -14);
        assert_eq!(turn.opponent, MapPoint::new(0, -500));
        Ok(())
    }

    #[test]
    fn race_ends_when_a_pod_completes_every_lap() -> Result<()> {
        let mut sim = RaceSim::new(line(), 1, Protocol::Single)?;
        assert!(sim.step(&[]).is_err());
        for _ in 0..200 {
            if sim.is_over() {
                break;
            }
            let target = sim.circuit().checkpoints[sim.pods()[0].next_checkpoint];
            sim.step(&[full_thrust(target.x, target.y)])?;
        }
        assert!(sim.is_over());
        assert!(sim.pods()[0].finished);
        assert_eq!(sim.pods()[0].checkpoints_passed, 2);
        Ok(())
    }

    #[test]
    fn degenerate_races_are_rejected() {
        let one = Circuit::new(vec![MapPoint::new(0, 0)]);
        assert!(RaceSim::new(one, 3, Protocol::Single).is_err());
        assert!(RaceSim::new(line(), 0, Protocol::Single).is_err());
    }
}
