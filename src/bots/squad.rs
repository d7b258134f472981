use super::AutopilotBot;
use crate::circuit::CircuitTracker;
use crate::config::SteeringConfig;
use crate::kinematics::PodState;
use crate::protocol::{PodReport, Protocol, ProtocolError, RaceHeader, TurnInput, TEAM_SIZE};
use crate::steering::{decide_lookahead, PodMove, Sighting};

/// Two pods on a circuit announced up front. Velocity and the next
/// checkpoint come from the engine; opponents are modelled but never
/// steered.
pub struct SquadBot {
    id: &'static str,
    description: &'static str,
    cfg: SteeringConfig,
    pods: [PodState; TEAM_SIZE],
    opponents: [PodState; TEAM_SIZE],
    tracker: CircuitTracker,
}

fn team(prefix: &str, boost_charges: u32) -> [PodState; TEAM_SIZE] {
    [
        PodState::new(format!("{prefix}0"), boost_charges),
        PodState::new(format!("{prefix}1"), boost_charges),
    ]
}

/// Refreshes `pod` from its report and sights its next checkpoint.
fn observe(
    pod: &mut PodState,
    report: &PodReport,
    tracker: &CircuitTracker,
    elapsed_secs: f64,
) -> Result<Sighting, ProtocolError> {
    let checkpoint = tracker
        .checkpoint(report.next_checkpoint_id as i64)
        .ok_or(ProtocolError::CheckpointOutOfRange {
            id: report.next_checkpoint_id as i64,
            count: tracker.circuit().len(),
        })?;

    pod.update_with_velocity(report.position, report.velocity(), elapsed_secs);
    pod.track_checkpoint(report.next_checkpoint_id);

    // Facing is -1 until the pod has moved once; treat it as facing the checkpoint.
    let facing = if report.angle < 0 {
        (checkpoint - report.position).to_vector().tangent_angle()
    } else {
        report.angle as f64
    };
    pod.set_facing(facing);
    Ok(Sighting::from_facing(report.position, facing, checkpoint))
}

impl SquadBot {
    pub fn new(id: &'static str, description: &'static str, cfg: SteeringConfig) -> Self {
        Self {
            id,
            description,
            pods: team("pod", cfg.boost_charges),
            opponents: team("opponent", cfg.boost_charges),
            tracker: CircuitTracker::new(cfg.laps, Vec::new()),
            cfg,
        }
    }

    pub fn pods(&self) -> &[PodState; TEAM_SIZE] {
        &self.pods
    }

    pub fn tracker(&self) -> &CircuitTracker {
        &self.tracker
    }
}

impl AutopilotBot for SquadBot {
    fn id(&self) -> &'static str {
        self.id
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn protocol(&self) -> Protocol {
        Protocol::Team
    }

    fn config(&self) -> &SteeringConfig {
        &self.cfg
    }

    fn reset(&mut self, header: Option<&RaceHeader>) {
        self.pods = team("pod", self.cfg.boost_charges);
        self.opponents = team("opponent", self.cfg.boost_charges);
        self.tracker = match header {
            Some(header) => CircuitTracker::with_circuit(header.circuit.clone(), header.laps),
            None => CircuitTracker::new(self.cfg.laps, Vec::new()),
        };
    }

    fn next_moves(
        &mut self,
        turn: &TurnInput,
        elapsed_secs: f64,
    ) -> Result<Vec<PodMove>, ProtocolError> {
        let TurnInput::Team(turn) = turn else {
            return Err(ProtocolError::WrongTurnKind {
                expected: Protocol::Team,
            });
        };

        let mut moves = Vec::with_capacity(TEAM_SIZE);
        for (pod, report) in self.pods.iter_mut().zip(&turn.own) {
            let sighting = observe(pod, report, &self.tracker, elapsed_secs)?;
            let progress = pod.progress();
            let decision = decide_lookahead(pod, sighting, &self.tracker, progress, &self.cfg);
            moves.push(decision.pod_move);
        }

        for (pod, report) in self.opponents.iter_mut().zip(&turn.opponents) {
            let sighting = observe(pod, report, &self.tracker, elapsed_secs)?;
            let progress = pod.progress();
            let predicted = decide_lookahead(pod, sighting, &self.tracker, progress, &self.cfg);
            tracing::trace!(
                pod = %pod.name,
                lap = progress.lap,
                checkpoint = progress.checkpoint_index,
                predicted = %predicted.pod_move,
                "opponent"
            );
        }

        Ok(moves)
    }
}
