use super::AutopilotBot;
use crate::config::SteeringConfig;
use crate::kinematics::PodState;
use crate::protocol::{Protocol, ProtocolError, RaceHeader, TurnInput};
use crate::steering::{decide_simple, PodMove, Sighting};

/// Single pod that aims straight at the reported checkpoint and blends
/// distance and angle into its thrust. Velocity comes from position deltas.
pub struct DriftBot {
    id: &'static str,
    description: &'static str,
    cfg: SteeringConfig,
    pod: PodState,
}

impl DriftBot {
    pub fn new(id: &'static str, description: &'static str, cfg: SteeringConfig) -> Self {
        let pod = PodState::new("pod", cfg.boost_charges);
        Self {
            id,
            description,
            cfg,
            pod,
        }
    }

    pub fn pod(&self) -> &PodState {
        &self.pod
    }
}

impl AutopilotBot for DriftBot {
    fn id(&self) -> &'static str {
        self.id
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn protocol(&self) -> Protocol {
        Protocol::Single
    }

    fn config(&self) -> &SteeringConfig {
        &self.cfg
    }

    fn reset(&mut self, _header: Option<&RaceHeader>) {
        self.pod = PodState::new("pod", self.cfg.boost_charges);
    }

    fn next_moves(
        &mut self,
        turn: &TurnInput,
        elapsed_secs: f64,
    ) -> Result<Vec<PodMove>, ProtocolError> {
        let TurnInput::Single(turn) = turn else {
            return Err(ProtocolError::WrongTurnKind {
                expected: Protocol::Single,
            });
        };

        self.pod.update_from_position(turn.position, elapsed_secs);
        tracing::trace!(x = turn.opponent.x, y = turn.opponent.y, "opponent");

        let sighting = Sighting {
            checkpoint: turn.checkpoint,
            distance: turn.checkpoint_distance as f64,
            bearing_deg: turn.checkpoint_angle as f64,
        };
        let decision = decide_simple(&mut self.pod, sighting, &self.cfg);
        Ok(vec![decision.pod_move])
    }
}
