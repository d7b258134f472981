use super::AutopilotBot;
use crate::circuit::{CircuitTracker, Observation};
use crate::config::SteeringConfig;
use crate::kinematics::PodState;
use crate::library::discovery_library;
use crate::protocol::{Protocol, ProtocolError, RaceHeader, TurnInput};
use crate::steering::{decide_lookahead, PodMove, Sighting};

/// Single pod that learns the circuit from the checkpoints it is sent,
/// optionally shortcut by the recorded library, and steers with look-ahead
/// once the loop is known.
pub struct ScoutBot {
    id: &'static str,
    description: &'static str,
    cfg: SteeringConfig,
    pod: PodState,
    tracker: CircuitTracker,
}

impl ScoutBot {
    pub fn new(id: &'static str, description: &'static str, cfg: SteeringConfig) -> Self {
        let pod = PodState::new("pod", cfg.boost_charges);
        let tracker = Self::fresh_tracker(&cfg);
        Self {
            id,
            description,
            cfg,
            pod,
            tracker,
        }
    }

    fn fresh_tracker(cfg: &SteeringConfig) -> CircuitTracker {
        let library = if cfg.use_library {
            discovery_library()
        } else {
            Vec::new()
        };
        CircuitTracker::new(cfg.laps, library)
    }

    pub fn tracker(&self) -> &CircuitTracker {
        &self.tracker
    }
}

impl AutopilotBot for ScoutBot {
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

    fn reset(&mut self, header: Option<&RaceHeader>) {
        self.pod = PodState::new("pod", self.cfg.boost_charges);
        self.tracker = Self::fresh_tracker(&self.cfg);
        if let Some(header) = header {
            self.tracker.set_max_laps(header.laps);
        }
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
        match self.tracker.observe(turn.checkpoint) {
            Observation::Unchanged => {}
            Observation::Advanced { index, new_lap } => {
                tracing::debug!(index, new_lap, lap = self.tracker.lap(), "checkpoint reached");
            }
            Observation::Discovered { index } => {
                tracing::debug!(
                    index,
                    analyzed = self.tracker.is_analyzed(),
                    candidates = self.tracker.candidates_left(),
                    "new checkpoint"
                );
            }
        }
        let progress = self.tracker.progress();
        self.pod.lap = progress.lap;
        self.pod.checkpoint_index = self.tracker.current_index();
        tracing::trace!(x = turn.opponent.x, y = turn.opponent.y, "opponent");

        let sighting = Sighting {
            checkpoint: turn.checkpoint,
            distance: turn.checkpoint_distance as f64,
            bearing_deg: turn.checkpoint_angle as f64,
        };
        let decision = decide_lookahead(&mut self.pod, sighting, &self.tracker, progress, &self.cfg);
        Ok(vec![decision.pod_move])
    }
}
