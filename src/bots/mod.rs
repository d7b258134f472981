use crate::config::SteeringConfig;
use crate::protocol::{Protocol, ProtocolError, RaceHeader, TurnInput};
use crate::steering::PodMove;
use serde::Serialize;

pub trait AutopilotBot {
    fn id(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn protocol(&self) -> Protocol;
    fn config(&self) -> &SteeringConfig;
    /// Clears per-race state. Team games pass the race header.
    fn reset(&mut self, header: Option<&RaceHeader>);
    /// One move per controlled pod, in protocol order.
    fn next_moves(
        &mut self,
        turn: &TurnInput,
        elapsed_secs: f64,
    ) -> Result<Vec<PodMove>, ProtocolError>;
}

#[derive(Clone, Debug, Serialize)]
pub struct BotManifestEntry {
    pub id: String,
    pub family: String,
    pub description: String,
    pub protocol: Protocol,
    pub config_hash: String,
    pub config: serde_json::Value,
}

mod drift;
mod roster;
mod scout;
mod squad;

pub use drift::DriftBot;
pub use roster::{
    bot_fingerprint, bot_ids, bot_manifest_entries, create_bot, create_bot_with_config,
    describe_bots, protocol_of,
};
pub use scout::ScoutBot;
pub use squad::SquadBot;
