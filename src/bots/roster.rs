use super::{AutopilotBot, BotManifestEntry, DriftBot, ScoutBot, SquadBot};
use crate::config::SteeringConfig;
use crate::fingerprint::config_fingerprint;
use crate::protocol::Protocol;

#[derive(Clone, Copy)]
enum Family {
    Drift,
    Scout,
    Squad,
}

impl Family {
    fn as_str(self) -> &'static str {
        match self {
            Self::Drift => "drift",
            Self::Scout => "scout",
            Self::Squad => "squad",
        }
    }

    fn protocol(self) -> Protocol {
        match self {
            Self::Squad => Protocol::Team,
            Self::Drift | Self::Scout => Protocol::Single,
        }
    }
}

struct RosterEntry {
    id: &'static str,
    description: &'static str,
    family: Family,
}

const ROSTER: &[RosterEntry] = &[
    RosterEntry {
        id: "drift-basic",
        description: "Single pod aiming at the raw checkpoint, 80/20 distance/angle thrust blend.",
        family: Family::Drift,
    },
    RosterEntry {
        id: "drift-blend",
        description: "Single pod aiming at the raw checkpoint, 70/30 distance/angle thrust blend.",
        family: Family::Drift,
    },
    RosterEntry {
        id: "circuit-scout",
        description: "Single pod that infers the circuit and steers one checkpoint ahead.",
        family: Family::Scout,
    },
    RosterEntry {
        id: "squad-lookahead",
        description: "Two pods on a known circuit with look-ahead, drift-corrected aim and a last-lap boost.",
        family: Family::Squad,
    },
];

fn entry(id: &str) -> Option<&'static RosterEntry> {
    ROSTER.iter().find(|entry| entry.id == id)
}

pub fn bot_ids() -> Vec<&'static str> {
    ROSTER.iter().map(|entry| entry.id).collect()
}

pub fn describe_bots() -> Vec<(&'static str, &'static str)> {
    ROSTER
        .iter()
        .map(|entry| (entry.id, entry.description))
        .collect()
}

pub fn protocol_of(id: &str) -> Option<Protocol> {
    entry(id).map(|entry| entry.family.protocol())
}

pub fn create_bot(id: &str) -> Option<Box<dyn AutopilotBot>> {
    let cfg = SteeringConfig::preset(id)?;
    create_bot_with_config(id, cfg)
}

/// Roster bot `id` driven by `cfg` instead of its preset.
pub fn create_bot_with_config(id: &str, cfg: SteeringConfig) -> Option<Box<dyn AutopilotBot>> {
    let entry = entry(id)?;
    let bot: Box<dyn AutopilotBot> = match entry.family {
        Family::Drift => Box::new(DriftBot::new(entry.id, entry.description, cfg)),
        Family::Scout => Box::new(ScoutBot::new(entry.id, entry.description, cfg)),
        Family::Squad => Box::new(SquadBot::new(entry.id, entry.description, cfg)),
    };
    Some(bot)
}

pub fn bot_manifest_entries() -> Vec<BotManifestEntry> {
    ROSTER
        .iter()
        .filter_map(|entry| {
            let cfg = SteeringConfig::preset(entry.id)?;
            let config = serde_json::to_value(&cfg).ok()?;
            let config_hash = config_fingerprint(&config).ok()?;
            Some(BotManifestEntry {
                id: entry.id.to_string(),
                family: entry.family.as_str().to_string(),
                description: entry.description.to_string(),
                protocol: entry.family.protocol(),
                config_hash,
                config,
            })
        })
        .collect()
}

pub fn bot_fingerprint(id: &str) -> Option<String> {
    bot_manifest_entries()
        .into_iter()
        .find(|entry| entry.id == id)
        .map(|entry| entry.config_hash)
}
