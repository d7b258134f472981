use crate::bots::{create_bot, AutopilotBot};
use crate::circuit::Circuit;
use crate::clock::{FrameClock, TURN_SECS};
use crate::fingerprint::config_fingerprint;
use crate::protocol::{format_header, format_single_turn, format_team_turn, Protocol, TurnInput};
use crate::sim::RaceSim;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Serialize)]
pub struct RaceSpec {
    pub label: String,
    pub circuit: Circuit,
    pub laps: u32,
    pub max_turns: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct RunMetrics {
    pub bot_id: String,
    pub bot_fingerprint: String,
    pub circuit_label: String,
    pub checkpoint_count: usize,
    pub laps: u32,
    pub max_turns: u32,
    pub turns: u32,
    pub finished: bool,
    pub timed_out: bool,
    pub checkpoints_passed: u32,
    pub boosts_used: u32,
    pub avg_thrust: f64,
}

/// A finished run plus the exact protocol text exchanged, so it can be
/// replayed through `play`.
#[derive(Clone, Debug)]
pub struct RunArtifact {
    pub metrics: RunMetrics,
    pub input_transcript: String,
    pub output_transcript: String,
}

pub fn run_race(bot_id: &str, race: &RaceSpec) -> Result<RunArtifact> {
    let mut bot = create_bot(bot_id).ok_or_else(|| anyhow!("unknown bot '{bot_id}'"))?;
    run_race_instance(bot.as_mut(), race)
}

pub fn run_race_instance(bot: &mut dyn AutopilotBot, race: &RaceSpec) -> Result<RunArtifact> {
    if race.max_turns == 0 {
        return Err(anyhow!("max_turns must be > 0"));
    }

    let protocol = bot.protocol();
    let mut sim = RaceSim::new(race.circuit.clone(), race.laps, protocol)
        .with_context(|| format!("invalid race {}", race.label))?;
    let mut input_transcript = String::new();
    let mut output_transcript = String::new();

    // Single-pod input never carries the header, but the bot still learns
    // the lap count from it.
    let header = sim.header();
    if protocol == Protocol::Team {
        input_transcript.push_str(&format_header(&header));
    }
    bot.reset(Some(&header));

    let mut clock = FrameClock::fixed(TURN_SECS);
    while !sim.is_over() && sim.turn() < race.max_turns {
        let turn = sim.turn_input();
        input_transcript.push_str(&match &turn {
            TurnInput::Single(turn) => format_single_turn(turn),
            TurnInput::Team(turn) => format_team_turn(turn),
        });

        let moves = bot
            .next_moves(&turn, clock.tick())
            .with_context(|| format!("bot {} failed on turn {}", bot.id(), sim.turn() + 1))?;
        for mv in &moves {
            output_transcript.push_str(&format!("{mv}\n"));
        }
        sim.step(&moves)?;
    }

    let config = serde_json::to_value(bot.config()).context("failed to serialize bot config")?;
    let bot_fingerprint = config_fingerprint(&config).context("failed to fingerprint bot config")?;

    let pods = sim.pods();
    let moves: u32 = pods.iter().map(|pod| pod.moves).sum();
    let thrust_total: u64 = pods.iter().map(|pod| pod.thrust_total).sum();
    let metrics = RunMetrics {
        bot_id: bot.id().to_string(),
        bot_fingerprint,
        circuit_label: race.label.clone(),
        checkpoint_count: race.circuit.len(),
        laps: race.laps,
        max_turns: race.max_turns,
        turns: sim.turn(),
        finished: pods.iter().any(|pod| pod.finished),
        timed_out: pods.iter().all(|pod| pod.timed_out),
        checkpoints_passed: pods
            .iter()
            .map(|pod| pod.checkpoints_passed)
            .max()
            .unwrap_or_default(),
        boosts_used: pods.iter().map(|pod| pod.boosts_used).sum(),
        avg_thrust: if moves > 0 {
            thrust_total as f64 / moves as f64
        } else {
            0.0
        },
    };

    tracing::debug!(
        bot = %metrics.bot_id,
        circuit = %metrics.circuit_label,
        turns = metrics.turns,
        finished = metrics.finished,
        "race complete"
    );

    Ok(RunArtifact {
        metrics,
        input_transcript,
        output_transcript,
    })
}

pub fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }
    fs::write(path, text).with_context(|| format!("failed writing {}", path.display()))
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize json")?;
    write_text(path, &json)
}
