use crate::bots::AutopilotBot;
use crate::clock::FrameClock;
use crate::protocol::{write_moves, Protocol, TurnInput, TurnReader};
use crate::steering::Command;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::{BufRead, Write};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub turns: u32,
    pub moves: u32,
    pub boosts: u32,
}

/// Plays one game over a line protocol until the input ends between turns.
pub fn run_session<R: BufRead, W: Write>(
    bot: &mut dyn AutopilotBot,
    input: R,
    mut output: W,
    clock: &mut FrameClock,
) -> Result<SessionSummary> {
    let mut reader = TurnReader::new(input);
    let protocol = bot.protocol();

    let header = match protocol {
        Protocol::Team => Some(reader.read_header().context("failed reading race header")?),
        Protocol::Single => None,
    };
    bot.reset(header.as_ref());
    if let Some(header) = &header {
        tracing::info!(
            bot = bot.id(),
            laps = header.laps,
            checkpoints = header.circuit.len(),
            "race header"
        );
    }

    let mut summary = SessionSummary::default();
    loop {
        let turn_number = summary.turns + 1;
        let turn = match (protocol, &header) {
            (Protocol::Single, _) => reader.read_single_turn()?.map(TurnInput::Single),
            (Protocol::Team, Some(header)) => reader
                .read_team_turn(header.circuit.len())?
                .map(TurnInput::Team),
            (Protocol::Team, None) => None,
        };
        let Some(turn) = turn else {
            break;
        };

        let elapsed = clock.tick();
        let moves = bot
            .next_moves(&turn, elapsed)
            .with_context(|| format!("bot {} failed on turn {turn_number}", bot.id()))?;
        write_moves(&mut output, &moves).context("failed writing moves")?;

        summary.turns = turn_number;
        summary.moves += moves.len() as u32;
        summary.boosts += moves
            .iter()
            .filter(|mv| mv.command == Command::Boost)
            .count() as u32;
    }

    tracing::info!(
        bot = bot.id(),
        turns = summary.turns,
        boosts = summary.boosts,
        "input closed"
    );
    Ok(summary)
}
