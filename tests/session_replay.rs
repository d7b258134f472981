use anyhow::Result;
use pod_autopilot::bots::{bot_ids, create_bot};
use pod_autopilot::clock::{FrameClock, TURN_SECS};
use pod_autopilot::library::recorded_circuits;
use pod_autopilot::runner::{run_race, RaceSpec};
use pod_autopilot::session::run_session;
use std::io::Cursor;

#[test]
fn live_session_reproduces_simulated_races() -> Result<()> {
    // Single-pod input carries no lap count, so live bots assume the three
    // laps of their presets.
    let race = RaceSpec {
        label: "recorded-03".to_string(),
        circuit: recorded_circuits()[3].clone(),
        laps: 3,
        max_turns: 1_000,
    };

    for bot_id in bot_ids() {
        let artifact = run_race(bot_id, &race)?;
        let mut bot = create_bot(bot_id).expect("roster bot");
        let mut output = Vec::new();
        let summary = run_session(
            bot.as_mut(),
            Cursor::new(artifact.input_transcript.as_bytes()),
            &mut output,
            &mut FrameClock::fixed(TURN_SECS),
        )?;

        assert_eq!(summary.turns, artifact.metrics.turns, "{bot_id}");
        assert_eq!(summary.boosts, artifact.metrics.boosts_used, "{bot_id}");
        assert_eq!(String::from_utf8(output)?, artifact.output_transcript, "{bot_id}");
    }
    Ok(())
}

#[test]
fn team_session_answers_two_lines_per_turn() -> Result<()> {
    let input = "\
3
3
2000 2000
10000 2000
6000 7000
2000 2500 0 0 -1 1
2000 1500 0 0 -1 1
2000 3500 0 0 -1 1
2000 500 0 0 -1 1
2150 2490 127 -8 356 1
2150 1510 127 8 4 1
2000 3500 0 0 0 1
2000 500 0 0 0 1
";
    let mut bot = create_bot("squad-lookahead").expect("roster bot");
    let mut output = Vec::new();
    let summary = run_session(
        bot.as_mut(),
        Cursor::new(input),
        &mut output,
        &mut FrameClock::fixed(TURN_SECS),
    )?;

    assert_eq!(summary.turns, 2);
    assert_eq!(summary.moves, 4);
    let text = String::from_utf8(output)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "10000 2000 100");
    assert_eq!(lines[1], "10000 2000 100");
    for line in &lines[2..] {
        let fields: Vec<&str> = line.split(' ').collect();
        assert_eq!(fields.len(), 3);
        fields[0].parse::<i32>()?;
        fields[1].parse::<i32>()?;
        let thrust = fields[2].parse::<u8>()?;
        assert!(thrust <= 100);
    }
    Ok(())
}

#[test]
fn session_rejects_a_broken_header() {
    let mut bot = create_bot("squad-lookahead").expect("roster bot");
    let result = run_session(
        bot.as_mut(),
        Cursor::new("3\n1\n100 100\n"),
        Vec::new(),
        &mut FrameClock::fixed(TURN_SECS),
    );
    assert!(result.is_err());
}
