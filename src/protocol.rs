//! Line-based game protocol.
//!
//! Single-pod games send, every turn,
//! `x y nextCheckpointX nextCheckpointY nextCheckpointDist nextCheckpointAngle`
//! followed by `opponentX opponentY`.
//!
//! Team games start with `laps`, `checkpointCount` and one `x y` line per
//! checkpoint, then send `x y vx vy angle nextCheckpointId` for each of our
//! pods followed by the same for each opposing pod.
//!
//! Tokens are whitespace separated; line breaks carry no meaning.

use crate::circuit::Circuit;
use crate::steering::PodMove;
use crate::vector::{MapPoint, Vector2};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::io::{self, BufRead, Write};

pub const TEAM_SIZE: usize = 2;

/// Largest checkpoint count a race header may announce.
pub const MAX_CHECKPOINTS: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Single,
    Team,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Team => "team",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    UnexpectedEof { field: &'static str },
    InvalidInteger { field: &'static str, token: String },
    InvalidHeader { field: &'static str, value: i64 },
    CheckpointOutOfRange { id: i64, count: usize },
    WrongTurnKind { expected: Protocol },
    Io(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof { field } => write!(f, "input ended while reading {field}"),
            Self::InvalidInteger { field, token } => {
                write!(f, "invalid integer for {field}: {token:?}")
            }
            Self::InvalidHeader { field, value } => write!(f, "invalid {field}: {value}"),
            Self::CheckpointOutOfRange { id, count } => {
                write!(f, "checkpoint id {id} out of range for {count} checkpoints")
            }
            Self::WrongTurnKind { expected } => {
                write!(f, "expected a {} protocol turn", expected.as_str())
            }
            Self::Io(message) => write!(f, "io error: {message}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<io::Error> for ProtocolError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Race setup sent once at the start of a team game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RaceHeader {
    pub laps: u32,
    pub circuit: Circuit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SingleTurn {
    pub position: MapPoint,
    pub checkpoint: MapPoint,
    pub checkpoint_distance: i32,
    pub checkpoint_angle: i32,
    pub opponent: MapPoint,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PodReport {
    pub position: MapPoint,
    pub vx: i32,
    pub vy: i32,
    /// Absolute facing in degrees; the engine sends -1 before the first move.
    pub angle: i32,
    pub next_checkpoint_id: usize,
}

impl PodReport {
    pub fn velocity(&self) -> Vector2 {
        Vector2::new(self.vx as f64, self.vy as f64)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TeamTurn {
    pub own: [PodReport; TEAM_SIZE],
    pub opponents: [PodReport; TEAM_SIZE],
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum TurnInput {
    Single(SingleTurn),
    Team(TeamTurn),
}

pub struct TurnReader<R> {
    inner: R,
    pending: VecDeque<String>,
    line: String,
}

impl<R: BufRead> TurnReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pending: VecDeque::new(),
            line: String::new(),
        }
    }

    /// True while there are tokens left to read.
    pub fn has_more(&mut self) -> Result<bool, ProtocolError> {
        while self.pending.is_empty() {
            self.line.clear();
            if self.inner.read_line(&mut self.line)? == 0 {
                return Ok(false);
            }
            self.pending
                .extend(self.line.split_whitespace().map(str::to_string));
        }
        Ok(true)
    }

    fn next_i32(&mut self, field: &'static str) -> Result<i32, ProtocolError> {
        if !self.has_more()? {
            return Err(ProtocolError::UnexpectedEof { field });
        }
        let token = self
            .pending
            .pop_front()
            .ok_or(ProtocolError::UnexpectedEof { field })?;
        token
            .parse::<i32>()
            .map_err(|_| ProtocolError::InvalidInteger { field, token })
    }

    fn next_point(&mut self, x: &'static str, y: &'static str) -> Result<MapPoint, ProtocolError> {
        Ok(MapPoint::new(self.next_i32(x)?, self.next_i32(y)?))
    }

    pub fn read_header(&mut self) -> Result<RaceHeader, ProtocolError> {
        let laps = self.next_i32("laps")?;
        if laps < 1 {
            return Err(ProtocolError::InvalidHeader {
                field: "laps",
                value: laps as i64,
            });
        }
        let count = self.next_i32("checkpointCount")?;
        if count < 2 || count as usize > MAX_CHECKPOINTS {
            return Err(ProtocolError::InvalidHeader {
                field: "checkpointCount",
                value: count as i64,
            });
        }
        let mut checkpoints = Vec::with_capacity(count as usize);
        for _ in 0..count {
            checkpoints.push(self.next_point("checkpointX", "checkpointY")?);
        }
        Ok(RaceHeader {
            laps: laps as u32,
            circuit: Circuit::new(checkpoints),
        })
    }

    /// `None` when the input ends cleanly between turns.
    pub fn read_single_turn(&mut self) -> Result<Option<SingleTurn>, ProtocolError> {
        if !self.has_more()? {
            return Ok(None);
        }
        Ok(Some(SingleTurn {
            position: self.next_point("x", "y")?,
            checkpoint: self.next_point("nextCheckpointX", "nextCheckpointY")?,
            checkpoint_distance: self.next_i32("nextCheckpointDist")?,
            checkpoint_angle: self.next_i32("nextCheckpointAngle")?,
            opponent: self.next_point("opponentX", "opponentY")?,
        }))
    }

    fn read_pod(&mut self, checkpoint_count: usize) -> Result<PodReport, ProtocolError> {
        let position = self.next_point("x", "y")?;
        let vx = self.next_i32("vx")?;
        let vy = self.next_i32("vy")?;
        let angle = self.next_i32("angle")?;
        let id = self.next_i32("nextCheckPointId")?;
        if id < 0 || id as usize >= checkpoint_count {
            return Err(ProtocolError::CheckpointOutOfRange {
                id: id as i64,
                count: checkpoint_count,
            });
        }
        Ok(PodReport {
            position,
            vx,
            vy,
            angle,
            next_checkpoint_id: id as usize,
        })
    }

    /// `None` when the input ends cleanly between turns.
    pub fn read_team_turn(
        &mut self,
        checkpoint_count: usize,
    ) -> Result<Option<TeamTurn>, ProtocolError> {
        if !self.has_more()? {
            return Ok(None);
        }
        let own = [self.read_pod(checkpoint_count)?, self.read_pod(checkpoint_count)?];
        let opponents = [self.read_pod(checkpoint_count)?, self.read_pod(checkpoint_count)?];
        Ok(Some(TeamTurn { own, opponents }))
    }
}

/// Writes one line per move and flushes, so the engine sees the turn at once.
pub fn write_moves<W: Write>(out: &mut W, moves: &[PodMove]) -> io::Result<()> {
    for mv in moves {
        writeln!(out, "{mv}")?;
    }
    out.flush()
}

pub fn format_header(header: &RaceHeader) -> String {
    let mut text = format!("{}\n{}\n", header.laps, header.circuit.len());
    for cp in &header.circuit.checkpoints {
        text.push_str(&format!("{} {}\n", cp.x, cp.y));
    }
    text
}

pub fn format_single_turn(turn: &SingleTurn) -> String {
    format!(
        "{} {} {} {} {} {}\n{} {}\n",
        turn.position.x,
        turn.position.y,
        turn.checkpoint.x,
        turn.checkpoint.y,
        turn.checkpoint_distance,
        turn.checkpoint_angle,
        turn.opponent.x,
        turn.opponent.y
    )
}

pub fn format_team_turn(turn: &TeamTurn) -> String {
    let mut text = String::new();
    for pod in turn.own.iter().chain(turn.opponents.iter()) {
        text.push_str(&format!(
            "{} {} {} {} {} {}\n",
            pod.position.x, pod.position.y, pod.vx, pod.vy, pod.angle, pod.next_checkpoint_id
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steering::Command;
    use std::io::Cursor;

    #[test]
    fn single_turns_until_clean_eof() {
        let input = "100 200 8000 4500 7920 -12\n300 400\n110 205 8000 4500 7900 -10\n310 410\n";
        let mut reader = TurnReader::new(Cursor::new(input));

        let first = reader.read_single_turn().unwrap().unwrap();
        assert_eq!(first.position, MapPoint::new(100, 200));
        assert_eq!(first.checkpoint, MapPoint::new(8_000, 4_500));
        assert_eq!(first.checkpoint_distance, 7_920);
        assert_eq!(first.checkpoint_angle, -12);
        assert_eq!(first.opponent, MapPoint::new(300, 400));

        assert!(reader.read_single_turn().unwrap().is_some());
        assert_eq!(reader.read_single_turn().unwrap(), None);
    }

    #[test]
    fn truncated_turn_is_an_error() {
        let mut reader = TurnReader::new(Cursor::new("100 200 8000 4500\n"));
        assert_eq!(
            reader.read_single_turn(),
            Err(ProtocolError::UnexpectedEof {
                field: "nextCheckpointDist"
            })
        );
    }

    #[test]
    fn bad_token_names_the_field() {
        let mut reader = TurnReader::new(Cursor::new("3\nfour\n"));
        assert_eq!(
            reader.read_header(),
            Err(ProtocolError::InvalidInteger {
                field: "checkpointCount",
                token: "four".to_string()
            })
        );
    }

    #[test]
    fn header_and_team_turn() {
        let input = "\
3
3
1000 1000
5000 1000
3000 4000
1000 1500 0 0 -1 1
1000 500 0 0 -1 1
1000 2500 0 0 -1 1
1000 -500 0 0 -1 1
";
        let mut reader = TurnReader::new(Cursor::new(input));
        let header = reader.read_header().unwrap();
        assert_eq!(header.laps, 3);
        assert_eq!(header.circuit.len(), 3);
        assert_eq!(header.circuit.checkpoints[2], MapPoint::new(3_000, 4_000));

        let turn = reader.read_team_turn(header.circuit.len()).unwrap().unwrap();
        assert_eq!(turn.own[1].position, MapPoint::new(1_000, 500));
        assert_eq!(turn.opponents[0].angle, -1);
        assert_eq!(turn.opponents[1].next_checkpoint_id, 1);
        assert_eq!(reader.read_team_turn(3).unwrap(), None);
    }

    #[test]
    fn header_rejects_degenerate_races() {
        let mut reader = TurnReader::new(Cursor::new("0 2 0 0 1 1"));
        assert!(matches!(
            reader.read_header(),
            Err(ProtocolError::InvalidHeader { field: "laps", .. })
        ));
        let mut reader = TurnReader::new(Cursor::new("3 1 0 0"));
        assert!(matches!(
            reader.read_header(),
            Err(ProtocolError::InvalidHeader {
                field: "checkpointCount",
                ..
            })
        ));
    }

    #[test]
    fn header_rejects_absurd_checkpoint_counts() {
        let mut reader = TurnReader::new(Cursor::new("3 2000000000 0 0"));
        assert_eq!(
            reader.read_header(),
            Err(ProtocolError::InvalidHeader {
                field: "checkpointCount",
                value: 2_000_000_000
            })
        );
        let mut reader = TurnReader::new(Cursor::new("3 65"));
        assert!(reader.read_header().is_err());
    }

    #[test]
    fn checkpoint_id_must_exist() {
        let mut reader = TurnReader::new(Cursor::new("0 0 0 0 0 7"));
        assert_eq!(
            reader.read_team_turn(3),
            Err(ProtocolError::CheckpointOutOfRange { id: 7, count: 3 })
        );
    }

    #[test]
    fn formatted_turns_parse_back() {
        let header = RaceHeader {
            laps: 2,
            circuit: Circuit::new(vec![MapPoint::new(1, 2), MapPoint::new(3, 4)]),
        };
        let pod = PodReport {
            position: MapPoint::new(-5, 6),
            vx: 7,
            vy: -8,
            angle: 359,
            next_checkpoint_id: 1,
        };
        let turn = TeamTurn {
            own: [pod, pod],
            opponents: [pod, pod],
        };
        let text = format_header(&header) + &format_team_turn(&turn);
        let mut reader = TurnReader::new(Cursor::new(text));
        assert_eq!(reader.read_header().unwrap(), header);
        assert_eq!(reader.read_team_turn(2).unwrap(), Some(turn));
    }

    #[test]
    fn moves_are_written_one_per_line() {
        let mut out = Vec::new();
        write_moves(
            &mut out,
            &[
                PodMove {
                    target: MapPoint::new(1, 2),
                    command: Command::Thrust(100),
                },
                PodMove {
                    target: MapPoint::new(3, 4),
                    command: Command::Boost,
                },
            ],
        )
        .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1 2 100\n3 4 BOOST\n");
    }
}
