use crate::circuit::Circuit;
use crate::vector::MapPoint;
use anyhow::{anyhow, Context, Result};

pub fn parse_seed(seed: &str) -> Result<u32> {
    let s = seed.trim();
    if s.is_empty() {
        return Err(anyhow!("empty seed"));
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).with_context(|| format!("invalid hex seed: {s}"))
    } else {
        s.parse::<u32>()
            .with_context(|| format!("invalid decimal seed: {s}"))
    }
}

pub fn seed_to_hex(seed: u32) -> String {
    format!("0x{seed:08x}")
}

pub fn parse_seed_csv(input: &str) -> Result<Vec<u32>> {
    let mut seeds = Vec::new();
    for token in input.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        seeds.push(parse_seed(token)?);
    }
    if seeds.is_empty() {
        return Err(anyhow!("no seeds parsed from --seeds"));
    }
    Ok(seeds)
}

/// `count` seeds walked from `start` with a 32-bit LCG step.
pub fn seed_sequence(start: u32, count: u32) -> Vec<u32> {
    let mut out = Vec::with_capacity(count as usize);
    let mut cur = start;
    for _ in 0..count {
        out.push(cur);
        cur = cur.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
    }
    out
}

/// Parses `"x,y;x,y;..."` into a circuit of at least two checkpoints.
pub fn parse_circuit_spec(input: &str) -> Result<Circuit> {
    let mut checkpoints = Vec::new();
    for pair in input.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let (x, y) = pair
            .split_once(',')
            .ok_or_else(|| anyhow!("checkpoint '{pair}' is not of the form x,y"))?;
        let x = x
            .trim()
            .parse::<i32>()
            .with_context(|| format!("invalid x in checkpoint '{pair}'"))?;
        let y = y
            .trim()
            .parse::<i32>()
            .with_context(|| format!("invalid y in checkpoint '{pair}'"))?;
        checkpoints.push(MapPoint::new(x, y));
    }
    if checkpoints.len() < 2 {
        return Err(anyhow!(
            "a circuit needs at least two checkpoints, got {}",
            checkpoints.len()
        ));
    }
    Ok(Circuit::new(checkpoints))
}
