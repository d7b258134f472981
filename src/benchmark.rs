use crate::bots::{bot_ids, create_bot};
use crate::library::{random_circuit, recorded_circuits};
use crate::runner::{run_race, write_json, write_text, RaceSpec, RunMetrics};
use crate::util::seed_to_hex;
use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    pub bots: Vec<String>,
    pub seeds: Vec<u32>,
    pub include_recorded: bool,
    pub laps: u32,
    pub max_turns: u32,
    pub out_dir: PathBuf,
    pub save_top: usize,
    pub jobs: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRecord {
    pub bot_id: String,
    pub bot_fingerprint: String,
    pub circuit_label: String,
    pub checkpoint_count: usize,
    pub turns: u32,
    pub finished: bool,
    pub timed_out: bool,
    pub checkpoints_passed: u32,
    pub boosts_used: u32,
    pub avg_thrust: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BotAggregate {
    pub bot_id: String,
    pub bot_fingerprint: String,
    pub runs: usize,
    pub finish_rate: f64,
    pub timeouts: usize,
    /// Mean turns over finished runs only; 0 when nothing finished.
    pub avg_finish_turns: f64,
    pub best_finish_turns: Option<u32>,
    pub avg_checkpoints: f64,
    pub avg_thrust: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SavedTranscriptRecord {
    pub rank: usize,
    pub bot_id: String,
    pub circuit_label: String,
    pub turns: u32,
    pub input_path: String,
    pub output_path: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub generated_unix_s: u64,
    pub laps: u32,
    pub max_turns: u32,
    pub jobs: Option<usize>,
    pub bots: Vec<String>,
    pub seeds: Vec<u32>,
    pub circuits: Vec<String>,
    pub run_count: usize,
    pub bot_rankings: Vec<BotAggregate>,
    pub runs: Vec<RunRecord>,
    pub saved_transcripts: Vec<SavedTranscriptRecord>,
}

#[derive(Clone, Debug)]
struct InternalRun {
    metrics: RunMetrics,
    input_transcript: String,
    output_transcript: String,
}

pub fn resolve_bots(input: Option<&str>) -> Result<Vec<String>> {
    let bots: Vec<String> = match input {
        None => bot_ids().iter().map(|id| (*id).to_string()).collect(),
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect(),
    };
    if bots.is_empty() {
        return Err(anyhow!("--bots resolved to empty list"));
    }
    for bot in &bots {
        if create_bot(bot).is_none() {
            return Err(anyhow!("unknown bot '{bot}'"));
        }
    }
    Ok(bots)
}

/// Recorded layouts first, then one random layout per seed.
pub fn race_specs(config: &BenchmarkConfig) -> Vec<RaceSpec> {
    let mut races = Vec::new();
    if config.include_recorded {
        for (index, circuit) in recorded_circuits().into_iter().enumerate() {
            races.push(RaceSpec {
                label: format!("recorded-{index:02}"),
                circuit,
                laps: config.laps,
                max_turns: config.max_turns,
            });
        }
    }
    for seed in &config.seeds {
        races.push(RaceSpec {
            label: format!("seed-{}", seed_to_hex(*seed)),
            circuit: random_circuit(*seed),
            laps: config.laps,
            max_turns: config.max_turns,
        });
    }
    races
}

pub fn run_benchmark(config: BenchmarkConfig) -> Result<BenchmarkReport> {
    if config.bots.is_empty() {
        return Err(anyhow!("benchmark requires at least one bot"));
    }
    let races = race_specs(&config);
    if races.is_empty() {
        return Err(anyhow!("benchmark requires recorded circuits or at least one seed"));
    }
    if let Some(jobs) = config.jobs {
        if jobs == 0 {
            return Err(anyhow!("benchmark --jobs must be >= 1 when provided"));
        }
    }
    fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("failed creating {}", config.out_dir.display()))?;

    let run_jobs: Vec<(&String, &RaceSpec)> = config
        .bots
        .iter()
        .flat_map(|bot| races.iter().map(move |race| (bot, race)))
        .collect();

    let run_one = |(bot_id, race): &(&String, &RaceSpec)| -> Result<InternalRun> {
        let artifact = run_race(bot_id, race).with_context(|| {
            format!("benchmark run failed for bot={bot_id} circuit={}", race.label)
        })?;
        Ok(InternalRun {
            metrics: artifact.metrics,
            input_transcript: artifact.input_transcript,
            output_transcript: artifact.output_transcript,
        })
    };

    let run_results: Vec<Result<InternalRun>> = if let Some(jobs) = config.jobs {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| run_jobs.par_iter().map(run_one).collect())
    } else {
        run_jobs.par_iter().map(run_one).collect()
    };

    let mut runs = Vec::with_capacity(run_results.len());
    for result in run_results {
        runs.push(result?);
    }

    let mut grouped: HashMap<String, Vec<&RunMetrics>> = HashMap::new();
    for run in &runs {
        grouped
            .entry(run.metrics.bot_id.clone())
            .or_default()
            .push(&run.metrics);
    }

    let mut rankings: Vec<BotAggregate> = grouped
        .into_iter()
        .map(|(bot_id, metrics)| aggregate(bot_id, &metrics))
        .collect();
    rankings.sort_by(|a, b| {
        b.finish_rate
            .total_cmp(&a.finish_rate)
            .then_with(|| a.avg_finish_turns.total_cmp(&b.avg_finish_turns))
            .then_with(|| b.avg_checkpoints.total_cmp(&a.avg_checkpoints))
            .then_with(|| a.bot_id.cmp(&b.bot_id))
    });

    let mut run_records: Vec<RunRecord> = runs
        .iter()
        .map(|run| RunRecord {
            bot_id: run.metrics.bot_id.clone(),
            bot_fingerprint: run.metrics.bot_fingerprint.clone(),
            circuit_label: run.metrics.circuit_label.clone(),
            checkpoint_count: run.metrics.checkpoint_count,
            turns: run.metrics.turns,
            finished: run.metrics.finished,
            timed_out: run.metrics.timed_out,
            checkpoints_passed: run.metrics.checkpoints_passed,
            boosts_used: run.metrics.boosts_used,
            avg_thrust: run.metrics.avg_thrust,
        })
        .collect();
    run_records.sort_by(|a, b| {
        a.circuit_label
            .cmp(&b.circuit_label)
            .then_with(|| b.finished.cmp(&a.finished))
            .then_with(|| a.turns.cmp(&b.turns))
            .then_with(|| a.bot_id.cmp(&b.bot_id))
    });

    let saved_transcripts = if config.save_top > 0 {
        save_fastest_transcripts(&config.out_dir, &runs, config.save_top)?
    } else {
        Vec::new()
    };

    write_runs_csv(&config.out_dir.join("runs.csv"), &run_records)?;
    write_rankings_csv(&config.out_dir.join("rankings.csv"), &rankings)?;

    let report = BenchmarkReport {
        generated_unix_s: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        laps: config.laps,
        max_turns: config.max_turns,
        jobs: config.jobs,
        circuits: races.iter().map(|race| race.label.clone()).collect(),
        bots: config.bots,
        seeds: config.seeds,
        run_count: run_records.len(),
        bot_rankings: rankings,
        runs: run_records,
        saved_transcripts,
    };
    write_json(&config.out_dir.join("summary.json"), &report)?;

    tracing::info!(
        runs = report.run_count,
        out_dir = %config.out_dir.display(),
        "benchmark complete"
    );
    Ok(report)
}

fn aggregate(bot_id: String, metrics: &[&RunMetrics]) -> BotAggregate {
    let runs = metrics.len();
    let finished: Vec<u32> = metrics
        .iter()
        .filter(|m| m.finished)
        .map(|m| m.turns)
        .collect();
    let per_run = |total: f64| if runs > 0 { total / runs as f64 } else { 0.0 };

    BotAggregate {
        bot_fingerprint: metrics
            .first()
            .map(|m| m.bot_fingerprint.clone())
            .unwrap_or_else(|| "unknown".to_string()),
        runs,
        finish_rate: per_run(finished.len() as f64),
        timeouts: metrics.iter().filter(|m| m.timed_out).count(),
        avg_finish_turns: if finished.is_empty() {
            0.0
        } else {
            finished.iter().map(|&t| t as f64).sum::<f64>() / finished.len() as f64
        },
        best_finish_turns: finished.iter().copied().min(),
        avg_checkpoints: per_run(metrics.iter().map(|m| m.checkpoints_passed as f64).sum()),
        avg_thrust: per_run(metrics.iter().map(|m| m.avg_thrust).sum()),
        bot_id,
    }
}

/// Writes the protocol transcripts of the `count` fastest finished runs.
fn save_fastest_transcripts(
    out_dir: &Path,
    runs: &[InternalRun],
    count: usize,
) -> Result<Vec<SavedTranscriptRecord>> {
    let mut order: Vec<&InternalRun> = runs.iter().filter(|run| run.metrics.finished).collect();
    order.sort_by(|a, b| {
        a.metrics
            .turns
            .cmp(&b.metrics.turns)
            .then_with(|| a.metrics.bot_id.cmp(&b.metrics.bot_id))
            .then_with(|| a.metrics.circuit_label.cmp(&b.metrics.circuit_label))
    });

    let save_dir = out_dir.join("top-fastest");
    let mut saved = Vec::new();
    for (idx, run) in order.into_iter().take(count).enumerate() {
        let rank = idx + 1;
        let base = format!(
            "rank{rank:02}-{}-{}-turns{}",
            run.metrics.bot_id, run.metrics.circuit_label, run.metrics.turns
        );
        let input_path = save_dir.join(format!("{base}.in"));
        let output_path = save_dir.join(format!("{base}.out"));
        write_text(&input_path, &run.input_transcript)?;
        write_text(&output_path, &run.output_transcript)?;
        write_json(&save_dir.join(format!("{base}.json")), &run.metrics)?;

        saved.push(SavedTranscriptRecord {
            rank,
            bot_id: run.metrics.bot_id.clone(),
            circuit_label: run.metrics.circuit_label.clone(),
            turns: run.metrics.turns,
            input_path: input_path.to_string_lossy().into_owned(),
            output_path: output_path.to_string_lossy().into_owned(),
        });
    }
    Ok(saved)
}

fn write_runs_csv(path: &Path, rows: &[RunRecord]) -> Result<()> {
    let mut csv = String::from(
        "bot_id,bot_fingerprint,circuit_label,checkpoint_count,turns,finished,timed_out,checkpoints_passed,boosts_used,avg_thrust\n",
    );
    for row in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{:.2}\n",
            row.bot_id,
            row.bot_fingerprint,
            row.circuit_label,
            row.checkpoint_count,
            row.turns,
            row.finished,
            row.timed_out,
            row.checkpoints_passed,
            row.boosts_used,
            row.avg_thrust
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}

fn write_rankings_csv(path: &Path, rows: &[BotAggregate]) -> Result<()> {
    let mut csv = String::from(
        "rank,bot_id,bot_fingerprint,runs,finish_rate,timeouts,avg_finish_turns,best_finish_turns,avg_checkpoints,avg_thrust\n",
    );
    for (idx, row) in rows.iter().enumerate() {
        csv.push_str(&format!(
            "{},{},{},{},{:.4},{},{:.2},{},{:.2},{:.2}\n",
            idx + 1,
            row.bot_id,
            row.bot_fingerprint,
            row.runs,
            row.finish_rate,
            row.timeouts,
            row.avg_finish_turns,
            row.best_finish_turns
                .map(|turns| turns.to_string())
                .unwrap_or_default(),
            row.avg_checkpoints,
            row.avg_thrust
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}
