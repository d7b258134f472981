use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use pod_autopilot::benchmark::{resolve_bots, run_benchmark, BenchmarkConfig};
use pod_autopilot::bots::{
    bot_ids, bot_manifest_entries, create_bot_with_config, describe_bots, AutopilotBot,
};
use pod_autopilot::clock::FrameClock;
use pod_autopilot::config::SteeringConfig;
use pod_autopilot::library::{random_circuit, recorded_circuits};
use pod_autopilot::runner::{run_race_instance, write_json, write_text, RaceSpec};
use pod_autopilot::session::run_session;
use pod_autopilot::util::{
    parse_circuit_spec, parse_seed, parse_seed_csv, seed_sequence, seed_to_hex,
};
use std::io;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(name = "pod-autopilot")]
#[command(about = "Heuristic pod racing autopilot with an offline simulator and benchmark")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Race live: read turns on stdin, write moves on stdout
    Play {
        #[arg(long, default_value = "squad-lookahead")]
        bot: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List available bots
    ListBots,
    /// Export full bot manifest (including config fingerprints)
    RosterManifest {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the effective steering config of a bot
    ShowConfig {
        #[arg(long, default_value = "squad-lookahead")]
        bot: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Race one bot through one simulated circuit
    Simulate {
        #[arg(long, default_value = "squad-lookahead")]
        bot: String,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Checkpoints as "x,y;x,y;..."
        #[arg(long, conflicts_with_all = ["seed", "recorded"])]
        circuit: Option<String>,
        /// Seed of a random circuit
        #[arg(long, conflicts_with = "recorded")]
        seed: Option<String>,
        /// Index into the recorded circuits (default 0)
        #[arg(long)]
        recorded: Option<usize>,
        #[arg(long, default_value_t = 3)]
        laps: u32,
        #[arg(long, default_value_t = 1_000)]
        max_turns: u32,
        /// Metrics JSON destination
        #[arg(long)]
        output: Option<PathBuf>,
        /// Writes <path>.in and <path>.out protocol transcripts
        #[arg(long)]
        transcript: Option<PathBuf>,
    },
    /// Run every bot over recorded and seeded circuits
    Benchmark {
        #[arg(long)]
        bots: Option<String>,
        #[arg(long)]
        seeds: Option<String>,
        #[arg(long)]
        seed_start: Option<String>,
        #[arg(long, default_value_t = 12)]
        seed_count: u32,
        /// Only race seeded circuits
        #[arg(long)]
        skip_recorded: bool,
        #[arg(long, default_value_t = 3)]
        laps: u32,
        #[arg(long, default_value_t = 1_000)]
        max_turns: u32,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long, default_value_t = 4)]
        save_top: usize,
        #[arg(long)]
        jobs: Option<usize>,
    },
}

fn main() -> Result<()> {
    // stdout carries protocol output only.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match Cli::parse().command {
        Commands::Play { bot, config } => {
            let cfg = SteeringConfig::resolve(&bot, config.as_deref())?;
            let mut bot = lookup_bot(&bot, cfg)?;
            let stdin = io::stdin();
            let stdout = io::stdout();
            let summary = run_session(
                bot.as_mut(),
                stdin.lock(),
                stdout.lock(),
                &mut FrameClock::monotonic(),
            )?;
            tracing::info!(turns = summary.turns, boosts = summary.boosts, "session over");
        }
        Commands::ListBots => {
            for (id, description) in describe_bots() {
                println!("{id:20} {description}");
            }
        }
        Commands::RosterManifest { output } => {
            let manifest = bot_manifest_entries();
            if let Some(path) = output {
                write_json(&path, &manifest)?;
                println!("wrote={}", path.display());
                println!("bots={}", manifest.len());
            } else {
                println!("{}", serde_json::to_string_pretty(&manifest)?);
            }
        }
        Commands::ShowConfig { bot, config } => {
            let cfg = SteeringConfig::resolve(&bot, config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&cfg)?);
        }
        Commands::Simulate {
            bot,
            config,
            circuit,
            seed,
            recorded,
            laps,
            max_turns,
            output,
            transcript,
        } => {
            let cfg = SteeringConfig::resolve(&bot, config.as_deref())?;
            let mut bot = lookup_bot(&bot, cfg)?;
            let race = resolve_race(circuit.as_deref(), seed.as_deref(), recorded, laps, max_turns)?;
            let artifact = run_race_instance(bot.as_mut(), &race)?;
            let metrics = &artifact.metrics;

            println!("bot={}", metrics.bot_id);
            println!("bot_fingerprint={}", metrics.bot_fingerprint);
            println!("circuit={}", metrics.circuit_label);
            println!("checkpoints={}", metrics.checkpoint_count);
            println!("laps={}", metrics.laps);
            println!("turns={}", metrics.turns);
            println!("finished={}", metrics.finished);
            println!("timed_out={}", metrics.timed_out);
            println!("checkpoints_passed={}", metrics.checkpoints_passed);
            println!("boosts_used={}", metrics.boosts_used);
            println!("avg_thrust={:.2}", metrics.avg_thrust);

            if let Some(path) = output {
                write_json(&path, metrics)?;
                println!("output={}", path.display());
            }
            if let Some(base) = transcript {
                let input_path = base.with_extension("in");
                let output_path = base.with_extension("out");
                write_text(&input_path, &artifact.input_transcript)?;
                write_text(&output_path, &artifact.output_transcript)?;
                println!("transcript_in={}", input_path.display());
                println!("transcript_out={}", output_path.display());
            }
        }
        Commands::Benchmark {
            bots,
            seeds,
            seed_start,
            seed_count,
            skip_recorded,
            laps,
            max_turns,
            out_dir,
            save_top,
            jobs,
        } => {
            let bots = resolve_bots(bots.as_deref())?;
            let seeds = resolve_seeds(seeds.as_deref(), seed_start.as_deref(), seed_count)?;
            let out_dir = out_dir
                .unwrap_or_else(|| PathBuf::from(format!("benchmarks/race-{}", timestamp_suffix())));

            let report = run_benchmark(BenchmarkConfig {
                bots,
                seeds,
                include_recorded: !skip_recorded,
                laps,
                max_turns,
                out_dir: out_dir.clone(),
                save_top,
                jobs,
            })?;

            println!("runs={}", report.run_count);
            println!("circuits={}", report.circuits.len());
            println!(
                "jobs={}",
                report
                    .jobs
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "auto".to_string())
            );
            println!("out_dir={}", out_dir.display());
            println!("rankings:");
            for (idx, bot) in report.bot_rankings.iter().enumerate() {
                println!(
                    "  {}. {}  finished={:.0}% avg_finish_turns={:.1} avg_checkpoints={:.1} avg_thrust={:.1} timeouts={}",
                    idx + 1,
                    bot.bot_id,
                    bot.finish_rate * 100.0,
                    bot.avg_finish_turns,
                    bot.avg_checkpoints,
                    bot.avg_thrust,
                    bot.timeouts,
                );
            }
            println!("saved transcripts:");
            for saved in &report.saved_transcripts {
                println!(
                    "  #{:02} {} {} turns={}",
                    saved.rank, saved.bot_id, saved.circuit_label, saved.turns
                );
            }
        }
    }

    Ok(())
}

fn lookup_bot(id: &str, cfg: SteeringConfig) -> Result<Box<dyn AutopilotBot>> {
    create_bot_with_config(id, cfg).ok_or_else(|| {
        let available = bot_ids().join(", ");
        anyhow!("unknown bot '{id}'. available: {available}")
    })
}

fn resolve_race(
    circuit: Option<&str>,
    seed: Option<&str>,
    recorded: Option<usize>,
    laps: u32,
    max_turns: u32,
) -> Result<RaceSpec> {
    let (label, circuit) = if let Some(spec) = circuit {
        ("custom".to_string(), parse_circuit_spec(spec)?)
    } else if let Some(seed) = seed {
        let seed = parse_seed(seed)?;
        (format!("seed-{}", seed_to_hex(seed)), random_circuit(seed))
    } else {
        let index = recorded.unwrap_or(0);
        let circuits = recorded_circuits();
        let count = circuits.len();
        let circuit = circuits
            .into_iter()
            .nth(index)
            .with_context(|| format!("recorded circuit {index} out of range (0..{count})"))?;
        (format!("recorded-{index:02}"), circuit)
    };
    Ok(RaceSpec {
        label,
        circuit,
        laps,
        max_turns,
    })
}

fn resolve_seeds(
    seeds: Option<&str>,
    seed_start: Option<&str>,
    seed_count: u32,
) -> Result<Vec<u32>> {
    if let Some(csv) = seeds {
        return parse_seed_csv(csv);
    }
    let start = match seed_start {
        Some(start) => parse_seed(start)?,
        None => 0xC0DE_0001,
    };
    Ok(seed_sequence(start, seed_count))
}

fn timestamp_suffix() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{now}")
}
