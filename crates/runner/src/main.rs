//! Episode driver for the open-loop optimistic planner.
//!
//! Runs the plan / commit / re-root decision loop on the corridor demo
//! environment, prints summaries and optionally saves episode trajectories
//! as JSON for offline inspection.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use olop_core::{Action, Environment};
use olop_planner::envs::ChainWalk;
use olop_planner::{Olop, PlannerConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

/// Open-loop optimistic planning demo tool.
#[derive(Parser)]
#[command(name = "olop-runner")]
#[command(about = "Run open-loop optimistic planning episodes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run full decision episodes on the corridor environment.
    Episode {
        /// Number of episodes to run.
        #[arg(short, long, default_value = "1")]
        episodes: usize,

        /// Oracle-call budget per planning invocation.
        #[arg(short, long, default_value = "100")]
        budget: usize,

        /// Discount factor, strictly inside (0, 1).
        #[arg(short, long, default_value = "0.85")]
        gamma: f32,

        /// Corridor length.
        #[arg(short, long, default_value = "8")]
        length: usize,

        /// Random seed for reproducible tie-breaking.
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Replay the action sequence from the root during expansion.
        #[arg(long)]
        restart: bool,

        /// Maximum environment steps per episode.
        #[arg(long, default_value = "64")]
        max_steps: usize,

        /// Output directory for episode records (JSON). Nothing is written
        /// if not specified.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a single planning call and print the greedy action sequence.
    Plan {
        /// Oracle-call budget for the planning invocation.
        #[arg(short, long, default_value = "100")]
        budget: usize,

        /// Discount factor, strictly inside (0, 1).
        #[arg(short, long, default_value = "0.85")]
        gamma: f32,

        /// Corridor length.
        #[arg(short, long, default_value = "8")]
        length: usize,

        /// Random seed for reproducible tie-breaking.
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Replay the action sequence from the root during expansion.
        #[arg(long)]
        restart: bool,
    },
}

/// A single step in an episode trajectory.
#[derive(Serialize, Deserialize, Debug)]
struct EpisodeStep {
    /// Cell occupied before the action was taken.
    position: usize,

    /// Committed action.
    action: Action,

    /// Immediate reward returned by the environment.
    reward: f32,

    /// Oracle calls spent planning this step.
    oracle_calls: usize,
}

/// A complete episode trajectory.
#[derive(Serialize, Deserialize, Debug)]
struct EpisodeRecord {
    /// Sequence of committed steps.
    steps: Vec<EpisodeStep>,

    /// Undiscounted reward accumulated over the episode.
    total_reward: f32,

    /// Whether the goal cell was reached before the step cap.
    reached_goal: bool,

    /// Run parameters for offline inspection.
    metadata: HashMap<String, serde_json::Value>,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Episode {
            episodes,
            budget,
            gamma,
            length,
            seed,
            restart,
            max_steps,
            output,
        } => run_episodes(episodes, budget, gamma, length, seed, restart, max_steps, output),
        Commands::Plan {
            budget,
            gamma,
            length,
            seed,
            restart,
        } => run_single_plan(budget, gamma, length, seed, restart),
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[allow(clippy::too_many_arguments)]
fn run_episodes(
    episodes: usize,
    budget: usize,
    gamma: f32,
    length: usize,
    seed: u64,
    restart: bool,
    max_steps: usize,
    output: Option<PathBuf>,
) -> Result<()> {
    let env = ChainWalk::new(length);
    let config = PlannerConfig::with_budget(budget)
        .with_gamma(gamma)
        .with_restart(restart);
    config.validate()?;

    if let Some(dir) = &output {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {:?}", dir))?;
    }

    println!("Corridor length: {}  budget: {}  gamma: {}", length, budget, gamma);
    println!("================================================");

    let start = Instant::now();
    let mut goals = 0;
    for episode in 0..episodes {
        let record = run_episode(&env, config.clone(), seed + episode as u64, max_steps)?;
        if record.reached_goal {
            goals += 1;
        }
        println!(
            "Episode {}: {} steps, total reward {:.3}, goal {}",
            episode,
            record.steps.len(),
            record.total_reward,
            if record.reached_goal { "reached" } else { "missed" },
        );

        if let Some(dir) = &output {
            let path = dir.join(format!("episode_{:03}.json", episode));
            let file =
                File::create(&path).with_context(|| format!("creating {:?}", path))?;
            serde_json::to_writer_pretty(BufWriter::new(file), &record)
                .with_context(|| format!("writing {:?}", path))?;
        }
    }

    println!("================================================");
    println!(
        "{}/{} episodes reached the goal in {:.2?}",
        goals,
        episodes,
        start.elapsed()
    );
    Ok(())
}

fn run_episode(
    env: &ChainWalk,
    config: PlannerConfig,
    seed: u64,
    max_steps: usize,
) -> Result<EpisodeRecord> {
    let budget = config.budget;
    let gamma = config.gamma;
    let mut planner = Olop::new(config, env.clone(), ChaCha8Rng::seed_from_u64(seed))?;

    let mut state = env.initial_state();
    let mut steps = Vec::new();
    let mut total_reward = 0.0;
    let mut reached_goal = false;

    for _ in 0..max_steps {
        let plan = planner.plan(state)?;
        let Some(&action) = plan.first() else {
            break;
        };

        let position = state;
        let (_, reward, done) = env.step(&mut state, action);
        let oracle_calls = planner.oracle().calls();
        planner.step_by_subtree(action);

        total_reward += reward;
        steps.push(EpisodeStep {
            position,
            action,
            reward,
            oracle_calls,
        });

        if done {
            reached_goal = state == env.goal();
            break;
        }
    }

    let mut metadata = HashMap::new();
    metadata.insert("seed".to_string(), serde_json::json!(seed));
    metadata.insert("budget".to_string(), serde_json::json!(budget));
    metadata.insert("gamma".to_string(), serde_json::json!(gamma));
    metadata.insert("length".to_string(), serde_json::json!(env.length()));

    Ok(EpisodeRecord {
        steps,
        total_reward,
        reached_goal,
        metadata,
    })
}

fn run_single_plan(
    budget: usize,
    gamma: f32,
    length: usize,
    seed: u64,
    restart: bool,
) -> Result<()> {
    let env = ChainWalk::new(length);
    let config = PlannerConfig::with_budget(budget)
        .with_gamma(gamma)
        .with_restart(restart);
    let mut planner = Olop::new(config, env.clone(), ChaCha8Rng::seed_from_u64(seed))?;

    let start = Instant::now();
    let plan = planner.plan(env.initial_state())?;
    let elapsed = start.elapsed();

    println!("Greedy plan: {:?}", plan);
    println!(
        "Tree nodes: {}  frontier: {}  oracle calls: {}/{}",
        planner.tree().len(),
        planner.leaves().len(),
        planner.oracle().calls(),
        budget
    );
    println!("Planned in {:.2?}", elapsed);
    Ok(())
}
