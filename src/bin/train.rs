use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use slate_dqn::config::{AgentKind, ExperimentConfig, SimulatorKind};
use slate_dqn::training::{SeedSummary, Trainer};

/// Train a slate recommender with DQN against simulated users.
#[derive(Parser)]
#[command(name = "train", about = "Train a DQN slate recommender")]
struct Cli {
    /// Path to YAML experiment configuration
    #[arg(long, default_value = "configs/default.yaml")]
    config: PathBuf,

    /// Override number of training episodes per seed
    #[arg(long)]
    episodes: Option<usize>,

    /// Override learning rate
    #[arg(long)]
    lr: Option<f64>,

    /// Override seeds (comma-separated)
    #[arg(long, value_delimiter = ',')]
    seeds: Option<Vec<u64>>,

    /// Override agent type: dqn or dueling_dqn
    #[arg(long)]
    agent: Option<String>,

    /// Print per-seed summaries as JSON
    #[arg(long)]
    json: bool,

    /// Print the default configuration as YAML and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    if cli.print_default_config {
        print!("{}", ExperimentConfig::default_yaml()?);
        return Ok(());
    }

    let mut config = ExperimentConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Apply CLI overrides
    if let Some(episodes) = cli.episodes {
        config.experiment.total_episodes = episodes;
    }
    if let Some(lr) = cli.lr {
        config.agent.params.lr = lr;
    }
    if let Some(seeds) = cli.seeds {
        config.experiment.seeds = seeds;
    }
    if let Some(agent) = cli.agent.as_deref() {
        config.agent.kind = match agent {
            "dqn" => AgentKind::Dqn,
            "dueling_dqn" => AgentKind::DuelingDqn,
            other => bail!("unknown agent '{}' (expected 'dqn' or 'dueling_dqn')", other),
        };
    }
    config.validate().context("invalid configuration")?;
    if config.response_simulator.kind == SimulatorKind::Llm {
        bail!("response_simulator.type 'llm' needs a completion client; the train binary runs 'random' only");
    }

    let summaries = Trainer::new(config).run().context("training failed")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        print_summary(&summaries);
    }
    Ok(())
}

fn print_summary(summaries: &[SeedSummary]) {
    println!("-------------------------------------------");
    for s in summaries {
        println!(
            "seed {} | {} | persona {} | learn steps: {} | eps: {:.3} | reward: {:.2} | ctr: {:.1}% | eval: {:.2} vs random {:.2} ({:+.2})",
            s.seed,
            s.agent,
            s.persona.id,
            s.learn_steps,
            s.final_epsilon,
            s.recent_reward,
            s.recent_click_through_rate * 100.0,
            s.eval_reward,
            s.random_reward,
            s.improvement(),
        );
    }
    if !summaries.is_empty() {
        let n = summaries.len() as f32;
        let eval: f32 = summaries.iter().map(|s| s.eval_reward).sum::<f32>() / n;
        let random: f32 = summaries.iter().map(|s| s.random_reward).sum::<f32>() / n;
        println!("-------------------------------------------");
        println!("mean eval reward over {} seeds: {:.2} (random {:.2})", summaries.len(), eval, random);
    }
}
