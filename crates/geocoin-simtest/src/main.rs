//! Geocoin Headless Simulation Harness
//!
//! Replays a seeded random walk with transfers against the real session,
//! then validates the world-model properties. Runs entirely in-process — no
//! map, no UI, no location sensor.
//!
//! Usage:
//!   cargo run -p geocoin-simtest
//!   cargo run -p geocoin-simtest -- --steps 500 --seed 7 --verbose
//!   cargo run -p geocoin-simtest -- --config world.json --save session.json

use std::path::PathBuf;

use clap::Parser;
use geocoin_core::prelude::*;
use geocoin_logic::luck;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Parser)]
#[command(name = "geocoin-simtest", about = "Headless Geocoin world-model harness")]
struct Args {
    /// JSON file overriding world configuration fields
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of random-walk steps
    #[arg(long, default_value_t = 200)]
    steps: usize,
    /// Seed for the random walk (the world itself is never seeded)
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Keep the session in this file instead of in memory
    #[arg(long)]
    save: Option<PathBuf>,
    /// Print every check, not just failures
    #[arg(long)]
    verbose: bool,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn check(name: &str, passed: bool, detail: String) -> Self {
        Self {
            name: name.into(),
            passed,
            detail,
        }
    }
}

fn main() {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let config = match load_config(args.config.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {}", e);
            std::process::exit(2);
        }
    };
    println!("=== Geocoin Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Deterministic sampler
    results.extend(validate_sampler(&config));

    // 2. Discovery idempotence
    results.extend(validate_discovery(&config));

    // 3. Random walk with transfers + restart
    let walk = match &args.save {
        Some(path) => validate_walk(&config, &args, FileStorage::new(path), || {
            FileStorage::new(path)
        }),
        None => {
            let storage = MemoryStorage::new();
            let handle = storage.clone();
            validate_walk(&config, &args, storage, move || handle.clone())
        }
    };
    results.extend(walk);

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed,
        results.len(),
        failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<WorldConfig, String> {
    let config = match path {
        None => WorldConfig::default(),
        Some(p) => {
            let text = std::fs::read_to_string(p).map_err(|e| format!("{}: {}", p.display(), e))?;
            serde_json::from_str(&text).map_err(|e| format!("{}: {}", p.display(), e))?
        }
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

// ── 1. Sampler ──────────────────────────────────────────────────────────

fn validate_sampler(config: &WorldConfig) -> Vec<TestResult> {
    println!("--- Deterministic Sampler ---");
    let sampler = HashSampler;
    let ids: Vec<CellId> = (-50..50)
        .flat_map(|i| (-50..50).map(move |j| CellId::new(i, j)))
        .collect();

    let stable = ids
        .iter()
        .all(|&id| sampler.sample(&luck::spawn_key(id)) == sampler.sample(&luck::spawn_key(id)));
    let in_range = ids.iter().all(|&id| {
        let v = sampler.sample(&luck::richness_key(id));
        (0.0..1.0).contains(&v)
    });
    let spawned = ids
        .iter()
        .filter(|&&id| luck::spawns(&sampler, id, config.spawn_probability))
        .count();
    let rate = spawned as f64 / ids.len() as f64;

    vec![
        TestResult::check("sampler_stable", stable, format!("{} keys", ids.len())),
        TestResult::check("sampler_range", in_range, "all samples in [0,1)".into()),
        TestResult::check(
            "spawn_rate",
            (rate - config.spawn_probability).abs() < 0.03,
            format!("{:.4} vs {:.4}", rate, config.spawn_probability),
        ),
    ]
}

// ── 2. Discovery ────────────────────────────────────────────────────────

fn validate_discovery(config: &WorldConfig) -> Vec<TestResult> {
    println!("--- Discovery ---");
    let mut world = WorldBuilder::new(*config);
    let first = world.compute_visible(config.origin, config.visibility_radius);
    let snapshot = world.store().serialize_all();
    let second = world.compute_visible(config.origin, config.visibility_radius);

    let mut fresh = WorldBuilder::new(*config);
    let replay = fresh.compute_visible(config.origin, config.visibility_radius);

    vec![
        TestResult::check(
            "discovery_idempotent",
            first == second && world.store().serialize_all() == snapshot,
            format!("{} caches in view", first.len()),
        ),
        TestResult::check(
            "discovery_reproducible",
            first == replay,
            "fresh world mints the same caches".into(),
        ),
        TestResult::check(
            "min_one_token",
            first.iter().all(|c| !c.is_empty() && c.len() == c.minted as usize),
            "every new cache holds 1..=max tokens".into(),
        ),
    ]
}

// ── 3. Walk ─────────────────────────────────────────────────────────────

fn validate_walk<St: Storage>(
    config: &WorldConfig,
    args: &Args,
    storage: St,
    reopen: impl Fn() -> St,
) -> Vec<TestResult> {
    println!("--- Random Walk ({} steps, seed {}) ---", args.steps, args.seed);
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(args.seed);

    let mut game = match Game::open(*config, storage) {
        Ok(g) => g,
        Err(e) => {
            results.push(TestResult::check("open", false, e.to_string()));
            return results;
        }
    };
    log::info!("Session opened: {:?}", game.load_status());

    let mut conserved = true;
    let mut declined = 0usize;
    let mut moved = 0usize;
    let mut minted_counts = std::collections::HashMap::new();
    let directions = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    for _ in 0..args.steps {
        let dir = directions[rng.gen_range(0..directions.len())];
        if let Err(e) = game.step(dir) {
            results.push(TestResult::check("walk_step", false, e.to_string()));
            return results;
        }
        for cache in game.visible() {
            minted_counts.entry(cache.id()).or_insert(cache.minted);
        }

        let total = match game.total_tokens() {
            Ok(t) => t,
            Err(e) => {
                results.push(TestResult::check("conservation", false, e.to_string()));
                return results;
            }
        };
        let ids: Vec<CellId> = game.visible().iter().map(|c| c.id()).collect();
        for id in ids {
            if !rng.gen_bool(0.2) {
                continue;
            }
            let outcome = if rng.gen_bool(0.6) {
                game.collect(id)
            } else {
                game.deposit(id)
            };
            match outcome {
                Ok(TransferOutcome::Moved(_)) => moved += 1,
                Ok(TransferOutcome::Declined(_)) => declined += 1,
                Err(e) => {
                    results.push(TestResult::check("walk_transfer", false, e.to_string()));
                    return results;
                }
            }
        }
        conserved &= game.total_tokens().map_or(false, |t| t == total);
    }

    results.push(TestResult::check(
        "conservation",
        conserved,
        format!("{} moved, {} declined", moved, declined),
    ));

    let mint_once = game.world().store().ids().all(|id| {
        game.world()
            .cache(id)
            .map(|c| minted_counts.get(&id).map_or(true, |&m| m == c.minted))
            .unwrap_or(false)
    });
    results.push(TestResult::check(
        "mint_once",
        mint_once,
        format!("{} caches known", game.world().store().len()),
    ));

    let expected = game.snapshot();
    let inventory = game.inventory().len();
    drop(game);

    match Game::open(*config, reopen()) {
        Ok(restored) => {
            results.push(TestResult::check(
                "restart_restores",
                restored.load_status() == &LoadStatus::Restored && restored.snapshot() == expected,
                format!(
                    "{} tokens held, {} trail points",
                    inventory,
                    expected.player_trail.len()
                ),
            ));
        }
        Err(e) => results.push(TestResult::check("restart_restores", false, e.to_string())),
    }

    results
}
