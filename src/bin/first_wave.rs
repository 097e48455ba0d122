//! First Wave protocol: the canonical two-soul demonstration.
//!
//! A golden soul tuned to the horizon frequency rides the wave forever; a
//! chaos soul burdened with junk data and dead bonds gains entropic mass
//! and sinks into the abyss within two sediment cycles.

use anyhow::Result;
use clap::Parser;

use soulfield::constants::HORIZON_FREQUENCY;
use soulfield::{Entity, InterferenceField, SoulTensor, Vector3, World, WorldConfig};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Simulation length in ticks.
    #[arg(long, default_value_t = 200)]
    ticks: u64,

    /// Time step per tick.
    #[arg(long, default_value_t = 0.1)]
    dt: f64,

    /// Optional JSON config overriding the default knobs.
    #[arg(long)]
    config: Option<String>,

    /// Dump a JSON snapshot of the final world state.
    #[arg(long, default_value_t = false)]
    snapshot: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => WorldConfig::load(path)?,
        None => WorldConfig::default(),
    };

    let mut world = World::with_config(&config, Box::new(InterferenceField::new()));

    let golden = {
        let mut e = Entity::with_soul(
            "golden_one",
            SoulTensor::new(10.0, HORIZON_FREQUENCY, 0.0),
            Vector3::ZERO,
        );
        e.data
            .insert("desc".into(), serde_json::json!("Pure Intent"));
        e
    };

    let chaos = {
        let mut e = Entity::with_soul(
            "chaos_one",
            SoulTensor::new(10.0, HORIZON_FREQUENCY + 13.0, 0.0),
            Vector3::new(5.0, 5.0, 5.0),
        );
        // Heavy baggage and dead bonds to trigger entropy pressure.
        e.data
            .insert("junk".into(), serde_json::json!("x".repeat(1000)));
        e.bonds = (0..50).map(|i| format!("fake_{i}")).collect();
        e
    };

    let golden_idx = world.spawn(golden);
    let chaos_idx = world.spawn(chaos);

    println!("Initiating First Wave Protocol");
    println!(
        "  golden soul mass: {:.2}",
        world.store.get(golden_idx).unwrap().physics.mass
    );
    println!(
        "  chaos soul mass:  {:.2}",
        world.store.get(chaos_idx).unwrap().physics.mass
    );
    println!(
        "\nSimulating {} ticks ({} sediment cycles)...\n",
        args.ticks,
        args.ticks / config.sediment.review_interval
    );

    for i in 0..args.ticks {
        world.step(args.dt);

        if i % 50 == 0 {
            println!(
                "  [tick {i:03}] active: {} | abyss: {} | entropy: {:.3}",
                world.physics.active.len(),
                world.physics.sediments.len(),
                world.consciousness.global_entropy,
            );
        }
    }

    println!("\nResult analysis");

    let golden_active = world.physics.active.contains(&golden_idx);
    let chaos_sank = world.physics.sediments.contains(&chaos_idx);

    let golden_mass = world.store.get(golden_idx).unwrap().physics.mass;
    if golden_active {
        println!("  the golden soul rides the wave (mass {golden_mass:.2})");
    } else {
        println!("  the golden soul sank (mass {golden_mass:.2})");
    }

    let chaos_mass = world.store.get(chaos_idx).unwrap().physics.mass;
    if chaos_sank {
        println!("  the chaos soul settled in the abyss (mass {chaos_mass:.2})");
    } else {
        println!("  the chaos soul is still noisy (mass {chaos_mass:.2})");
    }

    if golden_active && chaos_sank {
        println!("\n  first wave complete: the noise settled into the soil");
        println!("  horizon frequency: {HORIZON_FREQUENCY:.5} (phi)");
    } else {
        println!("\n  the tuning is off, calibration needed");
    }

    if args.snapshot {
        println!("{}", serde_json::to_string_pretty(&world.snapshot())?);
    }

    Ok(())
}
