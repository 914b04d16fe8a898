//! Shape Painter CLI - Run an evolution from JSON configuration.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use shape_painter::{
    compute::evolution::{EvolutionEngine, SymmetryOracle},
    schema::{EvolutionConfig, EvolutionPhase},
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [output.png]", args[0]);
        eprintln!();
        eprintln!("Evolve an image of shapes and save the fittest result.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to evolution configuration file");
        eprintln!("  output.png   Where to write the fittest image (default: fittest.png)");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let output_path = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("fittest.png"));

    // Load configuration
    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: EvolutionConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    let population = config.population.size;

    println!("Shape Painter");
    println!("=============");
    println!(
        "Canvas: {}x{}, {} shapes per image",
        config.image.canvas_size, config.image.canvas_size, config.image.shape_count
    );
    println!("Population: {}", population);
    println!(
        "Mutation rate: {:.6}, crossover rate: {:.2}",
        config.image.mutation_rate, config.image.crossover_rate
    );
    println!();

    let mut engine = EvolutionEngine::new(config, SymmetryOracle).unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    });

    println!("Running evolution...");
    let start = Instant::now();

    let result = engine
        .run_with_callback(population, |progress| match progress.phase {
            EvolutionPhase::Initializing => {
                if progress.admitted % (progress.population_size / 10).max(1) == 0 {
                    println!(
                        "  Initializing {}/{}",
                        progress.admitted, progress.population_size
                    );
                }
            }
            _ => println!(
                "  #{}: best score {:.2}",
                progress.generation,
                progress.best_fitness.unwrap_or(0.0)
            ),
        })
        .unwrap_or_else(|e| {
            eprintln!("Evolution failed: {}", e);
            std::process::exit(1);
        });

    let elapsed = start.elapsed();
    let stats = &result.stats;

    println!();
    println!("Finished: {:?}", stats.stop_reason);
    println!("  Generations: {}", stats.generations);
    println!(
        "  Evaluations: {} ({} during initialization)",
        stats.total_evaluations, stats.init_attempts
    );
    println!("  Best score: {:.2}", stats.best_fitness.unwrap_or(0.0));
    println!(
        "  Time: {:.2}s ({:.1} evaluations/s)",
        elapsed.as_secs_f32(),
        stats.total_evaluations as f32 / elapsed.as_secs_f32().max(f32::EPSILON)
    );

    if let Err(e) = engine.export_best(&output_path) {
        eprintln!("Error saving fittest image: {}", e);
        std::process::exit(1);
    }
    println!("Fittest image written to {}", output_path.display());
}

fn print_example_config() {
    let config = EvolutionConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
