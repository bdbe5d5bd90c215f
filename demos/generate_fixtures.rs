//! Example: Generate fixture files for detector tests.
//!
//! Run with: cargo run --example generate_fixtures

use synthts::{build_dataset, DatasetConfig, ScenarioConfig, Stage};
use std::fs;

fn main() {
    println!("SynthTS Fixture Generator");
    println!("=========================\n");

    if let Err(e) = fs::create_dir_all("fixtures") {
        eprintln!("Could not create fixtures/: {}", e);
        return;
    }

    generate_scenarios();
    generate_dataset();

    println!("\nAll fixtures generated successfully!");
}

fn generate_scenarios() {
    println!("Generating scenarios...");

    let scenarios = [
        ScenarioConfig::point_anomalies(),
        ScenarioConfig::chunked_anomalies(),
        ScenarioConfig::mean_drift(),
    ];

    for scenario in scenarios {
        let scenario = scenario.with_seed(42);
        let ts = match scenario.run() {
            Ok(ts) => ts,
            Err(e) => {
                eprintln!("  Warning: {} failed: {}", scenario.name, e);
                continue;
            }
        };

        for stage in [Stage::Normal, Stage::Anomalized, Stage::Drifted] {
            let Some(frame) = ts.frame(stage) else {
                continue;
            };
            let csv_path = format!("fixtures/{}_{}.csv", scenario.name, stage.column());
            if let Err(e) = frame.to_csv(&csv_path) {
                eprintln!("  Warning: Could not save {}: {}", csv_path, e);
            } else {
                println!("  Created {}", csv_path);
            }
        }

        // Keep the config next to its output
        let config_path = format!("fixtures/{}.scenario.json", scenario.name);
        if let Err(e) = scenario.to_json_file(&config_path) {
            eprintln!("  Warning: Could not save scenario: {}", e);
        }
    }
}

fn generate_dataset() {
    println!("Generating labeled dataset...");

    let config = DatasetConfig::new()
        .with_n(100)
        .with_size(500)
        .with_prob_anomalous(0.2);
    let mut rng = synthts::make_rng(Some(42));

    match build_dataset(&config, &mut rng) {
        Ok(dataset) => {
            let path = "fixtures/labeled_dataset.json";
            if let Err(e) = dataset.to_json(path) {
                eprintln!("  Warning: Could not save {}: {}", path, e);
            } else {
                println!(
                    "  Created {} ({} of {} anomalous)",
                    path,
                    dataset.anomalous_count(),
                    dataset.len()
                );
            }
        }
        Err(e) => eprintln!("  Warning: dataset generation failed: {}", e),
    }
}
