use anyhow::Result;
use log::{debug, error, info};

// Define modules used by main
mod clock;
mod population;
mod sink;

use clock::SimulationClock;
use population::WalkerPopulation;
use sink::{FrameSink, StreamFormat, StreamSink};
use walkers_common::{StreamHeader, WalkConfig};

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting Biased Gaussian Random Walkers engine...");

    // --- Load Configuration ---
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = WalkConfig::load(&config_path)?;
    debug!("Configuration: {:#?}", config);

    info!("Using {} Rayon threads.", rayon::current_num_threads());

    // --- Initialize Simulation ---
    let domain = config.domain()?;
    let red = WalkerPopulation::new(domain, config.red_params())?;
    let blue = WalkerPopulation::new(domain, config.blue_params())?;
    info!("Initialized {} red and {} blue walkers.", red.len(), blue.len());
    let mut sim = SimulationClock::new(domain, red, blue, config.timing.total_ticks);

    // --- Open the Frame Stream ---
    let format = StreamFormat::from_config(config.output.format.as_deref())?;
    let stream_path = format!("{}_frames.{}", config.output.base_filename, format.extension());
    let header = StreamHeader {
        domain,
        frame_rate: config.output.frame_rate,
        count_red: config.populations.count_red,
        count_blue: config.populations.count_blue,
        total_ticks: config.timing.total_ticks,
    };
    let mut stream = StreamSink::create(&stream_path, &header, format)?;

    // --- Run, then finalize on every exit path ---
    let run_result = sim.run(&mut stream);
    let finalize_result = stream.finalize();
    if let Err(e) = &run_result {
        error!("Simulation run failed: {}", e);
    }
    run_result?;
    finalize_result?;

    // --- Save Final Positions (optional) ---
    if config.output.save_positions {
        let filename = format!("{}_final_positions.csv", config.output.base_filename);
        let mut writer = csv::Writer::from_path(&filename)?;
        writer.write_record(["x", "y", "population"])?;
        for (x, y) in sim.red().positions() {
            writer.write_record([format!("{:.4}", x), format!("{:.4}", y), "red".to_string()])?;
        }
        for (x, y) in sim.blue().positions() {
            writer.write_record([format!("{:.4}", x), format!("{:.4}", y), "blue".to_string()])?;
        }
        writer.flush()?;
        info!("Final positions saved to {}", filename);
    } else {
        info!("Skipping saving final positions as per config.");
    }

    info!("Simulation Complete.");
    Ok(())
}
