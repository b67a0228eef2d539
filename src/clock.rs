use crate::population::WalkerPopulation;
use crate::sink::FrameSink;
use anyhow::Result;
use log::{info, trace};
use std::time::Instant;
use walkers_common::Domain;

// Wall-clock interval between progress log lines.
const STATUS_INTERVAL_SECS: f64 = 5.0;

/// Drives the two populations in lockstep for a fixed number of ticks,
/// handing one frame per tick to the rendering collaborator.
pub struct SimulationClock {
    domain: Domain,
    red: WalkerPopulation,
    blue: WalkerPopulation,
    total_ticks: u32,
}

impl SimulationClock {
    pub fn new(domain: Domain, red: WalkerPopulation, blue: WalkerPopulation, total_ticks: u32) -> Self {
        Self { domain, red, blue, total_ticks }
    }

    pub fn red(&self) -> &WalkerPopulation {
        &self.red
    }

    pub fn blue(&self) -> &WalkerPopulation {
        &self.blue
    }

    /// Runs the full tick loop. Ticks are strictly sequential; frames are
    /// submitted in increasing tick order because the encoder side is
    /// append-only. A sink failure aborts the run immediately and propagates
    /// unchanged; no frame is ever retried or skipped.
    pub fn run(&mut self, sink: &mut dyn FrameSink) -> Result<()> {
        info!(
            "Starting simulation loop for {} ticks ({} red + {} blue walkers in [{}, {}] x [{}, {}])...",
            self.total_ticks,
            self.red.len(),
            self.blue.len(),
            self.domain.min_x,
            self.domain.max_x,
            self.domain.min_y,
            self.domain.max_y
        );
        let start_time = Instant::now();
        let mut previous_print_time = start_time;

        for tick in 1..=self.total_ticks {
            let tick_start_time = Instant::now();
            self.red.advance_tick()?;
            self.blue.advance_tick()?;
            sink.submit_frame(tick, &self.red.positions(), &self.blue.positions())?;
            let tick_duration = tick_start_time.elapsed();

            let current_time = Instant::now();
            let should_print_status =
                current_time.duration_since(previous_print_time).as_secs_f64() >= STATUS_INTERVAL_SECS;
            let is_last_tick = tick == self.total_ticks;

            if should_print_status || is_last_tick {
                info!(
                    "Tick [{}/{}] | Tick Time: {:6.2} ms | Elapsed: {:.2} s",
                    tick,
                    self.total_ticks,
                    tick_duration.as_secs_f64() * 1000.0,
                    start_time.elapsed().as_secs_f64()
                );
                previous_print_time = current_time;
            } else {
                trace!(
                    "Tick [{}/{}] completed in {:.2} ms",
                    tick,
                    self.total_ticks,
                    tick_duration.as_secs_f64() * 1000.0
                );
            }
        }

        info!(
            "Simulation loop finished in {:.3} seconds.",
            start_time.elapsed().as_secs_f64()
        );
        Ok(())
    }
}
