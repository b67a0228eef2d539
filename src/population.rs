use anyhow::Result;
use rand::prelude::*;
use rand::distr::Uniform;
use rand_distr::Normal;
use rayon::prelude::*;
use walkers_common::{Domain, PopulationParams};

// Per-particle seed derivation constants, mixed with the population seed and
// the tick number so every (particle, tick) pair gets its own draw stream.
const PARTICLE_SEED_MUL: u64 = 0x1F3A;
const TICK_SEED_MUL: u64 = 0x58C7;

/// One population of Gaussian random walkers.
///
/// Positions are stored SoA (separate x and y vectors); index is particle
/// identity and never changes, so downstream consumers can track trajectories
/// across frames. All coordinates satisfy the domain invariant after
/// construction and after every tick.
pub struct WalkerPopulation {
    domain: Domain,
    step_scale: f32,
    bias_x: f32,
    seed: u64,
    tick: u32,
    pos_x: Vec<f32>,
    pos_y: Vec<f32>,
}

impl WalkerPopulation {
    /// Creates a population with all particles placed uniformly inside the
    /// centered sub-region spanning `spread_fraction` of the domain extent
    /// on each axis. Counts and scales are validated at config load; this
    /// only propagates distribution-construction failures.
    pub fn new(domain: Domain, params: PopulationParams) -> Result<Self> {
        let count = params.count as usize;
        let half_spread_x = params.spread_fraction * domain.width() * 0.5;
        let half_spread_y = params.spread_fraction * domain.height() * 0.5;
        let dist_x = Uniform::new_inclusive(
            domain.center_x() - half_spread_x,
            domain.center_x() + half_spread_x,
        )?;
        let dist_y = Uniform::new_inclusive(
            domain.center_y() - half_spread_y,
            domain.center_y() + half_spread_y,
        )?;

        let mut rng = StdRng::seed_from_u64(params.seed);
        let pos_x: Vec<f32> = (0..count).map(|_| rng.sample(dist_x)).collect();
        let pos_y: Vec<f32> = (0..count).map(|_| rng.sample(dist_y)).collect();

        Ok(Self {
            domain,
            step_scale: params.step_scale,
            bias_x: params.bias_x,
            seed: params.seed,
            tick: 0,
            pos_x,
            pos_y,
        })
    }

    pub fn len(&self) -> usize {
        self.pos_x.len()
    }

    /// Advances every particle by one stochastic step.
    ///
    /// Each particle draws dx ~ N(bias_x, step_scale) and dy ~ N(0, step_scale)
    /// from its own RNG seeded by (population seed, particle index, tick), so
    /// the parallel update is bit-for-bit reproducible regardless of thread
    /// schedule. Boundary policy: each axis commits independently only if the
    /// candidate stays within the inclusive domain bounds.
    pub fn advance_tick(&mut self) -> Result<()> {
        let step_x = Normal::new(self.bias_x, self.step_scale)?;
        let step_y = Normal::new(0.0f32, self.step_scale)?;
        let domain = self.domain;
        let seed = self.seed;
        let tick = self.tick;

        self.pos_x
            .par_iter_mut()
            .zip(self.pos_y.par_iter_mut())
            .enumerate()
            .for_each(|(idx, (x, y))| {
                let draw_seed = seed
                    .wrapping_add((idx as u64).wrapping_mul(PARTICLE_SEED_MUL))
                    .wrapping_add((tick as u64).wrapping_mul(TICK_SEED_MUL));
                let mut rng = StdRng::seed_from_u64(draw_seed);
                let dx: f32 = rng.sample(step_x);
                let dy: f32 = rng.sample(step_y);
                commit_step(x, y, dx, dy, &domain);
            });

        self.tick += 1;
        Ok(())
    }

    /// Ordered (x, y) snapshot for the rendering collaborator.
    pub fn positions(&self) -> Vec<(f32, f32)> {
        self.pos_x
            .iter()
            .zip(self.pos_y.iter())
            .map(|(&x, &y)| (x, y))
            .collect()
    }
}

/// Applies one candidate step with independent per-axis accept/reject.
///
/// A candidate that would leave the domain on one axis is discarded for that
/// axis only; the coordinate keeps its previous value for this tick. The other
/// axis still commits if its own candidate is in bounds. Candidates exactly on
/// a bound are accepted.
#[inline(always)]
fn commit_step(x: &mut f32, y: &mut f32, dx: f32, dy: f32, domain: &Domain) {
    let new_x = *x + dx;
    if domain.contains_x(new_x) {
        *x = new_x;
    }
    let new_y = *y + dy;
    if domain.contains_y(new_y) {
        *y = new_y;
    }
}
