use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangular bounds both populations are confined to.
/// Immutable after construction; both the engine and the visualizer read it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Domain {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl Domain {
    /// Builds a domain, rejecting degenerate or inverted bounds.
    pub fn new(min_x: f32, max_x: f32, min_y: f32, max_y: f32) -> Result<Self> {
        if min_x >= max_x {
            anyhow::bail!("Domain x bounds are degenerate: min_x ({}) >= max_x ({}).", min_x, max_x);
        }
        if min_y >= max_y {
            anyhow::bail!("Domain y bounds are degenerate: min_y ({}) >= max_y ({}).", min_y, max_y);
        }
        Ok(Self { min_x, max_x, min_y, max_y })
    }

    #[inline(always)]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    #[inline(always)]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    #[inline(always)]
    pub fn center_x(&self) -> f32 {
        (self.min_x + self.max_x) * 0.5
    }

    #[inline(always)]
    pub fn center_y(&self) -> f32 {
        (self.min_y + self.max_y) * 0.5
    }

    /// Inclusive containment on the x axis. A candidate exactly on a bound is in.
    #[inline(always)]
    pub fn contains_x(&self, x: f32) -> bool {
        x >= self.min_x && x <= self.max_x
    }

    /// Inclusive containment on the y axis.
    #[inline(always)]
    pub fn contains_y(&self, y: f32) -> bool {
        y >= self.min_y && y <= self.max_y
    }
}
