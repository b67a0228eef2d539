use crate::domain::Domain;
use serde::{Deserialize, Serialize};

/// Written once at the head of a frame stream. Carries everything the
/// rendering collaborator needs to size, scale and pace the video without
/// re-reading the engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamHeader {
    pub domain: Domain,
    pub frame_rate: u32,
    pub count_red: u32,
    pub count_blue: u32,
    pub total_ticks: u32,
}

/// One recorded tick: the ordered positions of both populations.
/// Particle order is stable across frames (index = particle identity).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub tick: u32,
    pub red: Vec<(f32, f32)>,
    pub blue: Vec<(f32, f32)>,
}
