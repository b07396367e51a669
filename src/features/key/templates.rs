//! Krumhansl-Kessler key templates
//!
//! Probe-tone profiles for C major and C minor, L1-normalized once. Templates
//! for other tonics are rotations of these two.
//!
//! # Reference
//!
//! Krumhansl, C. L. (1990). *Cognitive Foundations of Musical Pitch*.
//! Oxford University Press.

/// C major probe-tone ratings
pub const MAJOR_PROFILE: [f64; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// C minor probe-tone ratings
pub const MINOR_PROFILE: [f64; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Normalized key profiles for both modes
#[derive(Debug, Clone, PartialEq)]
pub struct KeyTemplates {
    /// Major profile rooted on C, sums to 1
    pub major: [f64; 12],

    /// Minor profile rooted on C, sums to 1
    pub minor: [f64; 12],
}

impl KeyTemplates {
    /// Build the templates from the Krumhansl-Kessler profiles
    pub fn new() -> Self {
        Self {
            major: normalized(&MAJOR_PROFILE),
            minor: normalized(&MINOR_PROFILE),
        }
    }

    /// Major template for tonic `root` (0 = C)
    pub fn get_major_template(&self, root: u32) -> [f64; 12] {
        rotate(&self.major, root)
    }

    /// Minor template for tonic `root` (0 = C)
    pub fn get_minor_template(&self, root: u32) -> [f64; 12] {
        rotate(&self.minor, root)
    }
}

impl Default for KeyTemplates {
    fn default() -> Self {
        Self::new()
    }
}

fn normalized(profile: &[f64; 12]) -> [f64; 12] {
    let sum: f64 = profile.iter().sum();
    profile.map(|v| v / sum)
}

/// `out[pc] = profile[(pc - root) mod 12]`
fn rotate(profile: &[f64; 12], root: u32) -> [f64; 12] {
    let root = (root % 12) as usize;
    let mut out = [0.0; 12];
    for (pc, value) in out.iter_mut().enumerate() {
        *value = profile[(pc + 12 - root) % 12];
    }
    out
}
