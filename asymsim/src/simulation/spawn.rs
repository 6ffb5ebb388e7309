//! Particle placement for `Scenario::add_particles`.
//!
//! A [`Spawner`] wraps a seeded RNG so that a scenario file always produces
//! the same initial state. Positions are drawn from a [`Distribution`] over a
//! region rectangle; velocities get a random direction scaled by
//! `velocity_scale`.

use std::f64::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::simulation::quadtree::Rect;
use crate::simulation::states::NVec2;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    /// Uniform over the region
    #[serde(rename = "uniform")]
    Uniform,
    /// Normal around the region centre, sigma = 1/6 of the smaller side
    #[serde(rename = "gaussian")]
    Gaussian,
    /// On a circle inscribed in the region, with a little radial jitter
    #[serde(rename = "ring")]
    Ring,
    /// Regular lattice filling the region
    #[serde(rename = "grid")]
    Grid,
    /// Archimedean spiral from the centre outwards
    #[serde(rename = "spiral")]
    Spiral,
    /// One gaussian blob per particle type, blobs spread on a circle
    #[serde(rename = "clusters")]
    Clusters,
}

/// Everything needed to add a batch of particles
#[derive(Deserialize, Debug, Clone)]
pub struct SpawnRequest {
    pub count: usize,
    pub distribution: Distribution,
    pub region: Option<[f64; 4]>, // x, y, width, height; None = world bounds
    #[serde(default)]
    pub kind: Option<usize>, // None = uniform over all types
    #[serde(default)]
    pub velocity_scale: f64,
    #[serde(default = "default_mass")]
    pub mass: f64,
    #[serde(default = "default_radius")]
    pub radius: f64,
}

fn default_mass() -> f64 {
    1.0
}

fn default_radius() -> f64 {
    2.0
}

impl SpawnRequest {
    pub fn new(count: usize, distribution: Distribution) -> Self {
        Self {
            count,
            distribution,
            region: None,
            kind: None,
            velocity_scale: 0.0,
            mass: default_mass(),
            radius: default_radius(),
        }
    }

    pub fn with_kind(mut self, kind: usize) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_region(mut self, region: Rect) -> Self {
        self.region = Some([region.x, region.y, region.width, region.height]);
        self
    }

    pub fn with_velocity_scale(mut self, scale: f64) -> Self {
        self.velocity_scale = scale;
        self
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn region_or(&self, fallback: Rect) -> Rect {
        match self.region {
            Some([x, y, w, h]) => Rect::new(x, y, w, h),
            None => fallback,
        }
    }
}

pub struct Spawner {
    rng: StdRng,
}

impl Spawner {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Random type in `[0, type_count)`
    pub fn random_kind(&mut self, type_count: usize) -> usize {
        self.rng.gen_range(0..type_count.max(1))
    }

    /// Random direction scaled by `scale`
    pub fn velocity(&mut self, scale: f64) -> NVec2 {
        if scale == 0.0 {
            return NVec2::zeros();
        }
        let theta = self.rng.gen_range(0.0..TAU);
        let speed = scale * self.rng.gen::<f64>();
        NVec2::new(theta.cos(), theta.sin()) * speed
    }

    /// Position of particle `index` out of `count` of type `kind`
    pub fn position(&mut self, dist: Distribution, region: &Rect, index: usize, count: usize, kind: usize, type_count: usize) -> NVec2 {
        let center = region.center();
        let half = 0.5 * region.width.min(region.height);

        let p = match dist {
            Distribution::Uniform => NVec2::new(
                self.rng.gen_range(region.x..region.right().max(region.x + f64::EPSILON)),
                self.rng.gen_range(region.y..region.bottom().max(region.y + f64::EPSILON)),
            ),
            Distribution::Gaussian => center + self.gaussian2() * (half / 3.0),
            Distribution::Ring => {
                let theta = self.rng.gen_range(0.0..TAU);
                let r = half * (0.8 + 0.1 * self.rng.gen::<f64>());
                center + NVec2::new(theta.cos(), theta.sin()) * r
            }
            Distribution::Grid => {
                let cols = (count as f64).sqrt().ceil().max(1.0) as usize;
                let rows = count.div_ceil(cols).max(1);
                let (col, row) = (index % cols, index / cols);
                NVec2::new(
                    region.x + (col as f64 + 0.5) * region.width / cols as f64,
                    region.y + (row as f64 + 0.5) * region.height / rows as f64,
                )
            }
            Distribution::Spiral => {
                let t = index as f64 / count.max(1) as f64;
                let theta = t * 6.0 * TAU;
                center + NVec2::new(theta.cos(), theta.sin()) * (t * half * 0.9)
            }
            Distribution::Clusters => {
                let n = type_count.max(1);
                let theta = kind as f64 / n as f64 * TAU;
                let blob = center + NVec2::new(theta.cos(), theta.sin()) * (half * 0.5);
                blob + self.gaussian2() * (half / (2.0 * n as f64 + 4.0))
            }
        };

        // keep everything inside the region
        NVec2::new(
            p.x.clamp(region.x, region.right()),
            p.y.clamp(region.y, region.bottom()),
        )
    }

    /// Two independent standard normal samples (Box-Muller)
    fn gaussian2(&mut self) -> NVec2 {
        let u1: f64 = self.rng.gen_range(f64::EPSILON..1.0);
        let u2: f64 = self.rng.gen();
        let r = (-2.0 * u1.ln()).sqrt();
        NVec2::new(r * (TAU * u2).cos(), r * (TAU * u2).sin())
    }
}
