//! World boundary policies
//!
//! Applied once per sub-step after collision resolution. The margin at each
//! edge is the particle's own radius.

use serde::Deserialize;

use crate::simulation::params::Parameters;
use crate::simulation::quadtree::Rect;
use crate::simulation::states::{NVec2, ParticleStore};

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryMode {
    #[serde(rename = "reflect")] // bounce off the edge, losing energy by `elasticity`
    Reflect,

    #[serde(rename = "wrap")] // leave one edge, reappear at the opposite one
    Wrap,

    #[serde(rename = "absorb")] // particles leaving the bounds are removed
    Absorb,

    #[serde(rename = "attract")] // outside particles get pushed back by an acceleration
    Attract,

    #[serde(rename = "infinite")] // no constraint, bounds only matter to the renderer
    Infinite,
}

/// Apply `mode` to every live particle. `verlet` keeps the position history
/// consistent with any change made here. Returns the number of particles
/// removed (only `Absorb` removes).
pub fn apply_boundary(store: &mut ParticleStore, bounds: &Rect, mode: BoundaryMode, params: &Parameters, verlet: bool) -> usize {
    let dt = params.sub_dt();
    let live: Vec<usize> = store.iter_active().collect();
    let mut absorbed = 0;

    for i in live {
        match mode {
            BoundaryMode::Reflect => {
                if reflect(store, i, bounds, params.elasticity) && verlet {
                    store.sync_history(i, dt);
                }
            }
            BoundaryMode::Wrap => wrap(store, i, bounds),
            BoundaryMode::Absorb => {
                let x = store.x[i];
                if x.x < bounds.x || x.x > bounds.right() || x.y < bounds.y || x.y > bounds.bottom() {
                    store.remove(i);
                    absorbed += 1;
                }
            }
            BoundaryMode::Attract => {
                if attract(store, i, bounds, params.boundary_stiffness, dt) && verlet {
                    store.sync_history(i, dt);
                }
            }
            BoundaryMode::Infinite => {}
        }
    }

    absorbed
}

/// Clamp inside `[min + r, max - r]` on both axes, flipping and damping the
/// outward velocity component. Returns true if the particle was touched.
fn reflect(store: &mut ParticleStore, i: usize, bounds: &Rect, elasticity: f64) -> bool {
    let r = store.radius[i];
    let mut x = store.x[i];
    let mut v = store.v[i];
    let mut hit = false;

    if x.x < bounds.x + r {
        x.x = bounds.x + r;
        if v.x < 0.0 { v.x = -v.x * elasticity; }
        hit = true;
    } else if x.x > bounds.right() - r {
        x.x = bounds.right() - r;
        if v.x > 0.0 { v.x = -v.x * elasticity; }
        hit = true;
    }

    if x.y < bounds.y + r {
        x.y = bounds.y + r;
        if v.y < 0.0 { v.y = -v.y * elasticity; }
        hit = true;
    } else if x.y > bounds.bottom() - r {
        x.y = bounds.bottom() - r;
        if v.y > 0.0 { v.y = -v.y * elasticity; }
        hit = true;
    }

    store.x[i] = x;
    store.v[i] = v;
    hit
}

/// Teleport across the bounds. The verlet history moves by the same offset
/// so the implied velocity is unchanged.
fn wrap(store: &mut ParticleStore, i: usize, bounds: &Rect) {
    let r = store.radius[i];
    let old = store.x[i];
    let mut x = old;

    if x.x > bounds.right() {
        x.x = bounds.x + r;
    } else if x.x < bounds.x {
        x.x = bounds.right() - r;
    }

    if x.y > bounds.bottom() {
        x.y = bounds.y + r;
    } else if x.y < bounds.y {
        x.y = bounds.bottom() - r;
    }

    if x != old {
        let shift: NVec2 = x - old;
        store.x[i] = x;
        store.x_prev[i] += shift;
    }
}

/// Push particles outside `[min + r, max - r]` back with an acceleration
/// proportional to the overshoot. Position is left alone.
fn attract(store: &mut ParticleStore, i: usize, bounds: &Rect, stiffness: f64, dt: f64) -> bool {
    let r = store.radius[i];
    let x = store.x[i];
    let mut push = NVec2::zeros();

    if x.x < bounds.x + r {
        push.x = bounds.x + r - x.x;
    } else if x.x > bounds.right() - r {
        push.x = bounds.right() - r - x.x;
    }

    if x.y < bounds.y + r {
        push.y = bounds.y + r - x.y;
    } else if x.y > bounds.bottom() - r {
        push.y = bounds.bottom() - r - x.y;
    }

    if push == NVec2::zeros() {
        return false;
    }

    store.v[i] += push * (stiffness * dt);
    true
}
