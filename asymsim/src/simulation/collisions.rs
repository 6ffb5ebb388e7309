//! Overlap resolution between particles
//!
//! For every pair closer than the sum of their radii:
//! 1. push both apart along the contact normal, each by the other particle's
//!    share of the total mass,
//! 2. if they are still approaching, exchange an elastic impulse scaled by
//!    `elasticity`.
//!
//! Separated pairs are never touched.

use log::trace;

use crate::simulation::forces::checked_direction;
use crate::simulation::quadtree::{Circle, QuadPoint, SpatialIndex};
use crate::simulation::states::ParticleStore;

/// One pass over all overlapping live pairs, using `index` (built from the
/// current positions) for candidates. `history_dt` is the sub-step length
/// when verlet history must follow velocity changes. Returns the number of
/// contacts resolved.
pub fn resolve_collisions(store: &mut ParticleStore, index: &SpatialIndex, elasticity: f64, history_dt: Option<f64>) -> usize {
    let max_radius = store.max_radius();
    let live: Vec<usize> = store.iter_active().collect();
    let mut candidates: Vec<QuadPoint> = Vec::new();
    let mut contacts = 0;

    for i in live {
        if !store.is_active(i) {
            continue;
        }

        // r_i + max radius covers every partner, pairs are handled once (j > i)
        let reach = store.radius[i] + max_radius;
        candidates.clear();
        index.query_circle_into(&Circle::new(store.x[i], reach), &mut candidates);

        for c in &candidates {
            let j = c.index;
            if j <= i || !store.is_active(j) {
                continue;
            }
            if resolve_pair(store, i, j, elasticity, history_dt) {
                contacts += 1;
            }
        }
    }

    contacts
}

/// Separate and bounce one pair. Returns false if the pair does not overlap
/// or is degenerate.
pub fn resolve_pair(store: &mut ParticleStore, i: usize, j: usize, elasticity: f64, history_dt: Option<f64>) -> bool {
    let delta = store.x[j] - store.x[i];
    let overlap = store.radius[i] + store.radius[j] - delta.norm();
    if overlap <= 0.0 {
        return false;
    }

    let (n, _) = match checked_direction(delta) {
        Ok(v) => v,
        Err(e) => {
            trace!("skipping contact ({i}, {j}): {e}");
            return false;
        }
    };

    let mi = store.m[i];
    let mj = store.m[j];
    let total = mi + mj;

    store.x[i] -= n * (overlap * mj / total);
    store.x[j] += n * (overlap * mi / total);

    // > 0 means i moves toward j along the normal
    let closing = (store.v[i] - store.v[j]).dot(&n);
    if closing > 0.0 {
        let impulse = (1.0 + elasticity) * closing / (1.0 / mi + 1.0 / mj);
        store.v[i] -= n * (impulse / mi);
        store.v[j] += n * (impulse / mj);

        if let Some(dt) = history_dt {
            store.sync_history(i, dt);
            store.sync_history(j, dt);
        }
    }

    true
}
