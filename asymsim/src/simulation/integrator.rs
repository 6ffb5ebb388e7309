//! Fixed-step time integrators for the particle store
//!
//! Provides Euler, position Verlet and an approximate Runge–Kutta scheme,
//! all driven by the accelerations already written into the store and by
//! `Parameters`. Each call advances one sub-step of length `params.sub_dt()`

use serde::Deserialize;

use super::params::Parameters;
use super::states::{NVec2, ParticleStore};

/// Which integrator method is used by the engine
/// integrator: "euler"`, `"verlet"` or `"rk4"`
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationMethod {
    #[serde(rename = "euler")] // semi-implicit Euler
    Euler,

    #[serde(rename = "verlet")] // position Verlet, keeps a previous position per particle
    Verlet,

    #[serde(rename = "rk4")] // 4-stage Runge-Kutta weights over a single acceleration sample
    RungeKutta,
}

/// Integration state machine. Holds the selected method; the per-particle
/// Verlet history lives in the store.
#[derive(Debug, Clone)]
pub struct Integrator {
    method: IntegrationMethod,
}

impl Integrator {
    pub fn new(method: IntegrationMethod) -> Self {
        Self { method }
    }

    pub fn method(&self) -> IntegrationMethod {
        self.method
    }

    /// Switch method. Entering Verlet re-seeds every live particle's history
    /// as `x_prev = x - v dt` so the first Verlet step continues smoothly.
    pub fn set_method(&mut self, method: IntegrationMethod, store: &mut ParticleStore, dt: f64) {
        if method == IntegrationMethod::Verlet && self.method != IntegrationMethod::Verlet {
            let live: Vec<usize> = store.iter_active().collect();
            for i in live {
                store.sync_history(i, dt);
            }
        }
        self.method = method;
    }

    pub fn is_verlet(&self) -> bool {
        self.method == IntegrationMethod::Verlet
    }

    /// Advance every live particle by one sub-step
    pub fn step(&self, store: &mut ParticleStore, params: &Parameters) {
        let dt = params.sub_dt();
        if dt <= 0.0 {
            return;
        }

        let live: Vec<usize> = store.iter_active().collect();
        for i in live {
            match self.method {
                IntegrationMethod::Euler => euler_single(store, i, dt, params),
                IntegrationMethod::Verlet => verlet_single(store, i, dt, params),
                IntegrationMethod::RungeKutta => rk4_single(store, i, dt, params),
            }
        }
    }
}

/// Scale `v` down to `max` if it is faster. Returns true if the cap applied.
fn cap_velocity(v: &mut NVec2, max: f64) -> bool {
    let speed2 = v.norm_squared();
    if max > 0.0 && speed2 > max * max {
        *v *= max / speed2.sqrt();
        return true;
    }
    false
}

/// v += a dt, damp, cap, x += v dt
fn euler_single(store: &mut ParticleStore, i: usize, dt: f64, params: &Parameters) {
    let mut v = store.v[i] + store.a[i] * dt;
    v *= params.damping;
    cap_velocity(&mut v, params.max_velocity);

    store.v[i] = v;
    store.x[i] += v * dt;
}

/// x_new = 2x - x_prev + a dt^2, with the displacement damped and the
/// derived velocity capped
fn verlet_single(store: &mut ParticleStore, i: usize, dt: f64, params: &Parameters) {
    let x = store.x[i];
    let x_verlet = 2.0 * x - store.x_prev[i] + store.a[i] * (dt * dt);

    let displacement = (x_verlet - x) * params.damping;
    let mut x_new = x + displacement;

    // velocity only for the cap and for renderers
    let mut v = displacement / dt;
    if cap_velocity(&mut v, params.max_velocity) {
        x_new = x + v * dt;
    }

    store.v[i] = v;
    store.x_prev[i] = x;
    store.x[i] = x_new;
}

/// Classical 1-2-2-1 weighting, but all four stages reuse the acceleration
/// sampled before the step (no re-evaluation at intermediate states), so
/// this reduces to x += dt (v + a dt / 2), v += a dt.
fn rk4_single(store: &mut ParticleStore, i: usize, dt: f64, params: &Parameters) {
    let x0 = store.x[i];
    let v0 = store.v[i];
    let a = store.a[i];

    let k1x = v0;
    let k1v = a;
    let k2x = v0 + k1v * (0.5 * dt);
    let k2v = a;
    let k3x = v0 + k2v * (0.5 * dt);
    let k3v = a;
    let k4x = v0 + k3v * dt;
    let k4v = a;

    let mut v = v0 + (k1v + 2.0 * k2v + 2.0 * k3v + k4v) * (dt / 6.0);
    v *= params.damping;
    cap_velocity(&mut v, params.max_velocity);

    store.x[i] = x0 + (k1x + 2.0 * k2x + 2.0 * k3x + k4x) * (dt / 6.0);
    store.v[i] = v;
}
