use std::time::Instant;

use crate::simulation::boundary::BoundaryMode;
use crate::simulation::engine::Engine;
use crate::simulation::integrator::IntegrationMethod;
use crate::simulation::params::Parameters;
use crate::simulation::quadtree::Rect;
use crate::simulation::scenario::Scenario;
use crate::simulation::states::{NVec2, ParticleSpec};

/// Helper to build a scenario of size `n` with deterministic positions
fn make_scenario(n: usize, use_index: bool) -> Scenario {
    let engine = Engine {
        integrator: IntegrationMethod::Euler,
        boundary: BoundaryMode::Wrap,
        bounds: Rect::new(0.0, 0.0, 2000.0, 2000.0),
        collisions: true,
        use_index,
    };
    let parameters = Parameters {
        capacity: n,
        ..Parameters::default()
    };

    let mut scenario = Scenario::new(engine, parameters, 4);
    scenario.apply_preset("stable_orbits").expect("built-in preset");

    for i in 0..n {
        let i_f = i as f64;
        // deterministic positions, no rand needed
        let x = NVec2::new(
            1000.0 + (i_f * 0.37).sin() * 950.0,
            1000.0 + (i_f * 0.13).cos() * 950.0,
        );
        scenario
            .create_particle(ParticleSpec {
                x,
                kind: i % 4,
                ..ParticleSpec::default()
            })
            .expect("failed to create benchmark particle");
    }

    scenario
}

/// Time one force pass, direct vs quadtree, for a range of n
pub fn bench_forces() {
    // Different system sizes to test
    let ns = [250, 500, 1000, 2000, 4000, 8000];

    for n in ns {
        let mut direct = make_scenario(n, false);
        let mut indexed = make_scenario(n, true);

        // Warm up
        direct.rebuild_index();
        direct.accumulate_forces();
        indexed.rebuild_index();
        indexed.accumulate_forces();

        // Time direct
        let t0 = Instant::now();
        direct.accumulate_forces();
        let dt_direct = t0.elapsed().as_secs_f64();

        // Time quadtree (rebuild included)
        let t1 = Instant::now();
        indexed.rebuild_index();
        indexed.accumulate_forces();
        let dt_indexed = t1.elapsed().as_secs_f64();

        println!("N = {n:5}, direct = {:8.6} s, quadtree = {:8.6} s", dt_direct, dt_indexed);
    }
}

/// Full tick cost for a range of n
/// Paste output directly into a spreadsheet to graph
pub fn bench_step_curve() {
    println!("N,direct_ms,quadtree_ms");

    for n in (250..=8000).step_by(250) {
        // Small n: average over a few ticks to smooth noise
        let steps_direct = if n <= 1000 { 5 } else { 1 };
        let steps_indexed = if n <= 4000 { 3 } else { 1 };

        let mut direct = make_scenario(n, false);
        let t0 = Instant::now();
        for _ in 0..steps_direct {
            direct.step();
        }
        let ms_direct = t0.elapsed().as_secs_f64() * 1000.0 / steps_direct as f64;

        let mut indexed = make_scenario(n, true);
        let t1 = Instant::now();
        for _ in 0..steps_indexed {
            indexed.step();
        }
        let ms_indexed = t1.elapsed().as_secs_f64() * 1000.0 / steps_indexed as f64;

        println!("{},{:.6},{:.6}", n, ms_direct, ms_indexed);
    }
}
