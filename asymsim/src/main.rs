use asymsim::{bench_forces, bench_step_curve, Scenario, ScenarioConfig};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
struct Args {
    /// Scenario file under `scenarios/`
    #[arg(short, default_value = "orbits.yaml")]
    file_name: String,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 600)]
    steps: usize,

    /// Log energy and timing every n ticks
    #[arg(short, long, default_value_t = 60)]
    report_every: usize,

    /// Run the benchmarks instead of a scenario
    #[arg(long)]
    bench: bool,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name);
    let file = File::open(&config_path).with_context(|| format!("opening {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg: ScenarioConfig = serde_yaml::from_reader(reader)?;

    Ok(scenario_cfg)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.bench {
        bench_forces();
        bench_step_curve();
        return Ok(());
    }

    let scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    let mut scenario = Scenario::build_scenario(scenario_cfg)?;

    let every = args.report_every.max(1);
    for tick in 1..=args.steps {
        let report = scenario.step();

        if tick % every == 0 {
            let timing = scenario.last_timing();
            info!(
                "tick {tick:5} t={:.2} live={} energy={:.4} contacts={} step={:?} (index {:?}, forces {:?}, integrate {:?})",
                scenario.time(),
                scenario.store().active_count(),
                scenario.system_energy(),
                report.contacts,
                timing.total,
                timing.rebuild,
                timing.forces,
                timing.integrate,
            );
        }
    }

    Ok(())
}
