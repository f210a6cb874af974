use anyhow::Context;
use clap::Parser;
use gui_bridge::bridge::GuiBridge;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use workflow::config::ScenarioConfig;
use workflow::runner::{RunMode, Runner};

mod backend;
mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Replay driver for the EV route client")]
struct Args {
    /// Replay the whole track at once and print a summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a scenario from YAML
    #[arg(long)]
    scenario: Option<PathBuf>,
    #[arg(long, default_value_t = 30)]
    fixes: usize,
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Replay in real time behind the HTTP bridge for the visualizer
    #[arg(long, default_value_t = false)]
    serve: bool,
    /// Append the offline summary to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let scenario = if let Some(path) = args.scenario {
        ScenarioConfig::load(path)?
    } else {
        ScenarioConfig::from_args(args.fixes, args.interval_ms, args.seed)
    };

    let runner = Runner::new(scenario);
    let gui_bridge = GuiBridge::new();
    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating replay runtime")?;

    if args.offline {
        let summary = runtime.block_on(runner.execute(RunMode::Offline, Some(gui_bridge.clone())))?;

        println!(
            "Offline run -> fixes {}, station updates {}, reroutes {}, {}",
            summary.fixes_accepted, summary.station_updates, summary.reroutes, summary.final_speed
        );
        gui_bridge.publish_status("Offline replay finished.");

        if let Some(report_path) = args.report {
            let target = summary
                .route_target
                .map(|to| format!("{:.5},{:.5}", to.latitude, to.longitude))
                .unwrap_or_else(|| "none".to_string());
            let report = format!(
                "fixes={} station_updates={} reroutes={} route_target={} notices={:?}\n",
                summary.fixes_accepted,
                summary.station_updates,
                summary.reroutes,
                target,
                summary.notices
            );
            if let Some(parent) = report_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&report_path)
                .with_context(|| format!("opening report {}", report_path.display()))?;
            file.write_all(report.as_bytes())?;
        }
    }
    if args.serve {
        let summary = runtime.block_on(runner.execute(RunMode::Serve, Some(gui_bridge.clone())))?;
        gui_bridge.publish_status(&format!(
            "Session stopped after {} fixes.",
            summary.fixes_accepted
        ));
    }

    Ok(())
}
