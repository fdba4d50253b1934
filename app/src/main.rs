use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use pace_core::{
    config::{HostKind, PaceConfig},
    frame::FrameContext,
    host::{self, HeadlessHost, SleepPacer},
    load_config_toml,
    logging::{init_console_logger, ConsoleLoggerConfig},
    schedule::TaskSchedule,
    task::FrameTask,
    FrameLoop, StopToken,
};

#[derive(Parser, Debug)]
#[command(name = "lifepace", about = "Fixed-rate frame pacing demo")]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulation steps per second (overrides config)
    #[arg(short, long)]
    rate: Option<f64>,

    /// Run without a window, paced by a sleeping display driver
    #[arg(long)]
    headless: bool,

    /// Display refresh rate of the headless driver (overrides config)
    #[arg(long)]
    refresh: Option<f64>,

    /// Stop after this many host frames
    #[arg(long)]
    frames: Option<u64>,
}

/// Stands in for the compute + render submission of one generation.
struct GenerationStep {
    generation: u64,
    report_every: u64,
}

impl FrameTask for GenerationStep {
    fn id(&self) -> &'static str {
        "generation-step"
    }

    fn on_frame(&mut self, ctx: &mut FrameContext<'_>) -> Result<()> {
        self.generation = ctx.frame_index;
        if self.generation % self.report_every == 0 {
            log::info!("generation {}", self.generation);
        } else {
            log::debug!("generation {}", self.generation);
        }
        Ok(())
    }

    fn on_shutdown(&mut self) {
        log::info!("last generation {}", self.generation);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_console_logger(&ConsoleLoggerConfig::from_env())?;

    let mut cfg = match cli.config.as_ref() {
        Some(path) => load_config_toml(path)?,
        None => PaceConfig::default(),
    };
    if let Some(rate) = cli.rate {
        cfg.pacing.target_hz = rate;
    }
    if let Some(refresh) = cli.refresh {
        cfg.runtime.headless_refresh_hz = refresh;
    }
    if cli.headless {
        cfg.runtime.host = HostKind::Headless;
    }
    if cli.frames.is_some() {
        cfg.runtime.max_frames = cli.frames;
    }
    cfg.validate()?;

    let stop = StopToken::new();
    if let Err(e) = stop.install_ctrlc_handler() {
        log::warn!("ctrl-c handler not installed: {e}");
    }

    let mut tasks = TaskSchedule::new();
    tasks.add(GenerationStep {
        generation: 0,
        report_every: (cfg.pacing.target_hz.round() as u64).max(1),
    });

    let mut frame_loop = FrameLoop::new(&cfg.pacing, tasks)?
        .with_stop_token(stop)
        .with_max_frames(cfg.runtime.max_frames);

    match cfg.runtime.host {
        HostKind::Headless => {
            let pacer = SleepPacer::new(cfg.runtime.headless_refresh_hz);
            HeadlessHost::new(pacer).run(&mut frame_loop)
        }
        HostKind::Window => {
            host::run_windowed(frame_loop, &cfg.window, cfg.runtime.control_flow_poll())
        }
    }
}
