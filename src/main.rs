//! Tilt Bounce demo
//!
//! Runs the simulation headless against a scripted tilt and renders every
//! impact through the tone engine.
//!
//! ```text
//! tilt-bounce [config.json] [--no-feedback]
//! ```
//!
//! The config path can also come from `TILT_BOUNCE_CONFIG`. Set `RUST_LOG=debug`
//! to see each rendered impact.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use tilt_bounce::consts::{MAX_SUBSTEPS, SIM_DT};
use tilt_bounce::feedback::{DispatchWorker, ToneEngine};
use tilt_bounce::motion::{self, MotionSource, ScriptedMotion, TiltScript};
use tilt_bounce::sim::FixedStepper;
use tilt_bounce::{CollisionEventMapper, Config, FeedbackPipeline, PhysicsSimulator, PlaybackScheduler};

/// Display refresh the demo pretends to run at
const FRAME_DT: f32 = 1.0 / 60.0;
/// Ten seconds of frames
const DEMO_FRAMES: u32 = 600;
/// Sensor cadence of the scripted tilt
const MOTION_INTERVAL: Duration = Duration::from_millis(10);

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut config_path = std::env::var_os("TILT_BOUNCE_CONFIG").map(PathBuf::from);
    let mut feedback = true;
    for arg in std::env::args().skip(1) {
        if arg == "--no-feedback" {
            feedback = false;
        } else {
            config_path = Some(PathBuf::from(arg));
        }
    }

    let config = match &config_path {
        Some(path) => Config::load(path)?,
        None => {
            log::info!("No config given, using defaults");
            Config::default()
        }
    };

    let engine = if feedback {
        ToneEngine::new()
    } else {
        ToneEngine::unavailable("feedback disabled on the command line")
    };
    let mut scheduler = PlaybackScheduler::new(engine, &config.playback);
    // A failed start leaves the scheduler degraded; the simulation runs regardless
    let _ = scheduler.start();
    let (worker, queue) = DispatchWorker::spawn(scheduler, config.playback.queue_capacity)?;

    let mut sim = PhysicsSimulator::new(&config.physics);
    let mut source = ScriptedMotion::new(TiltScript::default(), MOTION_INTERVAL);
    motion::connect(&mut source, sim.gravity_mailbox())?;

    let mut pipeline = FeedbackPipeline::new(CollisionEventMapper::new(&config.mapping), queue);
    let mut stepper = FixedStepper::new(SIM_DT, MAX_SUBSTEPS);
    let mut impacts = 0usize;

    log::info!(
        "Running {DEMO_FRAMES} frames in a {}x{} box",
        config.physics.width,
        config.physics.height
    );
    let frame = Duration::from_secs_f32(FRAME_DT);
    for _ in 0..DEMO_FRAMES {
        let began = Instant::now();
        stepper.advance(FRAME_DT, |dt| impacts += sim.tick_with(dt, &mut pipeline));
        if let Some(rest) = frame.checked_sub(began.elapsed()) {
            thread::sleep(rest);
        }
    }

    source.unsubscribe();
    let (_, queue) = pipeline.into_inner();
    let dropped = queue.dropped();
    drop(queue);

    let body = sim.body();
    log::info!(
        "Simulated {:.2}s ({} ticks): {impacts} impacts, body at ({:.1}, {:.1}) moving {:.1} px/s",
        sim.time(),
        sim.ticks(),
        body.pos.x,
        body.pos.y,
        body.speed()
    );

    match worker.shutdown() {
        Some(mut scheduler) => {
            let stats = scheduler.stats();
            log::info!(
                "Feedback: {} started, {} suppressed, {} dropped (engine down), {} failed, {} dropped (queue full)",
                stats.started,
                stats.suppressed,
                stats.dropped_engine_down,
                stats.failed,
                dropped
            );
            log::info!(
                "Engine {}: {} restart attempts, {} renders kept",
                scheduler.state().as_str(),
                stats.restart_attempts,
                scheduler.engine().history().len()
            );
            scheduler.shutdown();
        }
        None => log::warn!("Feedback worker did not shut down cleanly"),
    }
    Ok(())
}
