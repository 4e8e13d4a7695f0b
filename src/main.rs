//! Lane Runner headless entry point
//!
//! Runs one session with the autopilot at a fixed frame rate and reports how
//! far it got.
//!
//! Usage: lane-runner [--seed N] [--seconds S] [--difficulty easy|normal|hard]
//!                    [--settings FILE] [--manual]

use std::process::ExitCode;

use lane_runner::renderer::{LogHud, NullRenderer};
use lane_runner::sim::TickOutcome;
use lane_runner::{Difficulty, Game, Settings, SettingsError};

/// Display refresh the headless loop pretends to run at
const FRAME_DT: f32 = 1.0 / 60.0;

#[derive(Debug)]
struct Options {
    seed: u64,
    seconds: f32,
    difficulty: Option<Difficulty>,
    settings_path: Option<String>,
    autopilot: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            seconds: 120.0,
            difficulty: None,
            settings_path: None,
            autopilot: true,
        }
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut options = Options::default();
    while let Some(arg) = args.next() {
        let mut value = |name: &str| args.next().ok_or_else(|| format!("{name} needs a value"));
        match arg.as_str() {
            "--seed" => {
                options.seed = value("--seed")?
                    .parse()
                    .map_err(|e| format!("bad --seed: {e}"))?;
            }
            "--seconds" => {
                options.seconds = value("--seconds")?
                    .parse()
                    .map_err(|e| format!("bad --seconds: {e}"))?;
            }
            "--difficulty" => {
                let name = value("--difficulty")?;
                options.difficulty = Some(
                    Difficulty::from_str(&name).ok_or_else(|| format!("unknown difficulty {name}"))?,
                );
            }
            "--settings" => options.settings_path = Some(value("--settings")?),
            "--manual" => options.autopilot = false,
            other => return Err(format!("unknown argument {other}")),
        }
    }
    Ok(options)
}

fn load_settings(options: &Options) -> Result<Settings, SettingsError> {
    let mut settings = match &options.settings_path {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(difficulty) = options.difficulty {
        settings.apply_preset(difficulty);
    }
    settings.validate()?;
    Ok(settings)
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Lane Runner (headless) starting...");

    let options = match parse_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };
    let settings = match load_settings(&options) {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::from(2);
        }
    };

    let mut game = Game::new(options.seed, settings, NullRenderer::new(), LogHud::default());
    game.set_autopilot(options.autopilot);

    let max_frames = (options.seconds.max(0.0) / FRAME_DT).ceil() as u64;
    let mut crashed = false;
    for _ in 0..max_frames {
        if let TickOutcome::GameOver { .. } = game.frame(FRAME_DT) {
            crashed = true;
            break;
        }
    }

    let state = game.state();
    println!(
        "seed {} | {} | distance {} | speed {} | {} frames rendered",
        state.seed,
        if crashed { "crashed" } else { "survived" },
        state.score(),
        state.display_speed(),
        game.renderer().frames_rendered()
    );
    game.shutdown();
    log::info!("Released all visuals ({} left)", game.renderer().live_visuals());
    ExitCode::SUCCESS
}
