//! Block Catcher entry point
//!
//! Parses the command line, loads configuration, then runs either the
//! interactive terminal game or a headless autopilot session.

use std::fs::File;
use std::io::{self, Write, stdout};
use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use crossterm::{
    ExecutableCommand, cursor,
    event::{
        self, Event, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    terminal,
};

use block_catcher::GameConfig;
use block_catcher::audio::AudioManager;
use block_catcher::platform::{FixedTimestep, InputMapper};
use block_catcher::renderer::{NullPresenter, Presenter, TerminalRenderer};
use block_catcher::sim::{GamePhase, GameState, TickInput, tick};

const USAGE: &str = "block-catcher [--config PATH] [--seed N] [--headless TICKS] [--demo]";
const LOG_FILE: &str = "block-catcher.log";
/// Frame cap for the terminal front end
const FRAME_TIME: Duration = Duration::from_millis(16);

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    seed: Option<u64>,
    headless: Option<u64>,
    demo: bool,
}

fn parse_args() -> Result<Args> {
    let mut parsed = Args::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => parsed.config = Some(args.next().context(USAGE)?.into()),
            "--seed" => {
                let value = args.next().context(USAGE)?;
                parsed.seed = Some(value.parse().with_context(|| format!("Bad seed {value}"))?);
            }
            "--headless" => {
                let value = args.next().context(USAGE)?;
                parsed.headless = Some(
                    value
                        .parse()
                        .with_context(|| format!("Bad tick count {value}"))?,
                );
            }
            "--demo" => parsed.demo = true,
            "-h" | "--help" => bail!("Usage: {USAGE}"),
            other => bail!("Unknown argument {other}\n\nUsage: {USAGE}"),
        }
    }
    Ok(parsed)
}

fn run() -> Result<()> {
    let args = parse_args()?;

    match args.headless {
        Some(_) => env_logger::init(),
        None => {
            let log_path = std::env::temp_dir().join(LOG_FILE);
            let file = File::create(&log_path)
                .with_context(|| format!("Failed to create {}", log_path.display()))?;
            env_logger::Builder::from_default_env()
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        }
    }

    let config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => GameConfig::default(),
    };

    let seed = args.seed.unwrap_or_else(clock_seed);
    let state = GameState::new(seed, config.tuning.clone(), &config.settings)
        .context("Invalid tuning")?;
    log::info!("Block Catcher starting (seed {seed})");

    match args.headless {
        Some(ticks) => run_headless(state, ticks),
        None => run_terminal(state, &config, args.demo),
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Autopilot for a fixed number of ticks, restarting after each game over
fn run_headless(mut state: GameState, ticks: u64) -> Result<()> {
    let mut presenter = NullPresenter::default();

    for _ in 0..ticks {
        let input = TickInput {
            idle_mode: true,
            restart: state.session.phase == GamePhase::Over,
            ..Default::default()
        };
        tick(&mut state, &input);
        presenter.present(&state.snapshot())?;
    }

    log::info!(
        "Headless run done: {} frames, best score {:?}",
        presenter.frames,
        state.high_scores.best().map(|run| run.score)
    );
    let json = serde_json::to_string_pretty(&state.snapshot())?;
    println!("{json}");
    Ok(())
}

fn run_terminal(state: GameState, config: &GameConfig, demo: bool) -> Result<()> {
    terminal::enable_raw_mode().context("Failed to enable raw mode")?;
    let mut out = stdout();
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;
    out.execute(terminal::DisableLineWrap)?;

    // Terminals without the kitty protocol never report releases
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    let result = game_loop(state, config, demo);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

fn game_loop(mut state: GameState, config: &GameConfig, demo: bool) -> Result<()> {
    let settings = &config.settings;
    let (cols, rows) = terminal::size()?;
    let mut renderer = TerminalRenderer::new(io::BufWriter::new(stdout()), cols, rows);
    let mut audio = AudioManager::for_terminal(settings);
    let mut input = InputMapper::new(demo);
    let mut clock = FixedTimestep::default();

    let mut frame: u64 = 0;
    let mut render_failures: u64 = 0;
    let mut last_frame = Instant::now();
    let mut fps_window = (Instant::now(), 0u32);

    loop {
        let frame_start = Instant::now();
        frame += 1;

        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) => input.handle(&key, frame),
                Event::Resize(c, r) => renderer.resize(c, r),
                _ => {}
            }
        }
        if input.exit_requested() {
            log::info!("Exit requested");
            break;
        }

        let substeps = clock.advance(last_frame.elapsed());
        last_frame = Instant::now();
        for _ in 0..substeps {
            tick(&mut state, &input.tick_input(frame));
            input.consume_one_shots();
            audio.play_events(&state.events);
        }
        if state.exit_requested {
            break;
        }

        if settings.show_fps {
            fps_window.1 += 1;
            let window = fps_window.0.elapsed();
            if window >= Duration::from_secs(1) {
                let fps = (fps_window.1 as f32 / window.as_secs_f32()).round() as u32;
                renderer.set_fps(Some(fps));
                fps_window = (Instant::now(), 0);
            }
        }

        if let Err(e) = renderer.present(&state.snapshot()) {
            render_failures += 1;
            if render_failures == 1 || render_failures.is_multiple_of(100) {
                log::warn!("Render failed ({render_failures} so far): {e}");
            }
        }

        // Nothing changes before the next tick is due
        let wait = FRAME_TIME
            .saturating_sub(frame_start.elapsed())
            .max(clock.until_next());
        std::thread::sleep(wait);
    }

    let mut renderer_out = renderer.into_inner();
    renderer_out.flush()?;
    if let Some(best) = state.high_scores.best() {
        log::info!("Best run this session: {} (level {})", best.score, best.level);
    }
    Ok(())
}
