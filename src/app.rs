use crate::config::{
    load_settings, project_paths, write_json_atomic, Args, GameConfig, Settings,
};
use crate::input::{collect_input_nonblocking, map_key, Action};
use crate::render::{fit_view, Terminal, TerminalPresenter, Viewport};
use crate::session::{Command, Phase, Session};
use crate::storage::JsonScoreStore;
use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use std::fs::OpenOptions;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

type Game = Session<JsonScoreStore, TerminalPresenter>;

pub(crate) fn run() -> Result<()> {
    let args = Args::parse();
    let paths = project_paths(args.data_dir.as_deref())?;
    init_logging(&paths.log_path)?;

    if !paths.settings_path.exists() {
        write_json_atomic(&paths.settings_path, &Settings::default())?;
    }
    let settings = load_settings(&paths.settings_path).with_overrides(&args);

    let store = JsonScoreStore::new(&paths.best_score_path);
    if args.reset_best {
        store.clear()?;
        info!("best score cleared");
    }

    // viewport is read once; later resizes only re-centre the track
    let (tw, th) = crossterm::terminal::size()?;
    let Some(view) = fit_view(tw, th) else {
        bail!("terminal too small ({}x{}); try at least 44x16", tw, th);
    };
    let (track_w, track_h) = view.track_size_px();
    let cfg = GameConfig::for_track(track_w, track_h);
    cfg.validate().context("invalid game configuration")?;

    let seed = if settings.seed == 0 {
        clock_seed()
    } else {
        settings.seed
    };
    info!(
        "starting: track {}x{}px ({} lanes), seed {:#x}, {} fps",
        track_w, track_h, cfg.lanes, seed, settings.fps_cap
    );

    let session = Session::new(
        cfg,
        store,
        TerminalPresenter::new(settings.enable_color),
        seed,
    );

    let mut term = Terminal::begin()?;
    let res = run_loop(&mut term, session, view, &settings);
    let restored = term.end();
    info!("shutdown");
    res.and(restored)
}

/// Host scheduler: one session tick per frame for as long as the session asks for more.
fn run_loop(term: &mut Terminal, mut game: Game, mut view: Viewport, settings: &Settings) -> Result<()> {
    let fps = settings.fps_cap.clamp(10, 240);
    let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);
    let mut scheduled = false;

    loop {
        let frame_start = Instant::now();

        if term.resize_if_needed()? {
            view.recenter(term.cols, term.rows);
        }

        for key in collect_input_nonblocking(frame_dt)? {
            match map_key(key) {
                Some(Action::Quit) => {
                    info!("quit in {:?} at distance {}", game.phase(), game.distance());
                    return Ok(());
                }
                Some(Action::Game(cmd)) => {
                    game.apply(cmd);
                    if cmd == Command::Start && game.phase() == Phase::Running {
                        scheduled = true;
                    }
                }
                None => {}
            }
        }

        if scheduled {
            scheduled = game.tick();
        }

        game.presenter().draw(&mut term.cur, &view);
        term.present()?;

        pace_frame(frame_dt, frame_start);
    }
}

fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("could not open log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .write_style(env_logger::WriteStyle::Never)
        .try_init()?;
    Ok(())
}

fn clock_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    nanos ^ 0xC0FFEE_u64
}

/// Time left in the frame, or `None` once the frame has overrun.
fn frame_remaining(target: Duration, elapsed: Duration) -> Option<Duration> {
    target.checked_sub(elapsed).filter(|d| !d.is_zero())
}

fn pace_frame(target: Duration, start: Instant) {
    if let Some(left) = frame_remaining(target, start.elapsed()) {
        std::thread::sleep(left);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_pacing_sleeps_the_remainder_and_never_spins() {
        let frame = Duration::from_millis(16);
        assert_eq!(
            frame_remaining(frame, Duration::from_millis(10)),
            Some(Duration::from_millis(6))
        );
        assert_eq!(frame_remaining(frame, frame), None);
        assert_eq!(frame_remaining(frame, Duration::from_millis(40)), None);

        let start = Instant::now();
        pace_frame(Duration::from_millis(5), start);
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
