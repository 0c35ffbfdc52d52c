use anyhow::{ensure, Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub(crate) const PLAYER_SPEED: u32 = 10;
pub(crate) const ENEMY_SPEED: u32 = 10;
pub(crate) const ENEMY_QTY: usize = 3;
pub(crate) const LANES_QTY: usize = 3;

pub(crate) const VEHICLE_WIDTH: f32 = 130.0;
pub(crate) const VEHICLE_HEIGHT: f32 = 160.0;
pub(crate) const ENEMY_CLEARANCE_FACTOR: f32 = 3.0; // respawn at least this many car heights above

pub(crate) const ROAD_LINES_QTY: usize = 5;
pub(crate) const ROAD_LINE_WIDTH: f32 = 10.0;
pub(crate) const ROAD_LINE_GAP: f32 = 70.0;

#[derive(Parser, Debug, Clone)]
#[command(name = "lanedash")]
#[command(about = "Three-lane terminal racer: dodge oncoming traffic, beat your best distance", long_about = None)]
pub(crate) struct Args {
    /// Frame rate cap; one game tick runs per frame
    #[arg(long)]
    pub(crate) fps: Option<u32>,

    /// RNG seed for enemy placement (0 = seed from the clock)
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// Render without colors
    #[arg(long, default_value_t = false)]
    pub(crate) no_color: bool,

    /// Directory for settings, best score and log file
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,

    /// Clear the stored best score before starting
    #[arg(long, default_value_t = false)]
    pub(crate) reset_best: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Settings {
    pub(crate) fps_cap: u32,
    pub(crate) enable_color: bool,
    pub(crate) seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps_cap: 60,
            enable_color: true,
            seed: 0,
        }
    }
}

impl Settings {
    /// CLI flags win over the saved file for this run only.
    pub(crate) fn with_overrides(mut self, args: &Args) -> Self {
        if let Some(fps) = args.fps {
            self.fps_cap = fps;
        }
        if let Some(seed) = args.seed {
            self.seed = seed;
        }
        if args.no_color {
            self.enable_color = false;
        }
        self
    }
}

/// Gameplay geometry and speeds, fixed for the lifetime of a process.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct GameConfig {
    pub(crate) player_speed: u32,
    pub(crate) enemy_speed: u32,
    pub(crate) enemy_qty: usize,
    pub(crate) lanes: usize,
    pub(crate) vehicle_width: f32,
    pub(crate) vehicle_height: f32,
    pub(crate) clearance_factor: f32,
    pub(crate) road_lines_qty: usize,
    pub(crate) road_line_width: f32,
    pub(crate) road_line_gap: f32,
    pub(crate) track_width: f32,
    pub(crate) track_height: f32,
}

impl GameConfig {
    pub(crate) fn for_track(track_width: f32, track_height: f32) -> Self {
        Self {
            player_speed: PLAYER_SPEED,
            enemy_speed: ENEMY_SPEED,
            enemy_qty: ENEMY_QTY,
            lanes: LANES_QTY,
            vehicle_width: VEHICLE_WIDTH,
            vehicle_height: VEHICLE_HEIGHT,
            clearance_factor: ENEMY_CLEARANCE_FACTOR,
            road_lines_qty: ROAD_LINES_QTY,
            road_line_width: ROAD_LINE_WIDTH,
            road_line_gap: ROAD_LINE_GAP,
            track_width,
            track_height,
        }
    }

    pub(crate) fn min_clearance(&self) -> f32 {
        self.vehicle_height * self.clearance_factor
    }

    pub(crate) fn max_clearance(&self) -> f32 {
        self.track_height
    }

    pub(crate) fn road_line_pitch(&self) -> f32 {
        self.track_height / self.road_lines_qty as f32
    }

    pub(crate) fn validate(&self) -> Result<()> {
        ensure!(self.lanes > 0, "lane count must be positive");
        ensure!(self.enemy_qty > 0, "enemy count must be positive");
        ensure!(self.road_lines_qty > 0, "road line count must be positive");
        ensure!(
            self.vehicle_width > 0.0 && self.vehicle_height > 0.0,
            "vehicle dimensions must be positive"
        );
        ensure!(
            self.track_width > 0.0 && self.vehicle_height < self.track_height,
            "track {}x{} cannot hold a {}px tall vehicle",
            self.track_width,
            self.track_height,
            self.vehicle_height
        );
        ensure!(
            self.clearance_factor >= 1.0,
            "enemy clearance must be at least one vehicle height"
        );
        ensure!(
            (self.min_clearance() as i32) < (self.max_clearance() as i32),
            "track height {} leaves no room for enemy respawn clearance {}",
            self.track_height,
            self.min_clearance()
        );
        ensure!(
            self.road_line_pitch() > self.road_line_gap,
            "road line pitch {} must exceed the gap {}",
            self.road_line_pitch(),
            self.road_line_gap
        );
        Ok(())
    }
}

pub(crate) struct Paths {
    pub(crate) settings_path: PathBuf,
    pub(crate) best_score_path: PathBuf,
    pub(crate) log_path: PathBuf,
}

impl Paths {
    pub(crate) fn in_dir(dir: &Path) -> Self {
        Self {
            settings_path: dir.join("settings.json"),
            best_score_path: dir.join("best_score.json"),
            log_path: dir.join("lanedash.log"),
        }
    }
}

pub(crate) fn project_paths(override_dir: Option<&Path>) -> Result<Paths> {
    let dir = match override_dir {
        Some(d) => d.to_path_buf(),
        None => ProjectDirs::from("com", "lanedash", "Lanedash")
            .context("could not resolve project directories")?
            .data_local_dir()
            .to_path_buf(),
    };
    fs::create_dir_all(&dir)
        .with_context(|| format!("could not create data dir {}", dir.display()))?;
    Ok(Paths::in_dir(&dir))
}

/// Missing or unparsable file falls back to defaults.
pub(crate) fn load_settings(path: &Path) -> Settings {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

/// Serializes next to `path` and renames over it. `rename` replaces the
/// target in one step, so a reader sees either the old file or the new one.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(value)?;
    fs::write(&tmp, data).with_context(|| format!("could not write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("could not move {} to {}", tmp.display(), path.display()))?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn scratch_dir(tag: &str) -> PathBuf {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    let n = NEXT.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("lanedash-{}-{}-{}", tag, std::process::id(), n));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_track_config_is_valid() {
        let cfg = GameConfig::for_track(420.0, 800.0);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.min_clearance(), 480.0);
    }

    #[test]
    fn zero_lanes_is_rejected() {
        let mut cfg = GameConfig::for_track(420.0, 800.0);
        cfg.lanes = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn short_track_without_respawn_room_is_rejected() {
        // 480px clearance needs a taller track
        let cfg = GameConfig::for_track(420.0, 480.0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn cli_overrides_saved_settings() {
        let args = Args::parse_from(["lanedash", "--fps", "30", "--seed", "7", "--no-color"]);
        let s = Settings::default().with_overrides(&args);
        assert_eq!(s.fps_cap, 30);
        assert_eq!(s.seed, 7);
        assert!(!s.enable_color);
    }

    #[test]
    fn settings_round_trip_and_corrupt_fallback() {
        let dir = scratch_dir("settings");
        let paths = Paths::in_dir(&dir);

        assert_eq!(load_settings(&paths.settings_path), Settings::default());

        let s = Settings {
            fps_cap: 45,
            enable_color: false,
            seed: 99,
        };
        write_json_atomic(&paths.settings_path, &s).unwrap();
        assert_eq!(load_settings(&paths.settings_path), s);

        fs::write(&paths.settings_path, b"{ not json").unwrap();
        assert_eq!(load_settings(&paths.settings_path), Settings::default());
    }
}
