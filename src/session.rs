use crate::collision::is_colliding;
use crate::config::GameConfig;
use crate::geometry::{lane_to_offset, random_int};
use crate::model::{MovingObject, Player};
use crate::storage::ScoreStore;
use log::{debug, info, warn};
use rand::{rngs::StdRng, SeedableRng};

pub(crate) type ObjectId = usize;

pub(crate) const PLAYER_ID: ObjectId = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    Running,
    Ended,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Panel {
    Start,
    Score,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Start,
    MoveLeft,
    MoveRight,
}

/// Whatever draws the game. Calls arrive synchronously and cannot fail.
pub(crate) trait Presenter {
    fn clear_objects(&mut self);
    /// Creates the visual on first sight of `id`, moves it afterwards.
    fn put_object(&mut self, id: ObjectId, obj: &MovingObject);
    fn set_score(&mut self, distance: u64);
    fn set_best_score(&mut self, best: u64);
    fn set_final_score(&mut self, distance: u64);
    fn set_panel(&mut self, panel: Panel, visible: bool);
    fn set_new_best(&mut self, visible: bool);
}

pub(crate) struct Session<S: ScoreStore, P: Presenter> {
    cfg: GameConfig,
    phase: Phase,
    player: Player,
    enemies: Vec<MovingObject>,
    road_lines: Vec<MovingObject>,
    best_score: u64,
    new_best: bool,
    ticks: u64,
    rng: StdRng,
    store: S,
    presenter: P,
}

impl<S: ScoreStore, P: Presenter> Session<S, P> {
    /// Idle session showing the start panel. `cfg` must already be validated.
    pub(crate) fn new(cfg: GameConfig, store: S, mut presenter: P, seed: u64) -> Self {
        let best_score = store.best_score();
        presenter.set_best_score(best_score);
        presenter.set_panel(Panel::Start, true);
        presenter.set_panel(Panel::Score, false);
        presenter.set_panel(Panel::End, false);
        presenter.set_new_best(false);

        let player = Player::new(&cfg);
        Self {
            cfg,
            phase: Phase::Idle,
            player,
            enemies: Vec::new(),
            road_lines: Vec::new(),
            best_score,
            new_best: false,
            ticks: 0,
            rng: StdRng::seed_from_u64(seed),
            store,
            presenter,
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn distance(&self) -> u64 {
        self.player.distance
    }

    pub(crate) fn presenter(&self) -> &P {
        &self.presenter
    }

    pub(crate) fn apply(&mut self, cmd: Command) {
        match (self.phase, cmd) {
            (Phase::Idle | Phase::Ended, Command::Start) => self.start(),
            (Phase::Running, Command::MoveLeft) => {
                self.player.move_left(&self.cfg);
                self.presenter.put_object(PLAYER_ID, &self.player.body);
            }
            (Phase::Running, Command::MoveRight) => {
                self.player.move_right(&self.cfg);
                self.presenter.put_object(PLAYER_ID, &self.player.body);
            }
            _ => {}
        }
    }

    /// Throws away any previous run and begins a new one.
    pub(crate) fn start(&mut self) {
        // a failed write at the last game over must not lose the record
        self.best_score = self.best_score.max(self.store.best_score());
        self.presenter.set_best_score(self.best_score);

        self.presenter.set_panel(Panel::Start, false);
        self.presenter.set_panel(Panel::End, false);
        self.presenter.set_new_best(false);
        self.presenter.clear_objects();

        self.road_lines = self.spawn_road_lines();
        self.player = Player::new(&self.cfg);
        self.enemies = self.spawn_enemies();
        self.new_best = false;
        self.ticks = 0;

        self.presenter.set_score(0);
        self.presenter.set_panel(Panel::Score, true);
        self.publish_objects();

        self.phase = Phase::Running;
        info!(
            "run started: {} enemies, {} road lines, best {}",
            self.enemies.len(),
            self.road_lines.len(),
            self.best_score
        );
    }

    /// One frame of play. Returns whether the host should schedule another.
    pub(crate) fn tick(&mut self) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        self.ticks += 1;

        self.player.travel(self.cfg.player_speed);
        self.presenter.set_score(self.player.distance);

        let bottom = self.cfg.track_height;
        for obj in self.enemies.iter_mut().chain(self.road_lines.iter_mut()) {
            obj.advance();
            obj.recycle_if_offscreen(bottom, &mut self.rng);
        }
        self.publish_objects();

        if is_colliding(&self.player.body, &self.enemies) {
            debug!("collision on tick {} in lane {}", self.ticks, self.player.lane());
            self.end_run();
            return false;
        }
        true
    }

    fn end_run(&mut self) {
        self.phase = Phase::Ended;
        let distance = self.player.distance;
        self.presenter.set_final_score(distance);

        if distance > self.best_score {
            if let Err(e) = self.store.set_best_score(distance) {
                warn!("could not persist best score {}: {:#}", distance, e);
            }
            self.best_score = distance;
            self.new_best = true;
            self.presenter.set_new_best(true);
            self.presenter.set_best_score(distance);
        }

        self.presenter.set_panel(Panel::End, true);
        info!(
            "run over after {} ticks: distance {}, best {}{}",
            self.ticks,
            distance,
            self.best_score,
            if self.new_best { " (new best)" } else { "" }
        );
    }

    fn publish_objects(&mut self) {
        self.presenter.put_object(PLAYER_ID, &self.player.body);
        let first_enemy = PLAYER_ID + 1;
        for (i, e) in self.enemies.iter().enumerate() {
            self.presenter.put_object(first_enemy + i, e);
        }
        let first_line = first_enemy + self.enemies.len();
        for (i, l) in self.road_lines.iter().enumerate() {
            self.presenter.put_object(first_line + i, l);
        }
    }

    /// Lanes are cycled so a pool larger than the lane count wraps around.
    /// Each lane starts one track height further up than the previous one.
    fn spawn_enemies(&mut self) -> Vec<MovingObject> {
        let h = self.cfg.track_height;
        (0..self.cfg.enemy_qty)
            .map(|i| {
                let lane = i % self.cfg.lanes;
                let lead = random_int(&mut self.rng, self.cfg.vehicle_height as i32, h as i32);
                let y = -(lead as f32) - lane as f32 * h;
                MovingObject::enemy(lane, y, &self.cfg)
            })
            .collect()
    }

    /// Dashes along every lane divider.
    fn spawn_road_lines(&self) -> Vec<MovingObject> {
        let cfg = &self.cfg;
        let pitch = cfg.road_line_pitch();
        let dash = pitch - cfg.road_line_gap;
        let mut lines = Vec::new();
        for divider in 1..cfg.lanes {
            let x = lane_to_offset(divider, cfg.track_width, cfg.lanes) - cfg.road_line_width / 2.0;
            for i in 0..=cfg.road_lines_qty {
                lines.push(MovingObject::road_line(
                    x,
                    i as f32 * pitch,
                    cfg.road_line_width,
                    dash,
                    cfg.player_speed as f32,
                ));
            }
        }
        lines
    }
}
