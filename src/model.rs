use crate::config::GameConfig;
use crate::geometry::{lane_to_offset, random_int};
use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ObjectKind {
    Player,
    Enemy,
    RoadLine,
}

/// Where an object re-enters after sliding off the bottom of the track.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum RecyclePolicy {
    /// Back to exactly one object height above the top.
    FixedOffset,
    /// Somewhere in `[-max_clearance, -min_clearance]`.
    Randomized {
        min_clearance: f32,
        max_clearance: f32,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MovingObject {
    pub(crate) kind: ObjectKind,
    pub(crate) x: f32, // px, left edge
    pub(crate) y: f32, // px, top edge; negative is above the track
    pub(crate) width: f32,
    pub(crate) height: f32,
    pub(crate) dx: f32, // px/tick
    pub(crate) dy: f32, // px/tick
    pub(crate) lane: Option<usize>,
    pub(crate) recycle: RecyclePolicy,
}

impl MovingObject {
    pub(crate) fn road_line(x: f32, y: f32, width: f32, height: f32, speed: f32) -> Self {
        Self {
            kind: ObjectKind::RoadLine,
            x,
            y,
            width,
            height,
            dx: 0.0,
            dy: speed,
            lane: None,
            recycle: RecyclePolicy::FixedOffset,
        }
    }

    pub(crate) fn enemy(lane: usize, y: f32, cfg: &GameConfig) -> Self {
        Self::vehicle(
            ObjectKind::Enemy,
            lane,
            y,
            cfg.enemy_speed as f32,
            RecyclePolicy::Randomized {
                min_clearance: cfg.min_clearance(),
                max_clearance: cfg.max_clearance(),
            },
            cfg,
        )
    }

    fn vehicle(
        kind: ObjectKind,
        lane: usize,
        y: f32,
        dy: f32,
        recycle: RecyclePolicy,
        cfg: &GameConfig,
    ) -> Self {
        debug_assert!(lane < cfg.lanes, "lane {} out of range", lane);
        Self {
            kind,
            x: lane_to_offset(lane, cfg.track_width, cfg.lanes),
            y,
            width: cfg.vehicle_width,
            height: cfg.vehicle_height,
            dx: 0.0,
            dy,
            lane: Some(lane),
            recycle,
        }
    }

    pub(crate) fn advance(&mut self) {
        self.x += self.dx;
        self.y += self.dy;
    }

    /// Returns true when the object was moved back above the track.
    pub(crate) fn recycle_if_offscreen<R: Rng + ?Sized>(&mut self, bottom: f32, rng: &mut R) -> bool {
        if self.y <= bottom {
            return false;
        }
        self.y = match self.recycle {
            RecyclePolicy::FixedOffset => -self.height,
            RecyclePolicy::Randomized {
                min_clearance,
                max_clearance,
            } => -random_int(rng, min_clearance as i32, max_clearance as i32) as f32,
        };
        true
    }

    /// Immediate jump, no tweening. Caller guarantees `lane < cfg.lanes`.
    pub(crate) fn change_lane(&mut self, lane: usize, cfg: &GameConfig) {
        debug_assert!(lane < cfg.lanes, "lane {} out of range", lane);
        self.lane = Some(lane);
        self.x = lane_to_offset(lane, cfg.track_width, cfg.lanes);
    }
}

/// The player's car plus the run's distance counter.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Player {
    pub(crate) body: MovingObject,
    pub(crate) distance: u64,
}

impl Player {
    /// Bottom of the track, left-most lane.
    pub(crate) fn new(cfg: &GameConfig) -> Self {
        Self {
            body: MovingObject::vehicle(
                ObjectKind::Player,
                0,
                cfg.track_height - cfg.vehicle_height,
                0.0,
                RecyclePolicy::FixedOffset,
                cfg,
            ),
            distance: 0,
        }
    }

    pub(crate) fn lane(&self) -> usize {
        self.body.lane.unwrap_or(0)
    }

    pub(crate) fn move_left(&mut self, cfg: &GameConfig) {
        let lane = self.lane();
        if lane > 0 {
            self.body.change_lane(lane - 1, cfg);
        }
    }

    pub(crate) fn move_right(&mut self, cfg: &GameConfig) {
        let lane = self.lane();
        if lane + 1 < cfg.lanes {
            self.body.change_lane(lane + 1, cfg);
        }
    }

    pub(crate) fn travel(&mut self, speed: u32) {
        self.distance += speed as u64;
    }
}
