use crate::model::MovingObject;

/// Half-open `[top, top + h)` intervals on the vertical axis.
pub(crate) fn spans_overlap(a_top: f32, a_h: f32, b_top: f32, b_h: f32) -> bool {
    a_top < b_top + b_h && b_top < a_top + a_h
}

/// True if any enemy shares the player's lane and overlaps it vertically.
pub(crate) fn is_colliding(player: &MovingObject, enemies: &[MovingObject]) -> bool {
    let Some(lane) = player.lane else {
        return false;
    };
    enemies.iter().any(|e| {
        e.lane == Some(lane) && spans_overlap(player.y, player.height, e.y, e.height)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::model::{MovingObject, Player};

    fn setup(player_lane: usize, player_y: f32) -> (GameConfig, MovingObject) {
        let cfg = GameConfig::for_track(420.0, 800.0);
        let mut p = Player::new(&cfg);
        p.body.change_lane(player_lane, &cfg);
        p.body.y = player_y;
        (cfg, p.body)
    }

    #[test]
    fn overlapping_car_in_same_lane_collides() {
        let (cfg, player) = setup(1, 500.0);
        let enemy = MovingObject::enemy(1, 550.0, &cfg);
        assert!(is_colliding(&player, &[enemy]));
    }

    #[test]
    fn overlapping_car_in_other_lane_does_not_collide() {
        let (cfg, player) = setup(1, 500.0);
        let enemy = MovingObject::enemy(0, 550.0, &cfg);
        assert!(!is_colliding(&player, &[enemy]));
    }

    #[test]
    fn touching_bumpers_are_not_a_collision() {
        let (cfg, player) = setup(1, 500.0);
        let below = MovingObject::enemy(1, 660.0, &cfg);
        let above = MovingObject::enemy(1, 340.0, &cfg);
        assert!(!is_colliding(&player, &[below, above]));
    }

    #[test]
    fn overlap_is_symmetric_for_unequal_heights() {
        assert!(spans_overlap(500.0, 160.0, 450.0, 60.0));
        assert!(spans_overlap(450.0, 60.0, 500.0, 160.0));
        // enemy entirely inside the player's span
        assert!(spans_overlap(500.0, 160.0, 520.0, 20.0));
        assert!(!spans_overlap(500.0, 160.0, 440.0, 60.0));
    }

    #[test]
    fn any_single_hit_is_enough() {
        let (cfg, player) = setup(2, 640.0);
        let enemies = vec![
            MovingObject::enemy(0, 640.0, &cfg),
            MovingObject::enemy(1, 640.0, &cfg),
            MovingObject::enemy(2, 700.0, &cfg),
        ];
        assert!(is_colliding(&player, &enemies));
        assert!(!is_colliding(&player, &enemies[..2]));
    }
}
