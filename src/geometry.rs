use rand::Rng;

/// Uniform integer in `[min, max)`. Gameplay randomness only.
pub(crate) fn random_int<R: Rng + ?Sized>(rng: &mut R, min: i32, max: i32) -> i32 {
    assert!(min < max, "empty range {}..{}", min, max);
    rng.gen_range(min..max)
}

/// Left edge of a lane, in track pixels.
pub(crate) fn lane_to_offset(lane: usize, track_width: f32, lanes: usize) -> f32 {
    lane as f32 * (track_width / lanes as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn lane_offsets_start_at_zero_and_increase() {
        let lanes = 3;
        assert_eq!(lane_to_offset(0, 420.0, lanes), 0.0);
        for l in 1..lanes {
            assert!(lane_to_offset(l, 420.0, lanes) > lane_to_offset(l - 1, 420.0, lanes));
        }
        assert_eq!(lane_to_offset(2, 420.0, lanes), 280.0);
    }

    #[test]
    fn random_int_stays_in_half_open_range() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..1000 {
            let v = random_int(&mut rng, 160, 800);
            assert!((160..800).contains(&v));
        }
        assert_eq!(random_int(&mut rng, 4, 5), 4);
    }

    #[test]
    #[should_panic]
    fn random_int_rejects_empty_range() {
        let mut rng = StdRng::seed_from_u64(1);
        random_int(&mut rng, 5, 5);
    }
}
