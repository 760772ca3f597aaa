//! Dither generators
//!
//! Each generator draws from the engine's random source and may read or
//! update the channel's previous dither value. All values are in units of
//! one quantization step (LSB).
//!
//! | Mode         | Range        | Spectrum  |
//! |--------------|--------------|-----------|
//! | None         | 0            | -         |
//! | Rectangular  | [-0.5, 0.5)  | white     |
//! | Triangular   | (-1, 1)      | white     |
//! | HighpassRect | (-1, 1)      | rising    |

use rand::Rng;
use requant_core::DitherMode;

/// No dither
#[inline]
pub fn none<R: Rng>(_previous: &mut f32, _rng: &mut R) -> f32 {
    0.0
}

/// Rectangular PDF dither, uniform in [-0.5, 0.5)
#[inline]
pub fn rectangular<R: Rng>(_previous: &mut f32, rng: &mut R) -> f32 {
    rng.gen::<f32>() - 0.5
}

/// Triangular PDF dither, difference of two independent uniforms
#[inline]
pub fn triangular<R: Rng>(_previous: &mut f32, rng: &mut R) -> f32 {
    let a = rng.gen::<f32>();
    let b = rng.gen::<f32>();
    a - b
}

/// First difference of rectangular dither
///
/// Stores the new rectangular draw in `previous`.
#[inline]
pub fn highpass<R: Rng>(previous: &mut f32, rng: &mut R) -> f32 {
    let rnd = rng.gen::<f32>() - 0.5;
    let d = rnd - *previous;
    *previous = rnd;
    d
}

/// Draw one dither value for `mode`
///
/// Dispatches on every call. The block loop in the engine resolves the mode
/// once instead and calls the generator directly.
pub fn draw<R: Rng>(mode: DitherMode, previous: &mut f32, rng: &mut R) -> f32 {
    match mode {
        DitherMode::None => none(previous, rng),
        DitherMode::Rectangular => rectangular(previous, rng),
        DitherMode::Triangular => triangular(previous, rng),
        DitherMode::HighpassRect => highpass(previous, rng),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DRAWS: usize = 100_000;

    #[test]
    fn test_none_is_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut prev = 0.3;
        for _ in 0..100 {
            assert_eq!(draw(DitherMode::None, &mut prev, &mut rng), 0.0);
        }
        assert_eq!(prev, 0.3);
    }

    #[test]
    fn test_rectangular_bounds() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut prev = 0.0;
        let mut sum = 0.0_f64;
        for _ in 0..DRAWS {
            let d = rectangular(&mut prev, &mut rng);
            assert!((-0.5..0.5).contains(&d), "rectangular dither out of range: {}", d);
            sum += d as f64;
        }
        assert!((sum / DRAWS as f64).abs() < 0.01);
    }

    #[test]
    fn test_triangular_bounds_and_mean() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut prev = 0.0;
        let mut sum = 0.0_f64;
        let mut near_zero = 0;
        let mut near_edge = 0;
        for _ in 0..DRAWS {
            let d = triangular(&mut prev, &mut rng);
            assert!(d > -1.0 && d < 1.0, "triangular dither out of range: {}", d);
            sum += d as f64;
            if d.abs() < 0.1 {
                near_zero += 1;
            }
            if d.abs() > 0.9 {
                near_edge += 1;
            }
        }
        assert!((sum / DRAWS as f64).abs() < 0.01);
        // Triangular density peaks at zero and vanishes at the edges
        assert!(near_zero > 5 * near_edge);
    }

    #[test]
    fn test_highpass_updates_previous() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut reference = StdRng::seed_from_u64(4);

        let mut prev = 0.0;
        let first = highpass(&mut prev, &mut rng);
        let r1 = reference.gen::<f32>() - 0.5;
        assert_eq!(first, r1);
        assert_eq!(prev, r1);

        let second = highpass(&mut prev, &mut rng);
        let r2 = reference.gen::<f32>() - 0.5;
        assert_eq!(second, r2 - r1);
        assert_eq!(prev, r2);
    }

    #[test]
    fn test_highpass_has_little_dc() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut prev = 0.0;
        // First difference telescopes: the running sum is just the last draw
        let sum: f32 = (0..DRAWS).map(|_| highpass(&mut prev, &mut rng)).sum();
        assert!(sum.abs() < 1.0);
    }

    #[test]
    fn test_draw_dispatch_matches_generators() {
        let mut a = StdRng::seed_from_u64(6);
        let mut b = StdRng::seed_from_u64(6);
        let mut prev_a = 0.0;
        let mut prev_b = 0.0;

        for _ in 0..32 {
            assert_eq!(
                draw(DitherMode::Triangular, &mut prev_a, &mut a),
                triangular(&mut prev_b, &mut b)
            );
            assert_eq!(
                draw(DitherMode::HighpassRect, &mut prev_a, &mut a),
                highpass(&mut prev_b, &mut b)
            );
        }
    }
}
