//! Easing curves used by the stage timelines.
//!
//! Every ease is a monotonic reparameterization of normalized progress:
//! input is clamped to [0, 1], ease(0) = 0 and ease(1) = 1. Timelines pick
//! the curve per effect (cubic in/out for the explosion, quartic-in for the
//! exit burst, cubic-out for the door slide).

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

pub fn ease_in_quartic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * t * t
}

pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    let u = 1.0 - t;
    1.0 - u * u * u
}

#[cfg(test)]
mod tests {
    use super::*;

    const EASES: &[(&str, fn(f32) -> f32)] = &[
        ("ease_in_out_cubic", ease_in_out_cubic),
        ("ease_in_quartic", ease_in_quartic),
        ("ease_out_cubic", ease_out_cubic),
    ];

    #[test]
    fn boundary_laws() {
        for (name, ease) in EASES {
            assert!((ease(0.0) - 0.0).abs() < 1e-6, "{name}(0) != 0");
            assert!((ease(1.0) - 1.0).abs() < 1e-6, "{name}(1) != 1");
        }
    }

    #[test]
    fn monotonic_non_decreasing_over_unit_interval() {
        for (name, ease) in EASES {
            let mut previous = ease(0.0);
            for step in 1..=1000 {
                let t = step as f32 / 1000.0;
                let value = ease(t);
                assert!(
                    value >= previous - 1e-6,
                    "{name} decreased at t={t}: {previous} -> {value}"
                );
                previous = value;
            }
        }
    }

    #[test]
    fn inputs_outside_unit_interval_are_clamped() {
        for (name, ease) in EASES {
            assert!((ease(-3.0) - 0.0).abs() < 1e-6, "{name} below range");
            assert!((ease(7.5) - 1.0).abs() < 1e-6, "{name} above range");
        }
    }

    #[test]
    fn cubic_in_out_is_symmetric_about_midpoint() {
        for step in 0..=500 {
            let t = step as f32 / 1000.0;
            let low = ease_in_out_cubic(t);
            let high = ease_in_out_cubic(1.0 - t);
            assert!((low + high - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn quartic_in_starts_slower_than_cubic_out() {
        // Sanity on curve character: quartic-in should lag early progress.
        assert!(ease_in_quartic(0.25) < ease_out_cubic(0.25));
    }

    #[test]
    fn smoothstep_hits_edges_and_midpoint() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn lerp_interpolates_endpoints() {
        assert_eq!(lerp(2.0, 6.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 6.0, 1.0), 6.0);
        assert_eq!(lerp(2.0, 6.0, 0.5), 4.0);
    }
}
