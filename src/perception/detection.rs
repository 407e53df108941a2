//! Detection meter math
//!
//! Detection is continuous: every candidate accumulates a per-observer meter
//! at a rate shaped by distance, viewing angle, movement and concealment.
//! These functions are pure so the falloff curves can be tested directly.

use crate::core::config::PerceptionConfig;

/// Geometry and state of one observer/target pair
#[derive(Debug, Clone, Copy)]
pub struct DetectionInput {
    pub distance: f32,
    /// Effective vision radius of the observer
    pub max_range: f32,
    /// Absolute angle between observer facing and the target bearing
    pub off_axis: f32,
    pub target_moving: bool,
    pub target_in_bush: bool,
    pub observer_stress: f32,
    pub line_of_sight: bool,
}

/// Angular falloff: full in the fovea, down to `edge_rate` at the FOV edge,
/// `peripheral_rate` for close targets outside the cone.
pub fn angular_factor(off_axis: f32, distance: f32, config: &PerceptionConfig) -> f32 {
    if off_axis <= config.fovea_half_angle {
        return 1.0;
    }
    if off_axis <= config.fov_half_angle {
        let span = (config.fov_half_angle - config.fovea_half_angle).max(f32::EPSILON);
        let t = (off_axis - config.fovea_half_angle) / span;
        return 1.0 + (config.edge_rate - 1.0) * t;
    }
    if distance <= config.peripheral_range {
        return config.peripheral_rate;
    }
    0.0
}

/// Meter gain per second for one target; zero means "not detectable now"
pub fn detection_rate(input: &DetectionInput, config: &PerceptionConfig) -> f32 {
    if !input.line_of_sight || input.max_range <= 0.0 || !input.distance.is_finite() {
        return 0.0;
    }
    if input.distance >= input.max_range {
        return 0.0;
    }

    // Tunnel vision
    if input.observer_stress > config.panic_stress && input.off_axis > config.fovea_half_angle {
        return 0.0;
    }

    let range_factor = 1.0 - input.distance / input.max_range;
    let mut rate =
        config.base_rate * range_factor * angular_factor(input.off_axis, input.distance, config);
    if input.target_moving {
        rate *= config.moving_bonus;
    }
    if input.target_in_bush {
        rate *= config.bush_penalty;
    }

    if rate.is_finite() {
        rate.max(0.0)
    } else {
        0.0
    }
}

/// Advance a meter by `dt` seconds: accumulate at `rate`, or decay linearly
pub fn step_meter(meter: f32, rate: f32, dt: f32, config: &PerceptionConfig) -> f32 {
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
    let prior = if meter.is_finite() { meter } else { 0.0 };
    let next = if rate > 0.0 {
        prior + rate * dt
    } else {
        prior - config.decay_rate * dt
    };
    let next = if next.is_finite() { next } else { prior };
    next.clamp(0.0, config.meter_max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visible(distance: f32, off_axis: f32) -> DetectionInput {
        DetectionInput {
            distance,
            max_range: 300.0,
            off_axis,
            target_moving: false,
            target_in_bush: false,
            observer_stress: 0.0,
            line_of_sight: true,
        }
    }

    #[test]
    fn test_rate_falls_off_with_distance() {
        let config = PerceptionConfig::default();
        let near = detection_rate(&visible(50.0, 0.0), &config);
        let far = detection_rate(&visible(250.0, 0.0), &config);
        assert!(near > far);
        assert!(far > 0.0);
        assert_eq!(detection_rate(&visible(300.0, 0.0), &config), 0.0);
    }

    #[test]
    fn test_angular_falloff_reaches_edge_rate() {
        let config = PerceptionConfig::default();
        assert_eq!(angular_factor(0.0, 200.0, &config), 1.0);
        let edge = angular_factor(config.fov_half_angle, 200.0, &config);
        assert!((edge - config.edge_rate).abs() < 1e-5);
        assert_eq!(angular_factor(2.5, 200.0, &config), 0.0);
        assert_eq!(angular_factor(2.5, 40.0, &config), config.peripheral_rate);
    }

    #[test]
    fn test_moving_bonus_and_bush_penalty() {
        let config = PerceptionConfig::default();
        let base = detection_rate(&visible(100.0, 0.0), &config);

        let mut moving = visible(100.0, 0.0);
        moving.target_moving = true;
        assert!(detection_rate(&moving, &config) > base);

        let mut hidden = visible(100.0, 0.0);
        hidden.target_in_bush = true;
        let concealed = detection_rate(&hidden, &config);
        assert!((concealed - base * config.bush_penalty).abs() < 1e-5);
    }

    #[test]
    fn test_tunnel_vision_zeroes_off_fovea() {
        let config = PerceptionConfig::default();
        let mut panicked = visible(100.0, 0.6);
        panicked.observer_stress = 95.0;
        assert_eq!(detection_rate(&panicked, &config), 0.0);

        panicked.off_axis = 0.1;
        assert!(detection_rate(&panicked, &config) > 0.0);
    }

    #[test]
    fn test_blocked_sight_is_zero() {
        let config = PerceptionConfig::default();
        let mut blocked = visible(50.0, 0.0);
        blocked.line_of_sight = false;
        assert_eq!(detection_rate(&blocked, &config), 0.0);
    }

    #[test]
    fn test_meter_rises_and_decays_within_bounds() {
        let config = PerceptionConfig::default();
        let up = step_meter(0.5, 1.0, 0.2, &config);
        assert!(up > 0.5);
        let down = step_meter(0.5, 0.0, 0.2, &config);
        assert!(down < 0.5);

        assert_eq!(step_meter(1.9, 100.0, 1.0, &config), config.meter_max);
        assert_eq!(step_meter(0.1, 0.0, 10.0, &config), 0.0);
        assert_eq!(step_meter(f32::NAN, 1.0, 0.1, &config), 0.1);
        assert_eq!(step_meter(0.4, 1.0, f32::NAN, &config), 0.4);
    }
}
