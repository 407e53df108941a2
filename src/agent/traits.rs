//! Personality traits
//!
//! Five normally distributed scalars plus two derived ones. Fixed at spawn.

use rand::Rng;
use serde::{Deserialize, Serialize};

const TRAIT_MEAN: f32 = 0.5;
const TRAIT_SD: f32 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Traits {
    pub openness: f32,
    pub conscientiousness: f32,
    pub extraversion: f32,
    pub agreeableness: f32,
    pub neuroticism: f32,
    /// Derived: suitability to lead the squad
    pub leadership: f32,
    /// Derived: baseline marksmanship
    pub accuracy: f32,
}

/// Standard normal sample via the Box-Muller transform
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    let u1: f32 = rng.gen::<f32>().max(f32::EPSILON);
    let u2: f32 = rng.gen::<f32>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}

fn roll_trait<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    (TRAIT_MEAN + standard_normal(rng) * TRAIT_SD).clamp(0.0, 1.0)
}

impl Traits {
    /// Build from the five base scores; derived values carry no noise
    pub fn from_scores(
        openness: f32,
        conscientiousness: f32,
        extraversion: f32,
        agreeableness: f32,
        neuroticism: f32,
    ) -> Self {
        Self::with_noise(
            openness,
            conscientiousness,
            extraversion,
            agreeableness,
            neuroticism,
            0.0,
        )
    }

    fn with_noise(o: f32, c: f32, e: f32, a: f32, n: f32, noise: f32) -> Self {
        let (o, c, e, a, n) = (
            o.clamp(0.0, 1.0),
            c.clamp(0.0, 1.0),
            e.clamp(0.0, 1.0),
            a.clamp(0.0, 1.0),
            n.clamp(0.0, 1.0),
        );
        let leadership = (0.4 * e + 0.3 * c + 0.3 * (1.0 - n) + noise).clamp(0.0, 1.0);
        let accuracy = (0.25 + 0.45 * c + 0.3 * (1.0 - n) + noise * 0.5).clamp(0.0, 1.0);
        Self {
            openness: o,
            conscientiousness: c,
            extraversion: e,
            agreeableness: a,
            neuroticism: n,
            leadership,
            accuracy,
        }
    }

    /// Random personality, each trait ~ N(0.5, 0.15) clamped to [0, 1]
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let o = roll_trait(rng);
        let c = roll_trait(rng);
        let e = roll_trait(rng);
        let a = roll_trait(rng);
        let n = roll_trait(rng);
        let noise = standard_normal(rng) * 0.05;
        Self::with_noise(o, c, e, a, n, noise)
    }

    /// Vision radius scaled by openness (curious agents look further)
    pub fn vision_radius(&self, base: f32) -> f32 {
        base * (0.85 + 0.3 * self.openness)
    }

    /// Multiplier on decision intervals; conscientious agents react faster
    pub fn reaction_scale(&self) -> f32 {
        1.2 - 0.4 * self.conscientiousness
    }
}

impl Default for Traits {
    fn default() -> Self {
        Self::from_scores(0.5, 0.5, 0.5, 0.5, 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_rolled_traits_stay_in_unit_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..500 {
            let t = Traits::roll(&mut rng);
            for v in [
                t.openness,
                t.conscientiousness,
                t.extraversion,
                t.agreeableness,
                t.neuroticism,
                t.leadership,
                t.accuracy,
            ] {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_rolled_traits_center_on_mean() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let n = 2000;
        let mean: f32 = (0..n).map(|_| Traits::roll(&mut rng).openness).sum::<f32>() / n as f32;
        assert!((mean - 0.5).abs() < 0.03, "mean was {}", mean);
    }

    #[test]
    fn test_leadership_blend() {
        let bold = Traits::from_scores(0.5, 1.0, 1.0, 0.5, 0.0);
        let timid = Traits::from_scores(0.5, 0.0, 0.0, 0.5, 1.0);
        assert!((bold.leadership - 1.0).abs() < 1e-6);
        assert_eq!(timid.leadership, 0.0);
    }

    #[test]
    fn test_openness_widens_vision() {
        let curious = Traits::from_scores(1.0, 0.5, 0.5, 0.5, 0.5);
        let closed = Traits::from_scores(0.0, 0.5, 0.5, 0.5, 0.5);
        assert!(curious.vision_radius(300.0) > closed.vision_radius(300.0));
    }
}
