//! Simulation configuration with documented constants
//!
//! Every tunable number lives here, grouped by the component that reads it.
//! A `SimConfig` is built once at simulation start and passed by reference
//! into each component, so tests can run alternate parameter sets side by
//! side.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::{Result, SimError};

/// Spatial index tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Bucket size of the uniform spatial index (world units)
    ///
    /// Should be a few agent diameters wide. Smaller buckets mean more
    /// insert work for cover colliders; larger buckets mean more candidates
    /// to refine per query.
    pub cell_size: f32,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self { cell_size: 64.0 }
    }
}

/// World grid, map generation and smoke
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Size of one collision/vision cell (world units)
    pub tile_size: f32,
    /// Sampling step for line-of-sight checks
    pub los_step: f32,
    /// Procedural fallback map size in map cells
    pub fallback_width: u32,
    pub fallback_height: u32,
    /// Size of one map-description cell (world units)
    pub fallback_map_tile: f32,
    /// Hit points of low / high cover pieces
    pub low_cover_hp: f32,
    pub high_cover_hp: f32,
    /// Smoke volume lifetime (seconds) and radius
    pub smoke_duration: f64,
    pub smoke_radius: f32,
    /// Lifetime of transient visual/sound effects (seconds)
    pub effect_ttl: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tile_size: 4.0,
            los_step: 2.0,
            fallback_width: 48,
            fallback_height: 32,
            fallback_map_tile: 20.0,
            low_cover_hp: 120.0,
            high_cover_hp: 240.0,
            smoke_duration: 12.0,
            smoke_radius: 48.0,
            effect_ttl: 0.5,
        }
    }
}

/// Detection meters and vision
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    /// Minimum seconds between perception updates per agent
    pub interval: f64,
    /// Vision radius before trait scaling
    pub base_vision_radius: f32,
    /// Half-angle of the field of view (radians)
    pub fov_half_angle: f32,
    /// Half-angle of the foveal cone with full detection rate
    pub fovea_half_angle: f32,
    /// Targets this close are sensed even outside the field of view
    pub peripheral_range: f32,
    /// Rate multiplier for peripheral sensing outside the cone
    pub peripheral_rate: f32,
    /// Rate multiplier at the edge of the field of view
    pub edge_rate: f32,
    /// Meter gain per second at point-blank range inside the fovea
    pub base_rate: f32,
    /// Multiplier when the target is moving
    pub moving_bonus: f32,
    /// Multiplier when the target is inside a bush
    pub bush_penalty: f32,
    /// Observer stress above which vision collapses to the fovea
    pub panic_stress: f32,
    /// Meter loss per second when the target is not sensed
    pub decay_rate: f32,
    pub meter_max: f32,
    /// Meter value at which the target counts as spotted
    pub spot_threshold: f32,
    /// Number of mapping rays cast per perception update
    pub mapping_rays: usize,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            interval: 0.15,
            base_vision_radius: 320.0,
            fov_half_angle: 1.05,
            fovea_half_angle: 0.26,
            peripheral_range: 80.0,
            peripheral_rate: 0.35,
            edge_rate: 0.2,
            base_rate: 2.5,
            moving_bonus: 1.5,
            bush_penalty: 0.3,
            panic_stress: 85.0,
            decay_rate: 0.6,
            meter_max: 2.0,
            spot_threshold: 1.0,
            mapping_rays: 8,
        }
    }
}

/// Beliefs, heat and the trust ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Size of one heat cell (world units)
    pub heat_cell_size: f32,
    pub heat_max: f32,
    /// Heat lost per second
    pub heat_decay_per_sec: f32,
    /// Heat per second added around a spotted hostile
    pub spot_heat: f32,
    /// Heat added around a heard enemy sound
    pub sound_heat: f32,
    /// Expiry windows (seconds)
    pub hostile_ttl: f64,
    pub distress_ttl: f64,
    pub danger_ttl: f64,
    pub dread_ttl: f64,
    /// Trust below this blocks heat sharing entirely
    pub min_share_trust: f32,
    pub trust_neutral: f32,
    pub trust_min: f32,
    pub trust_max: f32,
    /// Radius within which teammates exchange heat and distress
    pub share_radius: f32,
    pub trust_heal_gain: f32,
    pub trust_resupply_gain: f32,
    /// Gain per second for holding ground next to a fighting teammate
    pub trust_hold_gain: f32,
    pub trust_betrayal_loss: f32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            heat_cell_size: 32.0,
            heat_max: 10.0,
            heat_decay_per_sec: 0.5,
            spot_heat: 4.0,
            sound_heat: 2.0,
            hostile_ttl: 10.0,
            distress_ttl: 5.0,
            danger_ttl: 30.0,
            dread_ttl: 60.0,
            min_share_trust: 0.3,
            trust_neutral: 0.5,
            trust_min: 0.1,
            trust_max: 1.0,
            share_radius: 220.0,
            trust_heal_gain: 0.15,
            trust_resupply_gain: 0.08,
            trust_hold_gain: 0.01,
            trust_betrayal_loss: 0.1,
        }
    }
}

/// Behavioral mode graph and action scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Base seconds between re-evaluations
    pub base_interval: f64,
    /// Extra seconds at 100 stress
    pub stress_interval: f64,
    /// Extra seconds at full fatigue
    pub fatigue_interval: f64,
    /// Upper bound of random jitter added to each interval
    pub jitter: f64,
    /// Stay-score components
    pub inertia: f32,
    pub conscientiousness_inertia: f32,
    pub fatigue_inertia: f32,
    /// Candidate actions below this score fall back to the mode default
    pub min_action_score: f32,
    /// Bias toward the squad leader's current mode
    pub leader_bias: f32,
    /// Effective accuracy below which suppression beats aimed fire
    pub low_accuracy: f32,
    /// Approval below which a challenger considers mutiny
    pub mutiny_approval: f32,
    /// Required competence/composure gap over the leader
    pub mutiny_gap: f32,
    pub throw_range: f32,
    /// Distance from the squad centroid that triggers regrouping
    pub regroup_distance: f32,
    /// Distance from the leader that triggers following
    pub follow_distance: f32,
    /// Minimum seconds between forced reactions
    pub reaction_cooldown: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            base_interval: 0.4,
            stress_interval: 0.6,
            fatigue_interval: 0.4,
            jitter: 0.25,
            inertia: 0.3,
            conscientiousness_inertia: 0.25,
            fatigue_inertia: 0.2,
            min_action_score: 0.15,
            leader_bias: 0.2,
            low_accuracy: 0.35,
            mutiny_approval: 0.3,
            mutiny_gap: 0.15,
            throw_range: 260.0,
            regroup_distance: 160.0,
            follow_distance: 120.0,
            reaction_cooldown: 0.5,
        }
    }
}

/// Resource model and movement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    pub radius: f32,
    pub max_hp: f32,
    /// Base speeds per movement mode (world units per second)
    pub sprint_speed: f32,
    pub jog_speed: f32,
    pub sneak_speed: f32,
    pub crawl_speed: f32,
    pub stamina_max: f32,
    /// Stamina spent per second per movement mode
    pub sprint_cost: f32,
    pub jog_cost: f32,
    pub sneak_cost: f32,
    pub crawl_cost: f32,
    /// Stamina recovered per second when idle / while moving slowly
    pub idle_recovery: f32,
    pub moving_recovery: f32,
    /// Fatigue gained per stamina point spent
    pub fatigue_gain: f32,
    /// Fatigue lost per second while idle
    pub fatigue_recovery: f32,
    /// Passive decay per second
    pub stress_decay: f32,
    pub suppression_decay: f32,
    /// Suppression at which an agent becomes pinned, and releases
    pub pinned_threshold: f32,
    pub unpin_threshold: f32,
    /// Low-pass factor for heading changes (0 = frozen, 1 = instant)
    pub heading_smoothing: f32,
    /// Maximum facing rotation per second (radians)
    pub turn_rate: f32,
    pub separation_radius: f32,
    pub separation_weight: f32,
    pub adrenaline_stress: f32,
    pub adrenaline_boost: f32,
    pub panic_stress: f32,
    pub panic_boost: f32,
    /// Fractional slowdown at full suppression
    pub suppression_slowdown: f32,
    /// Hp fraction below which an agent counts as wounded
    pub wounded_fraction: f32,
    pub wounded_speed: f32,
    pub pinned_speed: f32,
    pub bush_speed: f32,
    /// Social battery drained per second / regained by socializing
    pub social_drain: f32,
    pub social_gain: f32,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            radius: 6.0,
            max_hp: 100.0,
            sprint_speed: 110.0,
            jog_speed: 70.0,
            sneak_speed: 35.0,
            crawl_speed: 15.0,
            stamina_max: 100.0,
            sprint_cost: 12.0,
            jog_cost: 3.0,
            sneak_cost: 1.0,
            crawl_cost: 2.0,
            idle_recovery: 10.0,
            moving_recovery: 3.0,
            fatigue_gain: 0.002,
            fatigue_recovery: 0.01,
            stress_decay: 2.0,
            suppression_decay: 25.0,
            pinned_threshold: 70.0,
            unpin_threshold: 40.0,
            heading_smoothing: 0.25,
            turn_rate: 6.0,
            separation_radius: 18.0,
            separation_weight: 0.8,
            adrenaline_stress: 60.0,
            adrenaline_boost: 1.15,
            panic_stress: 90.0,
            panic_boost: 1.3,
            suppression_slowdown: 0.6,
            wounded_fraction: 0.4,
            wounded_speed: 0.75,
            pinned_speed: 0.1,
            bush_speed: 0.6,
            social_drain: 0.5,
            social_gain: 8.0,
        }
    }
}

/// Firing, ballistics, damage and suppression
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Clearance added to a teammate's radius for the line-of-fire scan
    pub safety_margin: f32,
    /// Stress above which the friendly-fire scan may be skipped
    pub negligence_stress: f32,
    pub negligence_skip_chance: f32,
    /// Concealed shooters still fire at targets this close
    pub ambush_range: f32,
    pub compromised_stress: f32,
    pub compromised_suppression: f32,
    /// Maximum facing error for aimed / suppressive fire (radians)
    pub attack_arc: f32,
    pub suppress_arc: f32,
    /// Base heading spread for aimed / suppressive fire (radians)
    pub attack_spread: f32,
    pub suppress_spread: f32,
    pub bullet_speed: f32,
    pub near_miss_radius: f32,
    pub near_miss_suppression: f32,
    pub near_miss_stress: f32,
    /// Crossfire detection window (seconds) and minimum angular divergence
    pub crossfire_window: f64,
    pub crossfire_angle: f32,
    pub crossfire_multiplier: f32,
    /// Stress per point of damage taken
    pub damage_stress: f32,
    /// Shock-freeze chance at neuroticism 1.0, and its duration
    pub shock_chance: f32,
    pub shock_duration: f64,
    pub downed_grace_hp: f32,
    /// Hp lost per second while downed
    pub bleed_rate: f32,
    pub downed_morale_penalty: f32,
    pub heal_stress_relief: f32,
    /// Extra reach beyond both radii for heal / resupply / loot hand-offs
    pub interact_range: f32,
    pub grenade_speed: f32,
    pub grenade_fuse: f64,
    pub grenade_radius: f32,
    pub grenade_damage: f32,
    pub grenade_cover_damage: f32,
    pub smoke_fuse: f64,
    pub explosion_suppression: f32,
    pub explosion_stress: f32,
    pub gunshot_sound_radius: f32,
    pub explosion_sound_radius: f32,
    /// Damage dealt to cover per bullet impact
    pub cover_bullet_damage: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            safety_margin: 4.0,
            negligence_stress: 90.0,
            negligence_skip_chance: 0.5,
            ambush_range: 90.0,
            compromised_stress: 70.0,
            compromised_suppression: 50.0,
            attack_arc: 0.6,
            suppress_arc: 1.0,
            attack_spread: 0.05,
            suppress_spread: 0.25,
            bullet_speed: 600.0,
            near_miss_radius: 24.0,
            near_miss_suppression: 12.0,
            near_miss_stress: 4.0,
            crossfire_window: 2.0,
            crossfire_angle: 1.05,
            crossfire_multiplier: 1.8,
            damage_stress: 0.8,
            shock_chance: 0.3,
            shock_duration: 0.6,
            downed_grace_hp: 20.0,
            bleed_rate: 2.0,
            downed_morale_penalty: 15.0,
            heal_stress_relief: 30.0,
            interact_range: 10.0,
            grenade_speed: 220.0,
            grenade_fuse: 2.5,
            grenade_radius: 60.0,
            grenade_damage: 70.0,
            grenade_cover_damage: 150.0,
            smoke_fuse: 1.5,
            explosion_suppression: 40.0,
            explosion_stress: 20.0,
            gunshot_sound_radius: 420.0,
            explosion_sound_radius: 700.0,
            cover_bullet_damage: 6.0,
        }
    }
}

/// Tactical pathfinding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathfindingConfig {
    /// Navigation cell size; coarser than the collision grid
    pub nav_cell_size: f32,
    /// Node expansions before the search gives up
    pub max_iterations: usize,
    /// Extra cost per point of heat in the destination cell
    pub heat_cost: f32,
    /// Cost multiplier for bush cells unless the agent prefers stealth
    pub bush_cost: f32,
    /// Target drift that forces a re-plan
    pub replan_tolerance: f32,
    /// Distance at which a waypoint counts as reached
    pub waypoint_reach: f32,
}

impl Default for PathfindingConfig {
    fn default() -> Self {
        Self {
            nav_cell_size: 16.0,
            max_iterations: 6000,
            heat_cost: 0.6,
            bush_cost: 10.0,
            replan_tolerance: 24.0,
            waypoint_reach: 6.0,
        }
    }
}

/// Leadership, deaths and command chaos
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SquadConfig {
    pub leader_buff_radius: f32,
    /// Per-second stress relief / morale gain inside the leader's aura
    pub leader_stress_relief: f32,
    pub leader_morale_gain: f32,
    /// Stress applied to teammates of a dead agent, falling off with distance
    pub death_stress: f32,
    pub death_radius: f32,
    pub leader_death_stress: f32,
    pub leader_death_radius: f32,
    pub death_morale_penalty: f32,
    /// Seconds of command chaos after a leader dies
    pub chaos_duration: f64,
    /// Morale boost to the opposing team per kill
    pub enemy_morale_boost: f32,
    pub election_aptitude_weight: f32,
    pub election_trust_weight: f32,
}

impl Default for SquadConfig {
    fn default() -> Self {
        Self {
            leader_buff_radius: 150.0,
            leader_stress_relief: 3.0,
            leader_morale_gain: 2.0,
            death_stress: 25.0,
            death_radius: 220.0,
            leader_death_stress: 35.0,
            leader_death_radius: 600.0,
            death_morale_penalty: 10.0,
            chaos_duration: 8.0,
            enemy_morale_boost: 10.0,
            election_aptitude_weight: 0.7,
            election_trust_weight: 0.3,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub spatial: SpatialConfig,
    pub world: WorldConfig,
    pub perception: PerceptionConfig,
    pub memory: MemoryConfig,
    pub decision: DecisionConfig,
    pub body: BodyConfig,
    pub combat: CombatConfig,
    pub pathfinding: PathfindingConfig,
    pub squad: SquadConfig,
}

impl SimConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing sections and keys keep their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: SimConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("world.tile_size", self.world.tile_size),
            ("world.los_step", self.world.los_step),
            ("spatial.cell_size", self.spatial.cell_size),
            ("memory.heat_cell_size", self.memory.heat_cell_size),
            ("pathfinding.nav_cell_size", self.pathfinding.nav_cell_size),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }

        if self.pathfinding.nav_cell_size < self.world.tile_size {
            return Err(SimError::InvalidConfig(format!(
                "nav_cell_size ({}) must be >= tile_size ({})",
                self.pathfinding.nav_cell_size, self.world.tile_size
            )));
        }

        if self.perception.fovea_half_angle > self.perception.fov_half_angle {
            return Err(SimError::InvalidConfig(format!(
                "fovea_half_angle ({}) must be <= fov_half_angle ({})",
                self.perception.fovea_half_angle, self.perception.fov_half_angle
            )));
        }

        if self.perception.spot_threshold >= self.perception.meter_max {
            return Err(SimError::InvalidConfig(format!(
                "spot_threshold ({}) must be < meter_max ({})",
                self.perception.spot_threshold, self.perception.meter_max
            )));
        }

        if self.memory.trust_min >= self.memory.trust_max || self.memory.heat_max <= 0.0 {
            return Err(SimError::InvalidConfig(
                "trust range must be non-empty and heat_max positive".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimConfig::from_toml_str(
            r#"
            [perception]
            base_vision_radius = 400.0

            [squad]
            chaos_duration = 3.0
            "#,
        )
        .expect("partial config should parse");

        assert_eq!(config.perception.base_vision_radius, 400.0);
        assert_eq!(config.squad.chaos_duration, 3.0);
        assert_eq!(config.body.radius, BodyConfig::default().radius);
    }

    #[test]
    fn test_invalid_fovea_rejected() {
        let mut config = SimConfig::default();
        config.perception.fovea_half_angle = 2.0;
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_degenerate_heat_cell_rejected() {
        for bad in [0.0, -8.0, f32::NAN, f32::INFINITY] {
            let mut config = SimConfig::default();
            config.memory.heat_cell_size = bad;
            assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_nav_cell_smaller_than_tile_rejected() {
        let mut config = SimConfig::default();
        config.pathfinding.nav_cell_size = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let result = SimConfig::from_toml_str("[perception\nbase = ");
        assert!(matches!(result, Err(SimError::ConfigParse(_))));
    }

    #[test]
    fn test_shipped_config_parses() {
        let config = SimConfig::from_toml_str(include_str!("../../data/sim_config.toml"))
            .expect("shipped config should parse");
        assert!(config.validate().is_ok());
    }
}
