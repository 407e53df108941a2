//! Resource model: health, stamina, stress, suppression and inventory
//!
//! Every mutation goes through a method that sanitizes its input and clamps
//! the result, so the invariants hold no matter what arithmetic feeds them.

use serde::{Deserialize, Serialize};

use crate::core::config::{BodyConfig, CombatConfig};
use crate::core::types::{angle_between, sanitize, Role};

pub const STRESS_MAX: f32 = 100.0;
pub const SUPPRESSION_MAX: f32 = 100.0;
pub const MORALE_MAX: f32 = 100.0;
pub const SOCIAL_MAX: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    Rifle,
    MachineGun,
    Carbine,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weapon {
    pub kind: WeaponKind,
    pub magazine: u32,
    pub magazine_size: u32,
    pub reserve: u32,
    /// Seconds between shots
    pub fire_interval: f64,
    pub reload_time: f64,
    pub damage: f32,
    pub range: f32,
}

impl Weapon {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Gunner => Self {
                kind: WeaponKind::MachineGun,
                magazine: 100,
                magazine_size: 100,
                reserve: 200,
                fire_interval: 0.1,
                reload_time: 4.0,
                damage: 18.0,
                range: 500.0,
            },
            Role::Medic | Role::Scout => Self {
                kind: WeaponKind::Carbine,
                magazine: 20,
                magazine_size: 20,
                reserve: 60,
                fire_interval: 0.3,
                reload_time: 1.8,
                damage: 20.0,
                range: 380.0,
            },
            Role::Rifleman | Role::Grenadier => Self {
                kind: WeaponKind::Rifle,
                magazine: 30,
                magazine_size: 30,
                reserve: 90,
                fire_interval: 0.25,
                reload_time: 2.0,
                damage: 25.0,
                range: 450.0,
            },
        }
    }

    pub fn total_ammo(&self) -> u32 {
        self.magazine + self.reserve
    }

    /// Fraction of a full loadout (one magazine plus three spares)
    pub fn ammo_fraction(&self) -> f32 {
        let full = (self.magazine_size * 4).max(1) as f32;
        (self.total_ammo() as f32 / full).min(1.0)
    }
}

/// Consumable carried in the utility pouch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UtilityKind {
    Grenade,
    Smoke,
    Medkit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    pub weapon: Weapon,
    pub utilities: Vec<UtilityKind>,
}

impl Inventory {
    pub fn for_role(role: Role) -> Self {
        use UtilityKind::*;
        let utilities = match role {
            Role::Rifleman => vec![Grenade, Medkit],
            Role::Gunner => vec![Smoke],
            Role::Medic => vec![Medkit, Medkit, Medkit, Smoke],
            Role::Scout => vec![Smoke, Medkit],
            Role::Grenadier => vec![Grenade, Grenade, Grenade, Smoke],
        };
        Self {
            weapon: Weapon::for_role(role),
            utilities,
        }
    }

    pub fn count(&self, kind: UtilityKind) -> usize {
        self.utilities.iter().filter(|u| **u == kind).count()
    }

    pub fn has(&self, kind: UtilityKind) -> bool {
        self.utilities.contains(&kind)
    }

    /// Remove one utility of this kind; false if none left
    pub fn take(&mut self, kind: UtilityKind) -> bool {
        match self.utilities.iter().position(|u| *u == kind) {
            Some(i) => {
                self.utilities.swap_remove(i);
                true
            }
            None => false,
        }
    }
}

/// Result of a damage application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    Ignored,
    Hurt,
    Downed,
    Died,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceState {
    pub hp: f32,
    pub max_hp: f32,
    pub stamina: f32,
    pub stamina_max: f32,
    /// Accumulated exhaustion in [0, 1]
    pub fatigue: f32,
    pub stress: f32,
    pub suppression: f32,
    pub morale: f32,
    pub social_battery: f32,
    /// Approval of the current squad leader in [0, 1]
    pub approval: f32,
    pub inventory: Inventory,
    pub reloading_until: f64,
    pub next_fire_at: f64,
    pub downed: bool,
    pub dead: bool,
    pub pinned: bool,
    pub frozen_until: f64,
    /// (time, incoming angle) of recent suppression, for crossfire
    pub recent_suppression: Vec<(f64, f32)>,
    pub leader_buff: bool,
}

impl ResourceState {
    pub fn new(role: Role, config: &BodyConfig) -> Self {
        Self {
            hp: config.max_hp,
            max_hp: config.max_hp,
            stamina: config.stamina_max,
            stamina_max: config.stamina_max,
            fatigue: 0.0,
            stress: 0.0,
            suppression: 0.0,
            morale: 70.0,
            social_battery: 80.0,
            approval: 0.6,
            inventory: Inventory::for_role(role),
            reloading_until: 0.0,
            next_fire_at: 0.0,
            downed: false,
            dead: false,
            pinned: false,
            frozen_until: 0.0,
            recent_suppression: Vec::new(),
            leader_buff: false,
        }
    }

    pub fn is_incapacitated(&self, now: f64) -> bool {
        self.dead || self.downed || now < self.frozen_until
    }

    pub fn is_reloading(&self, now: f64) -> bool {
        now < self.reloading_until
    }

    pub fn hp_fraction(&self) -> f32 {
        if self.max_hp > 0.0 {
            (self.hp / self.max_hp).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn stamina_fraction(&self) -> f32 {
        if self.stamina_max > 0.0 {
            (self.stamina / self.stamina_max).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Raise stress; ignored while downed or dead
    pub fn add_stress(&mut self, amount: f32) {
        if self.downed || self.dead || !amount.is_finite() {
            return;
        }
        self.stress = sanitize(self.stress + amount, self.stress, 0.0, STRESS_MAX);
    }

    pub fn relieve_stress(&mut self, amount: f32) {
        if !amount.is_finite() {
            return;
        }
        self.stress = sanitize(self.stress - amount.abs(), self.stress, 0.0, STRESS_MAX);
    }

    pub fn add_morale(&mut self, delta: f32) {
        if !delta.is_finite() {
            return;
        }
        self.morale = sanitize(self.morale + delta, self.morale, 0.0, MORALE_MAX);
    }

    pub fn add_approval(&mut self, delta: f32) {
        if !delta.is_finite() {
            return;
        }
        self.approval = sanitize(self.approval + delta, self.approval, 0.0, 1.0);
    }

    pub fn add_social(&mut self, delta: f32) {
        if !delta.is_finite() {
            return;
        }
        self.social_battery =
            sanitize(self.social_battery + delta, self.social_battery, 0.0, SOCIAL_MAX);
    }

    /// Incoming suppression from `angle`. Returns true when it completed a
    /// crossfire.
    pub fn suppress(
        &mut self,
        amount: f32,
        stress: f32,
        angle: f32,
        now: f64,
        body: &BodyConfig,
        combat: &CombatConfig,
    ) -> bool {
        if self.downed || self.dead || !amount.is_finite() || amount <= 0.0 {
            return false;
        }
        self.recent_suppression
            .retain(|(t, _)| now - *t <= combat.crossfire_window);
        let crossfire = self
            .recent_suppression
            .iter()
            .any(|(_, a)| angle_between(*a, angle) >= combat.crossfire_angle);
        if angle.is_finite() {
            self.recent_suppression.push((now, angle));
        }

        self.suppression = sanitize(
            self.suppression + amount,
            self.suppression,
            0.0,
            SUPPRESSION_MAX,
        );
        let multiplier = if crossfire {
            combat.crossfire_multiplier
        } else {
            1.0
        };
        self.add_stress(stress * multiplier);
        if self.suppression >= body.pinned_threshold {
            self.pinned = true;
        }
        crossfire
    }

    /// Apply damage, returning what happened. Dead agents ignore damage.
    ///
    /// `shock_roll` is a uniform sample in [0, 1) used for the shock freeze.
    pub fn take_damage(
        &mut self,
        amount: f32,
        neuroticism: f32,
        shock_roll: f32,
        now: f64,
        config: &CombatConfig,
    ) -> DamageOutcome {
        if self.dead || !amount.is_finite() || amount <= 0.0 {
            return DamageOutcome::Ignored;
        }

        if self.downed {
            self.hp = sanitize(self.hp - amount, 0.0, 0.0, self.max_hp);
            if self.hp <= 0.0 {
                self.hp = 0.0;
                self.dead = true;
                return DamageOutcome::Died;
            }
            return DamageOutcome::Hurt;
        }

        self.hp = sanitize(self.hp - amount, 0.0, 0.0, self.max_hp);
        self.add_stress(amount * config.damage_stress);
        if shock_roll < config.shock_chance * neuroticism {
            self.frozen_until = now + config.shock_duration;
        }

        if self.hp <= 0.0 {
            self.downed = true;
            self.pinned = false;
            self.hp = config.downed_grace_hp.min(self.max_hp).max(f32::EPSILON);
            self.add_morale(-config.downed_morale_penalty);
            return DamageOutcome::Downed;
        }
        DamageOutcome::Hurt
    }

    /// Drain the grace pool while downed. True exactly once, on death.
    pub fn bleed(&mut self, dt: f32, config: &CombatConfig) -> bool {
        if !self.downed || self.dead {
            return false;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.hp = sanitize(self.hp - config.bleed_rate * dt, 0.0, 0.0, self.max_hp);
        if self.hp <= 0.0 {
            self.hp = 0.0;
            self.dead = true;
            return true;
        }
        false
    }

    /// Full restore; false if the patient is beyond help
    pub fn heal(&mut self, config: &CombatConfig) -> bool {
        if self.dead {
            return false;
        }
        self.downed = false;
        self.hp = self.max_hp;
        self.relieve_stress(config.heal_stress_relief);
        true
    }

    /// Passive per-second decay of stress and suppression; pin hysteresis
    pub fn recover(&mut self, dt: f32, neuroticism: f32, config: &BodyConfig) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.relieve_stress(config.stress_decay * dt * (1.0 - 0.5 * neuroticism));
        self.suppression = sanitize(
            self.suppression - config.suppression_decay * dt,
            0.0,
            0.0,
            SUPPRESSION_MAX,
        );
        if self.pinned && self.suppression <= config.unpin_threshold {
            self.pinned = false;
        }
    }

    /// Begin a reload from reserve if one is possible
    pub fn start_reload(&mut self, now: f64) -> bool {
        let weapon = &self.inventory.weapon;
        if self.is_reloading(now) || weapon.reserve == 0 || weapon.magazine >= weapon.magazine_size
        {
            return false;
        }
        self.reloading_until = now + weapon.reload_time;
        true
    }

    /// Move rounds from reserve once a pending reload has elapsed
    pub fn finish_reload(&mut self, now: f64) {
        if self.reloading_until <= 0.0 || now < self.reloading_until {
            return;
        }
        let weapon = &mut self.inventory.weapon;
        let needed = weapon.magazine_size.saturating_sub(weapon.magazine);
        let moved = needed.min(weapon.reserve);
        weapon.magazine += moved;
        weapon.reserve -= moved;
        self.reloading_until = 0.0;
    }

    /// Restore every scalar invariant after arbitrary updates
    pub fn sanitize(&mut self) {
        self.max_hp = sanitize(self.max_hp, 100.0, 1.0, f32::MAX);
        self.hp = sanitize(self.hp, 0.0, 0.0, self.max_hp);
        self.stamina = sanitize(self.stamina, 0.0, 0.0, self.stamina_max.max(0.0));
        self.fatigue = sanitize(self.fatigue, 0.0, 0.0, 1.0);
        self.stress = sanitize(self.stress, 0.0, 0.0, STRESS_MAX);
        self.suppression = sanitize(self.suppression, 0.0, 0.0, SUPPRESSION_MAX);
        self.morale = sanitize(self.morale, 0.0, 0.0, MORALE_MAX);
        self.social_battery = sanitize(self.social_battery, 0.0, 0.0, SOCIAL_MAX);
        self.approval = sanitize(self.approval, 0.5, 0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn state() -> ResourceState {
        ResourceState::new(Role::Rifleman, &BodyConfig::default())
    }

    #[test]
    fn test_damage_downs_then_bleeds_to_death_once() {
        let combat = CombatConfig::default();
        let mut s = state();
        let morale = s.morale;

        assert_eq!(s.take_damage(150.0, 0.0, 1.0, 0.0, &combat), DamageOutcome::Downed);
        assert!(s.downed);
        assert_eq!(s.hp, combat.downed_grace_hp);
        assert_eq!(s.morale, morale - combat.downed_morale_penalty);

        let mut deaths = 0;
        for _ in 0..200 {
            if s.bleed(0.1, &combat) {
                deaths += 1;
            }
        }
        assert_eq!(deaths, 1);
        assert!(s.dead);
        assert_eq!(s.hp, 0.0);
    }

    #[test]
    fn test_downed_agent_ignores_stress() {
        let combat = CombatConfig::default();
        let mut s = state();
        s.take_damage(500.0, 0.0, 1.0, 0.0, &combat);
        let before = s.stress;
        s.add_stress(50.0);
        assert_eq!(s.stress, before);
    }

    #[test]
    fn test_heal_restores_and_relieves() {
        let combat = CombatConfig::default();
        let mut s = state();
        s.stress = 80.0;
        s.take_damage(500.0, 0.0, 1.0, 0.0, &combat);
        assert!(s.heal(&combat));
        assert!(!s.downed);
        assert_eq!(s.hp, s.max_hp);
        assert!(s.stress < 80.0);
    }

    #[test]
    fn test_shock_freeze_scales_with_neuroticism() {
        let combat = CombatConfig::default();
        let mut calm = state();
        calm.take_damage(5.0, 0.0, 0.01, 1.0, &combat);
        assert_eq!(calm.frozen_until, 0.0);

        let mut nervous = state();
        nervous.take_damage(5.0, 1.0, 0.01, 1.0, &combat);
        assert!(nervous.frozen_until > 1.0);
    }

    #[test]
    fn test_crossfire_multiplies_stress() {
        let body = BodyConfig::default();
        let combat = CombatConfig::default();
        let mut s = state();
        assert!(!s.suppress(5.0, 10.0, 0.0, 0.0, &body, &combat));
        let single = s.stress;
        assert!(s.suppress(5.0, 10.0, std::f32::consts::PI, 0.5, &body, &combat));
        assert!((s.stress - single - 10.0 * combat.crossfire_multiplier).abs() < 1e-4);
    }

    #[test]
    fn test_pinned_hysteresis() {
        let body = BodyConfig::default();
        let combat = CombatConfig::default();
        let mut s = state();
        s.suppress(80.0, 0.0, 0.0, 0.0, &body, &combat);
        assert!(s.pinned);
        s.recover(1.0, 0.5, &body);
        assert!(s.pinned, "55 suppression is still above the release threshold");
        s.recover(1.0, 0.5, &body);
        assert!(!s.pinned);
    }

    #[test]
    fn test_reload_moves_reserve_into_magazine() {
        let mut s = state();
        s.inventory.weapon.magazine = 0;
        assert!(s.start_reload(1.0));
        s.finish_reload(1.5);
        assert_eq!(s.inventory.weapon.magazine, 0);
        s.finish_reload(3.0);
        assert_eq!(s.inventory.weapon.magazine, 30);
        assert_eq!(s.inventory.weapon.reserve, 60);
    }

    #[test]
    fn test_take_utility() {
        let mut inv = Inventory::for_role(Role::Grenadier);
        assert_eq!(inv.count(UtilityKind::Grenade), 3);
        assert!(inv.take(UtilityKind::Grenade));
        assert_eq!(inv.count(UtilityKind::Grenade), 2);
        assert!(!inv.take(UtilityKind::Medkit));
    }

    fn adversarial() -> impl Strategy<Value = f32> {
        prop_oneof![
            Just(f32::NAN),
            Just(f32::INFINITY),
            Just(f32::NEG_INFINITY),
            -1.0e6f32..1.0e6f32,
        ]
    }

    proptest! {
        #[test]
        fn prop_resource_invariants_hold(
            inputs in proptest::collection::vec((adversarial(), adversarial(), 0u8..7), 1..60)
        ) {
            let body = BodyConfig::default();
            let combat = CombatConfig::default();
            let mut s = state();
            for (i, (a, b, op)) in inputs.into_iter().enumerate() {
                let now = i as f64 * 0.1;
                match op {
                    0 => s.add_stress(a),
                    1 => s.relieve_stress(a),
                    2 => { s.suppress(a, b, b, now, &body, &combat); }
                    3 => { s.take_damage(a, 0.5, 0.5, now, &combat); }
                    4 => { s.bleed(a, &combat); }
                    5 => s.recover(a, 0.5, &body),
                    _ => s.add_morale(a),
                }
                prop_assert!((0.0..=STRESS_MAX).contains(&s.stress));
                prop_assert!((0.0..=SUPPRESSION_MAX).contains(&s.suppression));
                prop_assert!(s.hp >= 0.0 && s.hp <= s.max_hp);
                prop_assert!((0.0..=MORALE_MAX).contains(&s.morale));
            }
        }
    }
}
