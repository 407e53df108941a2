//! Per-agent belief store
//!
//! Everything here is private knowledge. Other agents are referred to by id
//! only, and entries about them are dropped when they die.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::core::config::{MemoryConfig, PerceptionConfig};
use crate::core::types::{AgentId, Vec2};
use crate::perception::detection::step_meter;
use crate::spatial::Grid;

/// Last known position of a hostile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostileSighting {
    pub id: AgentId,
    pub position: Vec2,
    pub seen_at: f64,
}

/// What a teammate is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistressKind {
    Medic,
    Ammo,
    Cover,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistressSignal {
    pub kind: DistressKind,
    pub position: Vec2,
    pub sent_at: f64,
}

/// A remembered location with a timestamp (sounds, death sites)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub position: Vec2,
    pub radius: f32,
    pub created_at: f64,
}

/// Coarse grid of suspected enemy activity, values in [0, max]
#[derive(Debug, Clone)]
pub struct HeatGrid {
    cells: Grid<f32>,
    max: f32,
}

impl HeatGrid {
    pub fn new(world_size: Vec2, cell_size: f32, max: f32) -> Self {
        Self {
            cells: Grid::covering(world_size.x, world_size.y, cell_size),
            max,
        }
    }

    pub fn value_at(&self, p: Vec2) -> f32 {
        self.cells.sample(p).copied().unwrap_or(0.0)
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.cells.width, self.cells.height)
    }

    /// Raise the cell under `p` by `amount` and its neighbours by half
    pub fn raise_around(&mut self, p: Vec2, amount: f32) {
        if !p.is_finite() || !amount.is_finite() || amount <= 0.0 {
            return;
        }
        let (cx, cy) = self.cells.cell_of(p);
        let max = self.max;
        for dy in -1..=1 {
            for dx in -1..=1 {
                let gain = if dx == 0 && dy == 0 { amount } else { amount * 0.5 };
                if let Some(cell) = self.cells.get_mut(cx + dx, cy + dy) {
                    *cell = (*cell + gain).clamp(0.0, max);
                }
            }
        }
    }

    /// Linear decay, floored at zero
    pub fn decay(&mut self, amount: f32) {
        if !amount.is_finite() || amount <= 0.0 {
            return;
        }
        for cell in self.cells.iter_mut() {
            *cell = (*cell - amount).max(0.0);
        }
    }

    /// Merge a teammate's heat: each cell only ever goes up, to at most the
    /// sender's value scaled by trust. Low trust changes nothing.
    pub fn merge_from(&mut self, other: &HeatGrid, trust: f32, min_trust: f32) {
        if !trust.is_finite() || trust < min_trust {
            return;
        }
        if self.dimensions() != other.dimensions() {
            return;
        }
        let max = self.max;
        for (mine, theirs) in self.cells.iter_mut().zip(other.cells.iter()) {
            let offered = (theirs * trust).clamp(0.0, max);
            if offered > *mine {
                *mine = offered;
            }
        }
    }

    /// Center and value of the hottest cell, if any cell is warm
    pub fn hottest(&self) -> Option<(Vec2, f32)> {
        self.cells
            .cells()
            .filter(|(_, _, v)| **v > 0.0)
            .max_by(|a, b| a.2.total_cmp(b.2))
            .map(|(x, y, v)| (self.cells.cell_center(x, y), *v))
    }

    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.cells.iter().copied()
    }
}

/// Private beliefs of one agent
#[derive(Debug, Clone)]
pub struct Memory {
    pub hostiles: AHashMap<AgentId, HostileSighting>,
    pub heat: HeatGrid,
    /// Obstacles this agent has personally mapped
    pub discovered: Grid<bool>,
    trust: AHashMap<AgentId, f32>,
    pub distress: AHashMap<AgentId, DistressSignal>,
    pub danger_zones: Vec<Zone>,
    pub dread_zones: Vec<Zone>,
    meters: AHashMap<AgentId, f32>,
    spotted: AHashSet<AgentId>,
    last_heat_decay: Option<f64>,
    trust_neutral: f32,
}

impl Memory {
    pub fn new(world_size: Vec2, config: &MemoryConfig) -> Self {
        Self {
            hostiles: AHashMap::new(),
            heat: HeatGrid::new(world_size, config.heat_cell_size, config.heat_max),
            discovered: Grid::covering(world_size.x, world_size.y, config.heat_cell_size),
            trust: AHashMap::new(),
            distress: AHashMap::new(),
            danger_zones: Vec::new(),
            dread_zones: Vec::new(),
            meters: AHashMap::new(),
            spotted: AHashSet::new(),
            last_heat_decay: None,
            trust_neutral: config.trust_neutral,
        }
    }

    // Trust ledger

    pub fn trust_of(&self, teammate: AgentId) -> f32 {
        self.trust
            .get(&teammate)
            .copied()
            .unwrap_or(self.trust_neutral)
    }

    pub fn adjust_trust(&mut self, teammate: AgentId, delta: f32, config: &MemoryConfig) {
        let current = self.trust_of(teammate);
        let next = if delta.is_finite() {
            current + delta
        } else {
            current
        };
        self.trust
            .insert(teammate, next.clamp(config.trust_min, config.trust_max));
    }

    // Detection meters

    pub fn meter(&self, target: AgentId) -> f32 {
        self.meters.get(&target).copied().unwrap_or(0.0)
    }

    pub fn is_spotted(&self, target: AgentId) -> bool {
        self.spotted.contains(&target)
    }

    pub fn spotted(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.spotted.iter().copied()
    }

    /// Advance one meter. Returns true only on the transition into "spotted".
    ///
    /// A spotted target stays spotted until its meter drains to zero, so
    /// hovering around the threshold never re-reports first contact.
    pub fn update_meter(
        &mut self,
        target: AgentId,
        rate: f32,
        dt: f32,
        config: &PerceptionConfig,
    ) -> bool {
        let next = step_meter(self.meter(target), rate, dt, config);
        if next <= 0.0 {
            self.meters.remove(&target);
            self.spotted.remove(&target);
            return false;
        }
        self.meters.insert(target, next);
        next >= config.spot_threshold && self.spotted.insert(target)
    }

    /// Decay every meter not refreshed this perception pass
    pub fn decay_meters_except(
        &mut self,
        refreshed: &AHashSet<AgentId>,
        dt: f32,
        config: &PerceptionConfig,
    ) {
        let stale: Vec<AgentId> = self
            .meters
            .keys()
            .filter(|id| !refreshed.contains(*id))
            .copied()
            .collect();
        for id in stale {
            self.update_meter(id, 0.0, dt, config);
        }
    }

    // Hostiles, sounds, deaths

    pub fn record_hostile(&mut self, id: AgentId, position: Vec2, now: f64) {
        self.hostiles.insert(
            id,
            HostileSighting {
                id,
                position,
                seen_at: now,
            },
        );
    }

    pub fn nearest_hostile(&self, from: Vec2) -> Option<HostileSighting> {
        self.hostiles
            .values()
            .min_by(|a, b| {
                a.position
                    .distance_squared(from)
                    .total_cmp(&b.position.distance_squared(from))
            })
            .copied()
    }

    /// Average of known hostile positions
    pub fn known_enemy_center(&self) -> Option<Vec2> {
        if self.hostiles.is_empty() {
            return None;
        }
        let sum: Vec2 = self.hostiles.values().map(|h| h.position).sum();
        Some(sum / self.hostiles.len() as f32)
    }

    pub fn record_sound(&mut self, position: Vec2, radius: f32, now: f64, heat: f32) {
        self.danger_zones.push(Zone {
            position,
            radius,
            created_at: now,
        });
        self.heat.raise_around(position, heat);
    }

    pub fn record_death(&mut self, position: Vec2, radius: f32, now: f64) {
        self.dread_zones.push(Zone {
            position,
            radius,
            created_at: now,
        });
    }

    pub fn post_distress(&mut self, from: AgentId, kind: DistressKind, position: Vec2, now: f64) {
        self.distress.insert(
            from,
            DistressSignal {
                kind,
                position,
                sent_at: now,
            },
        );
    }

    pub fn mark_discovered(&mut self, p: Vec2) {
        let (x, y) = self.discovered.cell_of(p);
        self.discovered.set(x, y, true);
    }

    /// Drop every belief about an agent that no longer exists
    pub fn forget(&mut self, id: AgentId) {
        self.hostiles.remove(&id);
        self.meters.remove(&id);
        self.spotted.remove(&id);
        self.distress.remove(&id);
        self.trust.remove(&id);
    }

    /// Expire hostiles, distress, danger and dread entries past their windows
    pub fn expire(&mut self, now: f64, config: &MemoryConfig) {
        self.hostiles
            .retain(|_, h| now - h.seen_at <= config.hostile_ttl);
        self.distress
            .retain(|_, d| now - d.sent_at <= config.distress_ttl);
        self.danger_zones
            .retain(|z| now - z.created_at <= config.danger_ttl);
        self.dread_zones
            .retain(|z| now - z.created_at <= config.dread_ttl);
    }

    /// Heat decays per elapsed clock second since the previous call
    pub fn decay_heat(&mut self, now: f64, config: &MemoryConfig) {
        if let Some(last) = self.last_heat_decay {
            let elapsed = (now - last).max(0.0) as f32;
            self.heat.decay(config.heat_decay_per_sec * elapsed);
        }
        self.last_heat_decay = Some(now);
    }

    pub fn in_dread_zone(&self, p: Vec2) -> bool {
        self.dread_zones
            .iter()
            .any(|z| z.position.distance(p) <= z.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Memory {
        Memory::new(Vec2::new(320.0, 320.0), &MemoryConfig::default())
    }

    #[test]
    fn test_heat_is_capped_and_floored() {
        let mut heat = HeatGrid::new(Vec2::new(320.0, 320.0), 32.0, 10.0);
        for _ in 0..10 {
            heat.raise_around(Vec2::new(100.0, 100.0), 4.0);
        }
        assert!(heat.values().all(|v| (0.0..=10.0).contains(&v)));
        assert_eq!(heat.value_at(Vec2::new(100.0, 100.0)), 10.0);

        heat.decay(50.0);
        assert!(heat.values().all(|v| v == 0.0));
    }

    #[test]
    fn test_merge_with_low_trust_leaves_receiver_unchanged() {
        let config = MemoryConfig::default();
        let mut sender = HeatGrid::new(Vec2::new(320.0, 320.0), 32.0, 10.0);
        sender.raise_around(Vec2::new(50.0, 50.0), 8.0);
        let mut receiver = HeatGrid::new(Vec2::new(320.0, 320.0), 32.0, 10.0);
        receiver.raise_around(Vec2::new(250.0, 250.0), 2.0);
        let before: Vec<f32> = receiver.values().collect();

        receiver.merge_from(&sender, 0.29, config.min_share_trust);
        let after: Vec<f32> = receiver.values().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_merge_is_max_not_sum() {
        let mut sender = HeatGrid::new(Vec2::new(320.0, 320.0), 32.0, 10.0);
        sender.raise_around(Vec2::new(50.0, 50.0), 8.0);
        let mut receiver = HeatGrid::new(Vec2::new(320.0, 320.0), 32.0, 10.0);
        receiver.raise_around(Vec2::new(50.0, 50.0), 6.0);

        receiver.merge_from(&sender, 0.5, 0.3);
        // 8 * 0.5 = 4 < 6: unchanged
        assert_eq!(receiver.value_at(Vec2::new(50.0, 50.0)), 6.0);

        receiver.merge_from(&sender, 1.0, 0.3);
        receiver.merge_from(&sender, 1.0, 0.3);
        assert_eq!(receiver.value_at(Vec2::new(50.0, 50.0)), 8.0);
    }

    #[test]
    fn test_trust_starts_neutral_and_clamps() {
        let config = MemoryConfig::default();
        let mut mem = memory();
        let mate = AgentId(7);
        assert_eq!(mem.trust_of(mate), config.trust_neutral);
        mem.adjust_trust(mate, 5.0, &config);
        assert_eq!(mem.trust_of(mate), config.trust_max);
        mem.adjust_trust(mate, -5.0, &config);
        assert_eq!(mem.trust_of(mate), config.trust_min);
        mem.adjust_trust(mate, f32::NAN, &config);
        assert_eq!(mem.trust_of(mate), config.trust_min);
    }

    #[test]
    fn test_first_contact_fires_once() {
        let config = PerceptionConfig::default();
        let mut mem = memory();
        let enemy = AgentId(3);

        assert!(!mem.update_meter(enemy, 2.0, 0.3, &config));
        assert!(mem.update_meter(enemy, 2.0, 0.3, &config));
        assert!(mem.is_spotted(enemy));
        assert!(!mem.update_meter(enemy, 2.0, 0.3, &config));

        // Dip below the threshold and climb back: still no new report
        mem.update_meter(enemy, 0.0, 2.0, &config);
        assert!(mem.meter(enemy) > 0.0);
        assert!(mem.meter(enemy) < config.spot_threshold);
        assert!(!mem.update_meter(enemy, 2.0, 0.5, &config));

        // Fully forgotten, then seen again: reported again
        mem.update_meter(enemy, 0.0, 10.0, &config);
        assert!(!mem.is_spotted(enemy));
        assert!(!mem.update_meter(enemy, 2.0, 0.3, &config));
        assert!(mem.update_meter(enemy, 2.0, 0.3, &config));
    }

    #[test]
    fn test_unrefreshed_meters_decay() {
        let config = PerceptionConfig::default();
        let mut mem = memory();
        mem.update_meter(AgentId(1), 2.0, 0.3, &config);
        mem.update_meter(AgentId(2), 2.0, 0.3, &config);
        let refreshed: AHashSet<AgentId> = [AgentId(1)].into_iter().collect();
        mem.decay_meters_except(&refreshed, 0.5, &config);
        assert!((mem.meter(AgentId(1)) - 0.6).abs() < 1e-5);
        assert!(mem.meter(AgentId(2)) < 0.6);
    }

    #[test]
    fn test_expiry_windows() {
        let config = MemoryConfig::default();
        let mut mem = memory();
        mem.record_hostile(AgentId(1), Vec2::new(10.0, 10.0), 0.0);
        mem.post_distress(AgentId(2), DistressKind::Medic, Vec2::ZERO, 0.0);
        mem.record_sound(Vec2::new(40.0, 40.0), 100.0, 0.0, 2.0);
        mem.record_death(Vec2::new(60.0, 60.0), 50.0, 0.0);

        mem.expire(6.0, &config);
        assert_eq!(mem.hostiles.len(), 1);
        assert!(mem.distress.is_empty());

        mem.expire(11.0, &config);
        assert!(mem.hostiles.is_empty());
        assert_eq!(mem.danger_zones.len(), 1);

        mem.expire(31.0, &config);
        assert!(mem.danger_zones.is_empty());
        assert!(mem.in_dread_zone(Vec2::new(70.0, 60.0)));

        mem.expire(61.0, &config);
        assert!(mem.dread_zones.is_empty());
    }

    #[test]
    fn test_heat_decays_with_elapsed_clock_time() {
        let config = MemoryConfig::default();
        let mut mem = memory();
        mem.heat.raise_around(Vec2::new(100.0, 100.0), 4.0);
        mem.decay_heat(10.0, &config);
        assert_eq!(mem.heat.value_at(Vec2::new(100.0, 100.0)), 4.0);
        mem.decay_heat(12.0, &config);
        assert!((mem.heat.value_at(Vec2::new(100.0, 100.0)) - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_forget_drops_everything_about_an_agent() {
        let config = PerceptionConfig::default();
        let mut mem = memory();
        let id = AgentId(9);
        mem.record_hostile(id, Vec2::ZERO, 0.0);
        mem.update_meter(id, 5.0, 1.0, &config);
        mem.forget(id);
        assert!(mem.hostiles.is_empty());
        assert_eq!(mem.meter(id), 0.0);
        assert!(!mem.is_spotted(id));
    }

    #[test]
    fn test_known_enemy_center() {
        let mut mem = memory();
        assert!(mem.known_enemy_center().is_none());
        mem.record_hostile(AgentId(1), Vec2::new(0.0, 0.0), 0.0);
        mem.record_hostile(AgentId(2), Vec2::new(100.0, 50.0), 0.0);
        assert_eq!(mem.known_enemy_center(), Some(Vec2::new(50.0, 25.0)));
    }
}
