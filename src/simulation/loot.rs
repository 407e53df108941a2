//! Loot caches left behind by the dead

use serde::Serialize;

use crate::agent::{Agent, UtilityKind};
use crate::core::types::{LootId, Vec2};

#[derive(Debug, Clone, Serialize)]
pub struct LootCache {
    pub id: LootId,
    pub position: Vec2,
    pub ammo: u32,
    pub utilities: Vec<UtilityKind>,
}

impl LootCache {
    /// Everything a dead agent was carrying
    pub fn from_fallen(id: LootId, agent: &Agent) -> Option<Self> {
        let weapon = &agent.state.inventory.weapon;
        let cache = Self {
            id,
            position: agent.position,
            ammo: weapon.magazine + weapon.reserve,
            utilities: agent.state.inventory.utilities.clone(),
        };
        (!cache.is_empty()).then_some(cache)
    }

    pub fn is_empty(&self) -> bool {
        self.ammo == 0 && self.utilities.is_empty()
    }

    /// Move the contents into an agent's inventory
    pub fn transfer_to(&mut self, agent: &mut Agent) {
        agent.state.inventory.weapon.reserve += self.ammo;
        self.ammo = 0;
        agent
            .state
            .inventory
            .utilities
            .extend(self.utilities.drain(..));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Role;
    use crate::simulation::context::test_support::Scene;

    #[test]
    fn test_fallen_gear_moves_to_looter() {
        let mut scene = Scene::open();
        scene.add(0, Role::Grenadier, Vec2::new(10.0, 10.0));
        scene.add(0, Role::Rifleman, Vec2::new(20.0, 10.0));
        let carried = scene.agents[0].state.inventory.weapon.total_ammo();
        let mut cache = LootCache::from_fallen(LootId(1), &scene.agents[0]).expect("gear");
        assert_eq!(cache.ammo, carried);

        let before = scene.agents[1].state.inventory.weapon.reserve;
        let grenades = scene.agents[1].state.inventory.count(UtilityKind::Grenade);
        cache.transfer_to(&mut scene.agents[1]);
        assert!(cache.is_empty());
        assert_eq!(scene.agents[1].state.inventory.weapon.reserve, before + carried);
        assert!(scene.agents[1].state.inventory.count(UtilityKind::Grenade) > grenades);
    }

    #[test]
    fn test_empty_handed_leave_nothing() {
        let mut scene = Scene::open();
        scene.add(0, Role::Rifleman, Vec2::new(10.0, 10.0));
        let inventory = &mut scene.agents[0].state.inventory;
        inventory.weapon.magazine = 0;
        inventory.weapon.reserve = 0;
        inventory.utilities.clear();
        assert!(LootCache::from_fallen(LootId(1), &scene.agents[0]).is_none());
    }
}
