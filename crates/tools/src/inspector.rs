use cosmos_common::{EntityId, EntityType, SlotId};
use cosmos_ecs::ProcessingSubject;
use cosmos_ecs::components::{Item, Sentience};
use cosmos_kernel::Cosmos;
use serde::Serialize;
use std::fmt;

/// Read-only queries against a cosmos for debugging and the CLI.
pub struct CosmosInspector;

impl CosmosInspector {
    pub fn summary(cosmos: &Cosmos) -> CosmosSummary {
        let store = cosmos.significant().store();
        let processing = &cosmos.caches().processing;
        CosmosSummary {
            step: cosmos.step(),
            seed: cosmos.seed(),
            delta_ms: cosmos.delta().ms,
            entity_count: cosmos.entity_count(),
            by_type: EntityType::ALL
                .into_iter()
                .map(|t| (format!("{t:?}"), store.count_of(t)))
                .filter(|(_, n)| *n > 0)
                .collect(),
            processing: ProcessingSubject::ALL
                .into_iter()
                .map(|s| (format!("{s:?}"), processing.len_of(s)))
                .filter(|(_, n)| *n > 0)
                .collect(),
            slotted_items: cosmos.slotted_entities().len(),
            resample_requested: cosmos.resample_requested(),
        }
    }

    pub fn inspect_entity(cosmos: &Cosmos, id: EntityId) -> Option<EntityInfo> {
        let handle = cosmos.get_handle(id);
        if handle.dead() {
            return None;
        }
        let transform = handle.logic_transform().unwrap_or_default();
        Some(EntityInfo {
            id,
            name: handle.name().to_owned(),
            flavour: handle.flavour().name.clone(),
            position: [transform.pos.x, transform.pos.y],
            rotation: transform.rotation,
            health: handle.find::<Sentience>().map(|s| (s.health.value, s.health.maximum)),
            charges: handle.find::<Item>().map(|i| i.charges),
            slot: handle.current_slot(),
            children: cosmos.children_of(id),
        })
    }

    /// Every live entity in canonical order.
    pub fn list_entities(cosmos: &Cosmos) -> Vec<EntityId> {
        cosmos.ids()
    }
}

/// Counts describing a cosmos at one step.
#[derive(Debug, Clone, Serialize)]
pub struct CosmosSummary {
    pub step: u64,
    pub seed: u64,
    pub delta_ms: u32,
    pub entity_count: usize,
    /// Non-empty entity types with their population.
    pub by_type: Vec<(String, usize)>,
    /// Non-empty processing lists with their length.
    pub processing: Vec<(String, usize)>,
    pub slotted_items: usize,
    pub resample_requested: bool,
}

impl fmt::Display for CosmosSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cosmos: step={} seed={} entities={} slotted={}",
            self.step, self.seed, self.entity_count, self.slotted_items
        )?;
        for (t, n) in &self.by_type {
            write!(f, "\n  {t}: {n}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityInfo {
    pub id: EntityId,
    pub name: String,
    pub flavour: String,
    pub position: [f32; 2],
    pub rotation: f32,
    pub health: Option<(i32, i32)>,
    pub charges: Option<u32>,
    pub slot: Option<SlotId>,
    pub children: Vec<EntityId>,
}

impl fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] pos=({:.2}, {:.2}) rot={:.1}",
            self.name, self.id, self.position[0], self.position[1], self.rotation
        )?;
        if let Some((value, maximum)) = self.health {
            write!(f, " hp={value}/{maximum}")?;
        }
        if let Some(slot) = self.slot {
            write!(f, " in {}:{:?}", slot.container, slot.function)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmos_kernel::CosmosSettings;
    use cosmos_solver::test_scenes::test_scene_cosmos;

    #[test]
    fn summary_of_test_scene() {
        let (cosmos, scene) = test_scene_cosmos(CosmosSettings::default()).unwrap();
        let summary = CosmosInspector::summary(&cosmos);
        assert_eq!(summary.step, 0);
        assert_eq!(summary.entity_count, cosmos.entity_count());
        assert!(summary.by_type.contains(&("Character".to_owned(), 1 + scene.grunts.len())));
        assert!(summary.slotted_items >= 4);
        let total: usize = summary.by_type.iter().map(|(_, n)| n).sum();
        assert_eq!(total, summary.entity_count);
    }

    #[test]
    fn summary_serializes_to_json() {
        let (cosmos, _) = test_scene_cosmos(CosmosSettings::default()).unwrap();
        let json = serde_json::to_value(CosmosInspector::summary(&cosmos)).unwrap();
        assert_eq!(json["step"], 0);
        assert!(json["processing"].is_array());
    }

    #[test]
    fn inspect_carried_item() {
        let (cosmos, scene) = test_scene_cosmos(CosmosSettings::default()).unwrap();
        let info = CosmosInspector::inspect_entity(&cosmos, scene.rifle).unwrap();
        assert_eq!(info.flavour, "rifle");
        assert_eq!(info.slot.map(|s| s.container), Some(scene.player));

        let player = CosmosInspector::inspect_entity(&cosmos, scene.player).unwrap();
        assert_eq!(player.health, Some((100, 100)));
        assert_eq!(player.children, vec![scene.rifle, scene.backpack]);
        assert!(format!("{player}").contains("hp=100/100"));
    }

    #[test]
    fn inspect_dead_entity() {
        let (mut cosmos, scene) = test_scene_cosmos(CosmosSettings::default()).unwrap();
        cosmos.delete_entity(scene.car);
        assert!(CosmosInspector::inspect_entity(&cosmos, scene.car).is_none());
        assert!(!CosmosInspector::list_entities(&cosmos).contains(&scene.car));
    }

    #[test]
    fn summary_display() {
        let (cosmos, _) = test_scene_cosmos(CosmosSettings::default()).unwrap();
        let s = format!("{}", CosmosInspector::summary(&cosmos));
        assert!(s.contains("step=0"));
        assert!(s.contains("Vehicle: 1"));
    }
}
