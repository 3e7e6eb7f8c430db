use cosmos_common::Transform;
use cosmos_ecs::ProcessingSubject;
use cosmos_ecs::components::{Driver, PositionCopying};
use cosmos_kernel::Cosmos;

/// Attached entities follow their target; dead targets leave them in place.
pub fn update_transforms(cosmos: &mut Cosmos) {
    for id in cosmos.processing_list(ProcessingSubject::PositionCopying) {
        let copying = *cosmos.get::<PositionCopying>(id);
        let Some(target) = copying.target.and_then(|t| cosmos.find::<Transform>(t).copied()) else {
            continue;
        };
        let transform = cosmos.get_mut::<Transform>(id);
        transform.pos = target.pos + copying.offset;
        transform.rotation = target.rotation;
    }
}

/// Contained items take the transform of their root container.
pub fn items_follow_containers(cosmos: &mut Cosmos) {
    for (item, _) in cosmos.slotted_entities() {
        let root = cosmos.root_container_of(item);
        if let Some(t) = cosmos.find::<Transform>(root).copied() {
            *cosmos.get_mut::<Transform>(item) = t;
        }
    }
}

/// Drivers sit where their vehicle is.
pub fn drivers_follow_vehicles(cosmos: &mut Cosmos) {
    for id in cosmos.processing_list(ProcessingSubject::Drivers) {
        let Some(vehicle) = cosmos.get::<Driver>(id).vehicle else {
            continue;
        };
        if let Some(t) = cosmos.find::<Transform>(vehicle).copied() {
            cosmos.get_mut::<Transform>(id).pos = t.pos;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, spawn};
    use cosmos_common::{SlotFunction, SlotId};
    use cosmos_ecs::components::Item;
    use glam::Vec2;

    #[test]
    fn decorations_follow_target_with_offset() {
        let (mut cosmos, f) = testing::cosmos();
        let soldier = spawn(&mut cosmos, f.soldier, Vec2::new(10.0, 10.0));
        let smoke = spawn(&mut cosmos, f.smoke, Vec2::ZERO);
        *cosmos.get_mut::<PositionCopying>(smoke) = PositionCopying {
            target: Some(soldier),
            offset: Vec2::new(0.0, -5.0),
        };
        update_transforms(&mut cosmos);
        assert_eq!(cosmos.get::<Transform>(smoke).pos, Vec2::new(10.0, 5.0));

        cosmos.delete_entity(soldier);
        update_transforms(&mut cosmos);
        assert_eq!(cosmos.get::<Transform>(smoke).pos, Vec2::new(10.0, 5.0));
    }

    #[test]
    fn nested_items_take_root_transform() {
        let (mut cosmos, f) = testing::cosmos();
        let soldier = spawn(&mut cosmos, f.soldier, Vec2::new(7.0, 3.0));
        let pack = spawn(&mut cosmos, f.backpack, Vec2::ZERO);
        let ammo = spawn(&mut cosmos, f.ammo, Vec2::ZERO);
        cosmos.modify::<Item, _>(pack, |i| i.current_slot = Some(SlotId::new(soldier, SlotFunction::Back)));
        cosmos.modify::<Item, _>(ammo, |i| i.current_slot = Some(SlotId::new(pack, SlotFunction::Inside)));

        items_follow_containers(&mut cosmos);
        assert_eq!(cosmos.get::<Transform>(ammo).pos, Vec2::new(7.0, 3.0));
        assert_eq!(cosmos.get::<Transform>(pack).pos, Vec2::new(7.0, 3.0));
    }
}
