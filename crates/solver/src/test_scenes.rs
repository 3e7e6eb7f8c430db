//! Built-in flavours and a populated scene for tests, benchmarks and the
//! test-scene setup.

use cosmos_common::{EntityId, EntityType, FlavourId, SlotFunction, SlotId, Transform};
use cosmos_ecs::invariants::{self, Container, SlotDefinition};
use cosmos_ecs::{EntityFlavour, EntityInvariants, FlavourError, FlavourRegistry};
use cosmos_kernel::{Cosmos, CosmosSettings};
use glam::Vec2;

#[derive(Debug, Clone, Copy)]
pub struct TestFlavours {
    pub soldier: FlavourId,
    pub grunt: FlavourId,
    pub rifle: FlavourId,
    pub ammo: FlavourId,
    pub backpack: FlavourId,
    pub bullet: FlavourId,
    pub car: FlavourId,
    pub smoke: FlavourId,
}

/// Entities of a freshly populated test scene.
#[derive(Debug, Clone)]
pub struct TestScene {
    pub flavours: TestFlavours,
    pub player: EntityId,
    pub rifle: EntityId,
    pub backpack: EntityId,
    pub grunts: Vec<EntityId>,
    pub car: EntityId,
}

fn hands_and_back() -> Container {
    let slot = |function| SlotDefinition {
        function,
        capacity: 1,
        allows_containers: true,
    };
    Container {
        slots: vec![
            slot(SlotFunction::PrimaryHand),
            slot(SlotFunction::SecondaryHand),
            slot(SlotFunction::Back),
        ],
    }
}

fn character(name: &str, ai: bool) -> EntityFlavour {
    EntityFlavour::new(name, EntityType::Character).with_invariants(EntityInvariants {
        shape: Some(invariants::Shape { radius: 12.0 }),
        movement: Some(invariants::Movement::default()),
        sentience: Some(invariants::Sentience { max_health: 100 }),
        container: Some(hands_and_back()),
        melee: Some(invariants::Melee {
            range: 30.0,
            damage: 25,
            cooldown_ms: 500,
        }),
        ai: ai.then_some(invariants::Ai { sight_range: 400.0 }),
        ..Default::default()
    })
}

pub fn register_test_flavours(reg: &mut FlavourRegistry) -> Result<TestFlavours, FlavourError> {
    let bullet = reg.register(
        EntityFlavour::new("bullet", EntityType::Missile).with_invariants(EntityInvariants {
            shape: Some(invariants::Shape { radius: 2.0 }),
            missile: Some(invariants::Missile {
                damage: 30,
                lifetime_ms: 1000,
            }),
            ..Default::default()
        }),
    )?;
    let soldier = reg.register(character("soldier", false))?;
    let grunt = reg.register(character("grunt", true))?;
    let rifle = reg.register(
        EntityFlavour::new("rifle", EntityType::Item).with_invariants(EntityInvariants {
            shape: Some(invariants::Shape { radius: 6.0 }),
            item: Some(invariants::Item::default()),
            gun: Some(invariants::Gun {
                missile_flavour: bullet,
                muzzle_speed: 2000.0,
                cooldown_ms: 100,
                spread_degrees: 0.0,
            }),
            ..Default::default()
        }),
    )?;
    let ammo = reg.register(
        EntityFlavour::new("ammo", EntityType::Item).with_invariants(EntityInvariants {
            shape: Some(invariants::Shape { radius: 4.0 }),
            item: Some(invariants::Item {
                stackable: true,
                max_charges: 90,
            }),
            ..Default::default()
        }),
    )?;
    let backpack = reg.register(
        EntityFlavour::new("backpack", EntityType::Item).with_invariants(EntityInvariants {
            shape: Some(invariants::Shape { radius: 8.0 }),
            item: Some(invariants::Item::default()),
            container: Some(Container {
                slots: vec![SlotDefinition {
                    function: SlotFunction::Inside,
                    capacity: 4,
                    allows_containers: false,
                }],
            }),
            ..Default::default()
        }),
    )?;
    let car = reg.register(
        EntityFlavour::new("car", EntityType::Vehicle).with_invariants(EntityInvariants {
            shape: Some(invariants::Shape { radius: 30.0 }),
            vehicle: Some(invariants::Vehicle {
                acceleration: 1500.0,
                max_speed: 600.0,
                entry_radius: 60.0,
            }),
            ..Default::default()
        }),
    )?;
    let smoke = reg.register(
        EntityFlavour::new("smoke", EntityType::Decoration).with_invariants(EntityInvariants {
            animation: Some(invariants::Animation {
                frame_count: 4,
                frame_duration_ms: 50,
                looping: true,
            }),
            ..Default::default()
        }),
    )?;

    Ok(TestFlavours {
        soldier,
        grunt,
        rifle,
        ammo,
        backpack,
        bullet,
        car,
        smoke,
    })
}

pub fn spawn(cosmos: &mut Cosmos, flavour: FlavourId, pos: Vec2) -> EntityId {
    cosmos.create_entity(flavour, |c| c.transform = Some(Transform::at(pos)))
}

fn spawn_in(cosmos: &mut Cosmos, flavour: FlavourId, slot: SlotId) -> EntityId {
    let pos = cosmos.get_handle(slot.container).logic_transform().unwrap_or_default().pos;
    cosmos.create_entity(flavour, |c| {
        c.transform = Some(Transform::at(pos));
        if let Some(item) = c.item.as_mut() {
            item.current_slot = Some(slot);
        }
    })
}

/// An armed player with a backpack of ammo, two hostile grunts, a car and
/// some smoke.
pub fn populate_test_scene(cosmos: &mut Cosmos, flavours: TestFlavours) -> TestScene {
    let player = spawn(cosmos, flavours.soldier, Vec2::ZERO);
    let rifle = spawn_in(
        cosmos,
        flavours.rifle,
        SlotId::new(player, SlotFunction::PrimaryHand),
    );
    let backpack = spawn_in(cosmos, flavours.backpack, SlotId::new(player, SlotFunction::Back));
    for _ in 0..2 {
        spawn_in(
            cosmos,
            flavours.ammo,
            SlotId::new(backpack, SlotFunction::Inside),
        );
    }

    let grunts = [Vec2::new(300.0, 80.0), Vec2::new(320.0, -120.0)]
        .into_iter()
        .map(|pos| spawn(cosmos, flavours.grunt, pos))
        .collect();
    let car = spawn(cosmos, flavours.car, Vec2::new(-150.0, 0.0));
    spawn(cosmos, flavours.smoke, Vec2::new(-150.0, 40.0));
    spawn(cosmos, flavours.ammo, Vec2::new(60.0, 60.0));

    TestScene {
        flavours,
        player,
        rifle,
        backpack,
        grunts,
        car,
    }
}

/// A new cosmos holding the test scene.
pub fn test_scene_cosmos(settings: CosmosSettings) -> Result<(Cosmos, TestScene), FlavourError> {
    let mut reg = FlavourRegistry::new();
    let flavours = register_test_flavours(&mut reg)?;
    let mut cosmos = Cosmos::new(reg, settings);
    let scene = populate_test_scene(&mut cosmos, flavours);
    Ok((cosmos, scene))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NoCallbacks, SolverSettings, solve};
    use cosmos_ecs::ProcessingSubject;

    #[test]
    fn scene_is_consistent_and_attached() {
        let (cosmos, scene) = test_scene_cosmos(CosmosSettings::default()).unwrap();
        cosmos.assert_caches_consistent();
        assert_eq!(cosmos.children_of(scene.player), vec![scene.rifle, scene.backpack]);
        assert_eq!(cosmos.children_of(scene.backpack).len(), 2);
        assert_eq!(cosmos.processing_list(ProcessingSubject::Ai), scene.grunts);
        assert!(!cosmos.processing_list(ProcessingSubject::Physics).contains(&scene.rifle));
    }

    #[test]
    fn scene_runs_for_a_few_seconds() {
        let (mut cosmos, scene) = test_scene_cosmos(CosmosSettings::default()).unwrap();
        let settings = SolverSettings {
            verify_caches_every_step: true,
        };
        for _ in 0..180 {
            solve(&mut cosmos, &Default::default(), settings, &mut NoCallbacks);
        }
        assert_eq!(cosmos.step(), 180);
        assert!(cosmos.is_alive(scene.car));
    }
}
