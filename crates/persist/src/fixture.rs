use cosmos_common::{EntityId, EntityType, SlotFunction, SlotId, Transform};
use cosmos_ecs::invariants::{self, Container, SlotDefinition};
use cosmos_ecs::{EntityFlavour, EntityInvariants, FlavourRegistry};
use cosmos_input::{CosmicEntropy, Intent, IntentKind, TransferRequest};
use cosmos_kernel::{Cosmos, CosmosSettings};
use glam::Vec2;

/// Two soldiers, one of them armed, facing each other.
pub fn duel() -> (Cosmos, EntityId, EntityId) {
    let mut reg = FlavourRegistry::new();
    let bullet = reg
        .register(
            EntityFlavour::new("bullet", EntityType::Missile).with_invariants(EntityInvariants {
                shape: Some(invariants::Shape { radius: 2.0 }),
                missile: Some(invariants::Missile {
                    damage: 20,
                    lifetime_ms: 500,
                }),
                ..Default::default()
            }),
        )
        .unwrap();
    let soldier = reg
        .register(
            EntityFlavour::new("soldier", EntityType::Character).with_invariants(
                EntityInvariants {
                    shape: Some(invariants::Shape { radius: 12.0 }),
                    movement: Some(invariants::Movement::default()),
                    sentience: Some(invariants::Sentience { max_health: 100 }),
                    container: Some(Container {
                        slots: vec![SlotDefinition {
                            function: SlotFunction::PrimaryHand,
                            capacity: 1,
                            allows_containers: true,
                        }],
                    }),
                    ..Default::default()
                },
            ),
        )
        .unwrap();
    let rifle = reg
        .register(
            EntityFlavour::new("rifle", EntityType::Item).with_invariants(EntityInvariants {
                shape: Some(invariants::Shape { radius: 6.0 }),
                item: Some(invariants::Item::default()),
                gun: Some(invariants::Gun {
                    missile_flavour: bullet,
                    muzzle_speed: 1200.0,
                    cooldown_ms: 150,
                    spread_degrees: 4.0,
                }),
                ..Default::default()
            }),
        )
        .unwrap();

    let mut cosmos = Cosmos::new(
        reg,
        CosmosSettings {
            seed: 1234,
            ..Default::default()
        },
    );
    let spawn = |cosmos: &mut Cosmos, flavour, pos: Vec2| {
        cosmos.create_entity(flavour, |c| c.transform = Some(Transform::at(pos)))
    };
    let shooter = spawn(&mut cosmos, soldier, Vec2::ZERO);
    let target = spawn(&mut cosmos, soldier, Vec2::new(200.0, 0.0));
    let gun = spawn(&mut cosmos, rifle, Vec2::new(0.0, 40.0));
    let arm = CosmicEntropy::new().with_transfer(TransferRequest::to_slot(
        gun,
        SlotId::new(shooter, SlotFunction::PrimaryHand),
    ));
    cosmos_solver::solve(
        &mut cosmos,
        &arm,
        Default::default(),
        &mut cosmos_solver::NoCallbacks,
    );
    (cosmos, shooter, target)
}

/// Entropy for tick `i` of a scripted exchange of fire.
pub fn script(shooter: EntityId, i: u64) -> CosmicEntropy {
    let mut entropy = CosmicEntropy::new();
    if i % 20 == 0 {
        entropy = entropy.with_intent(shooter, Intent::pressed(IntentKind::Shoot));
    }
    if i % 20 == 10 {
        entropy = entropy.with_intent(shooter, Intent::released(IntentKind::Shoot));
    }
    if i % 3 == 0 {
        entropy = entropy.with_motion(shooter, Vec2::new(2.0, 0.5));
    }
    entropy
}
