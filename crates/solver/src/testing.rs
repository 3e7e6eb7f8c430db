use cosmos_ecs::FlavourRegistry;
use cosmos_kernel::{Cosmos, CosmosSettings};

pub use crate::test_scenes::{TestFlavours as Flavours, spawn};

pub fn cosmos() -> (Cosmos, Flavours) {
    let mut reg = FlavourRegistry::new();
    let flavours = crate::test_scenes::register_test_flavours(&mut reg).unwrap();
    (Cosmos::new(reg, CosmosSettings::default()), flavours)
}
