use cosmos_common::{EntityType, FlavourId};
use serde::{Deserialize, Serialize};

use crate::invariants::{self, EntityInvariants, Invariant};

/// A template describing one kind of entity: its type and shared invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityFlavour {
    pub name: String,
    pub entity_type: EntityType,
    pub invariants: EntityInvariants,
}

impl EntityFlavour {
    pub fn new(name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            name: name.into(),
            entity_type,
            invariants: EntityInvariants::default(),
        }
    }

    pub fn with_invariants(mut self, invariants: EntityInvariants) -> Self {
        self.invariants = invariants;
        self
    }

    pub fn find<I: Invariant>(&self) -> Option<&I> {
        self.invariants.find::<I>()
    }
}

/// Errors from registering a flavour.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FlavourError {
    #[error("flavour name {0:?} is already registered")]
    DuplicateName(String),
    #[error("flavour {flavour:?}: {entity_type:?} cannot carry the {invariant} invariant")]
    ForeignInvariant {
        flavour: String,
        entity_type: EntityType,
        invariant: &'static str,
    },
    #[error("flavour {flavour:?}: {entity_type:?} requires the {invariant} invariant")]
    MissingInvariant {
        flavour: String,
        entity_type: EntityType,
        invariant: &'static str,
    },
    #[error("flavour {flavour:?}: gun fires {missile:?}, which is not a registered missile flavour")]
    UnknownMissileFlavour { flavour: String, missile: FlavourId },
}

/// Every flavour a cosmos knows about, grouped by entity type.
///
/// Built once while setting up a scene and then frozen; a cosmos shares it
/// with its copies and never registers flavours while simulating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlavourRegistry {
    per_type: [Vec<EntityFlavour>; EntityType::COUNT],
}

impl FlavourRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a flavour.
    pub fn register(&mut self, flavour: EntityFlavour) -> Result<FlavourId, FlavourError> {
        if self.find_by_name(&flavour.name).is_some() {
            return Err(FlavourError::DuplicateName(flavour.name));
        }
        self.validate(&flavour)?;

        let list = &mut self.per_type[flavour.entity_type.index()];
        let id = FlavourId::new(flavour.entity_type, list.len() as u32);
        tracing::debug!(name = %flavour.name, ?id, "registered flavour");
        list.push(flavour);
        Ok(id)
    }

    /// Look up a flavour that must exist. Panics on an unknown id.
    pub fn get(&self, id: FlavourId) -> &EntityFlavour {
        match self.find(id) {
            Some(f) => f,
            None => panic!("flavour {id:?} is not registered"),
        }
    }

    pub fn find(&self, id: FlavourId) -> Option<&EntityFlavour> {
        self.per_type[id.entity_type.index()].get(id.index as usize)
    }

    pub fn find_by_name(&self, name: &str) -> Option<FlavourId> {
        self.iter()
            .find(|(_, f)| f.name == name)
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.per_type.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (FlavourId, &EntityFlavour)> {
        self.per_type.iter().flat_map(|list| {
            list.iter()
                .enumerate()
                .map(|(i, f)| (FlavourId::new(f.entity_type, i as u32), f))
        })
    }

    fn validate(&self, flavour: &EntityFlavour) -> Result<(), FlavourError> {
        use EntityType as T;

        let t = flavour.entity_type;
        let inv = &flavour.invariants;

        let foreign = |name: &'static str| FlavourError::ForeignInvariant {
            flavour: flavour.name.clone(),
            entity_type: t,
            invariant: name,
        };
        let missing = |name: &'static str| FlavourError::MissingInvariant {
            flavour: flavour.name.clone(),
            entity_type: t,
            invariant: name,
        };

        let only_on = |present: bool, name: &'static str, allowed: &[EntityType]| {
            if present && !allowed.contains(&t) {
                Err(foreign(name))
            } else {
                Ok(())
            }
        };

        only_on(inv.has::<invariants::Sentience>(), invariants::Sentience::NAME, &[T::Character])?;
        only_on(inv.has::<invariants::Movement>(), invariants::Movement::NAME, &[T::Character])?;
        only_on(inv.has::<invariants::Melee>(), invariants::Melee::NAME, &[T::Character])?;
        only_on(inv.has::<invariants::Ai>(), invariants::Ai::NAME, &[T::Character])?;
        only_on(inv.has::<invariants::Gun>(), invariants::Gun::NAME, &[T::Item])?;
        only_on(inv.has::<invariants::Item>(), invariants::Item::NAME, &[T::Item])?;
        only_on(inv.has::<invariants::Missile>(), invariants::Missile::NAME, &[T::Missile])?;
        only_on(inv.has::<invariants::Vehicle>(), invariants::Vehicle::NAME, &[T::Vehicle])?;
        only_on(
            inv.has::<invariants::Container>(),
            invariants::Container::NAME,
            &[T::Character, T::Item],
        )?;

        let required: Vec<(bool, &'static str)> = match t {
            T::Character => vec![
                (inv.has::<invariants::Sentience>(), invariants::Sentience::NAME),
                (inv.has::<invariants::Movement>(), invariants::Movement::NAME),
                (inv.has::<invariants::Shape>(), invariants::Shape::NAME),
            ],
            T::Item => vec![(inv.has::<invariants::Item>(), invariants::Item::NAME)],
            T::Missile => vec![
                (inv.has::<invariants::Missile>(), invariants::Missile::NAME),
                (inv.has::<invariants::Shape>(), invariants::Shape::NAME),
            ],
            T::Vehicle => vec![
                (inv.has::<invariants::Vehicle>(), invariants::Vehicle::NAME),
                (inv.has::<invariants::Shape>(), invariants::Shape::NAME),
            ],
            T::Decoration => Vec::new(),
        };
        if let Some(&(_, name)) = required.iter().find(|(present, _)| !present) {
            return Err(missing(name));
        }

        if let Some(gun) = inv.find::<invariants::Gun>() {
            let fires_missile = gun.missile_flavour.entity_type == T::Missile
                && self.find(gun.missile_flavour).is_some();
            if !fires_missile {
                return Err(FlavourError::UnknownMissileFlavour {
                    flavour: flavour.name.clone(),
                    missile: gun.missile_flavour,
                });
            }
        }

        Ok(())
    }
}
