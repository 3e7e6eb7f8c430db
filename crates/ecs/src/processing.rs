use cosmos_common::EntityType;
use serde::{Deserialize, Serialize};

use crate::invariants::{self, EntityInvariants};

/// Categories of per-tick processing. Each system iterates one or more of
/// these lists instead of scanning every entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProcessingSubject {
    Physics,
    Movement,
    Crosshair,
    Guns,
    Melee,
    Missiles,
    ForceJoints,
    Sentience,
    Vehicles,
    Drivers,
    Ai,
    Items,
    Animations,
    PositionCopying,
}

impl ProcessingSubject {
    pub const COUNT: usize = 14;

    pub const ALL: [ProcessingSubject; Self::COUNT] = [
        ProcessingSubject::Physics,
        ProcessingSubject::Movement,
        ProcessingSubject::Crosshair,
        ProcessingSubject::Guns,
        ProcessingSubject::Melee,
        ProcessingSubject::Missiles,
        ProcessingSubject::ForceJoints,
        ProcessingSubject::Sentience,
        ProcessingSubject::Vehicles,
        ProcessingSubject::Drivers,
        ProcessingSubject::Ai,
        ProcessingSubject::Items,
        ProcessingSubject::Animations,
        ProcessingSubject::PositionCopying,
    ];

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// A set of [`ProcessingSubject`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessingFlags(u16);

impl ProcessingFlags {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn of(subjects: &[ProcessingSubject]) -> Self {
        let mut flags = Self::empty();
        for s in subjects {
            flags.insert(*s);
        }
        flags
    }

    pub fn insert(&mut self, subject: ProcessingSubject) {
        self.0 |= subject.bit();
    }

    pub fn remove(&mut self, subject: ProcessingSubject) {
        self.0 &= !subject.bit();
    }

    pub fn contains(&self, subject: ProcessingSubject) -> bool {
        self.0 & subject.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Subjects in `self` that are not in `other`.
    pub fn without(&self, other: ProcessingFlags) -> Self {
        Self(self.0 & !other.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = ProcessingSubject> + '_ {
        ProcessingSubject::ALL
            .into_iter()
            .filter(move |s| self.contains(*s))
    }
}

/// Subjects an entity of this type and flavour takes part in unless disabled.
pub fn default_processing(
    entity_type: EntityType,
    invariants: &EntityInvariants,
) -> ProcessingFlags {
    use ProcessingSubject as P;

    let mut flags = match entity_type {
        EntityType::Character => ProcessingFlags::of(&[
            P::Physics,
            P::Movement,
            P::Crosshair,
            P::Sentience,
            P::Drivers,
            P::Animations,
        ]),
        EntityType::Item => ProcessingFlags::of(&[P::Physics, P::Items]),
        EntityType::Missile => ProcessingFlags::of(&[P::Physics, P::Missiles, P::ForceJoints]),
        EntityType::Vehicle => ProcessingFlags::of(&[P::Physics, P::Vehicles]),
        EntityType::Decoration => ProcessingFlags::of(&[P::PositionCopying]),
    };

    if invariants.has::<invariants::Gun>() {
        flags.insert(P::Guns);
    }
    if invariants.has::<invariants::Melee>() {
        flags.insert(P::Melee);
    }
    if invariants.has::<invariants::Ai>() {
        flags.insert(P::Ai);
    }
    if entity_type == EntityType::Decoration && invariants.has::<invariants::Animation>() {
        flags.insert(P::Animations);
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_insert_remove() {
        let mut f = ProcessingFlags::empty();
        f.insert(ProcessingSubject::Guns);
        f.insert(ProcessingSubject::Ai);
        assert!(f.contains(ProcessingSubject::Guns));
        f.remove(ProcessingSubject::Guns);
        assert!(!f.contains(ProcessingSubject::Guns));
        assert_eq!(f.iter().collect::<Vec<_>>(), vec![ProcessingSubject::Ai]);
    }

    #[test]
    fn without_subtracts() {
        let all = ProcessingFlags::of(&[ProcessingSubject::Physics, ProcessingSubject::Items]);
        let disabled = ProcessingFlags::of(&[ProcessingSubject::Physics]);
        let left = all.without(disabled);
        assert!(!left.contains(ProcessingSubject::Physics));
        assert!(left.contains(ProcessingSubject::Items));
    }

    #[test]
    fn guns_only_for_flavours_with_gun_invariant() {
        let plain = EntityInvariants::default();
        assert!(!default_processing(EntityType::Item, &plain).contains(ProcessingSubject::Guns));

        let gun = EntityInvariants {
            gun: Some(invariants::Gun {
                missile_flavour: cosmos_common::FlavourId::new(EntityType::Missile, 0),
                muzzle_speed: 1000.0,
                cooldown_ms: 100,
                spread_degrees: 0.0,
            }),
            ..Default::default()
        };
        assert!(default_processing(EntityType::Item, &gun).contains(ProcessingSubject::Guns));
    }

    #[test]
    fn all_subjects_fit_in_flags() {
        let mut f = ProcessingFlags::empty();
        for s in ProcessingSubject::ALL {
            f.insert(s);
        }
        assert_eq!(f.iter().count(), ProcessingSubject::COUNT);
    }
}
