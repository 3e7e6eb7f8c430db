use cosmos_common::{EntityId, Transform};
use cosmos_ecs::components::Sentience;
use cosmos_kernel::Cosmos;
use std::collections::BTreeMap;

use crate::audiovisual::{AudiovisualState, ParticleStream, SoundInstance};

#[derive(Debug, Clone, PartialEq)]
pub struct FrameEntity {
    pub id: EntityId,
    pub name: String,
    pub transform: Transform,
    /// Health as a fraction of maximum, for sentient entities.
    pub health: Option<f32>,
}

/// Everything a renderer needs for one frame, detached from the cosmos.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub step: u64,
    pub entities: Vec<FrameEntity>,
    pub sounds: Vec<SoundInstance>,
    pub particles: Vec<ParticleStream>,
    /// Observer → entities it can see.
    pub visible: BTreeMap<EntityId, Vec<EntityId>>,
}

impl Frame {
    pub fn capture(cosmos: &Cosmos, av: &AudiovisualState) -> Self {
        let mut frame = Self::default();
        frame.fill_from(cosmos, av);
        frame
    }

    /// Overwrite this frame in place, reusing its allocations.
    /// Visibility is left to the caller.
    pub fn fill_from(&mut self, cosmos: &Cosmos, av: &AudiovisualState) {
        self.step = cosmos.step();
        self.entities.clear();
        for id in cosmos.ids() {
            let handle = cosmos.get_handle(id);
            let Some(logic) = handle.logic_transform() else {
                continue;
            };
            if handle.current_slot().is_some() {
                continue;
            }
            self.entities.push(FrameEntity {
                id,
                name: handle.name().to_owned(),
                transform: av.displayed_transform(id).unwrap_or(logic),
                health: handle.find::<Sentience>().map(|s| s.health.ratio()),
            });
        }
        self.sounds.clear();
        self.sounds.extend_from_slice(av.sounds());
        self.particles.clear();
        self.particles.extend_from_slice(av.particles());
        self.visible.clear();
    }

    pub fn entity(&self, id: EntityId) -> Option<&FrameEntity> {
        self.entities.iter().find(|e| e.id == id)
    }
}
