use cosmos_common::{EntityId, Transform};
use cosmos_kernel::messages::{ParticleEffect, ParticleKind, SoundEffect, SoundKind};
use cosmos_kernel::{ConstLogicStep, Cosmos};
use cosmos_predict::ResampleSink;
use cosmos_solver::SolverCallbacks;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSettings {
    /// How fast displayed transforms chase logic transforms, per second.
    /// Zero or less snaps them.
    pub interpolation_speed: f32,
    /// Threads of the worker pool; zero lets rayon decide.
    pub worker_threads: usize,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            interpolation_speed: 25.0,
            worker_threads: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Interpolated {
    displayed: Transform,
    target: Transform,
}

impl Interpolated {
    fn snapped(t: Transform) -> Self {
        Self {
            displayed: t,
            target: t,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundInstance {
    pub kind: SoundKind,
    pub pos: Vec2,
    /// Entity the sound follows while it lives.
    pub subject: Option<EntityId>,
    pub remaining_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleStream {
    pub kind: ParticleKind,
    pub pos: Vec2,
    pub direction: Vec2,
    pub remaining_ms: u32,
}

fn sound_duration_ms(kind: SoundKind) -> u32 {
    match kind {
        SoundKind::Gunshot => 400,
        SoundKind::Swing => 250,
        SoundKind::Impact => 200,
        SoundKind::Death => 900,
        SoundKind::Pickup => 150,
        SoundKind::Engine => 1000,
    }
}

fn particle_lifetime_ms(kind: ParticleKind) -> u32 {
    match kind {
        ParticleKind::MuzzleFlash => 60,
        ParticleKind::Blood => 500,
        ParticleKind::Sparks => 250,
        ParticleKind::Debris => 800,
    }
}

/// Per-entity interpolation plus the sounds and particles currently playing.
///
/// Fed once per logic step through [`SolverCallbacks`] and advanced once per
/// rendered frame.
#[derive(Debug, Clone, Default)]
pub struct AudiovisualState {
    settings: FrameSettings,
    interpolation: BTreeMap<EntityId, Interpolated>,
    sounds: Vec<SoundInstance>,
    particles: Vec<ParticleStream>,
    resamples: u64,
}

impl AudiovisualState {
    pub fn new(settings: FrameSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    /// Start effects posted this step and retarget interpolation.
    pub fn standard_post_solve(&mut self, step: ConstLogicStep<'_>) {
        for effect in step.get_queue::<SoundEffect>() {
            self.sounds.push(SoundInstance {
                kind: effect.kind,
                pos: effect.pos,
                subject: effect.subject,
                remaining_ms: sound_duration_ms(effect.kind),
            });
        }
        for effect in step.get_queue::<ParticleEffect>() {
            self.particles.push(ParticleStream {
                kind: effect.kind,
                pos: effect.pos,
                direction: effect.direction,
                remaining_ms: particle_lifetime_ms(effect.kind),
            });
        }
        self.sample_transforms(step.cosmos);
    }

    fn sample_transforms(&mut self, cosmos: &Cosmos) {
        for id in cosmos.ids() {
            if let Some(t) = cosmos.find::<Transform>(id) {
                self.interpolation
                    .entry(id)
                    .or_insert_with(|| Interpolated::snapped(*t))
                    .target = *t;
            }
        }
    }

    /// Forget state of entities that no longer exist.
    pub fn clear_dead_entities(&mut self, cosmos: &Cosmos) {
        self.interpolation.retain(|id, _| cosmos.is_alive(*id));
        for sound in &mut self.sounds {
            if sound.subject.is_some_and(|s| !cosmos.is_alive(s)) {
                sound.subject = None;
            }
        }
    }

    /// Drop everything and re-derive from `cosmos`.
    pub fn resample(&mut self, cosmos: &Cosmos) {
        self.interpolation.clear();
        self.sounds.clear();
        self.particles.clear();
        self.sample_transforms(cosmos);
        self.resamples += 1;
        tracing::debug!(
            step = cosmos.step(),
            tracked = self.interpolation.len(),
            "audiovisual state resampled"
        );
    }

    /// Advance by one rendered frame of `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        let alpha = if self.settings.interpolation_speed <= 0.0 {
            1.0
        } else {
            1.0 - (-self.settings.interpolation_speed * dt).exp()
        };
        for entry in self.interpolation.values_mut() {
            entry.displayed = if alpha >= 1.0 {
                entry.target
            } else {
                entry.displayed.interpolated(&entry.target, alpha)
            };
        }

        let dt_ms = (dt * 1000.0) as u32;
        for sound in &mut self.sounds {
            sound.remaining_ms = sound.remaining_ms.saturating_sub(dt_ms);
            if let Some(followed) = sound.subject.and_then(|s| self.interpolation.get(&s)) {
                sound.pos = followed.displayed.pos;
            }
        }
        self.sounds.retain(|s| s.remaining_ms > 0);

        for particle in &mut self.particles {
            particle.remaining_ms = particle.remaining_ms.saturating_sub(dt_ms);
            particle.pos += particle.direction * dt;
        }
        self.particles.retain(|p| p.remaining_ms > 0);
    }

    pub fn displayed_transform(&self, id: EntityId) -> Option<Transform> {
        self.interpolation.get(&id).map(|i| i.displayed)
    }

    pub fn sounds(&self) -> &[SoundInstance] {
        &self.sounds
    }

    pub fn particles(&self) -> &[ParticleStream] {
        &self.particles
    }

    pub fn tracked_entities(&self) -> usize {
        self.interpolation.len()
    }

    pub fn resample_count(&self) -> u64 {
        self.resamples
    }

    pub fn settings(&self) -> FrameSettings {
        self.settings
    }
}

impl SolverCallbacks for AudiovisualState {
    fn post_solve(&mut self, step: ConstLogicStep<'_>) {
        self.standard_post_solve(step);
    }

    fn post_cleanup(&mut self, step: ConstLogicStep<'_>) {
        self.clear_dead_entities(step.cosmos);
    }
}

impl ResampleSink for AudiovisualState {
    fn resample(&mut self, cosmos: &Cosmos) {
        AudiovisualState::resample(self, cosmos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmos_ecs::components::RigidBody;
    use cosmos_input::{CosmicEntropy, Intent, IntentKind};
    use cosmos_kernel::CosmosSettings;
    use cosmos_kernel::messages::QueueDestruction;
    use cosmos_solver::test_scenes::{TestScene, test_scene_cosmos};
    use cosmos_solver::{SolverSettings, solve};

    fn scene() -> (Cosmos, TestScene) {
        test_scene_cosmos(CosmosSettings::default()).unwrap()
    }

    #[test]
    fn gunshot_starts_sound_and_muzzle_flash() {
        let (mut cosmos, scene) = scene();
        let mut av = AudiovisualState::new(FrameSettings::default());
        let fire = CosmicEntropy::new().with_intent(scene.player, Intent::pressed(IntentKind::Shoot));
        solve(&mut cosmos, &fire, SolverSettings::default(), &mut av);

        assert!(av.sounds().iter().any(|s| s.kind == SoundKind::Gunshot));
        assert!(av.particles().iter().any(|p| p.kind == ParticleKind::MuzzleFlash));
        assert!(av.displayed_transform(scene.player).is_some());
    }

    #[test]
    fn effects_expire() {
        let (mut cosmos, scene) = scene();
        let mut av = AudiovisualState::new(FrameSettings::default());
        let fire = CosmicEntropy::new().with_intent(scene.player, Intent::pressed(IntentKind::Shoot));
        solve(&mut cosmos, &fire, SolverSettings::default(), &mut av);
        assert!(!av.sounds().is_empty());

        for _ in 0..100 {
            av.advance(0.016);
        }
        assert!(av.sounds().is_empty());
        assert!(av.particles().is_empty());
    }

    #[test]
    fn displayed_transform_chases_logic() {
        let (mut cosmos, scene) = scene();
        let mut av = AudiovisualState::new(FrameSettings::default());
        solve(&mut cosmos, &CosmicEntropy::new(), SolverSettings::default(), &mut av);
        let start = av.displayed_transform(scene.car).unwrap().pos;

        cosmos.get_mut::<RigidBody>(scene.car).velocity = glam::Vec2::new(600.0, 0.0);
        solve(&mut cosmos, &CosmicEntropy::new(), SolverSettings::default(), &mut av);
        let logic = cosmos.get::<Transform>(scene.car).pos;

        av.advance(0.01);
        let halfway = av.displayed_transform(scene.car).unwrap().pos;
        assert!(halfway.x > start.x && halfway.x < logic.x);

        for _ in 0..200 {
            av.advance(0.01);
        }
        assert!((av.displayed_transform(scene.car).unwrap().pos - logic).length() < 1e-3);
    }

    #[test]
    fn zero_speed_snaps() {
        let (mut cosmos, scene) = scene();
        let mut av = AudiovisualState::new(FrameSettings {
            interpolation_speed: 0.0,
            worker_threads: 1,
        });
        cosmos.get_mut::<RigidBody>(scene.car).velocity = glam::Vec2::new(600.0, 0.0);
        solve(&mut cosmos, &CosmicEntropy::new(), SolverSettings::default(), &mut av);
        solve(&mut cosmos, &CosmicEntropy::new(), SolverSettings::default(), &mut av);
        av.advance(0.001);
        assert_eq!(
            av.displayed_transform(scene.car).unwrap(),
            *cosmos.get::<Transform>(scene.car)
        );
    }

    #[test]
    fn deleted_entities_are_forgotten_after_cleanup() {
        let (mut cosmos, scene) = scene();
        let mut av = AudiovisualState::new(FrameSettings::default());
        solve(&mut cosmos, &CosmicEntropy::new(), SolverSettings::default(), &mut av);
        assert!(av.displayed_transform(scene.rifle).is_some());

        struct Doom<'a>(&'a mut AudiovisualState, EntityId);
        impl SolverCallbacks for Doom<'_> {
            fn pre_solve(&mut self, step: &mut cosmos_kernel::LogicStep<'_>) {
                step.post(QueueDestruction::new(self.1));
            }
            fn post_solve(&mut self, step: ConstLogicStep<'_>) {
                self.0.post_solve(step);
            }
            fn post_cleanup(&mut self, step: ConstLogicStep<'_>) {
                self.0.post_cleanup(step);
            }
        }
        solve(
            &mut cosmos,
            &CosmicEntropy::new(),
            SolverSettings::default(),
            &mut Doom(&mut av, scene.player),
        );
        assert!(av.displayed_transform(scene.player).is_none());
        assert!(av.displayed_transform(scene.rifle).is_none());
        assert!(av.displayed_transform(scene.car).is_some());
    }

    #[test]
    fn resample_rebuilds_from_cosmos() {
        let (mut cosmos, _) = scene();
        let mut av = AudiovisualState::new(FrameSettings::default());
        solve(&mut cosmos, &CosmicEntropy::new(), SolverSettings::default(), &mut av);

        let (other, _) = scene();
        ResampleSink::resample(&mut av, &other);
        assert_eq!(av.resample_count(), 1);
        assert!(av.sounds().is_empty());
        assert_eq!(av.tracked_entities(), other.entity_count());
    }
}
