//! Audiovisual responses to game events. Only posts messages; the view
//! drains them after the step.

use cosmos_common::EntityType;
use cosmos_kernel::LogicStep;
use cosmos_kernel::messages::{
    CollisionMessage, GunshotMessage, HealthEvent, HealthEventResult, MeleeSwingMessage,
    ParticleEffect, ParticleKind, QueueDestruction, SoundEffect, SoundKind,
};
use glam::Vec2;

pub fn game_responses_to_particle_effects(step: &mut LogicStep<'_>) {
    let mut effects = Vec::new();

    for shot in step.get_queue::<GunshotMessage>() {
        effects.push(ParticleEffect {
            kind: ParticleKind::MuzzleFlash,
            pos: shot.muzzle.pos,
            direction: shot.muzzle.direction(),
        });
    }
    for event in step.get_queue::<HealthEvent>() {
        let kind = match event.result {
            HealthEventResult::Death => ParticleKind::Debris,
            HealthEventResult::None if event.effective_amount < 0 => ParticleKind::Blood,
            HealthEventResult::None => continue,
        };
        effects.push(ParticleEffect {
            kind,
            pos: event.point,
            direction: Vec2::ZERO,
        });
    }
    // Missiles detonating against vehicles.
    let destroyed = step.get_queue::<QueueDestruction>();
    for contact in step.get_queue::<CollisionMessage>() {
        if contact.subject.entity_type == EntityType::Missile
            && destroyed.iter().any(|q| q.subject == contact.subject)
            && contact.collider.entity_type == EntityType::Vehicle
        {
            effects.push(ParticleEffect {
                kind: ParticleKind::Sparks,
                pos: contact.point,
                direction: contact.normal,
            });
        }
    }

    for effect in effects {
        step.post(effect);
    }
}

pub fn create_sounds_from_game_events(step: &mut LogicStep<'_>) {
    let mut sounds = Vec::new();

    for shot in step.get_queue::<GunshotMessage>() {
        sounds.push(SoundEffect {
            kind: SoundKind::Gunshot,
            pos: shot.muzzle.pos,
            subject: Some(shot.gun),
        });
    }
    for swing in step.get_queue::<MeleeSwingMessage>() {
        sounds.push(SoundEffect {
            kind: SoundKind::Swing,
            pos: swing.pos,
            subject: Some(swing.subject),
        });
    }
    for event in step.get_queue::<HealthEvent>() {
        let kind = match event.result {
            HealthEventResult::Death => SoundKind::Death,
            HealthEventResult::None => SoundKind::Impact,
        };
        sounds.push(SoundEffect {
            kind,
            pos: event.point,
            subject: None,
        });
    }

    for sound in sounds {
        step.post(sound);
    }
}
