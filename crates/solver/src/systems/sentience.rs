use cosmos_ecs::components::Sentience;
use cosmos_kernel::LogicStep;
use cosmos_kernel::messages::{DamageMessage, HealthEvent, HealthEventResult, QueueDestruction};

/// Consumes the damage queue. Every damage to a living sentient entity
/// produces a health event; the blow that depletes health kills.
pub fn apply_damage_and_generate_health_events(step: &mut LogicStep<'_>) {
    for damage in step.take_queue::<DamageMessage>() {
        let Some(sentience) = step.cosmos.find_mut::<Sentience>(damage.subject) else {
            continue;
        };
        if sentience.health.is_depleted() {
            continue;
        }
        let effective_amount = sentience.health.apply(-damage.amount);
        let result = if sentience.health.is_depleted() {
            HealthEventResult::Death
        } else {
            HealthEventResult::None
        };

        step.post(HealthEvent {
            subject: damage.subject,
            effective_amount,
            point: damage.point,
            origin: damage.origin,
            result,
        });
        if result == HealthEventResult::Death {
            tracing::debug!(subject = %damage.subject, "died");
            step.post(QueueDestruction::new(damage.subject));
        }
    }
}
