use cosmos_common::{EntityId, FixedDelta};
use cosmos_input::CosmicEntropy;

use crate::cosmos::Cosmos;
use crate::messages::{Message, MessageQueues};
use crate::rng::CosmosRng;

/// Everything a system may touch during one step.
///
/// Fields are public so systems can borrow the cosmos and the queues
/// independently.
pub struct LogicStep<'a> {
    pub cosmos: &'a mut Cosmos,
    pub entropy: &'a CosmicEntropy,
    pub queues: &'a mut MessageQueues,
}

impl<'a> LogicStep<'a> {
    pub fn new(
        cosmos: &'a mut Cosmos,
        entropy: &'a CosmicEntropy,
        queues: &'a mut MessageQueues,
    ) -> Self {
        Self {
            cosmos,
            entropy,
            queues,
        }
    }

    pub fn post<M: Message>(&mut self, message: M) {
        self.queues.post(message);
    }

    pub fn get_queue<M: Message>(&self) -> &[M] {
        self.queues.get_queue::<M>()
    }

    pub fn take_queue<M: Message>(&mut self) -> Vec<M> {
        self.queues.take_queue::<M>()
    }

    pub fn delta(&self) -> FixedDelta {
        self.cosmos.delta()
    }

    pub fn rng_for(&self, id: EntityId) -> CosmosRng {
        self.cosmos.rng_for(id)
    }

    pub fn as_const(&self) -> ConstLogicStep<'_> {
        ConstLogicStep {
            cosmos: &*self.cosmos,
            entropy: self.entropy,
            queues: &*self.queues,
        }
    }
}

/// Read-only view of a step, handed to observers between solver phases.
#[derive(Clone, Copy)]
pub struct ConstLogicStep<'a> {
    pub cosmos: &'a Cosmos,
    pub entropy: &'a CosmicEntropy,
    pub queues: &'a MessageQueues,
}

impl ConstLogicStep<'_> {
    pub fn get_queue<M: Message>(&self) -> &[M] {
        self.queues.get_queue::<M>()
    }
}
