use cosmos_common::EntityId;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Random stream handed to systems. Portable and bit-identical across platforms.
pub type CosmosRng = ChaCha8Rng;

/// Splitmix64 finalizer, used to decorrelate stream keys.
pub fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Stream for one entity at one step.
///
/// Depends only on `(seed, step, id)`, so the same entity draws the same
/// numbers on the server and on every predicting client.
pub fn rng_for(seed: u64, step: u64, id: EntityId) -> CosmosRng {
    let key = splitmix64(seed ^ step.rotate_left(17) ^ id.to_bits());
    CosmosRng::seed_from_u64(key)
}
