//! Deterministic RNG with per-node seed derivation.
//!
//! Noise rendering is reproducible: the render options carry a base seed,
//! and every leaf derives its own PCG32 stream from that seed hashed with
//! the leaf's position in the document tree. Leaves therefore never share
//! generator state, which keeps them independent under any render order.

use rand::SeedableRng;
use rand_pcg::Pcg32;

/// Creates a PCG32 generator from a 32-bit seed.
pub fn create_rng(seed: u32) -> Pcg32 {
    // Expand the 32-bit seed to the 64-bit PCG32 state
    let seed64 = (seed as u64) | ((seed as u64) << 32);
    Pcg32::seed_from_u64(seed64)
}

/// Derives an independent seed for the node at `path`, where `path` is the
/// chain of child indices from the document root down to the node.
pub fn derive_node_seed(base_seed: u32, path: &[usize]) -> u32 {
    let mut input = Vec::with_capacity(4 + path.len() * 4);
    input.extend_from_slice(&base_seed.to_le_bytes());
    for &index in path {
        input.extend_from_slice(&(index as u32).to_le_bytes());
    }

    let hash = blake3::hash(&input);
    let bytes: [u8; 4] = hash.as_bytes()[0..4].try_into().unwrap();
    u32::from_le_bytes(bytes)
}

/// Creates the RNG for the node at `path`.
pub fn create_node_rng(base_seed: u32, path: &[usize]) -> Pcg32 {
    create_rng(derive_node_seed(base_seed, path))
}
