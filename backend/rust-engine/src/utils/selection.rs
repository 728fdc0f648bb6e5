//! Explicit random selection over pre-filtered pools. Filtering happens
//! before these calls so question choice stays independently testable.

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

/// Picks one element from the pool, or `None` when the pool is empty.
pub fn pick_random<'a, T, R: Rng + ?Sized>(pool: &'a [T], rng: &mut R) -> Option<&'a T> {
    pool.choose(rng)
}

/// Draws up to `count` distinct elements in random order.
pub fn sample_up_to<T: Clone, R: Rng + ?Sized>(pool: &[T], count: usize, rng: &mut R) -> Vec<T> {
    let mut indices: Vec<usize> = (0..pool.len()).collect();
    indices.shuffle(rng);
    indices
        .into_iter()
        .take(count)
        .map(|i| pool[i].clone())
        .collect()
}
