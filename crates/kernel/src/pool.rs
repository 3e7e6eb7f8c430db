use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct PoolSlot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generational slot allocator.
///
/// Freed slots are reused last-in first-out, which keeps allocation order a
/// pure function of the operation sequence. Every free bumps the slot's
/// generation so ids handed out for the previous occupant stay dead forever.
/// A slot whose generation is exhausted is never handed out again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool<T> {
    slots: Vec<PoolSlot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Pool<T> {
    /// An empty pool.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Store a value, returning its `(index, generation)`.
    pub fn allocate(&mut self, value: T) -> (u32, u32) {
        self.live += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.value.is_none(), "free list points at a live slot");
            slot.value = Some(value);
            return (index, slot.generation);
        }

        let index = self.slots.len() as u32;
        self.slots.push(PoolSlot {
            generation: 0,
            value: Some(value),
        });
        (index, 0)
    }

    /// Remove the value if `(index, generation)` is still live.
    pub fn free(&mut self, index: u32, generation: u32) -> Option<T> {
        let slot = self.slots.get_mut(index as usize)?;
        if slot.generation != generation {
            return None;
        }
        let value = slot.value.take()?;
        self.live -= 1;
        // An exhausted slot is retired; reusing it would revive old ids.
        match slot.generation.checked_add(1) {
            Some(next) => {
                slot.generation = next;
                self.free.push(index);
            }
            None => tracing::debug!(index, "retired exhausted pool slot"),
        }
        Some(value)
    }

    /// Value at `(index, generation)`, if that id is still live.
    pub fn get(&self, index: u32, generation: u32) -> Option<&T> {
        self.slots
            .get(index as usize)
            .filter(|s| s.generation == generation)
            .and_then(|s| s.value.as_ref())
    }

    /// Mutable value at `(index, generation)`, if that id is still live.
    pub fn get_mut(&mut self, index: u32, generation: u32) -> Option<&mut T> {
        self.slots
            .get_mut(index as usize)
            .filter(|s| s.generation == generation)
            .and_then(|s| s.value.as_mut())
    }

    /// Whether `(index, generation)` names a live value.
    pub fn is_alive(&self, index: u32, generation: u32) -> bool {
        self.get(index, generation).is_some()
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots ever allocated, live or free.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Live values with their `(index, generation)`, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.value.as_ref().map(|v| (i as u32, s.generation, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_and_get() {
        let mut pool = Pool::new();
        let (i, g) = pool.allocate("a");
        assert_eq!(pool.get(i, g), Some(&"a"));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn freed_slot_is_reused_with_new_generation() {
        let mut pool = Pool::new();
        let (i, g) = pool.allocate(1);
        assert_eq!(pool.free(i, g), Some(1));

        let (i2, g2) = pool.allocate(2);
        assert_eq!(i2, i);
        assert_ne!(g2, g);
        assert!(!pool.is_alive(i, g));
        assert!(pool.is_alive(i2, g2));
        assert_eq!(pool.get(i, g), None);
    }

    #[test]
    fn stale_free_is_noop() {
        let mut pool = Pool::new();
        let (i, g) = pool.allocate(1);
        pool.free(i, g);
        pool.allocate(2);
        assert_eq!(pool.free(i, g), None);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn reuse_is_lifo() {
        let mut pool = Pool::new();
        let a = pool.allocate('a');
        let b = pool.allocate('b');
        pool.free(a.0, a.1);
        pool.free(b.0, b.1);
        assert_eq!(pool.allocate('c').0, b.0);
        assert_eq!(pool.allocate('d').0, a.0);
    }

    #[test]
    fn exhausted_slot_is_retired() {
        let mut pool = Pool::new();
        let (i, _) = pool.allocate(1);
        pool.slots[i as usize].generation = u32::MAX;
        assert_eq!(pool.free(i, u32::MAX), Some(1));
        assert!(pool.is_empty());

        let (fresh, g) = pool.allocate(2);
        assert_ne!(fresh, i);
        assert_eq!(g, 0);
        assert!(!pool.is_alive(i, u32::MAX));
        assert!(!pool.is_alive(i, 0));
        assert_eq!(pool.capacity(), 2);
    }

    #[test]
    fn iteration_skips_free_slots() {
        let mut pool = Pool::new();
        let a = pool.allocate(10);
        pool.allocate(20);
        pool.free(a.0, a.1);
        let values: Vec<i32> = pool.iter().map(|(_, _, v)| *v).collect();
        assert_eq!(values, vec![20]);
        assert_eq!(pool.capacity(), 2);
    }
}
