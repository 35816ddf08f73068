//! Generation-guarded output slots.
//!
//! Each dashboard output (rows, table, chart, map) lives in an
//! [`OutputSlot`]. Writers tag values with the generation of the event that
//! produced them; a slot refuses a value older than the one it holds, so a
//! slow response can never overwrite the result of a newer event.

use std::sync::Arc;

use parking_lot::RwLock;

/// A value tagged with the event generation that produced it.
#[derive(Debug)]
pub struct Versioned<T> {
    pub generation: u64,
    pub value: Arc<T>,
}

impl<T> Clone for Versioned<T> {
    fn clone(&self) -> Self {
        Self {
            generation: self.generation,
            value: Arc::clone(&self.value),
        }
    }
}

/// Last-write-wins cell keyed by generation.
#[derive(Debug)]
pub struct OutputSlot<T> {
    current: RwLock<Versioned<T>>,
}

impl<T> OutputSlot<T> {
    /// Creates a slot holding `initial` at generation 0.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            current: RwLock::new(Versioned {
                generation: 0,
                value: Arc::new(initial),
            }),
        }
    }

    /// Stores `value` unless the slot already holds a newer generation.
    ///
    /// Equal generations are accepted. Returns whether the value was stored.
    pub fn publish(&self, generation: u64, value: T) -> bool {
        let mut current = self.current.write();
        if generation < current.generation {
            return false;
        }
        *current = Versioned {
            generation,
            value: Arc::new(value),
        };
        true
    }

    /// The current value and its generation.
    #[must_use]
    pub fn load(&self) -> Versioned<T> {
        self.current.read().clone()
    }

    /// The current value.
    #[must_use]
    pub fn latest(&self) -> Arc<T> {
        Arc::clone(&self.current.read().value)
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }
}
