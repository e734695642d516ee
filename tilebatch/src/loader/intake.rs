//! Shared intake queue of tiles waiting to be read.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::tile::TileDescriptor;

/// FIFO of descriptors drained by the loader workers.
///
/// Filled once at construction and never refilled. Claims take the lock for
/// the whole claim, so a descriptor is handed to exactly one worker.
#[derive(Debug)]
pub struct IntakeQueue {
    tiles: Mutex<VecDeque<Arc<TileDescriptor>>>,
    total: usize,
}

impl IntakeQueue {
    pub fn new(descriptors: Vec<Arc<TileDescriptor>>) -> Self {
        let total = descriptors.len();
        Self {
            tiles: Mutex::new(descriptors.into()),
            total,
        }
    }

    /// Removes up to `max` descriptors from the front of the queue.
    pub fn claim(&self, max: usize) -> Vec<Arc<TileDescriptor>> {
        let mut tiles = self.tiles.lock();
        let count = max.min(tiles.len());
        tiles.drain(..count).collect()
    }

    /// Number of descriptors not yet claimed.
    pub fn remaining(&self) -> usize {
        self.tiles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.lock().is_empty()
    }

    /// Number of descriptors the queue was filled with.
    pub fn total(&self) -> usize {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileId;
    use geo::Coord;
    use std::collections::HashSet;
    use std::thread;

    fn descriptors(count: usize) -> Vec<Arc<TileDescriptor>> {
        (0..count)
            .map(|i| {
                Arc::new(TileDescriptor::new(
                    TileId(i),
                    Coord {
                        x: i as f64,
                        y: 0.0,
                    },
                ))
            })
            .collect()
    }

    #[test]
    fn test_claim_in_fifo_order() {
        let queue = IntakeQueue::new(descriptors(5));
        let first = queue.claim(2);
        assert_eq!(first[0].id(), TileId(0));
        assert_eq!(first[1].id(), TileId(1));
        assert_eq!(queue.remaining(), 3);
        assert_eq!(queue.total(), 5);
    }

    #[test]
    fn test_claim_past_end() {
        let queue = IntakeQueue::new(descriptors(3));
        assert_eq!(queue.claim(8).len(), 3);
        assert!(queue.is_empty());
        assert!(queue.claim(8).is_empty());
    }

    #[test]
    fn test_concurrent_claims_never_duplicate() {
        let queue = Arc::new(IntakeQueue::new(descriptors(1000)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut ids = Vec::new();
                    loop {
                        let claimed = queue.claim(7);
                        if claimed.is_empty() {
                            break;
                        }
                        ids.extend(claimed.iter().map(|d| d.id()));
                    }
                    ids
                })
            })
            .collect();

        let mut seen = HashSet::new();
        let mut count = 0;
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "tile {} claimed twice", id);
                count += 1;
            }
        }
        assert_eq!(count, 1000);
    }
}
