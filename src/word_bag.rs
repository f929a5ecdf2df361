use rand::seq::SliceRandom;
use rand::RngCore;

/// Shuffled draw queue: every item comes out once before any repeats, and
/// the bag refills itself when it runs dry.
#[derive(Debug, Clone)]
pub struct WordBag<T> {
    pool: Vec<T>,
    queue: Vec<T>,
}

impl<T: Clone> WordBag<T> {
    pub fn new(pool: Vec<T>) -> Self {
        Self {
            pool,
            queue: Vec::new(),
        }
    }

    /// Next item, or `None` only when the pool itself is empty.
    pub fn draw(&mut self, rng: &mut dyn RngCore) -> Option<T> {
        if self.queue.is_empty() {
            self.refill(rng);
        }
        self.queue.pop()
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    fn refill(&mut self, rng: &mut dyn RngCore) {
        self.queue = self.pool.clone();
        self.queue.shuffle(rng);
    }
}
