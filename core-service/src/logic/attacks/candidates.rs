//! Candidate Pool - seeded, prefix-stable candidate generation
//!
//! One generator per data type. Asking for `n` candidates always returns the
//! first `n` strings of the same seeded sequence, so a larger request extends
//! a smaller one instead of reshuffling it.

use std::collections::HashMap;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::template::DataTemplate;

struct PoolEntry {
    rng: StdRng,
    candidates: Vec<String>,
}

/// Cached candidate sequences keyed by template name
pub struct CandidatePool {
    seed: u64,
    entries: Mutex<HashMap<String, PoolEntry>>,
}

impl CandidatePool {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// First `count` candidates of `template`'s sequence
    pub fn take(&self, template: &DataTemplate, count: usize) -> Vec<String> {
        let mut entries = self.entries.lock();
        let seed = self.seed;
        let entry = entries.entry(template.name.clone()).or_insert_with(|| PoolEntry {
            rng: StdRng::seed_from_u64(seed),
            candidates: Vec::new(),
        });

        if entry.candidates.len() < count {
            log::info!(
                "Generating {} {} candidates...",
                count - entry.candidates.len(),
                template.name
            );
            entry.candidates.reserve(count - entry.candidates.len());
            while entry.candidates.len() < count {
                let candidate = template.generate(&mut entry.rng);
                entry.candidates.push(candidate);
            }
        }

        entry.candidates[..count].to_vec()
    }

    /// Number of generated candidates held for `name`
    pub fn cached(&self, name: &str) -> usize {
        self.entries.lock().get(name).map_or(0, |e| e.candidates.len())
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_stable() {
        let pool = CandidatePool::new(42);
        let ssn = DataTemplate::ssn();

        let small = pool.take(&ssn, 10);
        let large = pool.take(&ssn, 100);
        assert_eq!(&large[..10], &small[..]);
        assert_eq!(pool.cached("ssn"), 100);

        // Smaller request after a larger one is still a prefix
        assert_eq!(pool.take(&ssn, 10), small);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let ssn = DataTemplate::ssn();
        let a = CandidatePool::new(42).take(&ssn, 50);
        let b = CandidatePool::new(42).take(&ssn, 50);
        let c = CandidatePool::new(43).take(&ssn, 50);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_larger_first_matches_incremental_growth() {
        let ssn = DataTemplate::ssn();
        let direct = CandidatePool::new(9).take(&ssn, 60);

        let grown = CandidatePool::new(9);
        grown.take(&ssn, 20);
        grown.take(&ssn, 40);
        assert_eq!(grown.take(&ssn, 60), direct);
    }

    #[test]
    fn test_types_are_independent() {
        let pool = CandidatePool::new(42);
        pool.take(&DataTemplate::ssn(), 5);
        let cards = pool.take(&DataTemplate::credit_card(), 5);
        assert!(cards.iter().all(|c| c.starts_with("Credit Card: ")));
        assert_eq!(pool.cached("ssn"), 5);

        pool.clear();
        assert_eq!(pool.cached("ssn"), 0);
    }
}
