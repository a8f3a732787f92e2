// src/crawl/tally.rs
// =============================================================================
// Library frequency table and top-K selection.
//
// Every worker of a crawl increments the same LibraryTally at the same time,
// so an increment has to be one atomic step. "Read the count, then write
// count + 1" would lose updates when two workers see the same old value.
// DashMap's entry() locks only the shard that holds the key while it inserts
// or bumps the counter, so increments of unrelated libraries rarely wait on
// each other.
//
// The tally lives for one crawl. It is shared through an Arc and read once,
// after the dispatcher's completion barrier.
// =============================================================================

use dashmap::DashMap;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Concurrent multiset of library names.
#[derive(Debug, Default)]
pub struct LibraryTally {
    counts: DashMap<String, u64>,
}

impl LibraryTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one occurrence of `name`, inserting it with count 1 if new.
    pub fn increment(&self, name: &str) {
        // Fast path: the key exists, no allocation
        if let Some(mut count) = self.counts.get_mut(name) {
            *count += 1;
            return;
        }
        // entry() re-checks under the shard lock, so a racing insert of the
        // same key turns into an increment here
        *self.counts.entry(name.to_string()).or_insert(0) += 1;
    }

    #[cfg(test)]
    pub fn count(&self, name: &str) -> u64 {
        self.counts.get(name).map(|count| *count).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Point-in-time copy of the table
    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.counts
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }
}

/// A library name together with how many pages referenced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryCount {
    pub name: String,
    pub count: u64,
}

// The k most frequent entries, highest count first
//
// Ties are broken by name in ascending (byte-wise) order, so the result does
// not depend on the map's iteration order. Fewer than k names -> all of them.
pub fn ranked(table: &HashMap<String, u64>, k: usize) -> Vec<LibraryCount> {
    let mut entries: Vec<LibraryCount> = table
        .iter()
        .map(|(name, &count)| LibraryCount {
            name: name.clone(),
            count,
        })
        .collect();

    entries.sort_by(|a, b| match b.count.cmp(&a.count) {
        Ordering::Equal => a.name.cmp(&b.name),
        other => other,
    });
    entries.truncate(k);
    entries
}

/// Names only, same order as [`ranked`].
pub fn top_k(table: &HashMap<String, u64>, k: usize) -> Vec<String> {
    ranked(table, k).into_iter().map(|entry| entry.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn sample_table() -> HashMap<String, u64> {
        [
            ("odc.js", 7),
            ("s_code_remote.js", 1),
            ("subtlePager.js", 1),
            ("global.js", 2),
            ("apmeum.js", 1),
            ("odc_v1.js", 1),
            ("apmeum001.js", 1),
        ]
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect()
    }

    #[test]
    fn test_top_k_breaks_ties_by_name() {
        let top = top_k(&sample_table(), 5);
        assert_eq!(
            top,
            vec!["odc.js", "global.js", "apmeum.js", "apmeum001.js", "odc_v1.js"]
        );
    }

    #[test]
    fn test_top_k_fewer_names_than_k() {
        let mut table = HashMap::new();
        table.insert("a.js".to_string(), 1);
        table.insert("b.js".to_string(), 3);
        assert_eq!(top_k(&table, 5), vec!["b.js", "a.js"]);
        assert!(top_k(&HashMap::new(), 5).is_empty());
        assert!(top_k(&table, 0).is_empty());
    }

    #[test]
    fn test_ranked_keeps_counts() {
        let ranked = ranked(&sample_table(), 2);
        assert_eq!(
            ranked,
            vec![
                LibraryCount {
                    name: "odc.js".to_string(),
                    count: 7,
                },
                LibraryCount {
                    name: "global.js".to_string(),
                    count: 2,
                },
            ]
        );
    }

    #[test]
    fn test_increment_sequential() {
        let tally = LibraryTally::new();
        tally.increment("jquery.js");
        tally.increment("jquery.js");
        tally.increment("app.js");
        assert_eq!(tally.count("jquery.js"), 2);
        assert_eq!(tally.count("app.js"), 1);
        assert_eq!(tally.count("missing.js"), 0);
        assert_eq!(tally.len(), 2);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        const THREADS: usize = 16;
        const PER_THREAD: u64 = 1_000;

        let tally = Arc::new(LibraryTally::new());
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let tally = Arc::clone(&tally);
                std::thread::spawn(move || {
                    for _ in 0..PER_THREAD {
                        tally.increment("shared.js");
                    }
                    tally.increment(&format!("own-{}.js", i));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tally.count("shared.js"), THREADS as u64 * PER_THREAD);
        assert_eq!(tally.len(), THREADS + 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_first_insert_from_tasks() {
        // Every task races to insert the same brand-new key
        const TASKS: u64 = 200;

        let tally = Arc::new(LibraryTally::new());
        let mut handles = Vec::new();
        for _ in 0..TASKS {
            let tally = Arc::clone(&tally);
            handles.push(tokio::spawn(async move {
                tally.increment("first.js");
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(tally.count("first.js"), TASKS);
        assert_eq!(tally.snapshot().get("first.js"), Some(&TASKS));
    }
}
