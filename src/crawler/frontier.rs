//! Crawl frontier and visited-set bookkeeping
//!
//! The frontier is a FIFO queue paired with a membership set for O(1)
//! duplicate checks. A URL lives in at most one of {queued, visited}:
//! dequeuing removes it from the queued set, and the engine marks it
//! visited before fetching.

use std::collections::{HashSet, VecDeque};

/// FIFO queue of URLs pending fetch, plus the visited set
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<String>,
    queued: HashSet<String>,
    visited: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a URL at the tail unless it is already queued or visited
    ///
    /// Returns true if the URL was actually enqueued.
    pub fn enqueue(&mut self, url: &str) -> bool {
        if self.visited.contains(url) || self.queued.contains(url) {
            return false;
        }
        self.queue.push_back(url.to_string());
        self.queued.insert(url.to_string());
        true
    }

    /// Removes and returns the head of the queue
    pub fn dequeue(&mut self) -> Option<String> {
        let url = self.queue.pop_front()?;
        self.queued.remove(&url);
        Some(url)
    }

    /// Records that a URL's fetch has been attempted
    pub fn mark_visited(&mut self, url: &str) {
        self.visited.insert(url.to_string());
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn is_queued(&self, url: &str) -> bool {
        self.queued.contains(url)
    }

    /// Number of URLs still waiting in the queue
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Number of URLs whose fetch has been attempted
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
