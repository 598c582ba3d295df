//! Read-through cache for parsed path expressions.
//!
//! Parsing is tree-independent, so a parsed [`PathExpression`] can be
//! shared across trees, start nodes, and threads. The cache is an explicit
//! injected object rather than a process-wide singleton: tests can
//! substitute a zero-capacity cache, and the evaluator routes nested
//! sub-path strings through whichever cache it was given.
//!
//! Capped at a fixed number of entries; when full, the cache is cleared
//! and repopulated on demand, which is effective for batch query
//! workloads. A concurrent duplicate parse of the same string is wasted
//! work, never an error: insert-if-absent keeps the first entry.

use crate::path::ast::PathExpression;
use crate::path::errors::ParseError;
use crate::path::parser::parse;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

const DEFAULT_CAPACITY: usize = 256;

/// Bounded, concurrency-safe path-expression cache.
#[derive(Debug)]
pub struct PathCache {
    entries: RwLock<HashMap<String, Arc<PathExpression>>>,
    capacity: usize,
}

impl Default for PathCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl PathCache {
    /// Creates a cache holding at most `capacity` parsed expressions.
    /// A capacity of zero degrades to parse-always.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Returns the parsed expression for `path`, parsing and caching on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] for an invalid path string; errors are not
    /// cached, so a corrected caller retry re-parses.
    pub fn get_or_parse(&self, path: &str) -> Result<Arc<PathExpression>, ParseError> {
        {
            let entries = self.entries.read().expect("path cache lock poisoned");
            if let Some(expr) = entries.get(path) {
                return Ok(Arc::clone(expr));
            }
        }

        // Parse outside the lock; a racing thread may parse the same
        // string, and insert-if-absent below keeps whichever landed first.
        let parsed = Arc::new(parse(path)?);

        if self.capacity == 0 {
            return Ok(parsed);
        }

        let mut entries = self.entries.write().expect("path cache lock poisoned");
        if entries.len() >= self.capacity && !entries.contains_key(path) {
            entries.clear();
        }
        let entry = entries
            .entry(path.to_string())
            .or_insert_with(|| Arc::clone(&parsed));
        Ok(Arc::clone(entry))
    }

    /// Number of cached expressions.
    pub fn len(&self) -> usize {
        self.entries.read().expect("path cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops all cached expressions (mainly for testing).
    pub fn clear(&self) {
        self.entries
            .write()
            .expect("path cache lock poisoned")
            .clear();
    }
}
