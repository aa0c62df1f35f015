//! User-Agent rotation
//!
//! The pool is fixed at construction. Every request draws one entry uniformly
//! at random; draws are independent, so repeats are expected.

use crate::crawler::FetchError;
use rand::seq::IndexedRandom;

/// Read-only pool of User-Agent strings
#[derive(Debug, Clone)]
pub struct HeaderPool {
    user_agents: Vec<String>,
}

impl HeaderPool {
    /// Creates a pool, rejecting an empty list
    pub fn new(user_agents: Vec<String>) -> Result<Self, FetchError> {
        if user_agents.is_empty() {
            return Err(FetchError::EmptyHeaderPool);
        }
        Ok(Self { user_agents })
    }

    /// Picks one User-Agent uniformly at random
    pub fn pick(&self) -> &str {
        let mut rng = rand::rng();
        // The pool is never empty, see `new`
        self.user_agents
            .choose(&mut rng)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.user_agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.user_agents.is_empty()
    }
}

impl Default for HeaderPool {
    fn default() -> Self {
        Self {
            user_agents: crate::config::DEFAULT_USER_AGENTS
                .iter()
                .map(|ua| ua.to_string())
                .collect(),
        }
    }
}
