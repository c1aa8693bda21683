//! Synthetic credential pool
//!
//! The target environment seeds a fixed population of users
//! (`user1..userN`, shared password). Sessions draw credentials from a
//! process-wide pool with an atomic round-robin cursor: when concurrency
//! exceeds the pool size the cursor wraps and identities are shared, which
//! the target tolerates (concurrent logins under one username each get
//! their own token).

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One username/password pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

/// Process-wide credential pool with round-robin handout
pub struct CredentialPool {
    users: Vec<Credential>,
    cursor: AtomicUsize,
}

impl CredentialPool {
    /// Build a generated pool of `user1..user{size}` with a shared password
    pub fn generated(size: usize, password: &str) -> Result<Self> {
        if size == 0 {
            return Err(Error::Config("credential pool size must be positive".into()));
        }
        let users = (1..=size)
            .map(|n| Credential {
                username: format!("user{}", n),
                password: password.to_string(),
            })
            .collect();
        Ok(Self {
            users,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Build a pool from an explicit credential list
    pub fn from_list(users: Vec<Credential>) -> Result<Self> {
        if users.is_empty() {
            return Err(Error::Config("credential list must not be empty".into()));
        }
        Ok(Self {
            users,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Hand out the next credential, wrapping modulo the pool size
    pub fn next(&self) -> Credential {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.users.len();
        self.users[index].clone()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
