//! Skydd mot inaktuella svar
//!
//! Varje muterande anrop tar en token för sin entitetsnyckel. Ett svar får bara
//! tillämpas om dess token fortfarande är den senast utfärdade för nyckeln.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestToken<K> {
    key: K,
    seq: u64,
}

impl<K> RequestToken<K> {
    pub fn key(&self) -> &K {
        &self.key
    }
}

#[derive(Debug)]
pub struct RequestGuard<K> {
    counter: u64,
    latest: HashMap<K, u64>,
}

impl<K: Eq + Hash + Clone> Default for RequestGuard<K> {
    fn default() -> Self {
        Self {
            counter: 0,
            latest: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> RequestGuard<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Utfärda en ny token; tidigare tokens för nyckeln blir inaktuella
    pub fn begin(&mut self, key: K) -> RequestToken<K> {
        self.counter += 1;
        self.latest.insert(key.clone(), self.counter);
        RequestToken {
            key,
            seq: self.counter,
        }
    }

    pub fn is_current(&self, token: &RequestToken<K>) -> bool {
        self.latest.get(&token.key) == Some(&token.seq)
    }

    /// Avsluta en begäran. Returnerar true om svaret ska tillämpas.
    pub fn complete(&mut self, token: &RequestToken<K>) -> bool {
        if self.is_current(token) {
            self.latest.remove(&token.key);
            true
        } else {
            tracing::debug!("Ignorerar inaktuellt svar (seq {})", token.seq);
            false
        }
    }

    pub fn pending(&self) -> usize {
        self.latest.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_token_is_rejected() {
        let mut guard = RequestGuard::new();

        let first = guard.begin(7_i64);
        let second = guard.begin(7_i64);

        assert!(!guard.is_current(&first));
        assert!(guard.complete(&second));
        assert!(!guard.complete(&first));
        assert_eq!(guard.pending(), 0);
    }

    #[test]
    fn test_keys_are_independent() {
        let mut guard = RequestGuard::new();

        let a = guard.begin("a");
        let b = guard.begin("b");

        assert!(guard.complete(&a));
        assert!(guard.complete(&b));
    }

    #[test]
    fn test_token_cannot_be_applied_twice() {
        let mut guard = RequestGuard::new();
        let token = guard.begin(1);
        assert!(guard.complete(&token));
        assert!(!guard.complete(&token));
    }
}
