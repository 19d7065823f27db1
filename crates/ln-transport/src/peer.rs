//! Bookkeeping for known peers.
//!
//! A peer is identified by its blockchain address (public key string) and
//! reachable at a web address (`host:port`). Registration is idempotent on
//! the web address, mirroring the original node's `register_new_node`.

use std::collections::HashMap;

/// Known peers, keyed by blockchain address.
#[derive(Debug, Default, Clone)]
pub struct PeerRegistry {
    peers: HashMap<String, String>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `web_address` under `blockchain_address`. A no-op if that
    /// web address is already registered under any address.
    pub fn register(&mut self, blockchain_address: String, web_address: String) -> bool {
        if self.peers.values().any(|addr| addr == &web_address) {
            return false;
        }
        self.peers.insert(blockchain_address, web_address);
        true
    }

    pub fn web_address_of(&self, blockchain_address: &str) -> Option<&str> {
        self.peers.get(blockchain_address).map(String::as_str)
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.peers.keys().map(String::as_str)
    }

    pub fn web_addresses(&self) -> impl Iterator<Item = &str> {
        self.peers.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// A snapshot of the full `blockchain_address -> web_address` table.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.peers.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_is_idempotent_on_web_address() {
        let mut registry = PeerRegistry::new();
        assert!(registry.register("addr-a".into(), "127.0.0.1:9000".into()));
        assert!(!registry.register("addr-b".into(), "127.0.0.1:9000".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn looks_up_web_address_by_blockchain_address() {
        let mut registry = PeerRegistry::new();
        registry.register("addr-a".into(), "127.0.0.1:9000".into());
        assert_eq!(registry.web_address_of("addr-a"), Some("127.0.0.1:9000"));
        assert_eq!(registry.web_address_of("addr-z"), None);
    }
}
