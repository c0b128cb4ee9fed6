//! The set of lockers this master is allowed to command.
//!
//! Built once at startup from the configured slave address list and
//! never mutated while the loop runs. A token naming an address outside
//! the registry is dropped with a diagnostic; the master only ever
//! transmits to lockers it was told about.

use crate::proxy::SlaveProxy;
use hasp_core::types::LockerAddress;
use std::collections::HashMap;

/// Address-keyed set of slave proxies.
#[derive(Debug, Default)]
pub struct Registry {
    proxies: HashMap<LockerAddress, SlaveProxy>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of slave addresses.
    ///
    /// Duplicate addresses collapse to one proxy.
    pub fn from_addresses(addresses: impl IntoIterator<Item = LockerAddress>) -> Self {
        let mut registry = Self::new();
        for address in addresses {
            registry.register(address);
        }
        registry
    }

    /// Add a slave to the registry.
    pub fn register(&mut self, address: LockerAddress) {
        self.proxies
            .insert(address.clone(), SlaveProxy::new(address));
    }

    /// The proxy for an address, if the address is registered.
    #[must_use]
    pub fn lookup(&self, address: &LockerAddress) -> Option<&SlaveProxy> {
        self.proxies.get(address)
    }

    /// Whether an address is registered.
    #[must_use]
    pub fn contains(&self, address: &LockerAddress) -> bool {
        self.proxies.contains_key(address)
    }

    /// All registered addresses, in no particular order.
    pub fn addresses(&self) -> impl Iterator<Item = &LockerAddress> {
        self.proxies.keys()
    }

    /// Number of registered lockers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(s: &str) -> LockerAddress {
        LockerAddress::new(s).unwrap()
    }

    #[test]
    fn test_lookup_registered_address() {
        let registry = Registry::from_addresses([address("A1"), address("B2")]);

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.lookup(&address("A1")).map(SlaveProxy::address),
            Some(&address("A1"))
        );
    }

    #[test]
    fn test_lookup_unknown_address_is_none() {
        let registry = Registry::from_addresses([address("A1")]);

        assert!(registry.lookup(&address("Z9")).is_none());
        assert!(!registry.contains(&address("Z9")));
    }

    #[test]
    fn test_duplicate_addresses_collapse() {
        let registry = Registry::from_addresses([address("A1"), address("A1")]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_registry() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.addresses().count(), 0);
    }
}
