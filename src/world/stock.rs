//! Resource stock - goods storage for settlements and ship holds

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::Resource;

/// A stock of goods; used for settlement storage and ship cargo alike
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    amounts: BTreeMap<Resource, u32>,
}

impl Stock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(contents: &[(Resource, u32)]) -> Self {
        let mut stock = Self::new();
        for &(resource, amount) in contents {
            stock.add(resource, amount);
        }
        stock
    }

    /// Get current amount of a resource
    pub fn get(&self, resource: Resource) -> u32 {
        self.amounts.get(&resource).copied().unwrap_or(0)
    }

    pub fn add(&mut self, resource: Resource, amount: u32) {
        *self.amounts.entry(resource).or_insert(0) += amount;
    }

    /// Try to remove resources, returns amount actually removed
    pub fn remove(&mut self, resource: Resource, amount: u32) -> u32 {
        match self.amounts.get_mut(&resource) {
            Some(current) => {
                let removed = amount.min(*current);
                *current -= removed;
                removed
            }
            None => 0,
        }
    }

    /// Check if the stock covers all required materials
    pub fn has_materials(&self, requirements: &[(Resource, u32)]) -> bool {
        requirements
            .iter()
            .all(|&(resource, amount)| self.get(resource) >= amount)
    }

    /// Consume materials for construction, returns true if successful
    pub fn consume_materials(&mut self, requirements: &[(Resource, u32)]) -> bool {
        if !self.has_materials(requirements) {
            return false;
        }
        for &(resource, amount) in requirements {
            self.remove(resource, amount);
        }
        true
    }

    /// Move up to `amount` of a resource into another stock, returning the
    /// amount actually moved
    pub fn transfer_to(&mut self, other: &mut Stock, resource: Resource, amount: u32) -> u32 {
        let moved = self.remove(resource, amount);
        other.add(resource, moved);
        moved
    }

    /// Drain everything into another stock
    pub fn drain_into(&mut self, other: &mut Stock) {
        let amounts = std::mem::take(&mut self.amounts);
        for (resource, amount) in amounts {
            other.add(resource, amount);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Resource, u32)> + '_ {
        self.amounts.iter().map(|(&r, &a)| (r, a))
    }
}
