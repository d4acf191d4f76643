use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A mutable per-eatery cart of item quantities.
///
/// `items` maps an item id to a strictly positive quantity; an entry
/// driven to zero is removed rather than stored.  All mutation goes
/// through the order service, which enforces that invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub eatery_id: String,
    #[serde(default)]
    pub items: BTreeMap<String, u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a new empty order for an eatery.
    pub fn new(id: String, eatery_id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            eatery_id,
            items: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Quantity currently recorded for `item_id`, zero if absent.
    pub fn quantity(&self, item_id: &str) -> u32 {
        self.items.get(item_id).copied().unwrap_or(0)
    }

    /// Apply a relative quantity change.  Returns the new quantity, or
    /// `None` when the change would drive the quantity negative or past
    /// `u32::MAX`, in which case the order is left untouched.
    pub fn apply_delta(&mut self, item_id: &str, delta: i64) -> Option<u32> {
        let current = i64::from(self.quantity(item_id));
        let new_qty = u32::try_from(current.checked_add(delta)?).ok()?;
        if new_qty == 0 {
            self.items.remove(item_id);
        } else {
            self.items.insert(item_id.to_string(), new_qty);
        }
        self.updated_at = Utc::now();
        Some(new_qty)
    }

    /// Total number of units across all items.
    pub fn total_items(&self) -> u32 {
        self.items.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
