use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Geographic position in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A single purchasable menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub price: Decimal,
    pub details: String,
}

/// A restaurant record with cuisine, location and menu.
///
/// `menu_categories` maps a category name to the ordered item ids shown
/// under it; `menu_items` maps each item id to its details.  Both use
/// `BTreeMap` so enumeration order is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Eatery {
    pub id: String,
    pub name: String,
    pub cuisine: String,
    pub loc: Location,
    #[serde(default)]
    pub menu_categories: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub menu_items: BTreeMap<String, MenuItem>,
}

impl Eatery {
    /// Item ids listed under `category`, in menu order.
    pub fn category_items(&self, category: &str) -> &[String] {
        self.menu_categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Look up a menu item by its id.
    pub fn menu_item(&self, item_id: &str) -> Option<&MenuItem> {
        self.menu_items.get(item_id)
    }
}

/// Search result entry: a directory eatery annotated with its distance
/// in miles from the query origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatedEatery {
    pub id: String,
    pub name: String,
    pub cuisine: String,
    pub loc: Location,
    pub dist: f64,
}

/// Relation marker on a pagination link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkRel {
    #[serde(rename = "self")]
    SelfRel,
    Prev,
    Next,
}

/// One pagination link: the page window it points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    pub rel: LinkRel,
    pub offset: usize,
    pub count: usize,
}

/// One page of `locate` results plus its link metadata.
///
/// `self` is always present; `prev`/`next` only when the corresponding
/// page exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EateryPage {
    pub eateries: Vec<LocatedEatery>,
    pub links: Vec<PageLink>,
}

impl EateryPage {
    /// Assemble a page from the window parameters and a next-page probe.
    pub fn new(eateries: Vec<LocatedEatery>, offset: usize, count: usize, has_next: bool) -> Self {
        let mut links = vec![PageLink {
            rel: LinkRel::SelfRel,
            offset,
            count,
        }];
        if offset > 0 {
            links.push(PageLink {
                rel: LinkRel::Prev,
                offset: offset.saturating_sub(count),
                count,
            });
        }
        if has_next {
            links.push(PageLink {
                rel: LinkRel::Next,
                offset: offset.saturating_add(count),
                count,
            });
        }
        Self { eateries, links }
    }

    pub fn link(&self, rel: LinkRel) -> Option<&PageLink> {
        self.links.iter().find(|link| link.rel == rel)
    }

    pub fn has_prev(&self) -> bool {
        self.link(LinkRel::Prev).is_some()
    }

    pub fn has_next(&self) -> bool {
        self.link(LinkRel::Next).is_some()
    }
}
