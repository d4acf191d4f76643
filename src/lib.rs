//! Data-access core for the Chowdown restaurant service: geospatial
//! eatery search with cursor pagination, menus, and mutable orders.

pub mod config;
pub mod dao;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod services;

pub use config::{Config, ConfigError};
pub use dao::ChowDao;
pub use models::{
    AppError, DaoResult, Eatery, EateryPage, ErrorCode, Errors, LinkRel, LocatedEatery, Location,
    MenuItem, Order, PageLink,
};
pub use observability::init_observability;
