pub mod eatery_service;
pub mod id_gen;
pub mod order_service;

pub use eatery_service::EateryService;
pub use id_gen::{OrderIdGenerator, DEFAULT_SUFFIX_LEN, ID_BASE};
pub use order_service::{OrderService, INVALID_EATERY_REF};
