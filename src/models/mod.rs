// Re-export all model types
pub use self::eatery::*;
pub use self::errors::*;
pub use self::order::*;

mod eatery;
mod errors;
mod order;
