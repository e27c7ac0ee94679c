pub mod error;
pub mod types;

pub mod study;

pub mod risk;

pub mod metrics;

pub mod projection;

pub mod sensitivity;

pub mod comparison;

pub use error::LadrilloError;
pub use types::*;

/// Standard result type for all ladrillo operations
pub type LadrilloResult<T> = Result<T, LadrilloError>;
