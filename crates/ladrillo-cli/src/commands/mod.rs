pub mod compare;
pub mod metrics;
pub mod projection;
pub mod sensitivity;
