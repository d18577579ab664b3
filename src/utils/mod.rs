pub mod backoff;
pub mod education;
pub mod logger;
pub mod pacing;
