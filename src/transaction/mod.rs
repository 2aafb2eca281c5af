pub mod concurrency;

pub use concurrency::{LockError, LockManager, LockMode};
