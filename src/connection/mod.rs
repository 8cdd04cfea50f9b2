// Connection - reachability of the progress store

pub mod status;

pub use status::{AtomicStoreStatus, StoreStatus};
