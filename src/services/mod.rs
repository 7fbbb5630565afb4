pub mod aggregator;
pub mod analysis;
pub mod cancel;
pub mod jobs;
pub mod merge;
pub mod pool;
pub mod progress;
pub mod setup;
pub mod store;
