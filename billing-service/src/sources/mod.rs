pub mod snapshot;

pub use snapshot::{latest_snapshot, select_latest};
