pub mod meter_record;
pub mod snapshot;

pub use meter_record::MeterRecord;
pub use snapshot::SnapshotRef;
