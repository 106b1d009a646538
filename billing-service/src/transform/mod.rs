pub mod anomaly;
pub mod monthly;
pub mod normalize;

pub use anomaly::{detect_anomalies, Alert, AlertKind, RuleThresholds};
pub use monthly::{select_month, MonthlyRow, YearMonth};
pub use normalize::{normalize, NormalizeOptions, NormalizedDataset, NumericField};
