use std::fmt;

use billing_client::MeterRecord;
use time::Date;

use super::normalize::{format_day_first, NumericField};

pub const DEFAULT_HIGH_CONSUMPTION_FACTOR: f64 = 1.5;
pub const DEFAULT_SUB_METER_SPIKE_THRESHOLD: f64 = 10_000.0;

/// Tunable constants for the fixed rule set. Both comparisons are strict.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleThresholds {
    /// A day is high when `daily_sum > factor * average daily_sum`.
    pub high_consumption_factor: f64,
    /// A sub-meter spikes when its value is above this.
    pub sub_meter_spike_threshold: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            high_consumption_factor: DEFAULT_HIGH_CONSUMPTION_FACTOR,
            sub_meter_spike_threshold: DEFAULT_SUB_METER_SPIKE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlertKind {
    HighConsumption { daily_sum: f64, average: f64 },
    ZeroConsumption,
    SubMeterSpike { column: &'static str, value: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub date: Date,
    pub kind: AlertKind,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = format_day_first(self.date);
        match &self.kind {
            AlertKind::HighConsumption { daily_sum, average } => write!(
                f,
                "High consumption alert on {date}: {daily_sum:.2} (Avg: {average:.2})"
            ),
            AlertKind::ZeroConsumption => write!(f, "Zero consumption detected on {date}"),
            AlertKind::SubMeterSpike { column, value } => {
                write!(f, "Sub-metering spike on {date} in '{column}': {value}")
            }
        }
    }
}

/// Mean `daily_sum` over all records, 0 for an empty dataset.
pub fn average_daily(records: &[MeterRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().map(|r| r.daily_sum).sum::<f64>() / records.len() as f64
}

/// Evaluate every rule against every record.
///
/// Alerts come out in record order; within a record the order is high
/// consumption, zero consumption, then sub-meters 1 to 3. Rules never
/// suppress each other.
pub fn detect_anomalies(records: &[MeterRecord], thresholds: &RuleThresholds) -> Vec<Alert> {
    let average = average_daily(records);
    let high_limit = thresholds.high_consumption_factor * average;
    let mut alerts = Vec::new();

    for record in records {
        if average > 0.0 && record.daily_sum > high_limit {
            alerts.push(Alert {
                date: record.date,
                kind: AlertKind::HighConsumption {
                    daily_sum: record.daily_sum,
                    average,
                },
            });
        }

        if record.daily_sum == 0.0 {
            alerts.push(Alert {
                date: record.date,
                kind: AlertKind::ZeroConsumption,
            });
        }

        for field in NumericField::SUB_METERS {
            let value = field.get(record);
            if value > thresholds.sub_meter_spike_threshold {
                alerts.push(Alert {
                    date: record.date,
                    kind: AlertKind::SubMeterSpike {
                        column: field.column(),
                        value,
                    },
                });
            }
        }
    }

    alerts
}
