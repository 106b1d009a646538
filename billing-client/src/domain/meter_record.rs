use time::Date;

/// One calendar day of aggregated metering and billing data.
///
/// Every numeric field is always populated; absent or unparsable source
/// values have already been coerced to `0.0` by the time a record exists.
#[derive(Debug, Clone, PartialEq)]
pub struct MeterRecord {
    pub date: Date,
    pub sub_metering_1: f64,
    pub sub_metering_2: f64,
    pub sub_metering_3: f64,
    pub daily_sum: f64,
    pub peak_charge: f64,
    pub offpeak_charge: f64,
    pub total_charge: f64,
    pub avg_submetering_value: f64,
}

impl MeterRecord {
    /// A record for `date` with every numeric field at zero.
    pub fn zeroed(date: Date) -> Self {
        Self {
            date,
            sub_metering_1: 0.0,
            sub_metering_2: 0.0,
            sub_metering_3: 0.0,
            daily_sum: 0.0,
            peak_charge: 0.0,
            offpeak_charge: 0.0,
            total_charge: 0.0,
            avg_submetering_value: 0.0,
        }
    }
}
