use std::{fmt, str::FromStr};

use billing_client::MeterRecord;
use serde::Serialize;
use time::{Date, Month};

use super::normalize::format_day_first;
use crate::pipeline::PipelineError;

/// A calendar month selector written as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
    pub year: i32,
    pub month: Month,
}

impl YearMonth {
    pub fn contains(&self, date: Date) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl FromStr for YearMonth {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PipelineError::Validation(format!("Invalid month '{s}', expected YYYY-MM, e.g. 2025-10"));

        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let all_digits = |p: &str, len: usize| p.len() == len && p.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(year, 4) || !all_digits(month, 2) {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;
        let month = Month::try_from(month).map_err(|_| invalid())?;
        Ok(YearMonth { year, month })
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, u8::from(self.month))
    }
}

/// One output row of the monthly query, keyed by the source column names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "total_Sub_metering_1")]
    pub sub_metering_1: f64,
    #[serde(rename = "total_Sub_metering_2")]
    pub sub_metering_2: f64,
    #[serde(rename = "total_Sub_metering_3")]
    pub sub_metering_3: f64,
    #[serde(rename = "total_daily_sum")]
    pub daily_sum: f64,
    pub peak_charge: f64,
    pub offpeak_charge: f64,
    pub total_charge: f64,
    pub avg_submetering_value: f64,
}

impl From<&MeterRecord> for MonthlyRow {
    fn from(r: &MeterRecord) -> Self {
        MonthlyRow {
            date: format_day_first(r.date),
            sub_metering_1: r.sub_metering_1,
            sub_metering_2: r.sub_metering_2,
            sub_metering_3: r.sub_metering_3,
            daily_sum: r.daily_sum,
            peak_charge: r.peak_charge,
            offpeak_charge: r.offpeak_charge,
            total_charge: r.total_charge,
            avg_submetering_value: r.avg_submetering_value,
        }
    }
}

/// Records dated inside `month`, in dataset order.
///
/// An empty selection is `NotFound`, never an empty success.
pub fn select_month(records: &[MeterRecord], month: YearMonth) -> Result<Vec<MonthlyRow>, PipelineError> {
    let rows: Vec<MonthlyRow> = records
        .iter()
        .filter(|r| month.contains(r.date))
        .map(MonthlyRow::from)
        .collect();

    if rows.is_empty() {
        return Err(PipelineError::NotFound(format!("No billing data found for month {month}")));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_year_month() {
        let ym: YearMonth = "2025-10".parse().unwrap();
        assert_eq!(ym, YearMonth { year: 2025, month: Month::October });
        assert_eq!(ym.to_string(), "2025-10");
    }

    #[test]
    fn rejects_malformed_months() {
        for raw in ["", "2025", "2025-13", "2025-00", "2025-1", "25-10", "2025/10", "2025-10-01", "abcd-ef"] {
            let res = raw.parse::<YearMonth>();
            assert!(matches!(res, Err(PipelineError::Validation(_))), "{raw}");
        }
    }

    #[test]
    fn selects_only_the_requested_month() {
        let records = vec![
            MeterRecord { daily_sum: 1.0, ..MeterRecord::zeroed(date!(2025 - 09 - 30)) },
            MeterRecord { daily_sum: 2.0, ..MeterRecord::zeroed(date!(2025 - 10 - 01)) },
            MeterRecord { daily_sum: 3.0, ..MeterRecord::zeroed(date!(2024 - 10 - 15)) },
            MeterRecord { daily_sum: 4.0, ..MeterRecord::zeroed(date!(2025 - 10 - 31)) },
        ];

        let rows = select_month(&records, "2025-10".parse().unwrap()).unwrap();
        let sums: Vec<f64> = rows.iter().map(|r| r.daily_sum).collect();
        assert_eq!(sums, vec![2.0, 4.0]);
        assert_eq!(rows[0].date, "01-10-2025");
    }

    #[test]
    fn month_without_data_is_not_found() {
        let records = vec![MeterRecord::zeroed(date!(2025 - 09 - 12))];
        let res = select_month(&records, "2025-10".parse().unwrap());
        assert!(matches!(res, Err(PipelineError::NotFound(ref m)) if m.contains("2025-10")));
    }

    #[test]
    fn rows_serialize_date_first_in_fixed_order() {
        let row = MonthlyRow::from(&MeterRecord {
            sub_metering_1: 1.0,
            daily_sum: 2.5,
            ..MeterRecord::zeroed(date!(2025 - 10 - 02))
        });
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            "{\"Date\":\"02-10-2025\",\"total_Sub_metering_1\":1.0,\"total_Sub_metering_2\":0.0,\
             \"total_Sub_metering_3\":0.0,\"total_daily_sum\":2.5,\"peak_charge\":0.0,\
             \"offpeak_charge\":0.0,\"total_charge\":0.0,\"avg_submetering_value\":0.0}"
        );
    }
}
