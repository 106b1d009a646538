use billing_client::MeterRecord;
use time::{macros::format_description, Date, Month};

use crate::pipeline::PipelineError;

pub const DEFAULT_DATE_COLUMN: &str = "Date";

/// The fixed set of numeric columns carried by every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    SubMetering1,
    SubMetering2,
    SubMetering3,
    DailySum,
    PeakCharge,
    OffpeakCharge,
    TotalCharge,
    AvgSubmeteringValue,
}

impl NumericField {
    pub const ALL: [NumericField; 8] = [
        NumericField::SubMetering1,
        NumericField::SubMetering2,
        NumericField::SubMetering3,
        NumericField::DailySum,
        NumericField::PeakCharge,
        NumericField::OffpeakCharge,
        NumericField::TotalCharge,
        NumericField::AvgSubmeteringValue,
    ];

    pub const SUB_METERS: [NumericField; 3] = [
        NumericField::SubMetering1,
        NumericField::SubMetering2,
        NumericField::SubMetering3,
    ];

    /// Source column name.
    pub fn column(self) -> &'static str {
        match self {
            NumericField::SubMetering1 => "total_Sub_metering_1",
            NumericField::SubMetering2 => "total_Sub_metering_2",
            NumericField::SubMetering3 => "total_Sub_metering_3",
            NumericField::DailySum => "total_daily_sum",
            NumericField::PeakCharge => "peak_charge",
            NumericField::OffpeakCharge => "offpeak_charge",
            NumericField::TotalCharge => "total_charge",
            NumericField::AvgSubmeteringValue => "avg_submetering_value",
        }
    }

    pub fn get(self, record: &MeterRecord) -> f64 {
        match self {
            NumericField::SubMetering1 => record.sub_metering_1,
            NumericField::SubMetering2 => record.sub_metering_2,
            NumericField::SubMetering3 => record.sub_metering_3,
            NumericField::DailySum => record.daily_sum,
            NumericField::PeakCharge => record.peak_charge,
            NumericField::OffpeakCharge => record.offpeak_charge,
            NumericField::TotalCharge => record.total_charge,
            NumericField::AvgSubmeteringValue => record.avg_submetering_value,
        }
    }

    fn set(self, record: &mut MeterRecord, value: f64) {
        let slot = match self {
            NumericField::SubMetering1 => &mut record.sub_metering_1,
            NumericField::SubMetering2 => &mut record.sub_metering_2,
            NumericField::SubMetering3 => &mut record.sub_metering_3,
            NumericField::DailySum => &mut record.daily_sum,
            NumericField::PeakCharge => &mut record.peak_charge,
            NumericField::OffpeakCharge => &mut record.offpeak_charge,
            NumericField::TotalCharge => &mut record.total_charge,
            NumericField::AvgSubmeteringValue => &mut record.avg_submetering_value,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub date_column: String,
    /// Fail with a schema error when no row survives date parsing.
    pub require_dated_rows: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            date_column: DEFAULT_DATE_COLUMN.to_string(),
            require_dated_rows: false,
        }
    }
}

/// Typed records plus counters describing what was repaired on the way.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedDataset {
    pub records: Vec<MeterRecord>,
    /// Rows discarded because their date could not be parsed.
    pub dropped_rows: usize,
    /// Numeric cells that were present in the schema but replaced with 0.
    pub coerced_cells: usize,
}

/// Parse raw CSV bytes into meter records.
///
/// The first row is the header. Rows whose date does not parse are dropped.
/// Numeric columns missing from the header read as 0 for every row; cells
/// that are empty, missing or not finite numbers read as 0 without touching
/// the rest of the row.
pub fn normalize(raw: &[u8], options: &NormalizeOptions) -> Result<NormalizedDataset, PipelineError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(raw);
    let headers: Vec<String> = rdr
        .byte_headers()
        .map_err(|e| PipelineError::Internal(format!("failed to read CSV headers: {e}")))?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim().to_string())
        .collect();

    let position = |name: &str| headers.iter().position(|h| h == name);

    let date_idx = position(options.date_column.as_str()).ok_or_else(|| {
        PipelineError::Schema(format!(
            "CSV file is missing the required '{}' column",
            options.date_column
        ))
    })?;

    let numeric_columns: Vec<(NumericField, usize)> = NumericField::ALL
        .iter()
        .filter_map(|field| position(field.column()).map(|idx| (*field, idx)))
        .collect();

    let mut dataset = NormalizedDataset::default();

    // Cells are decoded one by one so a non UTF-8 cell only affects itself.
    for result in rdr.byte_records() {
        let row = result.map_err(|e| PipelineError::Internal(format!("failed to read CSV record: {e}")))?;
        let cell = |idx: usize| row.get(idx).and_then(|b| std::str::from_utf8(b).ok());

        let Some(date) = cell(date_idx).and_then(parse_day_first) else {
            dataset.dropped_rows += 1;
            continue;
        };

        let mut record = MeterRecord::zeroed(date);
        for (field, idx) in &numeric_columns {
            match cell(*idx).and_then(coerce_numeric) {
                Some(value) => field.set(&mut record, value),
                None => dataset.coerced_cells += 1,
            }
        }
        dataset.records.push(record);
    }

    if dataset.dropped_rows > 0 {
        metrics::counter!("dataset_rows_dropped_total").increment(dataset.dropped_rows as u64);
    }
    if dataset.coerced_cells > 0 {
        metrics::counter!("dataset_cells_coerced_total").increment(dataset.coerced_cells as u64);
    }

    if options.require_dated_rows && dataset.records.is_empty() {
        return Err(PipelineError::Schema("No valid dates found in CSV".to_string()));
    }

    Ok(dataset)
}

/// Finite number in `cell`, if any.
pub fn coerce_numeric(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a calendar date, reading ambiguous numeric dates day first.
///
/// Accepts numeric `DD-MM-YYYY`, `DD/MM/YYYY`, `DD.MM.YYYY` (two-digit years
/// land in 20xx), year-first `YYYY-MM-DD`, compact `YYYYMMDD`, and dates with
/// a month name such as `01-Oct-2025`, `1 October 2025` or `Oct 1, 2025`. A
/// trailing time of day is ignored. When the day-first reading of a numeric
/// date is not valid the month-first reading is tried.
pub fn parse_day_first(raw: &str) -> Option<Date> {
    let date_part = strip_time_of_day(raw.trim());
    if date_part.is_empty() {
        return None;
    }

    if date_part.bytes().any(|b| b.is_ascii_alphabetic()) {
        return parse_named_month(date_part);
    }
    if date_part.len() == 8 && date_part.bytes().all(|b| b.is_ascii_digit()) {
        return Date::parse(date_part, format_description!("[year][month][day]")).ok();
    }

    let sep = date_part.chars().find(|c| matches!(c, '-' | '/' | '.'))?;
    let parts: Vec<&str> = date_part.split(sep).collect();
    let [first, second, third] = parts.as_slice() else {
        return None;
    };

    if first.len() == 4 {
        return calendar_date(first, second, third);
    }
    let year = match third.len() {
        4 => third.to_string(),
        2 => format!("20{third}"),
        _ => return None,
    };
    calendar_date(&year, second, first).or_else(|| calendar_date(&year, first, second))
}

/// Cut `HH:MM[:SS...]` and whatever follows it, plus the `T` or space before it.
fn strip_time_of_day(s: &str) -> &str {
    let Some(colon) = s.find(':') else {
        return s;
    };
    let before = &s[..colon];
    match before.rfind(|c: char| c.is_whitespace() || c == 'T') {
        Some(idx) => before[..idx].trim_end(),
        None => "",
    }
}

fn parse_named_month(s: &str) -> Option<Date> {
    let formats = [
        format_description!("[day padding:none]-[month repr:short case_sensitive:false]-[year]"),
        format_description!("[day padding:none]/[month repr:short case_sensitive:false]/[year]"),
        format_description!("[day padding:none] [month repr:short case_sensitive:false] [year]"),
        format_description!("[day padding:none]-[month repr:long case_sensitive:false]-[year]"),
        format_description!("[day padding:none] [month repr:long case_sensitive:false] [year]"),
        format_description!("[month repr:short case_sensitive:false] [day padding:none], [year]"),
        format_description!("[month repr:short case_sensitive:false] [day padding:none] [year]"),
        format_description!("[month repr:long case_sensitive:false] [day padding:none], [year]"),
        format_description!("[month repr:long case_sensitive:false] [day padding:none] [year]"),
    ];
    formats.iter().find_map(|format| Date::parse(s, *format).ok())
}

/// `DD-MM-YYYY`, the format used in alert text and query output.
pub fn format_day_first(date: Date) -> String {
    format!("{:02}-{:02}-{:04}", date.day(), u8::from(date.month()), date.year())
}
