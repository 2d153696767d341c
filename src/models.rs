use anyhow::{Result, anyhow};
use getset::Getters;
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Date embedded in an input file name, kept as the digit strings it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct FileDate {
    #[getset(get = "pub")]
    year: String,
    #[getset(get = "pub")]
    month: String,
    #[getset(get = "pub")]
    day: String,
}

impl FileDate {
    pub fn new(year: &str, month: &str, day: &str) -> Self {
        FileDate {
            year: year.to_string(),
            month: month.to_string(),
            day: day.to_string(),
        }
    }

    /// `YYYYMMDD` form used to tag the run output.
    pub fn business_date(&self) -> String {
        format!("{}{}{}", self.year, self.month, self.day)
    }
}

/// The two located input files, already checked to carry the same date.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct FileDatePair {
    #[getset(get = "pub")]
    primary_path: PathBuf,
    #[getset(get = "pub")]
    primary_name: String,
    #[getset(get = "pub")]
    secondary_path: PathBuf,
    #[getset(get = "pub")]
    secondary_name: String,
    #[getset(get = "pub")]
    date: FileDate,
}

impl FileDatePair {
    pub fn new(
        primary_path: PathBuf,
        primary_name: String,
        secondary_path: PathBuf,
        secondary_name: String,
        date: FileDate,
    ) -> Self {
        FileDatePair {
            primary_path,
            primary_name,
            secondary_path,
            secondary_name,
            date,
        }
    }
}

/// Composite key joining estimation rows to cash-flow rows.
///
/// Both sides are compared as the exact cell text, no trimming and no
/// numeric parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinKey {
    contract: String,
    date: String,
}

impl JoinKey {
    pub fn new(contract: &str, date: &str) -> Self {
        JoinKey {
            contract: contract.to_string(),
            date: date.to_string(),
        }
    }
}

/// Row of the discounted-flow estimation export. An absent amount takes no rule branch.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct EstimationRecord {
    #[getset(get = "pub")]
    contract_id: String,
    #[getset(get = "pub")]
    value_date: String,
    #[getset(get = "pub")]
    discounted_flow_change: Option<Decimal>,
    #[getset(get = "pub")]
    flow_amount: Option<Decimal>,
}

impl EstimationRecord {
    pub fn new(
        contract_id: &str,
        value_date: &str,
        discounted_flow_change: Option<Decimal>,
        flow_amount: Option<Decimal>,
    ) -> Self {
        EstimationRecord {
            contract_id: contract_id.to_string(),
            value_date: value_date.to_string(),
            discounted_flow_change,
            flow_amount,
        }
    }

    pub fn join_key(&self) -> JoinKey {
        JoinKey::new(&self.contract_id, &self.value_date)
    }
}

/// The four monetary columns of the swap cash-flow export that reconciliation may overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutableField {
    ReceivablePresentValue,
    PayablePresentValue,
    ReceivableInterest,
    PayableInterest,
}

impl MutableField {
    pub const ALL: [MutableField; 4] = [
        MutableField::ReceivablePresentValue,
        MutableField::PayablePresentValue,
        MutableField::ReceivableInterest,
        MutableField::PayableInterest,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            MutableField::ReceivablePresentValue => "der_vp",
            MutableField::PayablePresentValue => "obl_vp",
            MutableField::ReceivableInterest => "der_intereses",
            MutableField::PayableInterest => "obl_intereses",
        }
    }

    fn slot(self) -> usize {
        match self {
            MutableField::ReceivablePresentValue => 0,
            MutableField::PayablePresentValue => 1,
            MutableField::ReceivableInterest => 2,
            MutableField::PayableInterest => 3,
        }
    }
}

pub const CONTRACT_CODE_COLUMN: &str = "cod_emp";
pub const FLOW_DATE_COLUMN: &str = "fecha_cobro";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

/// In-memory swap cash-flow export. Every cell is kept as read so columns the
/// reconciliation does not touch are written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct CashFlowTable {
    #[getset(get = "pub")]
    headers: Vec<String>,
    #[getset(get = "pub")]
    rows: Vec<Vec<String>>,
    #[getset(get = "pub")]
    line_ending: LineEnding,
    contract_code: usize,
    flow_date: usize,
    mutable: [usize; 4],
}

impl CashFlowTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>, line_ending: LineEnding) -> Result<Self> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| anyhow!("missing required column {name}"))
        };

        let contract_code = position(CONTRACT_CODE_COLUMN)?;
        let flow_date = position(FLOW_DATE_COLUMN)?;
        let mut mutable = [0usize; 4];
        for field in MutableField::ALL {
            mutable[field.slot()] = position(field.column_name())?;
        }

        Ok(CashFlowTable {
            headers,
            rows,
            line_ending,
            contract_code,
            flow_date,
            mutable,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn join_key(&self, row: usize) -> JoinKey {
        let cells = &self.rows[row];
        JoinKey::new(&cells[self.contract_code], &cells[self.flow_date])
    }

    pub fn value(&self, row: usize, field: MutableField) -> &str {
        &self.rows[row][self.column_of(field)]
    }

    pub fn set_value(&mut self, row: usize, field: MutableField, value: String) {
        let column = self.column_of(field);
        self.rows[row][column] = value;
    }

    fn column_of(&self, field: MutableField) -> usize {
        self.mutable[field.slot()]
    }
}

/// Outcome of a successful run, handed to the downstream report update.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct RunResult {
    #[getset(get = "pub")]
    output_filename: String,
    #[getset(get = "pub")]
    business_date: String,
}

impl RunResult {
    pub fn new(output_filename: String, business_date: String) -> Self {
        RunResult {
            output_filename,
            business_date,
        }
    }
}

/// Counters collected while applying estimates to the cash-flow table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconSummary {
    pub estimates_matched: usize,
    pub estimates_skipped: usize,
    pub rows_matched: usize,
    pub fields_written: usize,
}
