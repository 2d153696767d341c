use std::path::PathBuf;

use anyhow::Result;

use crate::models::{CashFlowTable, EstimationRecord, ReconSummary};

/// TableWrite trait persists the reconciled cash-flow table.
pub trait TableWrite {
    /// Writes the table under `file_name`.
    ///
    /// # Arguments
    /// * `file_name` - Base name of the output file, the same as the primary input.
    /// * `table` - The reconciled table.
    ///
    /// # Returns
    /// The full path written to.
    fn write_table(&mut self, file_name: &str, table: &CashFlowTable) -> Result<PathBuf>;
}

/// Reconciling trait applies estimation records to a cash-flow table.
pub trait Reconciling {
    /// Overwrites the monetary fields of every row matched by an estimate.
    ///
    /// # Arguments
    /// * `table` - The cash-flow table, mutated in place.
    /// * `estimates` - The estimation records, in file order.
    ///
    /// # Returns
    /// Counters describing what was changed.
    fn reconcile(&self, table: &mut CashFlowTable, estimates: &[EstimationRecord]) -> ReconSummary;
}

/// LogSink receives leveled messages from the engine.
pub trait LogSink {
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
    /// Logs `message` together with the full cause chain of `error`.
    fn exception(&self, message: &str, error: &anyhow::Error);
}
