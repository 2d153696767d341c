use std::path::{Path, PathBuf};

use crate::{
    csv_reader,
    errors::ReconError,
    locator,
    models::RunResult,
    traits::{LogSink, Reconciling, TableWrite},
};
use anyhow::Result;

/// One reconciliation run over a fixed input directory:
/// locate, load, reconcile, write.
pub struct Engine<'a, T, R> {
    writer: T,
    reconciler: R,
    sink: &'a dyn LogSink,
    input_dir: PathBuf,
}

impl<'a, T, R> Engine<'a, T, R>
where
    T: TableWrite,
    R: Reconciling,
{
    pub fn new(writer: T, reconciler: R, sink: &'a dyn LogSink, input_dir: &Path) -> Self {
        Self {
            writer,
            reconciler,
            sink,
            input_dir: input_dir.to_path_buf(),
        }
    }

    /// Runs once and reports failures through the sink. `None` means no
    /// output file was written.
    pub fn process(&mut self) -> Option<RunResult> {
        match self.run() {
            Ok(result) => Some(result),
            Err(ReconError::Processing(err)) => {
                self.sink.exception("error processing swap cash flows", &err);
                None
            }
            Err(err) => {
                self.sink.error(&err.to_string());
                None
            }
        }
    }

    pub fn run(&mut self) -> Result<RunResult, ReconError> {
        self.try_run().map_err(ReconError::classify)
    }

    fn try_run(&mut self) -> Result<RunResult> {
        let pair = locator::locate(&self.input_dir)?;
        let business_date = pair.date().business_date();
        self.sink.info(&format!(
            "reconciling {} against {} for business date {business_date}",
            pair.primary_name(),
            pair.secondary_name()
        ));

        let mut cash_flows = csv_reader::read_cash_flows(pair.primary_path())?;
        let estimates = csv_reader::read_estimates(pair.secondary_path())?;
        self.sink.info(&format!(
            "loaded {} cash-flow rows and {} estimation rows",
            cash_flows.len(),
            estimates.len()
        ));

        let summary = self.reconciler.reconcile(&mut cash_flows, &estimates);
        if summary.estimates_skipped > 0 {
            self.sink.warning(&format!(
                "{} estimation rows matched no cash-flow row",
                summary.estimates_skipped
            ));
        }
        self.sink.info(&format!(
            "{} estimation rows matched {} cash-flow rows, {} fields updated",
            summary.estimates_matched, summary.rows_matched, summary.fields_written
        ));

        let path = self.writer.write_table(pair.primary_name(), &cash_flows)?;
        self.sink.info(&format!("reconciled cash flows saved to {}", path.display()));

        Ok(RunResult::new(pair.primary_name().clone(), business_date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        csv_writer::Latin1FileWriter,
        models::{CashFlowTable, MutableField},
        reconciler::SignRules,
    };
    use std::{cell::RefCell, fs};
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingSink {
        entries: RefCell<Vec<(&'static str, String)>>,
    }

    impl RecordingSink {
        fn levels(&self) -> Vec<&'static str> {
            self.entries.borrow().iter().map(|(level, _)| *level).collect()
        }
    }

    impl LogSink for RecordingSink {
        fn info(&self, message: &str) {
            self.entries.borrow_mut().push(("info", message.to_string()));
        }

        fn warning(&self, message: &str) {
            self.entries.borrow_mut().push(("warning", message.to_string()));
        }

        fn error(&self, message: &str) {
            self.entries.borrow_mut().push(("error", message.to_string()));
        }

        fn exception(&self, message: &str, err: &anyhow::Error) {
            self.entries
                .borrow_mut()
                .push(("exception", format!("{message}: {err:#}")));
        }
    }

    struct MockTableWriter {
        tables: Vec<(String, CashFlowTable)>,
    }

    impl MockTableWriter {
        fn new() -> Self {
            Self { tables: Vec::new() }
        }
    }

    impl TableWrite for MockTableWriter {
        fn write_table(&mut self, file_name: &str, table: &CashFlowTable) -> Result<PathBuf> {
            self.tables.push((file_name.to_string(), table.clone()));
            Ok(PathBuf::from(file_name))
        }
    }

    const CASH_FLOWS: &str = "cod_emp;fecha_cobro;der_vp;obl_vp;der_intereses;obl_intereses;moneda\n\
        1001;20240115;1;2;3;4;EUR\n\
        1002;20240115;5;6;7;8;COP\n";

    const ESTIMATES: &str = "M_CONTRACT_;M_DATE;M_DISCFLOWC;M_FLOW_COL\n\
        1001;20240115;150.0;-20.5\n\
        7777;20240115;1;1\n";

    fn input_dir(files: &[(&str, &str)]) -> Result<TempDir> {
        let dir = tempfile::tempdir()?;
        for (name, content) in files {
            fs::write(dir.path().join(name), content)?;
        }
        Ok(dir)
    }

    #[test]
    fn test_run_reconciles_and_writes() -> Result<()> {
        let dir = input_dir(&[
            ("flujos_swap_gbo_20240115.csv", CASH_FLOWS),
            ("COL_ESTIM_FLOWS_15012024.dat", ESTIMATES),
        ])?;
        let sink = RecordingSink::default();
        let mut engine = Engine::new(MockTableWriter::new(), SignRules::new(), &sink, dir.path());

        let result = engine.run()?;
        assert_eq!(result.output_filename(), "flujos_swap_gbo_20240115.csv");
        assert_eq!(result.business_date(), "20240115");

        let (name, table) = &engine.writer.tables[0];
        assert_eq!(name, "flujos_swap_gbo_20240115.csv");
        assert_eq!(table.value(0, MutableField::ReceivablePresentValue), "150.0");
        assert_eq!(table.value(0, MutableField::PayableInterest), "150.0");
        assert_eq!(table.value(0, MutableField::PayablePresentValue), "2");
        assert_eq!(table.rows()[1], vec!["1002", "20240115", "5", "6", "7", "8", "COP"]);
        assert!(sink.levels().contains(&"warning"));
        Ok(())
    }

    #[test]
    fn test_date_mismatch_writes_nothing() -> Result<()> {
        let dir = input_dir(&[
            ("flujos_swap_gbo_20240115.csv", CASH_FLOWS),
            ("COL_ESTIM_FLOWS_16012024.dat", ESTIMATES),
        ])?;
        let sink = RecordingSink::default();
        let mut engine = Engine::new(MockTableWriter::new(), SignRules::new(), &sink, dir.path());

        assert!(matches!(engine.run(), Err(ReconError::DateMismatch { .. })));
        assert!(engine.writer.tables.is_empty());
        Ok(())
    }

    #[test]
    fn test_empty_estimates_write_nothing() -> Result<()> {
        let dir = input_dir(&[
            ("flujos_swap_gbo_20240115.csv", CASH_FLOWS),
            ("COL_ESTIM_FLOWS_15012024.dat", "M_CONTRACT_;M_DATE;M_DISCFLOWC;M_FLOW_COL\n"),
        ])?;
        let sink = RecordingSink::default();
        let mut engine = Engine::new(MockTableWriter::new(), SignRules::new(), &sink, dir.path());

        assert!(matches!(engine.run(), Err(ReconError::EmptyInput(_))));
        assert!(engine.writer.tables.is_empty());
        Ok(())
    }

    #[test]
    fn test_process_logs_taxonomy_failure_as_error() -> Result<()> {
        let dir = input_dir(&[("flujos_swap_gbo_20240115.csv", CASH_FLOWS)])?;
        let sink = RecordingSink::default();
        let mut engine = Engine::new(MockTableWriter::new(), SignRules::new(), &sink, dir.path());

        assert_eq!(engine.process(), None);
        let entries = sink.entries.borrow();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "error");
        assert!(entries[0].1.contains("COL_ESTIM_FLOWS_*.dat"));
        Ok(())
    }

    #[test]
    fn test_process_logs_processing_failure_as_exception() -> Result<()> {
        let dir = input_dir(&[
            ("flujos_swap_gbo_20240115.csv", "cod_emp;fecha_cobro\n1001;20240115\n"),
            ("COL_ESTIM_FLOWS_15012024.dat", ESTIMATES),
        ])?;
        let sink = RecordingSink::default();
        let mut engine = Engine::new(MockTableWriter::new(), SignRules::new(), &sink, dir.path());

        assert_eq!(engine.process(), None);
        assert_eq!(sink.levels().last(), Some(&"exception"));
        assert!(engine.writer.tables.is_empty());
        Ok(())
    }

    #[test]
    fn test_output_file_preserves_untouched_rows() -> Result<()> {
        let dir = input_dir(&[
            ("flujos_swap_gbo_20240115.csv", CASH_FLOWS),
            ("COL_ESTIM_FLOWS_15012024.dat", ESTIMATES),
        ])?;
        let output = tempfile::tempdir()?;
        let sink = RecordingSink::default();
        let mut engine = Engine::new(
            Latin1FileWriter::new(output.path()),
            SignRules::new(),
            &sink,
            dir.path(),
        );

        let result = engine.process().ok_or_else(|| anyhow::anyhow!("run failed"))?;
        let written = fs::read_to_string(output.path().join(result.output_filename()))?;
        assert_eq!(
            written,
            "cod_emp;fecha_cobro;der_vp;obl_vp;der_intereses;obl_intereses;moneda\n\
             1001;20240115;150.0;2;3;150.0;EUR\n\
             1002;20240115;5;6;7;8;COP\n"
        );
        Ok(())
    }
}
