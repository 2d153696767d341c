use crate::{
    errors::ReconError,
    models::{CashFlowTable, EstimationRecord, LineEnding},
};
use anyhow::{Context, Result, anyhow};
use csv::ReaderBuilder;
use encoding_rs::WINDOWS_1252;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::{fs, path::Path, str::FromStr};

pub const DELIMITER: u8 = b';';

#[derive(Deserialize)]
struct EstimationRow {
    #[serde(rename = "M_CONTRACT_")]
    contract_id: String,
    #[serde(rename = "M_DATE")]
    value_date: String,
    #[serde(rename = "M_DISCFLOWC")]
    discounted_flow_change: Option<String>,
    #[serde(rename = "M_FLOW_COL")]
    flow_amount: Option<String>,
}

/// Reads a whole Latin-1 file into a `String`.
pub fn read_latin1(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let (decoded, _) = WINDOWS_1252.decode_without_bom_handling(&bytes);
    Ok(decoded.into_owned())
}

pub fn read_cash_flows(path: &Path) -> Result<CashFlowTable> {
    parse_cash_flows(&display_name(path), &read_latin1(path)?)
}

pub fn read_estimates(path: &Path) -> Result<Vec<EstimationRecord>> {
    parse_estimates(&display_name(path), &read_latin1(path)?)
}

/// Parses the swap cash-flow export, keeping every cell verbatim.
pub fn parse_cash_flows(name: &str, text: &str) -> Result<CashFlowTable> {
    let mut reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("cannot read header of {name}"))?
        .iter()
        .map(String::from)
        .collect();

    let mut rows = Vec::new();
    for rec in reader.records() {
        let rec = rec.with_context(|| format!("malformed row in {name}"))?;
        rows.push(rec.iter().map(String::from).collect::<Vec<_>>());
    }

    if rows.is_empty() {
        return Err(ReconError::EmptyInput(name.to_string()))?;
    }

    CashFlowTable::new(headers, rows, detect_line_ending(text))
        .with_context(|| format!("cannot load {name}"))
}

/// Parses the discounted-flow estimation export.
pub fn parse_estimates(name: &str, text: &str) -> Result<Vec<EstimationRecord>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for rec in reader.deserialize::<EstimationRow>() {
        let row = rec.with_context(|| format!("malformed row in {name}"))?;
        records.push(EstimationRecord::new(
            &row.contract_id,
            &row.value_date,
            parse_amount(row.discounted_flow_change.as_deref())
                .with_context(|| format!("M_DISCFLOWC in {name}"))?,
            parse_amount(row.flow_amount.as_deref())
                .with_context(|| format!("M_FLOW_COL in {name}"))?,
        ));
    }

    if records.is_empty() {
        return Err(ReconError::EmptyInput(name.to_string()))?;
    }

    Ok(records)
}

fn parse_amount(raw: Option<&str>) -> Result<Option<Decimal>> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    let amount = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|e| anyhow!("invalid amount {raw:?}: {e}"))?;
    Ok(Some(amount))
}

fn detect_line_ending(text: &str) -> LineEnding {
    if text.contains("\r\n") {
        LineEnding::CrLf
    } else {
        LineEnding::Lf
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MutableField;
    use rust_decimal::dec;

    const CASH_FLOWS: &str = "cod_emp;fecha_cobro;der_vp;obl_vp;der_intereses;obl_intereses;moneda\n\
        1001;20240115;0;0;0;0;EUR\n\
        1002;20240115;10.5;0;1.25;0;COP\n";

    fn recon_error<T: std::fmt::Debug>(res: Result<T>) -> ReconError {
        ReconError::classify(res.unwrap_err())
    }

    #[test]
    fn test_parse_cash_flows_keeps_cells_verbatim() -> Result<()> {
        let table = parse_cash_flows("flujos.csv", CASH_FLOWS)?;
        assert_eq!(table.len(), 2);
        assert_eq!(table.headers().len(), 7);
        assert_eq!(table.value(1, MutableField::ReceivablePresentValue), "10.5");
        assert_eq!(table.rows()[1][6], "COP");
        assert_eq!(*table.line_ending(), LineEnding::Lf);
        Ok(())
    }

    #[test]
    fn test_crlf_line_endings_are_detected() -> Result<()> {
        let text = CASH_FLOWS.replace('\n', "\r\n");
        let table = parse_cash_flows("flujos.csv", &text)?;
        assert_eq!(*table.line_ending(), LineEnding::CrLf);
        assert_eq!(table.rows()[0][6], "EUR");
        Ok(())
    }

    #[test]
    fn test_header_only_cash_flows_are_empty_input() {
        let text = "cod_emp;fecha_cobro;der_vp;obl_vp;der_intereses;obl_intereses\n";
        let err = recon_error(parse_cash_flows("flujos.csv", text));
        assert!(matches!(err, ReconError::EmptyInput(name) if name == "flujos.csv"));
    }

    #[test]
    fn test_zero_byte_file_is_empty_input() {
        let err = recon_error(parse_estimates("COL.dat", ""));
        assert!(matches!(err, ReconError::EmptyInput(_)));
    }

    #[test]
    fn test_ragged_row_is_a_processing_failure() {
        let text = "cod_emp;fecha_cobro;der_vp;obl_vp;der_intereses;obl_intereses\n1001;20240115;0\n";
        let err = recon_error(parse_cash_flows("flujos.csv", text));
        assert!(matches!(err, ReconError::Processing(_)));
    }

    #[test]
    fn test_parse_estimates_reads_amounts() -> Result<()> {
        let text = "M_CONTRACT_;M_DATE;M_DISCFLOWC;M_FLOW_COL;M_CCY\n\
            1001;20240115;150.0;-200.25;EUR\n\
            1002; 20240115 ; ;1.5e2 ;COP\n";
        let records = parse_estimates("COL.dat", text)?;
        assert_eq!(records.len(), 2);
        assert_eq!(*records[0].discounted_flow_change(), Some(dec!(150.0)));
        assert_eq!(*records[0].flow_amount(), Some(dec!(-200.25)));
        assert_eq!(records[1].value_date(), " 20240115 ");
        assert_eq!(*records[1].discounted_flow_change(), None);
        assert_eq!(*records[1].flow_amount(), Some(dec!(150)));
        Ok(())
    }

    #[test]
    fn test_non_numeric_amount_is_a_processing_failure() {
        let text = "M_CONTRACT_;M_DATE;M_DISCFLOWC;M_FLOW_COL\n1001;20240115;abc;1\n";
        let err = recon_error(parse_estimates("COL.dat", text));
        assert!(matches!(err, ReconError::Processing(_)));
    }

    #[test]
    fn test_read_latin1_decodes_accented_bytes() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("flujos_swap_gbo_20240115.csv");
        let mut bytes = b"cod_emp;fecha_cobro;der_vp;obl_vp;der_intereses;obl_intereses;descripci".to_vec();
        bytes.extend_from_slice(&[0xF3, b'n', b'\n']);
        bytes.extend_from_slice(b"1001;20240115;0;0;0;0;Compa");
        bytes.extend_from_slice(&[0xF1, 0xED, b'a', b'\n']);
        fs::write(&path, bytes)?;

        let table = read_cash_flows(&path)?;
        assert_eq!(table.headers()[6], "descripción");
        assert_eq!(table.rows()[0][6], "Compañía");
        Ok(())
    }
}
