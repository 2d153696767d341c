use crate::{
    csv_reader::DELIMITER,
    models::{CashFlowTable, LineEnding},
    traits::TableWrite,
};
use anyhow::{Context, Result, anyhow};
use csv::{Terminator, WriterBuilder};
use encoding_rs::WINDOWS_1252;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

/// Writes reconciled tables as semicolon separated Latin-1 files into one directory.
pub struct Latin1FileWriter {
    output_dir: PathBuf,
}

impl Latin1FileWriter {
    pub fn new(output_dir: &Path) -> Self {
        Latin1FileWriter {
            output_dir: output_dir.to_path_buf(),
        }
    }
}

impl TableWrite for Latin1FileWriter {
    fn write_table(&mut self, file_name: &str, table: &CashFlowTable) -> Result<PathBuf> {
        let bytes = render(table)?;

        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("cannot create output directory {}", self.output_dir.display())
        })?;
        let path = self.output_dir.join(file_name);
        let mut staged = NamedTempFile::new_in(&self.output_dir).with_context(|| {
            format!("cannot stage output in {}", self.output_dir.display())
        })?;
        staged
            .write_all(&bytes)
            .with_context(|| format!("cannot write {}", path.display()))?;
        staged
            .persist(&path)
            .map_err(|e| e.error)
            .with_context(|| format!("cannot replace {}", path.display()))?;
        Ok(path)
    }
}

/// Renders the whole table, header first, into Latin-1 bytes.
pub fn render(table: &CashFlowTable) -> Result<Vec<u8>> {
    let terminator = match table.line_ending() {
        LineEnding::Lf => Terminator::Any(b'\n'),
        LineEnding::CrLf => Terminator::CRLF,
    };
    let mut wrt = WriterBuilder::new()
        .delimiter(DELIMITER)
        .terminator(terminator)
        .from_writer(Vec::new());

    wrt.write_record(table.headers())?;
    for row in table.rows() {
        wrt.write_record(row)?;
    }

    let buffer = wrt
        .into_inner()
        .map_err(|e| anyhow!("cannot flush rendered table: {}", e.error()))?;
    let text = String::from_utf8(buffer)?;
    let (encoded, _, _) = WINDOWS_1252.encode(&text);
    Ok(encoded.into_owned())
}
