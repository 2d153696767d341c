use crate::{
    errors::ReconError,
    models::{FileDate, FileDatePair},
    naming::{NamingConvention, extract_date},
};
use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Finds the swap cash-flow export and the estimation export in `input_dir`
/// and checks that both carry the same date.
///
/// Only file names are inspected, no content is read.
pub fn locate(input_dir: &Path) -> Result<FileDatePair> {
    let names = list_file_names(input_dir)?;

    let primary = select(&names, NamingConvention::SwapFlows, input_dir)?;
    let secondary = select(&names, NamingConvention::EstimatedFlows, input_dir)?;

    let primary_date = dated(&primary)?;
    let secondary_date = dated(&secondary)?;

    if primary_date != secondary_date {
        return Err(ReconError::DateMismatch {
            primary: primary.clone(),
            primary_date: primary_date.business_date(),
            secondary: secondary.clone(),
            secondary_date: secondary_date.business_date(),
        })?;
    }

    Ok(FileDatePair::new(
        input_dir.join(&primary),
        primary,
        input_dir.join(&secondary),
        secondary,
        primary_date,
    ))
}

fn list_file_names(input_dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(input_dir)
        .with_context(|| format!("cannot list input directory {}", input_dir.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

fn select(names: &[String], convention: NamingConvention, input_dir: &Path) -> Result<String> {
    let mut candidates: Vec<String> = names
        .iter()
        .filter(|name| convention.matches(name))
        .cloned()
        .collect();

    if candidates.len() > 1 {
        return Err(ReconError::AmbiguousInput {
            pattern: convention.pattern(),
            candidates,
        })?;
    }

    Ok(candidates.pop().ok_or_else(|| ReconError::MissingInput {
        pattern: convention.pattern(),
        dir: PathBuf::from(input_dir),
    })?)
}

fn dated(name: &str) -> Result<FileDate> {
    Ok(extract_date(name).ok_or_else(|| ReconError::UndatedInput(name.to_string()))?)
}
