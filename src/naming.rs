use crate::models::FileDate;
use std::path::Path;

/// File naming conventions of the two extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingConvention {
    /// `flujos_swap_gbo_<YYYYMMDD>.csv`
    SwapFlows,
    /// `COL_ESTIM_FLOWS_<DDMMYYYY>.dat`
    EstimatedFlows,
}

impl NamingConvention {
    pub const ALL: [NamingConvention; 2] =
        [NamingConvention::SwapFlows, NamingConvention::EstimatedFlows];

    pub fn prefix(self) -> &'static str {
        match self {
            NamingConvention::SwapFlows => "flujos_swap_gbo",
            NamingConvention::EstimatedFlows => "COL_ESTIM_FLOWS",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            NamingConvention::SwapFlows => ".csv",
            NamingConvention::EstimatedFlows => ".dat",
        }
    }

    pub fn pattern(self) -> &'static str {
        match self {
            NamingConvention::SwapFlows => "flujos_swap_gbo_*.csv",
            NamingConvention::EstimatedFlows => "COL_ESTIM_FLOWS_*.dat",
        }
    }

    pub fn matches(self, file_name: &str) -> bool {
        file_name.starts_with(self.prefix()) && file_name.ends_with(self.extension())
    }

    /// Reads the eight-digit token in this convention's field order.
    fn read_token(self, token: &str) -> FileDate {
        match self {
            NamingConvention::SwapFlows => FileDate::new(&token[0..4], &token[4..6], &token[6..8]),
            NamingConvention::EstimatedFlows => {
                FileDate::new(&token[4..8], &token[2..4], &token[0..2])
            }
        }
    }
}

/// Extracts the embedded date from `file_name`, trying each convention in order.
///
/// Returns `None` when no convention matches or the date token is not eight
/// digits. Calendar validity is not checked.
pub fn extract_date(file_name: &str) -> Option<FileDate> {
    let base = Path::new(file_name).file_name()?.to_str()?;
    let convention = NamingConvention::ALL.into_iter().find(|c| c.matches(base))?;

    let stem = base.rsplit_once('.').map_or(base, |(stem, _)| stem);
    let token = stem.rsplit('_').next()?;
    if token.len() != 8 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    Some(convention.read_token(token))
}
