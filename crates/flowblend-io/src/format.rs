//! Case file format detection.

use std::path::Path;

/// Supported case file encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseFormat {
    Json,
    Toml,
}

impl CaseFormat {
    pub const ALL: &'static [CaseFormat] = &[CaseFormat::Json, CaseFormat::Toml];

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            CaseFormat::Json => &["json"],
            CaseFormat::Toml => &["toml"],
        }
    }

    pub fn friendly_name(&self) -> &'static str {
        match self {
            CaseFormat::Json => "JSON case",
            CaseFormat::Toml => "TOML case",
        }
    }

    /// Format implied by the file extension, if any.
    pub fn detect(path: &Path) -> Option<CaseFormat> {
        let ext = path.extension()?.to_str()?;
        Self::ALL.iter().copied().find(|format| {
            format
                .extensions()
                .iter()
                .any(|e| e.eq_ignore_ascii_case(ext))
        })
    }
}
