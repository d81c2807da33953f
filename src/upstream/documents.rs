//! Bill document files on the legislature's public file server.
//!
//! Bill text is published as static files, one per format:
//! `{base}/biennium/2025-26/Xml/Bills/House%20Bills/1234.xml`.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local};

use crate::gateway::biennium_start;

pub const DEFAULT_DOCUMENTS_BASE_URL: &str = "https://lawfilesext.leg.wa.gov";

// == Bill Format ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BillFormat {
    Xml,
    Htm,
    Pdf,
}

impl BillFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillFormat::Xml => "xml",
            BillFormat::Htm => "htm",
            BillFormat::Pdf => "pdf",
        }
    }

    /// Directory name on the file server.
    fn directory(&self) -> &'static str {
        match self {
            BillFormat::Xml => "Xml",
            BillFormat::Htm => "Htm",
            BillFormat::Pdf => "Pdf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            BillFormat::Xml => "application/xml",
            BillFormat::Htm => "text/html",
            BillFormat::Pdf => "application/pdf",
        }
    }

    /// PDFs are linked, never downloaded.
    pub fn is_fetched(&self) -> bool {
        !matches!(self, BillFormat::Pdf)
    }
}

impl fmt::Display for BillFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "xml" => Ok(BillFormat::Xml),
            "htm" | "html" => Ok(BillFormat::Htm),
            "pdf" => Ok(BillFormat::Pdf),
            _ => Err(format!("Invalid format: {raw}. Must be one of xml, htm or pdf")),
        }
    }
}

// == Chamber ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chamber {
    House,
    Senate,
}

impl Chamber {
    /// Lookup order when a bill's chamber is unknown.
    pub const ALL: [Chamber; 2] = [Chamber::House, Chamber::Senate];

    pub fn as_str(&self) -> &'static str {
        match self {
            Chamber::House => "House",
            Chamber::Senate => "Senate",
        }
    }

    /// Case-insensitive parse; `House`, `house` and `HOUSE` all match.
    pub fn parse_loose(raw: &str) -> Option<Self> {
        Chamber::ALL
            .into_iter()
            .find(|chamber| chamber.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

impl fmt::Display for Chamber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == URL Builder ==
pub fn bill_document_url(
    base_url: &str,
    biennium: &str,
    chamber: Chamber,
    bill_number: &str,
    format: BillFormat,
) -> String {
    format!(
        "{}/biennium/{biennium}/{}/Bills/{chamber}%20Bills/{bill_number}.{format}",
        base_url.trim_end_matches('/'),
        format.directory(),
    )
}

// == Validators ==
/// `YYYY-YY` with an odd first year, consecutive years, not starting in the
/// future.
pub fn validate_biennium(biennium: &str) -> bool {
    biennium_start(biennium).is_ok_and(|start| i64::from(start) <= i64::from(Local::now().year()))
}

/// Exactly `House` or `Senate`, case-sensitive.
pub fn validate_chamber(chamber: &str) -> bool {
    chamber == "House" || chamber == "Senate"
}

/// Three to five digits, no chamber prefix.
pub fn validate_bill_number(bill_number: &str) -> bool {
    (3..=5).contains(&bill_number.len()) && bill_number.chars().all(|c| c.is_ascii_digit())
}

// == Bill Identifiers ==
/// Chamber of origin from a bill id such as `HB 1234`, `ESSB 5000` or
/// `2SHB 1100`.
pub fn chamber_from_bill_id(bill_id: &str) -> Option<Chamber> {
    let prefix = bill_id.split_whitespace().next()?.to_ascii_uppercase();
    // Engrossed and numbered-substitute markers
    let kind = prefix.trim_start_matches(|c: char| c == 'E' || c.is_ascii_digit());
    // Substitute marker, unless it is the Senate's own `S`
    let kind = match kind.strip_prefix('S') {
        Some(rest) if rest.starts_with('H') || rest.starts_with('S') => rest,
        _ => kind,
    };

    let mut chars = kind.chars();
    let origin = chars.next()?;
    if !matches!(chars.as_str(), "B" | "JM" | "JR" | "CR" | "R") {
        return None;
    }
    match origin {
        'H' => Some(Chamber::House),
        'S' => Some(Chamber::Senate),
        _ => None,
    }
}

/// First run of three to five digits in `text`.
pub fn extract_bill_number(text: &str) -> Option<String> {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|run| (3..=5).contains(&run.len()))
        .map(str::to_string)
}
