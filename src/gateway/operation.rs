//! Operations and their parameter schemas.
//!
//! Every operation enumerates the parameters it accepts. Material
//! parameters are forwarded upstream and form the cache key. Local
//! parameters are filters the tool layer applies to the cached answer, so
//! they are validated but never reach the key. Cosmetic parameters are
//! accepted by every operation and ignored.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde_json::Value;

use crate::error::FetchError;
use crate::gateway::Params;
use crate::upstream::{BillFormat, Chamber, Endpoint, UpstreamRequest};

/// Parameters that only change presentation.
const COSMETIC_PARAMS: &[&str] = &["format", "verbose"];

// == Parameter Schema ==
/// How a parameter value is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// `YYYY-YY`, consecutive years starting odd
    Biennium,
    /// Digits, optionally prefixed by a chamber code (`HB 1234` -> `1234`)
    BillNumber,
    /// Four-digit year
    Year,
    /// Calendar date, `YYYY-MM-DD`
    Date,
    /// Free text, compared case-insensitively
    Text,
    /// Search text: case and runs of whitespace do not matter
    Query,
    /// `House` or `Senate`, any case
    Chamber,
    /// Fetchable bill text format, `xml` or `htm`
    DocumentFormat,
    /// Positive result count, at most [`MAX_COUNT`]
    Count,
    /// Boolean
    Flag,
}

pub const MAX_COUNT: u32 = 1000;

/// Whether a parameter reaches the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamRole {
    /// Required, sent upstream under the given name, part of the cache key
    Material { upstream: &'static str },
    /// Optional, applied by the tool layer after the fetch
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub role: ParamRole,
}

const fn material(name: &'static str, kind: ParamKind, upstream: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        role: ParamRole::Material { upstream },
    }
}

const fn local(name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        role: ParamRole::Local,
    }
}

const BILL_LOOKUP: &[ParamSpec] = &[
    material("biennium", ParamKind::Biennium, "biennium"),
    material("bill_number", ParamKind::BillNumber, "billNumber"),
];

const SEARCH_BILLS: &[ParamSpec] = &[
    material("year", ParamKind::Year, "year"),
    local("agency", ParamKind::Text),
    local("active_only", ParamKind::Flag),
];

const BILL_DOCUMENTS: &[ParamSpec] = &[
    material("biennium", ParamKind::Biennium, "biennium"),
    material("bill_number", ParamKind::BillNumber, "namedLike"),
    local("document_type", ParamKind::Text),
];

const BILL_AMENDMENTS: &[ParamSpec] = &[
    material("year", ParamKind::Year, "year"),
    local("bill_number", ParamKind::BillNumber),
];

const COMMITTEES: &[ParamSpec] = &[material("biennium", ParamKind::Biennium, "biennium")];

const COMMITTEE_MEETINGS: &[ParamSpec] = &[
    material("start_date", ParamKind::Date, "beginDate"),
    material("end_date", ParamKind::Date, "endDate"),
    local("committee", ParamKind::Text),
];

const BILL_CONTENT: &[ParamSpec] = &[
    material("biennium", ParamKind::Biennium, "biennium"),
    material("chamber", ParamKind::Chamber, "chamber"),
    material("bill_number", ParamKind::BillNumber, "billNumber"),
    material("bill_format", ParamKind::DocumentFormat, "format"),
];

const BILL_TEXT_SEARCH: &[ParamSpec] = &[
    material("query", ParamKind::Query, "query"),
    material("biennium", ParamKind::Biennium, "biennium"),
    material("max_docs", ParamKind::Count, "maxDocs"),
];

const FIND_LEGISLATOR: &[ParamSpec] = &[
    material("biennium", ParamKind::Biennium, "biennium"),
    local("chamber", ParamKind::Text),
    local("party", ParamKind::Text),
    local("district", ParamKind::Text),
];

// == Operation ==
/// A logical request the gateway knows how to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetBillInfo,
    GetBillStatus,
    SearchBills,
    GetBillDocuments,
    GetBillAmendments,
    GetCommittees,
    GetCommitteeMeetings,
    FindLegislator,
    GetBillContent,
    SearchBillText,
}

impl Operation {
    pub const ALL: [Operation; 10] = [
        Operation::GetBillInfo,
        Operation::GetBillStatus,
        Operation::SearchBills,
        Operation::GetBillDocuments,
        Operation::GetBillAmendments,
        Operation::GetCommittees,
        Operation::GetCommitteeMeetings,
        Operation::FindLegislator,
        Operation::GetBillContent,
        Operation::SearchBillText,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::GetBillInfo => "getBillInfo",
            Operation::GetBillStatus => "getBillStatus",
            Operation::SearchBills => "searchBills",
            Operation::GetBillDocuments => "getBillDocuments",
            Operation::GetBillAmendments => "getBillAmendments",
            Operation::GetCommittees => "getCommittees",
            Operation::GetCommitteeMeetings => "getCommitteeMeetings",
            Operation::FindLegislator => "findLegislator",
            Operation::GetBillContent => "getBillContent",
            Operation::SearchBillText => "searchBillText",
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        match self {
            Operation::GetBillInfo | Operation::GetBillStatus => Endpoint::GetLegislation,
            Operation::SearchBills => Endpoint::GetLegislationByYear,
            Operation::GetBillDocuments => Endpoint::GetDocuments,
            Operation::GetBillAmendments => Endpoint::GetAmendments,
            Operation::GetCommittees => Endpoint::GetCommittees,
            Operation::GetCommitteeMeetings => Endpoint::GetCommitteeMeetings,
            Operation::FindLegislator => Endpoint::GetSponsors,
            Operation::GetBillContent => Endpoint::BillDocument,
            Operation::SearchBillText => Endpoint::KeywordSearch,
        }
    }

    pub fn schema(&self) -> &'static [ParamSpec] {
        match self {
            Operation::GetBillInfo | Operation::GetBillStatus => BILL_LOOKUP,
            Operation::SearchBills => SEARCH_BILLS,
            Operation::GetBillDocuments => BILL_DOCUMENTS,
            Operation::GetBillAmendments => BILL_AMENDMENTS,
            Operation::GetCommittees => COMMITTEES,
            Operation::GetCommitteeMeetings => COMMITTEE_MEETINGS,
            Operation::FindLegislator => FIND_LEGISLATOR,
            Operation::GetBillContent => BILL_CONTENT,
            Operation::SearchBillText => BILL_TEXT_SEARCH,
        }
    }

    // == Normalize ==
    /// Validates `params` against the schema and derives the cache key and
    /// upstream request.
    ///
    /// Parameter names are matched case-insensitively and `null` counts as
    /// absent. Unknown names and missing material parameters are rejected.
    pub fn normalize(&self, params: &Params) -> Result<NormalizedRequest, FetchError> {
        let mut values: BTreeMap<&'static str, String> = BTreeMap::new();

        for (raw_name, raw_value) in params {
            let name = raw_name.trim().to_ascii_lowercase();
            if COSMETIC_PARAMS.contains(&name.as_str()) || raw_value.is_null() {
                continue;
            }

            let spec = self
                .schema()
                .iter()
                .find(|spec| spec.name == name)
                .ok_or_else(|| self.invalid(format!("unknown parameter `{raw_name}`")))?;

            let value = normalize_value(spec.kind, raw_value)
                .map_err(|reason| self.invalid(format!("`{}` {reason}", spec.name)))?;

            if let Some(previous) = values.insert(spec.name, value.clone()) {
                if previous != value {
                    return Err(self.invalid(format!(
                        "`{}` given twice with different values",
                        spec.name
                    )));
                }
            }
        }

        let mut key_params = BTreeMap::new();
        let mut upstream = UpstreamRequest::new(self.endpoint());
        for spec in self.schema() {
            if let ParamRole::Material { upstream: upstream_name } = spec.role {
                let value = values
                    .get(spec.name)
                    .ok_or_else(|| self.invalid(format!("missing `{}`", spec.name)))?;
                key_params.insert(spec.name, value.clone());
                upstream = upstream.with(upstream_name, value.clone());
            }
        }

        Ok(NormalizedRequest {
            operation: *self,
            key: CacheKey::new(*self, &key_params),
            upstream,
        })
    }

    fn invalid(&self, reason: String) -> FetchError {
        FetchError::InvalidRequest {
            operation: self.name().to_string(),
            reason,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = FetchError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == name)
            .ok_or_else(|| FetchError::UnknownOperation(name.to_string()))
    }
}

// == Cache Key ==
/// Deterministic key: operation name plus material parameters sorted by name.
///
/// Values are rendered as `name?k=v&k=v` with `%`, `&` and `=` escaped, so
/// free-text values cannot run into the next parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    fn new(operation: Operation, params: &BTreeMap<&'static str, String>) -> Self {
        let query: Vec<String> = params
            .iter()
            .map(|(name, value)| format!("{name}={}", escape_key_value(value)))
            .collect();
        Self(format!("{}?{}", operation.name(), query.join("&")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn escape_key_value(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('&', "%26")
        .replace('=', "%3D")
}

/// Output of [`Operation::normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    pub operation: Operation,
    pub key: CacheKey,
    pub upstream: UpstreamRequest,
}

// == Value Normalization ==
fn normalize_value(kind: ParamKind, value: &Value) -> Result<String, String> {
    let raw = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return Err("must be a string, number or boolean".to_string()),
    };

    match kind {
        ParamKind::Biennium => normalize_biennium(&raw),
        ParamKind::BillNumber => normalize_bill_number(&raw),
        ParamKind::Year => {
            if raw.len() == 4 && raw.chars().all(|c| c.is_ascii_digit()) {
                Ok(raw)
            } else {
                Err(format!("must be a four-digit year, got {raw:?}"))
            }
        }
        ParamKind::Date => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(|date| date.format("%Y-%m-%d").to_string())
            .map_err(|_| format!("must be a YYYY-MM-DD date, got {raw:?}")),
        ParamKind::Text => Ok(raw.to_lowercase()),
        ParamKind::Query => {
            let query = raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
            if query.is_empty() {
                Err("must not be blank".to_string())
            } else {
                Ok(query)
            }
        }
        ParamKind::Chamber => Chamber::parse_loose(&raw)
            .map(|chamber| chamber.as_str().to_string())
            .ok_or_else(|| format!("must be House or Senate, got {raw:?}")),
        ParamKind::DocumentFormat => match raw.parse::<BillFormat>() {
            Ok(format) if format.is_fetched() => Ok(format.as_str().to_string()),
            Ok(format) => Err(format!("{format} documents are linked, not fetched")),
            Err(reason) => Err(reason),
        },
        ParamKind::Count => match raw.parse::<u32>() {
            Ok(count) if (1..=MAX_COUNT).contains(&count) => Ok(count.to_string()),
            _ => Err(format!("must be a whole number from 1 to {MAX_COUNT}, got {raw:?}")),
        },
        ParamKind::Flag => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok("true".to_string()),
            "false" | "0" | "no" => Ok("false".to_string()),
            _ => Err(format!("must be a boolean, got {raw:?}")),
        },
    }
}

fn normalize_biennium(raw: &str) -> Result<String, String> {
    let start = biennium_start(raw)?;
    Ok(format!("{start}-{:02}", (start + 1) % 100))
}

/// First year of a `YYYY-YY` biennium. Sessions open in odd years and the
/// second half names the following year.
pub(crate) fn biennium_start(raw: &str) -> Result<u32, String> {
    let err = || format!("must look like 2025-26, got {raw:?}");
    let bytes = raw.as_bytes();
    let well_formed = bytes.len() == 7
        && bytes[4] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || b.is_ascii_digit());
    if !well_formed {
        return Err(err());
    }

    let first: u32 = raw[..4].parse().map_err(|_| err())?;
    let second: u32 = raw[5..].parse().map_err(|_| err())?;
    if (first + 1) % 100 != second {
        return Err(format!("must span two consecutive years, got {raw:?}"));
    }
    if first % 2 == 0 {
        return Err(format!("must start in an odd year, got {raw:?}"));
    }
    Ok(first)
}

fn normalize_bill_number(raw: &str) -> Result<String, String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = compact.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    let digits = digits.trim_start_matches('0');

    if digits.is_empty() || digits.len() > 5 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("must be a bill number like 1234 or HB 1234, got {raw:?}"));
    }
    Ok(digits.to_string())
}
