//! Rows of the tko-subs CSV report and the metadata we keep for them

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TkoError;

/// Substring identifying the CSV header line
pub const HEADER_MARKER: &str = "Domain,Cname,Provider";

/// One data row: `domain,cname,provider,vulnerable`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub domain: String,
    pub cname: String,
    pub provider: String,
    /// Raw value of the fourth column
    pub flag: String,
}

/// Outcome of a well-formed row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Vulnerable,
    NotVulnerable,
}

impl Finding {
    /// Split a raw row into its four columns
    pub fn parse(line: &str) -> Result<Self, TkoError> {
        let fields: Vec<&str> = line.trim_end_matches('\r').split(',').collect();
        let [domain, cname, provider, flag] = fields.as_slice() else {
            return Err(TkoError::Parse {
                line: line.to_string(),
                reason: format!("expected 4 fields, found {}", fields.len()),
            });
        };

        Ok(Self {
            domain: domain.trim().to_string(),
            cname: cname.trim().to_string(),
            provider: provider.trim().to_string(),
            flag: flag.trim().to_string(),
        })
    }

    /// Flag is compared after trimming; case matters.
    pub fn verdict(&self) -> Option<Verdict> {
        match self.flag.as_str() {
            "true" => Some(Verdict::Vulnerable),
            "false" => Some(Verdict::NotVulnerable),
            _ => None,
        }
    }
}

/// Parse and classify a row. Anything that is not a four-column row with a
/// `true`/`false` flag is reported as a parse error.
pub fn classify(line: &str) -> Result<(Finding, Verdict), TkoError> {
    let finding = Finding::parse(line)?;
    match finding.verdict() {
        Some(verdict) => Ok((finding, verdict)),
        None => Err(TkoError::Parse {
            line: line.to_string(),
            reason: format!("unknown vulnerability flag '{}'", finding.flag),
        }),
    }
}

/// Key used to detect duplicate rows.
///
/// Fields are trimmed and the DNS columns are case folded, so rows that only
/// differ in whitespace or hostname casing collapse into one.
pub fn row_signature(line: &str) -> String {
    line.trim()
        .split(',')
        .enumerate()
        .map(|(idx, field)| {
            let field = field.trim();
            if idx < 2 {
                field.to_lowercase()
            } else {
                field.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Typed view of the `Tko-subs` metadata namespace.
///
/// Unknown keys written by older versions are kept in `extra` so a round trip
/// through this struct never drops data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TkoMeta {
    /// Raw CSV rows that were flagged vulnerable, in the order they were seen
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vulnerable: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_row() {
        let finding = Finding::parse("example.com,cname1,github,true").unwrap();
        assert_eq!(finding.domain, "example.com");
        assert_eq!(finding.cname, "cname1");
        assert_eq!(finding.provider, "github");
        assert_eq!(finding.verdict(), Some(Verdict::Vulnerable));
    }

    #[test]
    fn test_parse_strips_carriage_return() {
        let finding = Finding::parse("example.com,cname2,heroku,false\r").unwrap();
        assert_eq!(finding.flag, "false");
        assert_eq!(finding.verdict(), Some(Verdict::NotVulnerable));
    }

    #[test]
    fn test_three_fields_is_parse_error() {
        let err = Finding::parse("example.com,cname1,github").unwrap_err();
        match err {
            TkoError::Parse { reason, .. } => assert!(reason.contains("found 3")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_flag_whitespace_tolerated_but_case_is_not() {
        let (_, verdict) = classify("example.com,cname1,github, true ").unwrap();
        assert_eq!(verdict, Verdict::Vulnerable);
        assert!(classify("example.com,cname1,github,True").is_err());
    }

    #[test]
    fn test_unknown_flag_is_ambiguous() {
        let err = classify("example.com,cname1,github,maybe").unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn test_signature_folds_case_and_whitespace() {
        assert_eq!(
            row_signature("Example.COM, CNAME1 ,github,true"),
            row_signature("example.com,cname1,github,true ")
        );
        // provider casing is significant
        assert_ne!(
            row_signature("example.com,cname1,GitHub,true"),
            row_signature("example.com,cname1,github,true")
        );
    }

    #[test]
    fn test_tko_meta_keeps_unknown_keys() {
        let raw = serde_json::json!({"vulnerable": ["a,b,c,true"], "note": "legacy"});
        let meta: TkoMeta = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(meta.vulnerable.len(), 1);
        assert_eq!(serde_json::to_value(&meta).unwrap(), raw);
    }

    #[test]
    fn test_empty_tko_meta_serializes_to_empty_object() {
        let value = serde_json::to_value(TkoMeta::default()).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }
}
