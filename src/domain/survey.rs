//! Survey records: candidates going in, classified records coming out

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::geometry::GeoPoint;
use crate::error::GeoError;

/// Garden likelihood reported by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Likelihood {
    #[default]
    Low,
    Medium,
    High,
}

impl Likelihood {
    /// Parse a classifier answer, falling back to `Low` for anything unexpected
    pub fn parse_or_low(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "low" => Likelihood::Low,
            "medium" => Likelihood::Medium,
            "high" => Likelihood::High,
            other => {
                log::warn!("Unexpected likelihood value {other:?}, defaulting to low");
                Likelihood::Low
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Likelihood::Low => "low",
            Likelihood::Medium => "medium",
            Likelihood::High => "high",
        }
    }
}

impl std::fmt::Display for Likelihood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier output for one image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub reasoning: String,
    pub likelihood: Likelihood,
}

/// An address with its geocoded point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

impl Candidate {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }

    /// The geocoded point, rejected if outside the WGS84 range
    pub fn checked_point(&self) -> Result<GeoPoint, GeoError> {
        GeoPoint::checked(self.lat, self.lng)
    }
}

/// Drop candidates whose coordinates are out of range, logging each one
pub fn retain_valid(candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|candidate| match candidate.checked_point() {
            Ok(_) => true,
            Err(err) => {
                log::warn!("Dropping {}: {err}", candidate.address);
                false
            }
        })
        .collect()
}

/// Persisted state for one address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub address: String,
    #[serde(default)]
    pub likelihood: Option<Likelihood>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl AnalysisRecord {
    /// A record with no analysis yet
    pub fn pending(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            likelihood: None,
            reasoning: None,
            analyzed_at: None,
        }
    }

    /// A record carrying a finished analysis
    pub fn analyzed(address: impl Into<String>, analysis: Analysis) -> Self {
        Self {
            address: address.into(),
            likelihood: Some(analysis.likelihood),
            reasoning: Some(analysis.reasoning),
            analyzed_at: Some(Utc::now()),
        }
    }

    /// Analysis is complete once a likelihood has been stored
    pub fn is_complete(&self) -> bool {
        self.likelihood.is_some()
    }
}

/// Likelihood counts over a batch of records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl Summary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a AnalysisRecord>) -> Self {
        let mut summary = Summary::default();
        for record in records {
            match record.likelihood {
                Some(Likelihood::Low) => summary.low += 1,
                Some(Likelihood::Medium) => summary.medium += 1,
                Some(Likelihood::High) => summary.high += 1,
                None => {}
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_likelihood() {
        assert_eq!(Likelihood::parse_or_low("high"), Likelihood::High);
        assert_eq!(Likelihood::parse_or_low(" Medium "), Likelihood::Medium);
        assert_eq!(Likelihood::parse_or_low("LOW"), Likelihood::Low);
        assert_eq!(Likelihood::parse_or_low("very high"), Likelihood::Low);
        assert_eq!(Likelihood::parse_or_low(""), Likelihood::Low);
    }

    #[test]
    fn test_likelihood_serde_lowercase() {
        let json = serde_json::to_string(&Likelihood::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
        let back: Likelihood = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(back, Likelihood::High);
    }

    #[test]
    fn test_record_completeness() {
        let pending = AnalysisRecord::pending("12 Smith St");
        assert!(!pending.is_complete());

        let done = AnalysisRecord::analyzed(
            "12 Smith St",
            Analysis {
                reasoning: "raised beds".to_string(),
                likelihood: Likelihood::High,
            },
        );
        assert!(done.is_complete());
        assert!(done.analyzed_at.is_some());
    }

    #[test]
    fn test_retain_valid_drops_out_of_range() {
        let candidate = |address: &str, lat, lng| Candidate {
            address: address.to_string(),
            lat,
            lng,
        };
        let kept = retain_valid(vec![
            candidate("1 Ok St", -36.08, 146.92),
            candidate("2 Bad St", -136.08, 146.92),
            candidate("3 Nan St", f64::NAN, 146.92),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].address, "1 Ok St");

        let err = candidate("2 Bad St", -136.08, 146.92).checked_point().unwrap_err();
        assert_eq!(
            err,
            GeoError::InvalidCoordinate {
                lat: -136.08,
                lng: 146.92
            }
        );
    }

    #[test]
    fn test_summary_counts() {
        let analyzed = |likelihood| {
            AnalysisRecord::analyzed(
                "x",
                Analysis {
                    reasoning: String::new(),
                    likelihood,
                },
            )
        };
        let records = vec![
            analyzed(Likelihood::Low),
            analyzed(Likelihood::High),
            analyzed(Likelihood::High),
            AnalysisRecord::pending("y"),
        ];
        let summary = Summary::from_records(&records);
        assert_eq!(
            summary,
            Summary {
                low: 1,
                medium: 0,
                high: 2
            }
        );
        assert_eq!(summary.total(), 3);
    }
}
