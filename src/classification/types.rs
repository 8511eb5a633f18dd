use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fixed classification taxonomy.
///
/// Every command receives exactly one of these labels. `Anomalous` is
/// reserved for commands the oracle could not score with confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    #[serde(rename = "BENIGN")]
    Benign,
    #[serde(rename = "SUSPICIOUS")]
    Suspicious,
    #[serde(rename = "MALICIOUS")]
    Malicious,
    #[serde(rename = "ANOMALOUS")]
    Anomalous,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Benign => "BENIGN",
            Classification::Suspicious => "SUSPICIOUS",
            Classification::Malicious => "MALICIOUS",
            Classification::Anomalous => "ANOMALOUS",
        }
    }

    /// Normalizes a raw oracle verdict into a label.
    ///
    /// An absent score vector or a set anomaly flag forces `Anomalous`
    /// regardless of any score content. Otherwise the label is the argmax
    /// over the ordered classes [BENIGN, SUSPICIOUS, MALICIOUS], first
    /// maximum winning on ties.
    pub fn normalize(verdict: &Verdict) -> Classification {
        if verdict.anomalous {
            return Classification::Anomalous;
        }
        let scores = match verdict.scores {
            Some(scores) => scores,
            None => return Classification::Anomalous,
        };

        let mut best = 0;
        for (idx, score) in scores.iter().enumerate() {
            if *score > scores[best] {
                best = idx;
            }
        }
        match best {
            0 => Classification::Benign,
            1 => Classification::Suspicious,
            _ => Classification::Malicious,
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw oracle output before normalization: a three-class score vector
/// (absent when the oracle could not score the input) and an anomaly flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub scores: Option<[f32; 3]>,
    pub anomalous: bool,
}

impl Verdict {
    /// Verdict used when the oracle itself failed: unscoreable input.
    pub fn unscored() -> Self {
        Self {
            scores: None,
            anomalous: true,
        }
    }
}

/// One classified command. Immutable once appended to a log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub command: String,
    pub timestamp: DateTime<Utc>,
    pub classification: Classification,
    pub scores: Option<[f32; 3]>,
    pub anomalous: bool,
}

impl CommandRecord {
    pub fn new(command: &str, verdict: &Verdict) -> Self {
        Self {
            command: command.to_string(),
            timestamp: crate::logging::record::now_millis(),
            classification: Classification::normalize(verdict),
            scores: verdict.scores,
            anomalous: verdict.anomalous,
        }
    }
}
