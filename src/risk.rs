//! Risk aggregation over classified command logs.
//!
//! Summaries are derived on demand from a command-log snapshot and are never
//! stored independently of their source log.

use crate::classification::types::{Classification, CommandRecord};

/// Counts and weighted risk score for one command-log snapshot.
///
/// Anomalous commands count toward the total but carry no weight in the
/// numerator; the score stays within `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskSummary {
    pub total: usize,
    pub benign: usize,
    pub suspicious: usize,
    pub malicious: usize,
    pub anomalous: usize,
}

impl RiskSummary {
    /// `(malicious + 0.5 * suspicious) / total * 100`, or 0 for empty logs.
    pub fn risk_score(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.malicious as f64 + 0.5 * self.suspicious as f64) / self.total as f64 * 100.0
    }

    /// Human-readable summary, one decimal place on the score.
    pub fn render(&self) -> String {
        if self.total == 0 {
            return String::from("No commands issued.");
        }
        format!(
            "Session Summary: {} total commands. Benign: {}, Suspicious: {}, Malicious: {}. Risk Score: {:.1}%",
            self.total, self.benign, self.suspicious, self.malicious,
            self.risk_score()
        )
    }
}

impl std::fmt::Display for RiskSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Pure function of a command-log snapshot.
pub fn summarize(log: &[CommandRecord]) -> RiskSummary {
    let mut summary = RiskSummary {
        total: log.len(),
        benign: 0,
        suspicious: 0,
        malicious: 0,
        anomalous: 0,
    };
    for record in log {
        match record.classification {
            Classification::Benign => summary.benign += 1,
            Classification::Suspicious => summary.suspicious += 1,
            Classification::Malicious => summary.malicious += 1,
            Classification::Anomalous => summary.anomalous += 1,
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::types::Verdict;

    fn record(classification: Classification) -> CommandRecord {
        let verdict = match classification {
            Classification::Benign => Verdict {
                scores: Some([0.8, 0.1, 0.1]),
                anomalous: false,
            },
            Classification::Suspicious => Verdict {
                scores: Some([0.1, 0.8, 0.1]),
                anomalous: false,
            },
            Classification::Malicious => Verdict {
                scores: Some([0.1, 0.1, 0.8]),
                anomalous: false,
            },
            Classification::Anomalous => Verdict {
                scores: None,
                anomalous: true,
            },
        };
        CommandRecord::new("cmd", &verdict)
    }

    #[test]
    fn test_empty_log_renders_no_commands() {
        let summary = summarize(&[]);
        assert_eq!(summary.render(), "No commands issued.");
        assert_eq!(summary.risk_score(), 0.0);
    }

    #[test]
    fn test_one_of_each_scores_fifty() {
        let log = vec![
            record(Classification::Benign),
            record(Classification::Suspicious),
            record(Classification::Malicious),
        ];
        let summary = summarize(&log);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.benign, 1);
        assert_eq!(summary.suspicious, 1);
        assert_eq!(summary.malicious, 1);
        assert!((summary.risk_score() - 50.0).abs() < 1e-9);
        assert!(summary.render().contains("Risk Score: 50.0%"));
    }

    #[test]
    fn test_all_malicious_scores_hundred() {
        let log = vec![record(Classification::Malicious)];
        let summary = summarize(&log);
        assert!((summary.risk_score() - 100.0).abs() < 1e-9);
        assert!(summary.render().contains("Risk Score: 100.0%"));
    }

    #[test]
    fn test_anomalous_counts_in_total_only() {
        let log = vec![
            record(Classification::Anomalous),
            record(Classification::Malicious),
        ];
        let summary = summarize(&log);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.anomalous, 1);
        assert!((summary.risk_score() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_stays_in_range() {
        let log = vec![
            record(Classification::Malicious),
            record(Classification::Suspicious),
            record(Classification::Suspicious),
        ];
        let summary = summarize(&log);
        let score = summary.risk_score();
        assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn test_summary_is_pure_over_snapshot() {
        let log = vec![record(Classification::Benign)];
        let first = summarize(&log);
        let second = summarize(&log);
        assert_eq!(first, second);
    }
}
