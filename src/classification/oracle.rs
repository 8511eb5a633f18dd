use std::collections::HashMap;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use regex::Regex;

use crate::classification::types::Verdict;
use crate::error_handling::types::ClassifierError;

/// The scoring oracle contract.
///
/// Implementations are treated as black boxes: given a command they return
/// a three-class score vector (or nothing when the input cannot be scored)
/// and an anomaly flag. Calls may be slow, so the contract is async and
/// callers must degrade gracefully on error.
#[async_trait]
pub trait ClassificationOracle: Send + Sync {
    async fn classify(&self, command: &str) -> Result<Verdict, ClassifierError>;
}

/// Deterministic in-process oracle over a token lexicon.
///
/// Each known token contributes a weight vector over the three classes;
/// the command's score vector is the normalized sum. A command whose tokens
/// are mostly unknown is flagged anomalous rather than scored: more than
/// half unknown, or more than three unknown tokens in total.
pub struct LexiconOracle {
    lexicon: HashMap<String, [f32; 3]>,
    tokenizer: Regex,
}

const UNKNOWN_RATIO_LIMIT: f32 = 0.5;
const UNKNOWN_COUNT_LIMIT: usize = 3;

impl LexiconOracle {
    pub fn new() -> Self {
        Self {
            lexicon: builtin_lexicon(),
            tokenizer: token_pattern(),
        }
    }

    /// Loads a lexicon file with one `token benign suspicious malicious`
    /// entry per line. Blank lines and `#` comments are skipped.
    pub fn from_file(path: &Path) -> Result<Self, ClassifierError> {
        let raw = fs::read_to_string(path).map_err(ClassifierError::LexiconError)?;
        let mut lexicon = HashMap::new();

        for (number, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let token = parts
                .next()
                .ok_or_else(|| ClassifierError::ScoringFailed(format!("line {}", number + 1)))?;
            let mut weights = [0.0f32; 3];
            for weight in weights.iter_mut() {
                let field = parts.next().ok_or_else(|| {
                    ClassifierError::ScoringFailed(format!(
                        "lexicon line {} is missing weights",
                        number + 1
                    ))
                })?;
                *weight = field.parse().map_err(|_| {
                    ClassifierError::ScoringFailed(format!(
                        "lexicon line {} has a non-numeric weight",
                        number + 1
                    ))
                })?;
            }
            lexicon.insert(token.to_lowercase(), weights);
        }

        if lexicon.is_empty() {
            return Err(ClassifierError::ScoringFailed(String::from(
                "lexicon file contains no entries",
            )));
        }

        Ok(Self {
            lexicon,
            tokenizer: token_pattern(),
        })
    }

    fn score(&self, command: &str) -> Verdict {
        let tokens: Vec<String> = self
            .tokenizer
            .find_iter(command)
            .map(|m| m.as_str().to_lowercase())
            .collect();

        if tokens.is_empty() {
            return Verdict {
                scores: None,
                anomalous: true,
            };
        }

        let mut sum = [0.0f32; 3];
        let mut unknown = 0usize;
        for token in &tokens {
            match self.lexicon.get(token) {
                Some(weights) => {
                    for (acc, w) in sum.iter_mut().zip(weights.iter()) {
                        *acc += w;
                    }
                }
                None => unknown += 1,
            }
        }

        let ratio = unknown as f32 / tokens.len() as f32;
        let anomalous = ratio > UNKNOWN_RATIO_LIMIT || unknown > UNKNOWN_COUNT_LIMIT;

        if unknown == tokens.len() {
            // Nothing recognized at all; no meaningful vector to report.
            return Verdict {
                scores: None,
                anomalous: true,
            };
        }

        let total: f32 = sum.iter().sum();
        let scores = if total > 0.0 {
            [sum[0] / total, sum[1] / total, sum[2] / total]
        } else {
            [1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0]
        };

        Verdict {
            scores: Some(scores),
            anomalous,
        }
    }
}

impl Default for LexiconOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClassificationOracle for LexiconOracle {
    async fn classify(&self, command: &str) -> Result<Verdict, ClassifierError> {
        Ok(self.score(command))
    }
}

fn token_pattern() -> Regex {
    // Shell words, paths and flag tokens; everything else is separator noise.
    Regex::new(r"[A-Za-z0-9_./*-]+").expect("token pattern is valid")
}

fn builtin_lexicon() -> HashMap<String, [f32; 3]> {
    let entries: &[(&str, [f32; 3])] = &[
        // Everyday shell activity.
        ("ls", [0.85, 0.10, 0.05]),
        ("pwd", [0.85, 0.10, 0.05]),
        ("cd", [0.85, 0.10, 0.05]),
        ("whoami", [0.75, 0.20, 0.05]),
        ("id", [0.75, 0.20, 0.05]),
        ("date", [0.85, 0.10, 0.05]),
        ("uptime", [0.85, 0.10, 0.05]),
        ("uname", [0.70, 0.25, 0.05]),
        ("hostname", [0.75, 0.20, 0.05]),
        ("echo", [0.80, 0.15, 0.05]),
        ("cat", [0.70, 0.20, 0.10]),
        ("ps", [0.70, 0.25, 0.05]),
        ("top", [0.80, 0.15, 0.05]),
        ("df", [0.85, 0.10, 0.05]),
        ("du", [0.85, 0.10, 0.05]),
        ("history", [0.70, 0.25, 0.05]),
        ("man", [0.90, 0.07, 0.03]),
        ("help", [0.90, 0.07, 0.03]),
        ("clear", [0.90, 0.07, 0.03]),
        ("exit", [0.90, 0.07, 0.03]),
        ("quit", [0.90, 0.07, 0.03]),
        ("w", [0.80, 0.15, 0.05]),
        ("who", [0.80, 0.15, 0.05]),
        ("grep", [0.70, 0.25, 0.05]),
        ("find", [0.60, 0.30, 0.10]),
        ("tar", [0.60, 0.30, 0.10]),
        // Reconnaissance and staging.
        ("sudo", [0.20, 0.55, 0.25]),
        ("ssh", [0.30, 0.55, 0.15]),
        ("scp", [0.25, 0.55, 0.20]),
        ("ftp", [0.25, 0.55, 0.20]),
        ("telnet", [0.20, 0.55, 0.25]),
        ("nc", [0.10, 0.50, 0.40]),
        ("netcat", [0.10, 0.50, 0.40]),
        ("nmap", [0.05, 0.55, 0.40]),
        ("ping", [0.50, 0.40, 0.10]),
        ("curl", [0.25, 0.55, 0.20]),
        ("wget", [0.20, 0.55, 0.25]),
        ("chmod", [0.25, 0.50, 0.25]),
        ("chown", [0.25, 0.50, 0.25]),
        ("base64", [0.20, 0.55, 0.25]),
        ("python", [0.35, 0.50, 0.15]),
        ("python3", [0.35, 0.50, 0.15]),
        ("perl", [0.30, 0.50, 0.20]),
        ("bash", [0.35, 0.50, 0.15]),
        ("sh", [0.35, 0.50, 0.15]),
        ("crontab", [0.15, 0.55, 0.30]),
        ("kill", [0.25, 0.55, 0.20]),
        ("service", [0.30, 0.50, 0.20]),
        ("systemctl", [0.30, 0.50, 0.20]),
        ("netstat", [0.30, 0.55, 0.15]),
        ("ifconfig", [0.45, 0.45, 0.10]),
        ("env", [0.55, 0.40, 0.05]),
        // Destruction and credential theft.
        ("rm", [0.05, 0.25, 0.70]),
        ("dd", [0.10, 0.30, 0.60]),
        ("mkfs", [0.05, 0.15, 0.80]),
        ("shred", [0.05, 0.15, 0.80]),
        ("useradd", [0.10, 0.35, 0.55]),
        ("userdel", [0.10, 0.30, 0.60]),
        ("passwd", [0.15, 0.40, 0.45]),
        ("iptables", [0.10, 0.40, 0.50]),
        ("insmod", [0.05, 0.30, 0.65]),
        ("rmmod", [0.05, 0.30, 0.65]),
        ("tcpdump", [0.10, 0.45, 0.45]),
        ("/etc/passwd", [0.05, 0.35, 0.60]),
        ("/etc/shadow", [0.02, 0.18, 0.80]),
        // Frequent arguments, so plain flag usage does not read as unknown.
        ("-l", [0.85, 0.10, 0.05]),
        ("-la", [0.85, 0.10, 0.05]),
        ("-a", [0.80, 0.15, 0.05]),
        ("-f", [0.40, 0.40, 0.20]),
        ("-r", [0.40, 0.40, 0.20]),
        ("-rf", [0.05, 0.25, 0.70]),
        ("/", [0.40, 0.35, 0.25]),
        ("/tmp", [0.35, 0.45, 0.20]),
        ("*", [0.40, 0.40, 0.20]),
    ];

    entries
        .iter()
        .map(|(token, weights)| (token.to_string(), *weights))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::types::Classification;

    #[tokio::test]
    async fn test_benign_command_scores_benign() {
        let oracle = LexiconOracle::new();
        let verdict = oracle.classify("ls -la").await.unwrap();
        assert!(!verdict.anomalous);
        assert_eq!(Classification::normalize(&verdict), Classification::Benign);
    }

    #[tokio::test]
    async fn test_destructive_command_scores_malicious() {
        let oracle = LexiconOracle::new();
        let verdict = oracle.classify("rm -rf /").await.unwrap();
        assert!(!verdict.anomalous);
        assert_eq!(
            Classification::normalize(&verdict),
            Classification::Malicious
        );
    }

    #[tokio::test]
    async fn test_empty_command_is_anomalous() {
        let oracle = LexiconOracle::new();
        let verdict = oracle.classify("   ").await.unwrap();
        assert_eq!(verdict.scores, None);
        assert!(verdict.anomalous);
    }

    #[tokio::test]
    async fn test_unrecognized_gibberish_is_anomalous() {
        let oracle = LexiconOracle::new();
        let verdict = oracle.classify("xyzzy plugh qwfp zzkt").await.unwrap();
        assert!(verdict.anomalous);
        assert_eq!(
            Classification::normalize(&verdict),
            Classification::Anomalous
        );
    }

    #[tokio::test]
    async fn test_mostly_unknown_tokens_flag_anomaly() {
        let oracle = LexiconOracle::new();
        // One known token, three unknown: ratio 0.75 crosses the limit.
        let verdict = oracle.classify("ls qqqq wwww eeee").await.unwrap();
        assert!(verdict.anomalous);
    }

    #[tokio::test]
    async fn test_score_vector_is_normalized() {
        let oracle = LexiconOracle::new();
        let verdict = oracle.classify("cat /etc/shadow").await.unwrap();
        let scores = verdict.scores.unwrap();
        let total: f32 = scores.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_lexicon_file_parsing() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "frobnicate 0.1 0.2 0.7").unwrap();
        let oracle = LexiconOracle::from_file(file.path()).unwrap();
        assert_eq!(
            oracle.lexicon.get("frobnicate"),
            Some(&[0.1f32, 0.2f32, 0.7f32])
        );
    }

    #[test]
    fn test_lexicon_file_rejects_bad_weights() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "frobnicate 0.1 oops 0.7").unwrap();
        assert!(LexiconOracle::from_file(file.path()).is_err());
    }
}
