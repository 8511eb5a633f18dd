use std::sync::Arc;

use serde_json::json;

use crate::classification::anomaly::AnomalySink;
use crate::classification::database::CommandDatabase;
use crate::classification::oracle::ClassificationOracle;
use crate::classification::types::{Classification, CommandRecord, Verdict};
use crate::logging::context::SessionContext;

/// Classification dispatch.
///
/// Submits a command to the scoring oracle, normalizes the verdict into the
/// fixed taxonomy, records the result in the session's command log and the
/// cross-session database, and forwards anomalies to the sink without
/// holding up the calling session.
pub struct CommandTriage {
    oracle: Arc<dyn ClassificationOracle>,
    database: Arc<CommandDatabase>,
    sink: Arc<dyn AnomalySink>,
}

impl CommandTriage {
    pub fn new(
        oracle: Arc<dyn ClassificationOracle>,
        database: Arc<CommandDatabase>,
        sink: Arc<dyn AnomalySink>,
    ) -> Self {
        Self {
            oracle,
            database,
            sink,
        }
    }

    pub fn database(&self) -> &Arc<CommandDatabase> {
        &self.database
    }

    /// Classifies one command and applies every required side effect.
    ///
    /// An oracle failure is not fatal: it degrades to an unscored verdict,
    /// which normalization turns into `ANOMALOUS`.
    pub async fn classify_command(
        &self,
        ctx: &SessionContext,
        session_log: &mut Vec<CommandRecord>,
        command: &str,
    ) -> CommandRecord {
        let verdict = match self.oracle.classify(command).await {
            Ok(verdict) => verdict,
            Err(e) => {
                ctx.error_fields(
                    "Classification oracle failed",
                    json!({"command": command, "error": e.to_string()}),
                );
                Verdict::unscored()
            }
        };

        let record = CommandRecord::new(command, &verdict);

        session_log.push(record.clone());
        self.database.append(record.clone());

        ctx.info_fields(
            "Command Classified",
            json!({
                "command": record.command,
                "classification": record.classification.as_str(),
                "prediction": prediction_field(&record.scores),
            }),
        );

        if record.classification == Classification::Anomalous {
            let sink = Arc::clone(&self.sink);
            let raw = record.command.clone();
            // Forwarding must not block the session beyond issuing the call.
            tokio::spawn(async move {
                if let Err(e) = sink.record(&raw).await {
                    log::warn!("anomaly sink write failed: {}", e);
                }
            });
        }

        record
    }
}

fn prediction_field(scores: &Option<[f32; 3]>) -> String {
    match scores {
        Some(scores) => format!("[{}, {}, {}]", scores[0], scores[1], scores[2]),
        None => String::from("None"),
    }
}
