use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use serde_json::json;
use tokio::io::AsyncBufReadExt;

use crate::auth::AuthPolicy;
use crate::classification::anomaly::FileAnomalySink;
use crate::classification::database::CommandDatabase;
use crate::classification::dispatcher::CommandTriage;
use crate::classification::oracle::{ClassificationOracle, LexiconOracle};
use crate::configuration::config::Config;
use crate::enrichment::geo::{GeoLocator, MaxMindLocator, NullLocator};
use crate::error_handling::types::ControllerError;
use crate::generation::dispatch::ResponseDispatch;
use crate::generation::history::ConversationStore;
use crate::generation::provider::OpenAiGenerator;
use crate::logging::context::SessionContext;
use crate::logging::event_log::EventLog;
use crate::network::listener::SshListener;
use crate::risk;
use crate::session::engine::SessionEngine;

/// Builds the collaborator graph from a validated configuration and owns
/// the server-scoped state: the event log, the cross-session command
/// database and the conversation-history store all live here and are
/// injected into the session engine, never reached through globals.
pub struct Controller {
    pub config: Config,
    engine: Arc<SessionEngine>,
    event_log: Arc<EventLog>,
    database: Arc<CommandDatabase>,
}

impl Controller {
    pub fn new(config: Config) -> Result<Self, ControllerError> {
        let event_log = Arc::new(EventLog::open(
            &config.honeypot.log_file,
            &config.honeypot.sensor_name,
        )?);

        // Location enrichment is best-effort: a configured-but-broken
        // database degrades to "Unknown" rather than refusing to start.
        let locator: Arc<dyn GeoLocator> = match &config.honeypot.geoip_database {
            Some(path) => match MaxMindLocator::open(path) {
                Ok(locator) => Arc::new(locator),
                Err(e) => {
                    warn!("GeoIP database unavailable ({}); locations will read Unknown", e);
                    Arc::new(NullLocator)
                }
            },
            None => Arc::new(NullLocator),
        };

        let oracle: Arc<dyn ClassificationOracle> = match &config.classifier.lexicon_file {
            Some(path) => Arc::new(LexiconOracle::from_file(path)?),
            None => Arc::new(LexiconOracle::new()),
        };

        let database = Arc::new(CommandDatabase::new());
        let sink = Arc::new(FileAnomalySink::open(&config.honeypot.anomaly_file)?);
        let triage = Arc::new(CommandTriage::new(oracle, Arc::clone(&database), sink));

        if !config.llm.provider.eq_ignore_ascii_case("openai") {
            return Err(ControllerError::InitializationFailed(format!(
                "invalid LLM provider '{}'; only openai-compatible endpoints are supported",
                config.llm.provider
            )));
        }
        let generator = Arc::new(
            OpenAiGenerator::new(&config.llm)
                .map_err(|e| ControllerError::InitializationFailed(e.to_string()))?,
        );
        let dispatch = Arc::new(ResponseDispatch::new(
            generator,
            Arc::new(ConversationStore::new()),
            config.llm.system_prompt.clone(),
            config.llm.trimmer_max_tokens,
        ));

        let auth = Arc::new(AuthPolicy::new(config.accounts.clone()));

        let engine = Arc::new(SessionEngine::new(
            Arc::clone(&event_log),
            locator,
            triage,
            dispatch,
            auth,
            Duration::from_secs(config.ssh.idle_timeout_secs),
        ));

        Ok(Self {
            config,
            engine,
            event_log,
            database,
        })
    }

    /// Starts the admin monitor and serves SSH connections until the
    /// process ends. Only bind/host-key failures return here; everything
    /// that happens inside a session stays inside that session.
    pub async fn run(self) -> Result<(), ControllerError> {
        let ctx = SessionContext::for_process(Arc::clone(&self.event_log));
        ctx.info_fields(
            "SSH honeypot server is running",
            json!({"port": self.config.ssh.port}),
        );

        let database = Arc::clone(&self.database);
        tokio::spawn(async move {
            monitor_admin(database).await;
        });

        let listener = SshListener::new(Arc::clone(&self.engine), &self.config.ssh);
        listener.run().await?;
        Ok(())
    }
}

/// Console monitor for the operator running the sensor: typing `S` prints
/// a summary of all attacker commands collected so far, across sessions.
async fn monitor_admin(database: Arc<CommandDatabase>) {
    let stdin = tokio::io::stdin();
    let mut lines = tokio::io::BufReader::new(stdin).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().eq_ignore_ascii_case("s") {
            let summary = risk::summarize(&database.snapshot());
            info!("defender summary requested");
            println!("\n=== DEFENDER SESSION SUMMARY ===");
            println!("{}", summary.render());
            println!("================================\n");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::types::{HoneypotSection, SshSection};
    use tempfile::tempdir;

    #[test]
    fn test_controller_builds_collaborator_graph() {
        let dir = tempdir().unwrap();
        let config = Config {
            honeypot: HoneypotSection {
                sensor_name: String::from("lab"),
                log_file: dir.path().join("events.jsonl"),
                anomaly_file: dir.path().join("anomalies.jsonl"),
                geoip_database: None,
            },
            ssh: SshSection::default(),
            llm: Default::default(),
            classifier: Default::default(),
            accounts: [(String::from("alice"), String::new())].into_iter().collect(),
        };

        let controller = Controller::new(config).unwrap();
        assert!(controller.database.is_empty());
        assert_eq!(controller.config.honeypot.sensor_name, "lab");
    }

    #[test]
    fn test_unknown_llm_provider_is_fatal() {
        let dir = tempdir().unwrap();
        let mut llm = crate::configuration::types::LlmSection::default();
        llm.provider = String::from("parrot");

        let config = Config {
            honeypot: HoneypotSection {
                sensor_name: String::from("lab"),
                log_file: dir.path().join("events.jsonl"),
                anomaly_file: dir.path().join("anomalies.jsonl"),
                geoip_database: None,
            },
            ssh: SshSection::default(),
            llm,
            classifier: Default::default(),
            accounts: [(String::from("alice"), String::new())].into_iter().collect(),
        };

        match Controller::new(config) {
            Err(ControllerError::InitializationFailed(_)) => {}
            other => panic!("expected InitializationFailed, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_broken_geoip_database_is_not_fatal() {
        let dir = tempdir().unwrap();
        let bogus = dir.path().join("not-a-database.mmdb");
        std::fs::write(&bogus, b"definitely not maxmind data").unwrap();

        let config = Config {
            honeypot: HoneypotSection {
                sensor_name: String::from("lab"),
                log_file: dir.path().join("events.jsonl"),
                anomaly_file: dir.path().join("anomalies.jsonl"),
                geoip_database: Some(bogus),
            },
            ssh: SshSection::default(),
            llm: Default::default(),
            classifier: Default::default(),
            accounts: [(String::from("alice"), String::new())].into_iter().collect(),
        };

        assert!(Controller::new(config).is_ok());
    }
}
