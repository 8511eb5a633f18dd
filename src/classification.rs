//! Command classification core module.
//!
//! A command entered by a remote party flows through the [`dispatcher`]:
//! the scoring oracle produces a raw verdict, the verdict is normalized
//! into the fixed four-label taxonomy, the resulting record lands in both
//! the session's command log and the cross-session database, and anomalous
//! commands are forwarded to the anomaly sink for later human review.

pub mod anomaly;
pub mod database;
pub mod dispatcher;
pub mod oracle;
pub mod types;

pub use anomaly::{AnomalySink, FileAnomalySink};
pub use database::CommandDatabase;
pub use dispatcher::CommandTriage;
pub use oracle::{ClassificationOracle, LexiconOracle};
pub use types::{Classification, CommandRecord, Verdict};
