use std::sync::Mutex;

use crate::classification::types::CommandRecord;

/// Cross-session command database.
///
/// Append-only: records from every session land here in arrival order and
/// existing entries are never mutated. Reporting collaborators read it
/// through snapshots; read-your-writes consistency across sessions is not
/// promised and not needed.
#[derive(Default)]
pub struct CommandDatabase {
    records: Mutex<Vec<CommandRecord>>,
}

impl CommandDatabase {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn append(&self, record: CommandRecord) {
        let mut records = match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.push(record);
    }

    /// A point-in-time copy for summaries and exports.
    pub fn snapshot(&self) -> Vec<CommandRecord> {
        let records = match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.clone()
    }

    pub fn len(&self) -> usize {
        match self.records.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::types::Verdict;
    use std::sync::Arc;

    fn record(command: &str) -> CommandRecord {
        CommandRecord::new(
            command,
            &Verdict {
                scores: Some([0.8, 0.1, 0.1]),
                anomalous: false,
            },
        )
    }

    #[test]
    fn test_append_preserves_order() {
        let db = CommandDatabase::new();
        db.append(record("first"));
        db.append(record("second"));
        db.append(record("third"));

        let snapshot = db.snapshot();
        let commands: Vec<&str> = snapshot.iter().map(|r| r.command.as_str()).collect();
        assert_eq!(commands, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_concurrent_appends_all_land() {
        let db = Arc::new(CommandDatabase::new());
        let mut tasks = Vec::new();
        for i in 0..8 {
            let db = Arc::clone(&db);
            tasks.push(tokio::spawn(async move {
                for j in 0..25 {
                    db.append(record(&format!("cmd-{}-{}", i, j)));
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(db.len(), 200);
    }
}
