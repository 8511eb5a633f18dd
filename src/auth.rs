//! Authentication policy for inbound connections.
//!
//! The account table is deception bait, not access control: decisions exist
//! to shape which sessions proceed, while every attempted credential pair is
//! recorded either way.

use std::collections::BTreeMap;

use serde_json::json;

use crate::logging::context::SessionContext;

/// Accept/reject policy over the configured account table.
///
/// Rules, in order:
/// - unknown username: reject;
/// - known username with an empty configured password: accept any password;
/// - known username with a nonempty password: accept only an exact match.
///
/// Both the returned decision and the logging side effect are required:
/// every attempt is logged with its credentials before the decision is
/// returned.
pub struct AuthPolicy {
    accounts: BTreeMap<String, String>,
}

impl AuthPolicy {
    pub fn new(accounts: BTreeMap<String, String>) -> Self {
        Self { accounts }
    }

    pub fn authenticate(&self, ctx: &SessionContext, username: &str, password: &str) -> bool {
        let accepted = match self.accounts.get(username) {
            Some(expected) => expected.is_empty() || expected == password,
            None => false,
        };

        if accepted {
            ctx.info_fields(
                "Authentication success",
                json!({"username": username, "password": password}),
            );
        } else {
            ctx.info_fields(
                "Authentication failed",
                json!({"username": username, "password": password}),
            );
        }

        accepted
    }
}
