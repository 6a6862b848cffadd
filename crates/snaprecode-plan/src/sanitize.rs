use serde_json::Value;

use snaprecode_core::types::{Brigade, Quota};

/// Drop live traffic and usage state so the brigade starts clean on its new node.
///
/// Quotas keep only their schema version.
pub fn sanitize(brigade: &mut Brigade) {
    brigade.brigade_counters = Value::Null;
    brigade.stats_counters_stack = Value::Null;
    brigade.endpoints = Value::Null;

    for user in &mut brigade.users {
        user.quotas = Quota {
            ver: user.quotas.ver,
            ..Quota::default()
        };
    }
}
