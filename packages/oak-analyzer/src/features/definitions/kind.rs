//! Definition kinds
//!
//! Triggers and checkers are aggregated by the same algorithm; a
//! [`DefinitionKind`] supplies what differs: extra fields, the handler
//! property and the rule set the handler is checked against.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::features::consistency::{BoundResultPolicy, RuleSet};
use crate::shared::models::IssueCode;

pub trait DefinitionKind: Send + Sync + 'static {
    type Extra: Clone + fmt::Debug + PartialEq + Serialize + Send + Sync;

    /// Name used in logs and errors
    const INDEX_NAME: &'static str;

    /// Invalidation bus topic
    const TOPIC: &'static str;

    /// Property holding the handler function
    const HANDLER: &'static str;

    const RULES: RuleSet;

    /// Extra fields folded from the definition object
    fn read_extra(fields: &Map<String, Value>) -> Self::Extra;

    /// Whether a bare `return;` is acceptable for this definition
    fn bare_return_allowed(extra: &Self::Extra) -> bool;
}

/// Trigger definitions (`src/triggers`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TriggerExtra {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `before`, `after` or `commit`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    /// Cross-transaction trigger
    pub cs: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

/// Trigger phase in which a handler may end with a bare `return;`
pub const COMMIT_PHASE: &str = "commit";

impl DefinitionKind for Trigger {
    type Extra = TriggerExtra;

    const INDEX_NAME: &'static str = "trigger index";
    const TOPIC: &'static str = "triggers";
    const HANDLER: &'static str = "fn";

    const RULES: RuleSet = RuleSet {
        require_async: Some(IssueCode::TriggerAsyncRequired),
        literal_return: Some(IssueCode::TriggerInvalidReturn),
        missing_return_value: Some(IssueCode::TriggerMissingReturnValue),
        missing_handler: Some(IssueCode::TriggerMissingHandler),
        context_call: IssueCode::TriggerInvalidContextCall,
        bound_result: BoundResultPolicy::Reject,
    };

    fn read_extra(fields: &Map<String, Value>) -> TriggerExtra {
        TriggerExtra {
            name: string_field(fields, "name"),
            when: string_field(fields, "when"),
            cs: fields.get("cs").and_then(Value::as_bool).unwrap_or(false),
            priority: fields.get("priority").and_then(Value::as_i64),
        }
    }

    fn bare_return_allowed(extra: &TriggerExtra) -> bool {
        extra.cs || extra.when.as_deref() == Some(COMMIT_PHASE)
    }
}

/// Checker definitions (`src/checkers`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checker;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckerExtra {
    /// `row`, `data`, `relation`, `logical` or `logicalData`
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub checker_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    pub conditional_filter: bool,
}

impl DefinitionKind for Checker {
    type Extra = CheckerExtra;

    const INDEX_NAME: &'static str = "checker index";
    const TOPIC: &'static str = "checkers";
    const HANDLER: &'static str = "checker";

    const RULES: RuleSet = RuleSet {
        require_async: None,
        literal_return: None,
        missing_return_value: None,
        missing_handler: None,
        context_call: IssueCode::CheckerInvalidContextCall,
        bound_result: BoundResultPolicy::RequireGuard {
            unguarded: IssueCode::CheckerUnguardedPromise,
            destructured: IssueCode::CheckerUnsupportedDestructure,
        },
    };

    fn read_extra(fields: &Map<String, Value>) -> CheckerExtra {
        CheckerExtra {
            checker_type: string_field(fields, "type"),
            priority: fields.get("priority").and_then(Value::as_i64),
            conditional_filter: fields.contains_key("conditionalFilter"),
        }
    }

    fn bare_return_allowed(_extra: &CheckerExtra) -> bool {
        true
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}
