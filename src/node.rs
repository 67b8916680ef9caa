//! Item-stream harness around the dispatcher.
//!
//! Items process sequentially in input order, one invocation each. Output
//! normally maps one item per input; a spread SELECT instead appends one
//! item per per-statement result, and a continue-on-fail failure appends an
//! error-annotated echo of the input.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::dispatcher;
use crate::error::{NodeRunError, SqliteNodeError};
use crate::statement::resolve_kind;
use crate::types::{Invocation, QueryKind, QueryOutcome};

/// One item flowing through the node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// The JSON payload.
    pub json: JsonValue,
    /// Error text, set on continue-on-fail items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Index of the input item a failure item pairs with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paired_item: Option<usize>,
}

impl Item {
    /// Create an item carrying only a payload.
    #[must_use]
    pub fn new(json: JsonValue) -> Self {
        Self {
            json,
            error: None,
            paired_item: None,
        }
    }
}

/// Raw node parameters for one item, as the surrounding engine supplies
/// them: the argument mapping still in JSON text form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeParameters {
    /// Path to the database file.
    pub database_path: String,
    /// Statement kind hint.
    pub query_type: QueryKind,
    /// The SQL text.
    pub query_text: String,
    /// Named arguments as a JSON object text.
    pub arguments: String,
    /// Flatten per-statement SELECT results into the output list.
    pub spread: bool,
}

impl Default for NodeParameters {
    fn default() -> Self {
        Self {
            database_path: String::new(),
            query_type: QueryKind::Auto,
            query_text: String::new(),
            arguments: "{}".to_string(),
            spread: false,
        }
    }
}

impl NodeParameters {
    /// Parse the argument text and build the invocation for one item.
    ///
    /// # Errors
    ///
    /// `SqliteNodeError::ArgumentParse` when the text is not valid JSON,
    /// `SqliteNodeError::Validation` when it parses to something other than
    /// an object.
    pub fn resolve(&self) -> Result<Invocation, SqliteNodeError> {
        let arguments = parse_arguments(&self.arguments)?;
        Ok(Invocation::new(
            self.database_path.clone(),
            self.query_type,
            self.query_text.clone(),
            arguments,
            self.spread,
        ))
    }
}

fn parse_arguments(text: &str) -> Result<Map<String, JsonValue>, SqliteNodeError> {
    match serde_json::from_str::<JsonValue>(text)? {
        JsonValue::Object(map) => Ok(map),
        other => Err(SqliteNodeError::Validation(format!(
            "arguments must be a JSON object, got {other}"
        ))),
    }
}

/// Run the node over an input item list.
///
/// `parameters` resolves the node parameters for a given item index, the
/// way a workflow engine evaluates per-item expressions. With
/// `continue_on_fail`, a failing item contributes an output item carrying
/// its original payload, the error text, and its index, and processing
/// moves on; otherwise the run aborts with the failing index attached.
///
/// # Errors
///
/// Returns `NodeRunError` for the first failing item when
/// `continue_on_fail` is off.
pub async fn run<P>(
    items: &[Item],
    parameters: P,
    continue_on_fail: bool,
) -> Result<Vec<Item>, NodeRunError>
where
    P: Fn(usize) -> NodeParameters,
{
    let mut output = Vec::with_capacity(items.len());
    for (item_index, item) in items.iter().enumerate() {
        let params = parameters(item_index);
        match run_one(&params).await {
            Ok(outcome) => append_outcome(&mut output, &params, outcome),
            Err(source) => {
                if continue_on_fail {
                    debug!(item_index, error = %source, "item failed, continuing");
                    output.push(Item {
                        json: item.json.clone(),
                        error: Some(source.to_string()),
                        paired_item: Some(item_index),
                    });
                } else {
                    return Err(NodeRunError { item_index, source });
                }
            }
        }
    }
    Ok(output)
}

async fn run_one(params: &NodeParameters) -> Result<QueryOutcome, SqliteNodeError> {
    let invocation = params.resolve()?;
    dispatcher::execute(&invocation).await
}

fn append_outcome(output: &mut Vec<Item>, params: &NodeParameters, outcome: QueryOutcome) {
    let kind = resolve_kind(params.query_type, &params.query_text);
    if params.spread && kind == QueryKind::Select {
        for result in outcome.into_results() {
            output.push(Item::new(spread_payload(result.into_json())));
        }
    } else {
        output.push(Item::new(outcome.into_json()));
    }
}

/// Shape one per-statement payload for spread output: arrays nest under an
/// `items` key, anything else passes through unwrapped.
#[must_use]
pub fn spread_payload(payload: JsonValue) -> JsonValue {
    if payload.is_array() {
        serde_json::json!({ "items": payload })
    } else {
        payload
    }
}
