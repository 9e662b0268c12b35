/**
 * The captured event payload.
 *
 * Plain serializable data: the ingestion backend defines the schema, the
 * SDK just ships it. The only validation the SDK performs is the
 * submission-time prompt check in `AInsights::capture`: either
 * `messages` or a `template` must be present.
 */

use serde::Serialize;
use serde_json::{Map, Value};

/**
 * One captured AI interaction.
 *
 * Two ways to describe the prompt:
 * - Recommended: `template` (the prompt template) + `inputs` (the values
 *   substituted into it).
 * - Fallback: `messages`, the raw messages argument as passed to the
 *   model client.
 *
 * # Example
 * ```ignore
 * let event = InsightEvent::new(response_json)
 *     .template("Summarize: {text}")
 *     .input("text", "...")
 *     .user_id("user-42");
 * ```
 */
#[derive(Clone, Debug, Default, Serialize)]
pub struct InsightEvent {
    /// The model's response, as returned by the vendor client.
    pub response: Value,

    /// Raw prompt messages, when template/inputs are unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Value>,

    /// The prompt template with formatting placeholders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<Value>,

    /// The values substituted into the template.
    pub inputs: Map<String, Value>,

    /// Additional arguments used in the interaction.
    pub args: Map<String, Value>,

    /// Free-form metadata associated with the interaction.
    pub meta: Map<String, Value>,

    /// Identifier of the user who initiated the interaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl InsightEvent {
    pub fn new(response: Value) -> Self {
        Self {
            response,
            ..Self::default()
        }
    }

    pub fn messages(mut self, messages: impl Into<Value>) -> Self {
        self.messages = Some(messages.into());
        self
    }

    pub fn template(mut self, template: impl Into<Value>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn input(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inputs.insert(key.into(), value.into());
        self
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}
