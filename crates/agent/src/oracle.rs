//! Reasoning oracle boundary.
//!
//! The control loop only ever sees [`OracleReply`]: assistant text plus zero
//! or more action requests. [`HttpOracle`] speaks the OpenAI-compatible
//! chat-completions dialect; [`ScriptedOracle`] replays canned replies for
//! tests and offline development.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use pagepilot_actions::{ActionRequest, ACTION_NAMES};

use crate::types::{Turn, TurnRole};

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle transport: {0}")]
    Transport(String),

    #[error("malformed oracle reply: {0}")]
    Malformed(String),

    #[error("scripted oracle has no replies left")]
    Exhausted,
}

/// What the oracle said: user-visible text and the actions it wants run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OracleReply {
    pub text: String,
    pub requests: Vec<ActionRequest>,
}

impl OracleReply {
    pub fn say(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            requests: Vec::new(),
        }
    }

    pub fn act(text: impl Into<String>, requests: Vec<ActionRequest>) -> Self {
        Self {
            text: text.into(),
            requests,
        }
    }
}

/// One completion: system framing plus the trimmed conversation.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn complete(&self, system: &str, turns: &[Turn]) -> Result<OracleReply, OracleError>;
}

/// Deterministic oracle that pops pre-scripted replies in order. Running out
/// of script is an error so a test that loops longer than intended fails
/// loudly instead of spinning.
#[derive(Default)]
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<OracleReply>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    pub fn new(replies: impl IntoIterator<Item = OracleReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// System prompts seen so far, one per completion call.
    pub fn prompts_seen(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn complete(&self, system: &str, _turns: &[Turn]) -> Result<OracleReply, OracleError> {
        self.calls.lock().push(system.to_string());
        self.replies
            .lock()
            .pop_front()
            .ok_or(OracleError::Exhausted)
    }
}

#[derive(Clone, Debug)]
pub struct HttpOracleConfig {
    /// Base URL of an OpenAI-compatible API, without the trailing path.
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Per-completion deadline; a slow upstream fails the turn rather than
    /// hanging the loop.
    pub timeout_secs: u64,
}

impl Default for HttpOracleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Chat-completions client with tool-call style responses mapped onto
/// [`ActionRequest`]s.
pub struct HttpOracle {
    client: reqwest::Client,
    config: HttpOracleConfig,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Deserialize)]
struct FunctionCall {
    name: String,
    /// JSON-encoded argument object, as the dialect ships it.
    arguments: String,
}

impl HttpOracle {
    pub fn new(config: HttpOracleConfig) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OracleError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn messages(system: &str, turns: &[Turn]) -> Vec<Value> {
        let mut messages = vec![json!({"role": "system", "content": system})];
        for turn in turns {
            let message = match turn.role {
                TurnRole::User => json!({"role": "user", "content": turn.content}),
                TurnRole::Assistant => json!({"role": "assistant", "content": turn.content}),
                TurnRole::ActionResult => json!({
                    "role": "user",
                    "content": format!("[action results]\n{}", turn.content),
                }),
            };
            messages.push(message);
        }
        messages
    }

    fn tool_declarations() -> Vec<Value> {
        ACTION_NAMES
            .iter()
            .map(|name| {
                json!({
                    "type": "function",
                    "function": {
                        "name": name,
                        "parameters": {"type": "object", "additionalProperties": true},
                    },
                })
            })
            .collect()
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn complete(&self, system: &str, turns: &[Turn]) -> Result<OracleReply, OracleError> {
        let body = json!({
            "model": self.config.model,
            "messages": Self::messages(system, turns),
            "tools": Self::tool_declarations(),
        });

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))?;
        let message = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| OracleError::Malformed("empty choices".into()))?
            .message;

        let mut requests = Vec::with_capacity(message.tool_calls.len());
        for call in message.tool_calls {
            let arguments: Value = serde_json::from_str(&call.function.arguments)
                .map_err(|e| {
                    OracleError::Malformed(format!(
                        "tool call '{}' arguments: {e}",
                        call.function.name
                    ))
                })?;
            requests.push(ActionRequest::new(call.function.name, arguments));
        }
        debug!(
            requests = requests.len(),
            has_text = message.content.is_some(),
            "oracle completion"
        );

        Ok(OracleReply {
            text: message.content.unwrap_or_default(),
            requests,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_oracle_replays_in_order() {
        let oracle = ScriptedOracle::new([
            OracleReply::say("first"),
            OracleReply::act(
                "second",
                vec![ActionRequest::new("launch", json!({"address": "https://a"}))],
            ),
        ]);

        let first = oracle.complete("sys", &[]).await.unwrap();
        assert_eq!(first.text, "first");
        let second = oracle.complete("sys", &[]).await.unwrap();
        assert_eq!(second.requests.len(), 1);

        let err = oracle.complete("sys", &[]).await.unwrap_err();
        assert!(matches!(err, OracleError::Exhausted));
        assert_eq!(oracle.prompts_seen().len(), 3);
    }

    #[test]
    fn turn_mapping_labels_action_results() {
        let turns = vec![
            Turn::user("hi"),
            Turn::assistant("hello"),
            Turn::action_result("click: ok"),
        ];
        let messages = HttpOracle::messages("sys", &turns);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[3]["role"], "user");
        assert!(messages[3]["content"]
            .as_str()
            .unwrap()
            .starts_with("[action results]"));
    }

    #[test]
    fn every_action_is_declared_as_a_tool() {
        let tools = HttpOracle::tool_declarations();
        assert_eq!(tools.len(), ACTION_NAMES.len());
        assert_eq!(tools[0]["function"]["name"], ACTION_NAMES[0]);
    }

    #[test]
    fn tool_call_arguments_parse_from_string_payload() {
        let raw = json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "function": {
                            "name": "launch",
                            "arguments": "{\"address\": \"https://example.com\"}"
                        }
                    }]
                }
            }]
        });
        let parsed: ChatResponse = serde_json::from_value(raw).unwrap();
        let call = &parsed.choices[0].message.tool_calls[0];
        assert_eq!(call.function.name, "launch");
        let arguments: Value = serde_json::from_str(&call.function.arguments).unwrap();
        assert_eq!(arguments["address"], "https://example.com");
    }
}
