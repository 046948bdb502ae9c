use ensemble_model::{ModelMessage, ModelRequest, ModelTool};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{HostedConfig, SearchParameters};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct FunctionDelta {
    pub name: Option<String>,
    pub arguments: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ToolCallDelta {
    pub index: Option<u32>,
    pub id: Option<String>,
    pub function: Option<FunctionDelta>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Choice {
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Delta {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct FunctionTool {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct Tool {
    r#type: &'static str,
    function: FunctionTool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FunctionPayload {
    pub name: String,
    /// The arguments, encoded as a JSON string per the wire format.
    pub arguments: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ToolCallPayload {
    pub id: String,
    pub r#type: &'static str,
    pub function: FunctionPayload,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<ToolCallPayload>>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search_parameters: Option<SearchParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_options: Option<StreamOptions>,
    stream: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct StreamOptions {
    include_usage: bool,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    req: &ModelRequest,
    config: &HostedConfig,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: config.model.clone(),
        messages: req.messages.iter().map(create_message).collect(),
        tools: req.tools.iter().map(create_tool).collect(),
        search_parameters: config.search_parameters,
        stream_options: Some(StreamOptions {
            include_usage: true,
        }),
        stream: true,
    }
}

#[inline]
fn create_message(msg: &ModelMessage) -> Message {
    match msg {
        ModelMessage::System(content) => Message::System {
            content: content.clone(),
        },
        ModelMessage::User(content) => Message::User {
            content: content.clone(),
        },
        ModelMessage::Assistant(msg) => {
            let tool_calls = if msg.tool_calls.is_empty() {
                None
            } else {
                Some(
                    msg.tool_calls
                        .iter()
                        .map(|call| ToolCallPayload {
                            id: call.id.clone(),
                            r#type: "function",
                            function: FunctionPayload {
                                name: call.name.clone(),
                                arguments: call.arguments.to_string(),
                            },
                        })
                        .collect(),
                )
            };
            let content = if msg.content.is_empty() && tool_calls.is_some() {
                None
            } else {
                Some(msg.content.clone())
            };
            Message::Assistant {
                content,
                tool_calls,
            }
        }
        ModelMessage::Tool(result) => Message::Tool {
            tool_call_id: result.id.clone(),
            content: result.content.clone(),
        },
    }
}

#[inline]
fn create_tool(tool: &ModelTool) -> Tool {
    Tool {
        r#type: "function",
        function: FunctionTool {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use ensemble_model::{AssistantMessage, ToolCallRequest};
    use serde_json::json;

    use super::*;
    use crate::{HostedConfigBuilder, SearchParameters};

    #[test]
    fn test_create_request() {
        let request = ModelRequest {
            messages: vec![
                ModelMessage::System("You are a weather agent.".to_owned()),
                ModelMessage::User("Weather in Tokyo?".to_owned()),
            ],
            tools: vec![ModelTool {
                name: "web_search".to_owned(),
                description: "Searches the web.".to_owned(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string" }
                    }
                }),
            }],
        };
        let config = HostedConfigBuilder::with_api_key("xxx")
            .with_model("grok-3")
            .build();
        let payload = create_request(&request, &config);
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["model"], "grok-3");
        assert_eq!(value["stream"], true);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "Weather in Tokyo?");
        assert_eq!(value["tools"][0]["function"]["name"], "web_search");
        assert!(value.get("search_parameters").is_none());
    }

    #[test]
    fn test_search_parameters_payload() {
        let request = ModelRequest {
            messages: vec![ModelMessage::User("Any news?".to_owned())],
            tools: vec![],
        };
        let config = HostedConfigBuilder::with_api_key("xxx")
            .with_search_parameters(SearchParameters::always_on(20))
            .build();
        let value =
            serde_json::to_value(create_request(&request, &config)).unwrap();
        assert_eq!(value["search_parameters"]["mode"], "on");
        assert_eq!(value["search_parameters"]["max_search_results"], 20);
        assert_eq!(value["search_parameters"]["return_citations"], false);
        // Empty tool lists must be omitted entirely.
        assert!(value.get("tools").is_none());
    }

    #[test]
    fn test_assistant_replay_with_tool_calls() {
        let msg = ModelMessage::Assistant(AssistantMessage {
            content: String::new(),
            tool_calls: vec![ToolCallRequest {
                id: "call:1".to_owned(),
                name: "market_data".to_owned(),
                arguments: json!({ "symbols": "btc,eth" }),
            }],
        });
        let value = serde_json::to_value(create_message(&msg)).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["content"], Value::Null);
        assert_eq!(value["tool_calls"][0]["id"], "call:1");
        assert_eq!(value["tool_calls"][0]["type"], "function");
        let arguments =
            value["tool_calls"][0]["function"]["arguments"].as_str().unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(arguments).unwrap(),
            json!({ "symbols": "btc,eth" })
        );
    }
}
