use std::cell::RefCell;
use std::future::ready;
use std::sync::LazyLock;

use ensemble_model::{ErrorKind, ModelMessage, ToolCallRequest};
use ensemble_test_model::{PresetEvent, PresetResponse, ScriptedProvider};
use serde::Deserialize;
use serde_json::{Value, json};

use super::*;
use crate::tool::{self, Tool, ToolResult};

static PRICE_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "type": "object",
        "properties": {
            "symbols": { "type": "string" }
        },
        "required": ["symbols"]
    })
});

struct PriceTool;

#[derive(Deserialize)]
struct PriceInput {
    symbols: String,
}

impl Tool for PriceTool {
    type Input = PriceInput;

    fn name(&self) -> &str {
        "market_data"
    }

    fn description(&self) -> &str {
        "Fetches spot prices for the given symbols."
    }

    fn parameter_schema(&self) -> &Value {
        &PRICE_SCHEMA
    }

    fn execute(
        &self,
        input: PriceInput,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        ready(Ok(format!("{}: $50000", input.symbols)))
    }
}

struct BrokenTool;

impl Tool for BrokenTool {
    type Input = PriceInput;

    fn name(&self) -> &str {
        "market_data"
    }

    fn description(&self) -> &str {
        "Always fails."
    }

    fn parameter_schema(&self) -> &Value {
        &PRICE_SCHEMA
    }

    fn execute(
        &self,
        _input: PriceInput,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        ready(Err(tool::Error::execution_error()
            .with_reason("upstream timed out")))
    }
}

fn price_tool_call() -> PresetEvent {
    PresetEvent::ToolCall(ToolCallRequest {
        id: "tool:1".to_owned(),
        name: "market_data".to_owned(),
        arguments: json!({ "symbols": "btc" }),
    })
}

#[tokio::test]
async fn test_plain_response() {
    let provider = ScriptedProvider::default();
    provider.push_response(PresetResponse::with_events([
        PresetEvent::MessageDelta("Hello ".to_owned()),
        PresetEvent::MessageDelta("there!".to_owned()),
    ]));

    let agent = Agent::builder(ModelClient::new(provider.clone()))
        .with_name("greeter")
        .with_role("You are a friendly greeter.")
        .add_instruction("Keep responses short.")
        .build();

    let chunks = RefCell::new(Vec::new());
    let resp = agent
        .respond("Hi", |chunk| chunks.borrow_mut().push(chunk.to_owned()))
        .await
        .unwrap();
    assert_eq!(resp, "Hello there!");
    assert_eq!(*chunks.borrow(), ["Hello ", "there!"]);

    // The system prompt carries the role and the instruction bullets.
    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    let ModelMessage::System(system) = &requests[0].messages[0] else {
        panic!("expected a system message");
    };
    assert!(system.starts_with("You are a friendly greeter."));
    assert!(system.contains("- Keep responses short."));
}

#[tokio::test]
async fn test_tool_round_trip() {
    let provider = ScriptedProvider::default();
    provider.push_response(PresetResponse::with_events([
        PresetEvent::MessageDelta("Let me check. ".to_owned()),
        price_tool_call(),
    ]));
    provider.push_response(PresetResponse::with_text("BTC is at $50000."));

    let agent = Agent::builder(ModelClient::new(provider.clone()))
        .with_name("analyst")
        .with_tool(PriceTool)
        .build();

    let resp = agent.respond("How is BTC doing?", |_| {}).await.unwrap();
    assert_eq!(resp, "Let me check. BTC is at $50000.");

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].tools.len(), 1);
    assert_eq!(requests[0].tools[0].name, "market_data");

    // The follow-up request replays the assistant turn and the tool
    // result.
    let messages = &requests[1].messages;
    let ModelMessage::Assistant(assistant) = &messages[2] else {
        panic!("expected an assistant message");
    };
    assert_eq!(assistant.content, "Let me check. ");
    assert_eq!(assistant.tool_calls.len(), 1);
    let ModelMessage::Tool(result) = &messages[3] else {
        panic!("expected a tool result message");
    };
    assert_eq!(result.id, "tool:1");
    assert_eq!(result.content, "btc: $50000");
}

#[tokio::test]
async fn test_unknown_tool_reported_to_model() {
    let provider = ScriptedProvider::default();
    provider.push_response(PresetResponse::with_events([PresetEvent::ToolCall(
        ToolCallRequest {
            id: "tool:1".to_owned(),
            name: "time_machine".to_owned(),
            arguments: json!({}),
        },
    )]));
    provider.push_response(PresetResponse::with_text("Never mind."));

    let agent = Agent::builder(ModelClient::new(provider.clone()))
        .with_tool(PriceTool)
        .build();

    let resp = agent.respond("Hi", |_| {}).await.unwrap();
    assert_eq!(resp, "Never mind.");

    let requests = provider.requests();
    let ModelMessage::Tool(result) = &requests[1].messages[3] else {
        panic!("expected a tool result message");
    };
    assert_eq!(result.content, "Error: unknown tool 'time_machine'");
}

#[tokio::test]
async fn test_tool_failure_reported_to_model() {
    let provider = ScriptedProvider::default();
    provider.push_response(PresetResponse::with_events([price_tool_call()]));
    provider.push_response(PresetResponse::with_text(
        "The data source is unavailable right now.",
    ));

    let agent = Agent::builder(ModelClient::new(provider.clone()))
        .with_tool(BrokenTool)
        .build();

    let resp = agent.respond("How is BTC doing?", |_| {}).await.unwrap();
    assert_eq!(resp, "The data source is unavailable right now.");

    let requests = provider.requests();
    let ModelMessage::Tool(result) = &requests[1].messages[3] else {
        panic!("expected a tool result message");
    };
    assert_eq!(result.content, "Error: upstream timed out");
}

#[tokio::test]
async fn test_invalid_tool_input_reported_to_model() {
    let provider = ScriptedProvider::default();
    provider.push_response(PresetResponse::with_events([PresetEvent::ToolCall(
        ToolCallRequest {
            id: "tool:1".to_owned(),
            name: "market_data".to_owned(),
            arguments: json!({ "bogus": 1 }),
        },
    )]));
    provider.push_response(PresetResponse::with_text("Sorry about that."));

    let agent = Agent::builder(ModelClient::new(provider.clone()))
        .with_tool(PriceTool)
        .build();

    agent.respond("How is BTC doing?", |_| {}).await.unwrap();

    let requests = provider.requests();
    let ModelMessage::Tool(result) = &requests[1].messages[3] else {
        panic!("expected a tool result message");
    };
    assert!(result.content.starts_with("Error: "));
}

#[tokio::test]
async fn test_turn_limit() {
    let provider = ScriptedProvider::default();
    for _ in 0..8 {
        provider
            .push_response(PresetResponse::with_events([price_tool_call()]));
    }

    let agent = Agent::builder(ModelClient::new(provider.clone()))
        .with_tool(PriceTool)
        .build();

    let err = agent.respond("How is BTC doing?", |_| {}).await.unwrap_err();
    assert!(matches!(err, RespondError::TurnLimitExceeded));
    assert_eq!(provider.requests().len(), MAX_TURNS);
}

#[tokio::test]
async fn test_provider_failure() {
    let provider = ScriptedProvider::default();
    provider.push_failure(ErrorKind::RateLimitExceeded);

    let agent = Agent::builder(ModelClient::new(provider)).build();

    let err = agent.respond("Hi", |_| {}).await.unwrap_err();
    let RespondError::Provider(err) = err else {
        panic!("expected a provider error");
    };
    assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
}
