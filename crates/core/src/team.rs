//! Teams of agents behind a coordinator model.
//!
//! A team surfaces each member agent to its coordinator model as a tool
//! taking a single `query` string. The coordinator model decides which
//! members to involve and in what order; this module only executes the
//! delegations it asks for and replays each member's transcript back as
//! the tool result.

use std::sync::LazyLock;

use ensemble_model::{
    AssistantMessage, ModelMessage, ModelRequest, ModelTool, ToolCallRequest,
    ToolCallResult,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::agent::Agent;
use crate::error::RespondError;
use crate::model_client::ModelClient;

/// Upper bound on coordinator turns within a single response. Enough for
/// the coordinator to consult every member of the largest team and still
/// write a summary.
const MAX_TURNS: usize = 8;

static MEMBER_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "The task to forward to this member."
            }
        },
        "required": ["query"]
    })
});

#[derive(Deserialize)]
struct MemberQuery {
    query: String,
}

/// A chunk of streamed team output.
///
/// Member chunks are only produced when the team is configured to show
/// member responses.
#[derive(Clone, Copy, Debug)]
pub enum TeamChunk<'a> {
    /// Text produced by the coordinator model itself.
    Coordinator(&'a str),
    /// Text produced by a member agent while handling a delegation.
    Member {
        /// The name of the member.
        name: &'a str,
        /// The text chunk.
        text: &'a str,
    },
}

/// A group of member agents coordinated by their own model backend.
pub struct Team {
    name: String,
    role: String,
    instructions: Vec<String>,
    model_client: ModelClient,
    members: Vec<Agent>,
    show_members_responses: bool,
}

impl Team {
    /// Creates a builder for configuring a team whose coordinator runs
    /// on the given model client.
    #[inline]
    pub fn builder(model_client: ModelClient) -> TeamBuilder {
        TeamBuilder::new(model_client)
    }

    /// Returns the name of the team.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the member agents, in the order they were added.
    #[inline]
    pub fn members(&self) -> impl Iterator<Item = &Agent> {
        self.members.iter()
    }

    /// Responds to the given prompt, streaming output through
    /// `on_chunk` and returning the coordinator's full transcript once
    /// it stops delegating.
    ///
    /// A member failure never aborts the response; the coordinator
    /// receives an error string as the tool result and decides how to
    /// proceed.
    pub async fn respond(
        &self,
        prompt: &str,
        on_chunk: impl Fn(TeamChunk<'_>),
    ) -> Result<String, RespondError> {
        let mut messages = vec![
            ModelMessage::System(self.system_prompt()),
            ModelMessage::User(prompt.to_owned()),
        ];
        let tools: Vec<_> =
            self.members.iter().map(member_tool).collect();

        let mut transcript = String::new();
        for turn in 0..MAX_TURNS {
            trace!("team '{}' starting turn {turn}", self.name);
            let outcome = self
                .model_client
                .send_request(
                    ModelRequest {
                        messages: messages.clone(),
                        tools: tools.clone(),
                    },
                    &|chunk| on_chunk(TeamChunk::Coordinator(chunk)),
                )
                .await?;
            transcript.push_str(&outcome.text);

            if outcome.tool_calls.is_empty() {
                return Ok(transcript);
            }

            messages.push(ModelMessage::Assistant(AssistantMessage {
                content: outcome.text,
                tool_calls: outcome.tool_calls.clone(),
            }));
            for call in outcome.tool_calls {
                let content = self.delegate(&call, &on_chunk).await;
                messages.push(ModelMessage::Tool(ToolCallResult {
                    id: call.id,
                    content,
                }));
            }
        }

        warn!("team '{}' exceeded the turn limit", self.name);
        Err(RespondError::TurnLimitExceeded)
    }

    async fn delegate(
        &self,
        call: &ToolCallRequest,
        on_chunk: &impl Fn(TeamChunk<'_>),
    ) -> String {
        let Some(member) = self
            .members
            .iter()
            .find(|member| member_slug(member.name()) == call.name)
        else {
            warn!("coordinator requested an unknown member: {}", call.name);
            return format!("Error: unknown member '{}'", call.name);
        };

        let query: MemberQuery =
            match serde_json::from_value(call.arguments.clone()) {
                Ok(query) => query,
                Err(err) => {
                    warn!("malformed delegation arguments: {err}");
                    return format!("Error: invalid delegation input: {err}");
                }
            };

        debug!("delegating to member '{}'", member.name());
        let resp = member
            .respond(&query.query, |chunk| {
                if self.show_members_responses {
                    on_chunk(TeamChunk::Member {
                        name: member.name(),
                        text: chunk,
                    });
                }
            })
            .await;
        match resp {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "No response from member.".to_owned(),
            Err(err) => {
                warn!("member '{}' failed: {err}", member.name());
                format!(
                    "Error: member '{}' failed to respond: {err}",
                    member.name()
                )
            }
        }
    }

    fn system_prompt(&self) -> String {
        let mut prompt = self.role.clone();
        if !self.instructions.is_empty() {
            if !prompt.is_empty() {
                prompt.push_str("\n\n");
            }
            prompt.push_str("Instructions:\n");
            for instruction in &self.instructions {
                prompt.push_str("- ");
                prompt.push_str(instruction);
                prompt.push('\n');
            }
        }
        prompt.push_str(
            "\nYou coordinate a team of members. To delegate a task, call \
             the tool named after the member; the tool result is that \
             member's full response.\nMembers:\n",
        );
        for member in &self.members {
            prompt.push_str("- ");
            prompt.push_str(&member_slug(member.name()));
            prompt.push_str(": ");
            prompt.push_str(member.role());
            prompt.push('\n');
        }
        prompt.trim_end().to_owned()
    }
}

/// Builder type for [`Team`].
pub struct TeamBuilder {
    name: String,
    role: String,
    instructions: Vec<String>,
    model_client: ModelClient,
    members: Vec<Agent>,
    show_members_responses: bool,
}

impl TeamBuilder {
    #[inline]
    fn new(model_client: ModelClient) -> Self {
        Self {
            name: "team".to_owned(),
            role: String::new(),
            instructions: Vec::new(),
            model_client,
            members: Vec::new(),
            show_members_responses: false,
        }
    }

    /// Sets the name of the team.
    #[inline]
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the role of the team's coordinator.
    #[inline]
    pub fn with_role<S: Into<String>>(mut self, role: S) -> Self {
        self.role = role.into();
        self
    }

    /// Appends an instruction to the coordinator's system prompt.
    #[inline]
    pub fn add_instruction<S: Into<String>>(mut self, instruction: S) -> Self {
        self.instructions.push(instruction.into());
        self
    }

    /// Adds a member agent to the team.
    #[inline]
    pub fn add_member(mut self, member: Agent) -> Self {
        self.members.push(member);
        self
    }

    /// Sets whether member output is streamed alongside the
    /// coordinator's.
    #[inline]
    pub fn show_members_responses(mut self, show: bool) -> Self {
        self.show_members_responses = show;
        self
    }

    /// Builds the configured team.
    #[inline]
    pub fn build(self) -> Team {
        Team {
            name: self.name,
            role: self.role,
            instructions: self.instructions,
            model_client: self.model_client,
            members: self.members,
            show_members_responses: self.show_members_responses,
        }
    }
}

fn member_tool(member: &Agent) -> ModelTool {
    ModelTool {
        name: member_slug(member.name()),
        description: format!(
            "Delegates a task to {}. {}",
            member.name(),
            member.role()
        ),
        parameters: MEMBER_SCHEMA.clone(),
    }
}

/// Returns the tool name a member of the given name is surfaced under
/// to its coordinator model.
pub fn member_slug(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use ensemble_test_model::{PresetEvent, PresetResponse, ScriptedProvider};

    use super::*;

    fn analyst(provider: &ScriptedProvider) -> Agent {
        Agent::builder(ModelClient::new(provider.clone()))
            .with_name("Market Analyst")
            .with_role("Analyzes market conditions.")
            .build()
    }

    fn delegation_call(name: &str, query: &str) -> PresetEvent {
        PresetEvent::ToolCall(ToolCallRequest {
            id: "tool:1".to_owned(),
            name: name.to_owned(),
            arguments: json!({ "query": query }),
        })
    }

    #[test]
    fn test_member_slug() {
        assert_eq!(member_slug("Market Analyst"), "market_analyst");
        assert_eq!(member_slug("Searcher-2"), "searcher_2");
    }

    #[tokio::test]
    async fn test_delegation_round_trip() {
        let coordinator_provider = ScriptedProvider::default();
        coordinator_provider.push_response(PresetResponse::with_events([
            delegation_call("market_analyst", "check btc"),
        ]));
        coordinator_provider
            .push_response(PresetResponse::with_text("Summary: looks strong."));

        let member_provider = ScriptedProvider::default();
        member_provider
            .push_response(PresetResponse::with_text("BTC looks strong."));

        let team = Team::builder(ModelClient::new(coordinator_provider.clone()))
            .with_name("Desk")
            .with_role("You lead a market desk.")
            .add_member(analyst(&member_provider))
            .show_members_responses(true)
            .build();

        let member_chunks = RefCell::new(Vec::new());
        let resp = team
            .respond("How is the market?", |chunk| {
                if let TeamChunk::Member { name, text } = chunk {
                    member_chunks
                        .borrow_mut()
                        .push((name.to_owned(), text.to_owned()));
                }
            })
            .await
            .unwrap();
        assert_eq!(resp, "Summary: looks strong.");
        assert_eq!(
            *member_chunks.borrow(),
            [("Market Analyst".to_owned(), "BTC looks strong.".to_owned())]
        );

        // The member received the delegated query as its prompt.
        let member_requests = member_provider.requests();
        assert_eq!(member_requests.len(), 1);
        let ModelMessage::User(prompt) = &member_requests[0].messages[1]
        else {
            panic!("expected a user message");
        };
        assert_eq!(prompt, "check btc");

        // The member's transcript came back as the tool result.
        let coordinator_requests = coordinator_provider.requests();
        let ModelMessage::Tool(result) = &coordinator_requests[1].messages[3]
        else {
            panic!("expected a tool result message");
        };
        assert_eq!(result.content, "BTC looks strong.");
    }

    #[tokio::test]
    async fn test_member_roster_offered_as_tools() {
        let coordinator_provider = ScriptedProvider::default();
        coordinator_provider
            .push_response(PresetResponse::with_text("No delegation needed."));

        let member_provider = ScriptedProvider::default();
        let team = Team::builder(ModelClient::new(coordinator_provider.clone()))
            .add_member(analyst(&member_provider))
            .build();

        team.respond("Hi", |_| {}).await.unwrap();

        let requests = coordinator_provider.requests();
        assert_eq!(requests[0].tools.len(), 1);
        assert_eq!(requests[0].tools[0].name, "market_analyst");
        let ModelMessage::System(system) = &requests[0].messages[0] else {
            panic!("expected a system message");
        };
        assert!(system.contains("market_analyst"));
    }

    #[tokio::test]
    async fn test_member_failure_becomes_tool_result() {
        let coordinator_provider = ScriptedProvider::default();
        coordinator_provider.push_response(PresetResponse::with_events([
            delegation_call("market_analyst", "check btc"),
        ]));
        coordinator_provider.push_response(PresetResponse::with_text(
            "The analyst is unavailable right now.",
        ));

        // No scripted responses: the member's backend fails.
        let member_provider = ScriptedProvider::default();
        let team = Team::builder(ModelClient::new(coordinator_provider.clone()))
            .add_member(analyst(&member_provider))
            .build();

        let resp = team.respond("How is the market?", |_| {}).await.unwrap();
        assert_eq!(resp, "The analyst is unavailable right now.");

        let requests = coordinator_provider.requests();
        let ModelMessage::Tool(result) = &requests[1].messages[3] else {
            panic!("expected a tool result message");
        };
        assert!(result.content.starts_with("Error: member 'Market Analyst'"));
    }

    #[tokio::test]
    async fn test_member_output_hidden_by_default() {
        let coordinator_provider = ScriptedProvider::default();
        coordinator_provider.push_response(PresetResponse::with_events([
            delegation_call("market_analyst", "check btc"),
        ]));
        coordinator_provider.push_response(PresetResponse::with_text("Done."));

        let member_provider = ScriptedProvider::default();
        member_provider
            .push_response(PresetResponse::with_text("BTC looks strong."));

        let team = Team::builder(ModelClient::new(coordinator_provider))
            .add_member(analyst(&member_provider))
            .build();

        let saw_member_chunk = RefCell::new(false);
        team.respond("How is the market?", |chunk| {
            if matches!(chunk, TeamChunk::Member { .. }) {
                *saw_member_chunk.borrow_mut() = true;
            }
        })
        .await
        .unwrap();
        assert!(!*saw_member_chunk.borrow());
    }

    #[tokio::test]
    async fn test_unknown_member_becomes_tool_result() {
        let coordinator_provider = ScriptedProvider::default();
        coordinator_provider.push_response(PresetResponse::with_events([
            delegation_call("ghost", "boo"),
        ]));
        coordinator_provider
            .push_response(PresetResponse::with_text("Never mind."));

        let member_provider = ScriptedProvider::default();
        let team = Team::builder(ModelClient::new(coordinator_provider.clone()))
            .add_member(analyst(&member_provider))
            .build();

        team.respond("Hi", |_| {}).await.unwrap();

        let requests = coordinator_provider.requests();
        let ModelMessage::Tool(result) = &requests[1].messages[3] else {
            panic!("expected a tool result message");
        };
        assert_eq!(result.content, "Error: unknown member 'ghost'");
    }
}
