//! The agent and its conversation loop.

mod builder;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use ensemble_model::{
    AssistantMessage, ModelMessage, ModelRequest, ToolCallRequest,
    ToolCallResult,
};

pub use builder::AgentBuilder;

use crate::error::RespondError;
use crate::model_client::ModelClient;
use crate::tool::ToolObject;

/// Upper bound on model turns within a single response. The model should
/// normally finish in two turns (one tool call and one summary); hitting
/// this limit means it is stuck in a tool call loop.
const MAX_TURNS: usize = 6;

/// A single assistant persona.
///
/// An agent is an immutable binding of a role, a list of instructions,
/// a model backend and at most one callable tool. It holds no mutable
/// state; each [`respond`] call is an independent session whose tool
/// round-trips live only inside that call.
///
/// [`respond`]: Agent::respond
#[derive(Clone)]
pub struct Agent {
    name: String,
    role: String,
    instructions: Vec<String>,
    model_client: ModelClient,
    tool: Option<Arc<dyn ToolObject>>,
}

impl Agent {
    /// Creates a builder for configuring an agent with the given model
    /// client.
    #[inline]
    pub fn builder(model_client: ModelClient) -> AgentBuilder {
        AgentBuilder::new(model_client)
    }

    /// Returns the name of the agent.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the role of the agent.
    #[inline]
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Responds to the given prompt, streaming text through `on_chunk`
    /// as it arrives and returning the full transcript once the model
    /// stops.
    ///
    /// Tool calls requested by the model are executed inline, and their
    /// results are replayed to the model in a follow-up turn. A tool
    /// failure never aborts the response; the model receives an error
    /// string instead and carries on.
    pub async fn respond(
        &self,
        prompt: &str,
        on_chunk: impl Fn(&str),
    ) -> Result<String, RespondError> {
        let mut messages = vec![
            ModelMessage::System(self.system_prompt()),
            ModelMessage::User(prompt.to_owned()),
        ];
        let tools: Vec<_> =
            self.tool.iter().map(|tool| tool.definition()).collect();

        let mut transcript = String::new();
        for turn in 0..MAX_TURNS {
            trace!("agent '{}' starting turn {turn}", self.name);
            let outcome = self
                .model_client
                .send_request(
                    ModelRequest {
                        messages: messages.clone(),
                        tools: tools.clone(),
                    },
                    &on_chunk,
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
                let content = self.run_tool(&call).await;
                messages.push(ModelMessage::Tool(ToolCallResult {
                    id: call.id,
                    content,
                }));
            }
        }

        warn!("agent '{}' exceeded the turn limit", self.name);
        Err(RespondError::TurnLimitExceeded)
    }

    async fn run_tool(&self, call: &ToolCallRequest) -> String {
        let Some(tool) =
            self.tool.as_ref().filter(|tool| tool.name() == call.name)
        else {
            warn!("model requested an unknown tool: {}", call.name);
            return format!("Error: unknown tool '{}'", call.name);
        };

        debug!("executing tool: {}", call.name);
        match tool.execute(call.arguments.clone()).await {
            Ok(output) => output,
            Err(err) => {
                warn!("tool '{}' failed: {}", call.name, err.reason());
                format!("Error: {}", err.reason())
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
        prompt.trim_end().to_owned()
    }
}
