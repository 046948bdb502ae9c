use std::sync::Arc;

use crate::agent::Agent;
use crate::model_client::ModelClient;
use crate::tool::{AnyTool, Tool, ToolObject};

/// Builder type for [`Agent`].
pub struct AgentBuilder {
    name: String,
    role: String,
    instructions: Vec<String>,
    model_client: ModelClient,
    tool: Option<Arc<dyn ToolObject>>,
}

impl AgentBuilder {
    #[inline]
    pub(crate) fn new(model_client: ModelClient) -> Self {
        Self {
            name: "agent".to_owned(),
            role: String::new(),
            instructions: Vec::new(),
            model_client,
            tool: None,
        }
    }

    /// Sets the name of the agent.
    #[inline]
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the role of the agent, typically a one-line persona
    /// description.
    #[inline]
    pub fn with_role<S: Into<String>>(mut self, role: S) -> Self {
        self.role = role.into();
        self
    }

    /// Appends an instruction to the agent's system prompt.
    #[inline]
    pub fn add_instruction<S: Into<String>>(mut self, instruction: S) -> Self {
        self.instructions.push(instruction.into());
        self
    }

    /// Sets the tool the agent can call. An agent carries at most one
    /// tool; calling this again replaces the previous one.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tool = Some(Arc::new(AnyTool(tool)));
        self
    }

    /// Builds the configured agent.
    #[inline]
    pub fn build(self) -> Agent {
        Agent {
            name: self.name,
            role: self.role,
            instructions: self.instructions,
            model_client: self.model_client,
            tool: self.tool,
        }
    }
}
