use serde::{Deserialize, Serialize};

/// Token cost of one completion or embedding call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub const fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens.saturating_add(output_tokens),
        }
    }
}

/// Per-request token breakdown.
///
/// `total_in_query` is recomputed from the parts and is billed at most once
/// per non-cached request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsageRecord {
    pub classifier_tokens: u32,
    pub embedding_tokens: u32,
    pub agent_input_tokens: u32,
    pub agent_output_tokens: u32,
    pub total_in_query: u32,
}

impl TokenUsageRecord {
    pub const fn classified(classifier_tokens: u32) -> Self {
        Self {
            classifier_tokens,
            embedding_tokens: 0,
            agent_input_tokens: 0,
            agent_output_tokens: 0,
            total_in_query: classifier_tokens,
        }
    }

    /// Add an agent's usage on top of the classifier tokens.
    #[must_use]
    pub const fn with_agent(mut self, agent: AgentUsage) -> Self {
        self.embedding_tokens = agent.embedding_tokens;
        self.agent_input_tokens = agent.input_tokens;
        self.agent_output_tokens = agent.output_tokens;
        self.total_in_query = self.classifier_tokens
            .saturating_add(self.embedding_tokens)
            .saturating_add(self.agent_input_tokens)
            .saturating_add(self.agent_output_tokens);
        self
    }
}

/// Tokens an agent spent answering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentUsage {
    pub embedding_tokens: u32,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl AgentUsage {
    #[must_use]
    pub const fn with_completion(mut self, usage: TokenUsage) -> Self {
        self.input_tokens = self.input_tokens.saturating_add(usage.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(usage.output_tokens);
        self
    }

    #[must_use]
    pub const fn with_embedding(mut self, tokens: u32) -> Self {
        self.embedding_tokens = self.embedding_tokens.saturating_add(tokens);
        self
    }
}
