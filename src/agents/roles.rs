//! Agent personas and the task each one performs for a query.

/// Persona presented to the model as its system message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentRole {
    /// Short role title.
    pub role: &'static str,
    /// What the agent is trying to achieve.
    pub goal: &'static str,
    /// Background shaping the agent's behaviour.
    pub backstory: &'static str,
    /// Whether the agent may call the paper search tool.
    pub uses_search: bool,
}

impl AgentRole {
    /// System prompt introducing the persona.
    pub fn system_prompt(&self) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role, self.backstory, self.goal
        )
    }
}

/// Unit of work assigned to one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTask {
    /// Instructions for the agent.
    pub description: String,
    /// Shape of the result the agent must return.
    pub expected_output: &'static str,
}

/// Finds the passages of the paper relevant to the query.
pub const RESEARCH_ANALYST: AgentRole = AgentRole {
    role: "Research Analyst",
    goal: "Search and retrieve relevant information from the research paper based on user queries",
    backstory: "You are an expert research analyst with deep knowledge in academic papers. \
Your specialty is finding and extracting precise information from research documents. \
You excel at understanding context and retrieving the most relevant sections.",
    uses_search: true,
};

/// Condenses the research findings.
pub const CONTENT_SUMMARIZER: AgentRole = AgentRole {
    role: "Content Summarizer",
    goal: "Create clear, concise summaries of research paper content",
    backstory: "You are a skilled technical writer who specializes in summarizing \
complex research content into clear, understandable summaries. You maintain \
accuracy while making information accessible.",
    uses_search: false,
};

/// Writes the final cited answer.
pub const QA_SPECIALIST: AgentRole = AgentRole {
    role: "Q&A Specialist",
    goal: "Answer questions comprehensively based on research paper content",
    backstory: "You are an expert at answering questions based on research documents. \
You provide accurate, well-structured answers by synthesizing information from \
multiple sources within the document. You always cite your sources and provide \
context for your answers.",
    uses_search: false,
};

/// Research task for `query`.
pub fn research_task(query: &str) -> AgentTask {
    AgentTask {
        description: format!(
            "Search the research paper for information related to: {query}\n\n\
Find all relevant sections, facts, and details that answer or relate to this query.\n\
Be thorough and comprehensive in your search."
        ),
        expected_output: "A detailed list of relevant information, facts, and sections from the research paper",
    }
}

/// Summary task over the research findings.
pub fn summarize_task() -> AgentTask {
    AgentTask {
        description: "Summarize the research findings provided by the Research Analyst.\n\
Create a clear, well-organized summary that highlights the key points."
            .to_string(),
        expected_output: "A clear and concise summary of the research findings",
    }
}

/// Answer task for `query`.
pub fn answer_task(query: &str) -> AgentTask {
    AgentTask {
        description: format!(
            "Based on the research findings and summary, provide a comprehensive answer to: {query}\n\n\
Your answer should:\n\
1. Directly address the query\n\
2. Include relevant details and context\n\
3. Cite specific information from the research paper\n\
4. Be well-structured and easy to understand"
        ),
        expected_output: "A comprehensive, well-structured answer to the user's query with citations",
    }
}
