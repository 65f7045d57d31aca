use serde::Serialize;

use crate::scraper::Document;

/// Sections requested from the model. The service is asked for them but
/// nothing checks that the reply actually contains them.
pub const SYSTEM_PROMPT: &str = "You are a research paper summarizer. Given the text of a research paper, extract the following:
1) Title and author(s) of the paper.
2) Year the paper was published.
3) Objective or aim of the research, explaining why it was conducted.
4) Background or introduction, explaining the need for the research and any topics the reader should already know about.
5) Type of research, study or experiment.
6) Methods or methodology, explaining what the researchers did.
7) Results and key findings.
8) Conclusion, including limitations and future directions.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Exactly one system message followed by exactly one user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionSequence {
    messages: [Message; 2],
}

impl InstructionSequence {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn system(&self) -> &Message {
        &self.messages[0]
    }

    pub fn user(&self) -> &Message {
        &self.messages[1]
    }
}

pub fn user_prompt_for(document: &Document) -> String {
    let header = format!(
        "You are looking at a research paper titled {}\n\
         The contents of the paper follow. Please provide a short summary of this paper in markdown. \
         If it includes additional headings, summarize those too.\n\n",
        document.title
    );

    // Body goes in whole; nothing is truncated or chunked.
    let mut prompt = String::with_capacity(header.len() + document.text.len());
    prompt.push_str(&header);
    prompt.push_str(&document.text);
    prompt
}

pub fn build(document: &Document) -> InstructionSequence {
    InstructionSequence {
        messages: [
            Message {
                role: Role::System,
                content: SYSTEM_PROMPT.to_string(),
            },
            Message {
                role: Role::User,
                content: user_prompt_for(document),
            },
        ],
    }
}
