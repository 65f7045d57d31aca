use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::error::Result;
use crate::llm::{self, CompletionService};
use crate::prompt;
use crate::scraper::{self, Fetch};

/// Progress of a single run. Nothing moves backwards; `Invoked` and
/// `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Loading,
    Built,
    Invoked,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Loading => "loading",
            Stage::Built => "built",
            Stage::Invoked => "invoked",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub url: String,
    pub title: String,
    pub word_count: usize,
    pub model: String,
    #[serde(rename = "summary_markdown")]
    pub markdown: String,
    pub generated_at: DateTime<Utc>,
}

/// Terminal state of one run alongside its result.
#[derive(Debug)]
pub struct Run {
    pub stage: Stage,
    pub result: Result<Summary>,
}

pub struct Pipeline<F, C> {
    fetcher: F,
    service: C,
}

impl<F: Fetch, C: CompletionService> Pipeline<F, C> {
    pub fn new(fetcher: F, service: C) -> Self {
        Self { fetcher, service }
    }

    pub fn summarize(&self, url: &str) -> Result<Summary> {
        self.execute(url).result
    }

    /// Runs every stage in order and reports where the run ended up.
    #[instrument(skip(self))]
    pub fn execute(&self, url: &str) -> Run {
        let mut stage = Stage::Idle;
        match self.run(url, &mut stage) {
            Ok(summary) => Run {
                stage,
                result: Ok(summary),
            },
            Err(err) => {
                error!(stage = %stage, error = %err, "pipeline failed");
                Run {
                    stage: Stage::Failed,
                    result: Err(err),
                }
            }
        }
    }

    fn run(&self, url: &str, stage: &mut Stage) -> Result<Summary> {
        *stage = Stage::Loading;
        let document = scraper::load(&self.fetcher, url)?;
        let word_count = document.word_count();
        info!(title = %document.title, word_count, "document loaded");

        let instructions = prompt::build(&document);
        *stage = Stage::Built;
        info!(prompt_chars = instructions.user().content.len(), "prompt built");

        let markdown = llm::invoke(&self.service, &instructions)?;
        *stage = Stage::Invoked;
        info!(chars = markdown.len(), "summary received");

        Ok(Summary {
            url: document.url,
            title: document.title,
            word_count,
            model: self.service.model().to_string(),
            markdown,
            generated_at: Utc::now(),
        })
    }
}
