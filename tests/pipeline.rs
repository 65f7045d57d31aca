use std::cell::{Cell, RefCell};
use std::env::VarError;

use paper_summarizer::config::Config;
use paper_summarizer::error::{AppError, Result};
use paper_summarizer::llm::{CompletionService, OpenAiClient};
use paper_summarizer::prompt::{InstructionSequence, Role, SYSTEM_PROMPT};
use paper_summarizer::scraper::{Fetch, RawPage};
use paper_summarizer::{Pipeline, Stage};
use pretty_assertions::assert_eq;

const SAMPLE_PAGE: &str =
    "<html><head><title>Sample</title></head><body><p>Hello</p><script>evil()</script></body></html>";

struct StaticFetcher {
    html: String,
    calls: Cell<usize>,
}

impl StaticFetcher {
    fn new(html: &str) -> Self {
        Self {
            html: html.to_string(),
            calls: Cell::new(0),
        }
    }
}

impl Fetch for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<RawPage> {
        self.calls.set(self.calls.get() + 1);
        Ok(RawPage {
            url: url.to_string(),
            content_type: Some("text/html".to_string()),
            html: self.html.clone(),
        })
    }
}

struct UnreachableFetcher;

impl Fetch for UnreachableFetcher {
    fn fetch(&self, url: &str) -> Result<RawPage> {
        Err(AppError::FetchError(format!("dns error: failed to lookup address for {url}")))
    }
}

#[derive(Default)]
struct RecordingService {
    seen: RefCell<Vec<InstructionSequence>>,
}

impl CompletionService for RecordingService {
    fn model(&self) -> &str {
        "mock"
    }

    fn complete(&self, instructions: &InstructionSequence) -> Result<String> {
        self.seen.borrow_mut().push(instructions.clone());
        Ok("# Sample\n\nA summary.".to_string())
    }
}

#[test]
fn sample_page_flows_through_every_stage() {
    let pipeline = Pipeline::new(StaticFetcher::new(SAMPLE_PAGE), RecordingService::default());

    let run = pipeline.execute("https://example.org/sample");
    assert_eq!(run.stage, Stage::Invoked);
    let summary = run.result.unwrap();

    assert_eq!(summary.url, "https://example.org/sample");
    assert_eq!(summary.title, "Sample");
    assert_eq!(summary.word_count, 1);
    assert_eq!(summary.model, "mock");
    assert_eq!(summary.markdown, "# Sample\n\nA summary.");
}

#[test]
fn service_receives_built_instructions() {
    let service = RecordingService::default();
    let fetcher = StaticFetcher::new(SAMPLE_PAGE);
    let pipeline = Pipeline::new(&fetcher, &service);
    pipeline.summarize("https://example.org/sample").unwrap();

    let seen = service.seen.borrow();
    assert_eq!(seen.len(), 1);
    let instructions = &seen[0];
    assert_eq!(instructions.messages().len(), 2);
    assert_eq!(instructions.system().role, Role::System);
    assert_eq!(instructions.system().content, SYSTEM_PROMPT);
    assert_eq!(instructions.user().role, Role::User);
    assert!(instructions.user().content.contains("Sample"));
    assert!(instructions.user().content.ends_with("Hello"));
    assert!(!instructions.user().content.contains("evil()"));
    assert_eq!(fetcher.calls.get(), 1);
}

#[test]
fn fetch_failure_stops_before_the_service() {
    let service = RecordingService::default();
    let pipeline = Pipeline::new(UnreachableFetcher, &service);

    let run = pipeline.execute("http://does-not-resolve.invalid/");
    assert_eq!(run.stage, Stage::Failed);
    assert!(matches!(run.result, Err(AppError::FetchError(_))));
    assert!(service.seen.borrow().is_empty());
}

#[test]
fn parse_failure_stops_before_the_service() {
    let service = RecordingService::default();
    let fetcher = StaticFetcher::new("<html><frameset><frame src=\"a.html\"></frameset></html>");
    let pipeline = Pipeline::new(&fetcher, &service);

    let err = pipeline.summarize("https://example.org/frames").unwrap_err();
    assert!(matches!(err, AppError::ParseError(_)));
    assert!(service.seen.borrow().is_empty());
}

#[test]
fn missing_credential_fails_only_at_invoke() {
    let config = Config::from_lookup(|_| None).unwrap();
    let client = OpenAiClient::new(&config).unwrap();
    let fetcher = StaticFetcher::new(SAMPLE_PAGE);
    let pipeline = Pipeline::new(&fetcher, client);

    let run = pipeline.execute("https://example.org/sample");
    assert_eq!(run.stage, Stage::Failed);
    assert!(matches!(run.result, Err(AppError::ServiceError(_))));
    assert_eq!(fetcher.calls.get(), 1);
}

#[test]
fn unreadable_credential_still_loads_and_builds() {
    let config = Config::from_env(|key| match key {
        "OPENAI_API_KEY" => Err(VarError::NotUnicode("sk\u{fffd}".into())),
        _ => Err(VarError::NotPresent),
    })
    .unwrap();
    let client = OpenAiClient::new(&config).unwrap();
    let fetcher = StaticFetcher::new(SAMPLE_PAGE);
    let pipeline = Pipeline::new(&fetcher, client);

    let run = pipeline.execute("https://example.org/sample");
    assert_eq!(run.stage, Stage::Failed);
    assert!(matches!(run.result, Err(AppError::ServiceError(_))));
    assert_eq!(fetcher.calls.get(), 1);
}
