//! Task registry
//!
//! An explicit mapping from task name to handler function, built once at
//! startup. Dispatching a task name submits a job to the broker interface;
//! the handler only runs later, when a worker claims the record.

use crate::crawler::{ContentBudget, CrawlSummary};
use crate::jobs::tracker::TrackerProgress;
use crate::jobs::{AppContext, JobTracker};
use crate::store::{JobRecord, JobStore};
use crate::NewsrakeError;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// Task name of the article crawl
pub const TASK_CRAWL_ARTICLES: &str = "crawl_articles";

/// Boxed future a task handler returns
pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = Result<CrawlSummary, NewsrakeError>> + 'a>>;

/// A task handler: a plain function from context and job record to a run
pub type TaskHandler = for<'a> fn(&'a AppContext, &'a JobRecord) -> TaskFuture<'a>;

/// Registry holding the mapping between task names and their handlers
///
/// Built once at startup and never mutated afterward; workers dispatch by
/// capability lookup rather than any registration side effect.
pub struct TaskRegistry {
    handlers: HashMap<&'static str, TaskHandler>,
}

impl TaskRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Creates the registry with every built-in task registered
    pub fn with_builtin_tasks() -> Self {
        let mut registry = Self::new();
        registry.register(TASK_CRAWL_ARTICLES, crawl_articles);
        registry
    }

    /// Registers a handler under a task name
    pub fn register(&mut self, name: &'static str, handler: TaskHandler) {
        self.handlers.insert(name, handler);
        tracing::debug!("Registered task handler: {}", name);
    }

    /// Looks up the handler for a task name
    pub fn lookup(&self, name: &str) -> Option<TaskHandler> {
        self.handlers.get(name).copied()
    }

    /// Checks whether a task name has a handler
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Returns all registered task names, sorted
    pub fn task_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Submits a job for a registered task
    ///
    /// Dispatch never executes the handler in-process: it validates the task
    /// name against the registry and hands the record to the broker.
    pub fn dispatch<S: JobStore>(
        &self,
        tracker: &JobTracker<S>,
        task: &str,
        max_chars: Option<u64>,
    ) -> Result<String, NewsrakeError> {
        if !self.contains(task) {
            return Err(NewsrakeError::UnknownTask(task.to_string()));
        }
        Ok(tracker.submit(task, max_chars)?)
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Handler for the article crawl task
///
/// The per-job budget override wins over the configured default; progress
/// flows back through the tracker while the engine runs.
fn crawl_articles<'a>(ctx: &'a AppContext, job: &'a JobRecord) -> TaskFuture<'a> {
    Box::pin(async move {
        let max_chars = job.max_chars.or(ctx.config.crawl.budget_max_chars);
        let mut budget = ContentBudget::new(max_chars);
        let progress = TrackerProgress::new(&ctx.tracker, &job.id);
        ctx.engine.run(&mut budget, &progress).await
    })
}
