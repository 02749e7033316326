//! Tagged logging with an optional filter → sink pipeline.
//!
//! Every call on [`Log`] emits a `tracing` event carrying the tag as a field.
//! When a [`LogPipeline`] is attached, the same record is also passed through
//! its filters in order and handed to its sink. The pipeline is assembled
//! once at startup and shared by every component through [`Log`] clones.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Diagnostic detail
    Debug,
    /// Normal progress
    Info,
    /// Something unexpected that the core recovered from
    Warn,
    /// A failure the user may need to act on
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// One line flowing through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Severity
    pub level: LogLevel,
    /// Component tag; filters may strip it
    pub tag: Option<String>,
    /// Rendered message text
    pub message: String,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{} {}: {}", self.level, tag, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// A transform applied to every record before it reaches the sink.
pub trait LogFilter {
    /// Returns the (possibly rewritten) record.
    fn process(&self, record: LogRecord) -> LogRecord;
}

/// Destination at the end of a pipeline.
pub trait LogSink {
    /// Accepts a fully filtered record.
    fn write(&self, record: &LogRecord);
}

/// Strips everything except the message text.
#[derive(Debug, Default, Clone, Copy)]
pub struct MessageOnlyFilter;

impl LogFilter for MessageOnlyFilter {
    fn process(&self, record: LogRecord) -> LogRecord {
        LogRecord { tag: None, ..record }
    }
}

/// In-memory sink that keeps every record it receives.
///
/// # Example
///
/// ```
/// use fit_sensors::logging::{Log, LogPipeline, MemorySink, MessageOnlyFilter};
/// use std::rc::Rc;
///
/// let sink = Rc::new(MemorySink::new());
/// let pipeline = LogPipeline::builder()
///     .filter(MessageOnlyFilter)
///     .sink(sink.clone())
///     .build();
///
/// let log = Log::new("BasicSensorsApi").with_pipeline(pipeline);
/// log.info(format_args!("Ready"));
///
/// assert_eq!(sink.messages(), vec!["Ready".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct MemorySink {
    records: RefCell<Vec<LogRecord>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all records.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.borrow().clone()
    }

    /// Returns just the message text of every record.
    pub fn messages(&self) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .map(|r| r.message.clone())
            .collect()
    }

    /// Returns true if any record's message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.records
            .borrow()
            .iter()
            .any(|r| r.message.contains(needle))
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Drops all stored records.
    pub fn clear(&self) {
        self.records.borrow_mut().clear();
    }
}

impl LogSink for MemorySink {
    fn write(&self, record: &LogRecord) {
        self.records.borrow_mut().push(record.clone());
    }
}

impl<T: LogSink + ?Sized> LogSink for Rc<T> {
    fn write(&self, record: &LogRecord) {
        (**self).write(record);
    }
}

/// Ordered filters feeding a single sink.
pub struct LogPipeline {
    filters: Vec<Box<dyn LogFilter>>,
    sink: Option<Box<dyn LogSink>>,
}

impl LogPipeline {
    /// Starts an empty pipeline.
    pub fn builder() -> LogPipelineBuilder {
        LogPipelineBuilder {
            filters: Vec::new(),
            sink: None,
        }
    }

    fn emit(&self, record: LogRecord) {
        let Some(sink) = &self.sink else {
            return;
        };
        let record = self
            .filters
            .iter()
            .fold(record, |record, filter| filter.process(record));
        sink.write(&record);
    }
}

impl fmt::Debug for LogPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogPipeline")
            .field("filters", &self.filters.len())
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

/// Builder for [`LogPipeline`].
pub struct LogPipelineBuilder {
    filters: Vec<Box<dyn LogFilter>>,
    sink: Option<Box<dyn LogSink>>,
}

impl LogPipelineBuilder {
    /// Appends a filter; filters run in the order they are added.
    pub fn filter(mut self, filter: impl LogFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Sets the sink, replacing any previous one.
    pub fn sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Finishes the pipeline.
    pub fn build(self) -> LogPipeline {
        LogPipeline {
            filters: self.filters,
            sink: self.sink,
        }
    }
}

/// A tagged logger shared by the components of one controller.
///
/// Cloning is cheap; clones share the same pipeline.
#[derive(Debug, Clone)]
pub struct Log {
    tag: Rc<str>,
    pipeline: Option<Rc<LogPipeline>>,
}

impl Log {
    /// Creates a logger that only emits `tracing` events.
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self {
            tag: Rc::from(tag.as_ref()),
            pipeline: None,
        }
    }

    /// Attaches a pipeline that receives a copy of every record.
    pub fn with_pipeline(mut self, pipeline: LogPipeline) -> Self {
        self.pipeline = Some(Rc::new(pipeline));
        self
    }

    /// Returns the tag attached to every record.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Logs a debug-level message.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(tag = %self.tag, "{}", args);
        self.forward(LogLevel::Debug, args);
    }

    /// Logs an info-level message.
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(tag = %self.tag, "{}", args);
        self.forward(LogLevel::Info, args);
    }

    /// Logs a warning-level message.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(tag = %self.tag, "{}", args);
        self.forward(LogLevel::Warn, args);
    }

    /// Logs an error-level message.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(tag = %self.tag, "{}", args);
        self.forward(LogLevel::Error, args);
    }

    fn forward(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        if let Some(pipeline) = &self.pipeline {
            pipeline.emit(LogRecord {
                level,
                tag: Some(self.tag.to_string()),
                message: args.to_string(),
            });
        }
    }
}
