use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use codex_config::{OutputConfig, SinkKind, WikiConfig};
use codex_core::{CodexError, Result};

use crate::review::AcceptedPrd;

/// What a sink receives: the accepted draft, rendered once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deliverable {
    pub title: String,
    /// `prd-<feature-slug>.md`
    pub file_name: String,
    pub markdown: String,
}

impl Deliverable {
    pub fn new(accepted: &AcceptedPrd, slug: &str) -> Self {
        Self {
            title: format!("PRD: {}", accepted.draft().title()),
            file_name: format!("prd-{slug}.md"),
            markdown: accepted.render(),
        }
    }
}

/// A delivery target.
///
/// Fails with `SinkUnavailable` when the integration is not configured or
/// not present on this machine, and with `DeliveryFailed` when it is there
/// but the write did not succeed.
#[async_trait]
pub trait Sink: Send + Sync {
    fn kind(&self) -> SinkKind;

    /// Deliver and return where the document ended up, if it has a location.
    async fn deliver(&self, doc: &Deliverable) -> Result<Option<String>>;
}

fn unavailable(sink: SinkKind, reason: impl Into<String>) -> CodexError {
    CodexError::SinkUnavailable {
        sink: sink.to_string(),
        reason: reason.into(),
    }
}

fn failed(sink: SinkKind, reason: impl Into<String>) -> CodexError {
    CodexError::DeliveryFailed {
        sink: sink.to_string(),
        reason: reason.into(),
    }
}

// ── File ───────────────────────────────────────────────────────

pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl Sink for FileSink {
    fn kind(&self) -> SinkKind {
        SinkKind::File
    }

    async fn deliver(&self, doc: &Deliverable) -> Result<Option<String>> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| failed(self.kind(), format!("{}: {e}", self.dir.display())))?;
        let path = self.dir.join(&doc.file_name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            warn!(path = %path.display(), "replacing existing PRD file");
        }
        tokio::fs::write(&path, &doc.markdown)
            .await
            .map_err(|e| failed(self.kind(), format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), "PRD written");
        Ok(Some(path.display().to_string()))
    }
}

// ── Clipboard ──────────────────────────────────────────────────

/// Copies through the platform clipboard command.
pub struct ClipboardSink {
    command: Option<Vec<String>>,
}

impl ClipboardSink {
    /// Use the first clipboard command found on `PATH`.
    pub fn detect() -> Self {
        Self {
            command: detect_clipboard_command(),
        }
    }

    /// Use an explicit command line, e.g. `["xclip", "-selection", "clipboard"]`.
    pub fn with_command(command: Vec<String>) -> Self {
        Self {
            command: (!command.is_empty()).then_some(command),
        }
    }
}

fn clipboard_candidates() -> Vec<&'static [&'static str]> {
    if cfg!(target_os = "macos") {
        vec![&["pbcopy"]]
    } else if cfg!(windows) {
        vec![&["clip"]]
    } else {
        let mut c: Vec<&'static [&'static str]> = Vec::new();
        if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            c.push(&["wl-copy"]);
        }
        c.push(&["xclip", "-selection", "clipboard"]);
        c.push(&["xsel", "--clipboard", "--input"]);
        c
    }
}

fn detect_clipboard_command() -> Option<Vec<String>> {
    let path = std::env::var_os("PATH")?;
    let dirs: Vec<PathBuf> = std::env::split_paths(&path).collect();
    clipboard_candidates()
        .into_iter()
        .find(|cmd| dirs.iter().any(|d| is_executable(&d.join(cmd[0]))))
        .map(|cmd| cmd.iter().map(|s| s.to_string()).collect())
}

fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}

#[async_trait]
impl Sink for ClipboardSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Clipboard
    }

    async fn deliver(&self, doc: &Deliverable) -> Result<Option<String>> {
        let Some((program, args)) = self.command.as_ref().and_then(|c| c.split_first()) else {
            return Err(unavailable(self.kind(), "no clipboard command found"));
        };
        debug!(program, "copying PRD to clipboard");

        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => unavailable(self.kind(), format!("{program} not found")),
                _ => failed(self.kind(), format!("{program}: {e}")),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(doc.markdown.as_bytes())
                .await
                .map_err(|e| failed(self.kind(), format!("{program}: {e}")))?;
        }
        let status = child
            .wait()
            .await
            .map_err(|e| failed(self.kind(), format!("{program}: {e}")))?;
        if !status.success() {
            return Err(failed(self.kind(), format!("{program} exited with {status}")));
        }
        Ok(None)
    }
}

// ── Wiki ───────────────────────────────────────────────────────

/// A stalled wiki counts as unreachable.
const WIKI_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Creates a page through a Confluence-style REST API.
pub struct WikiSink {
    config: WikiConfig,
    client: reqwest::Client,
}

impl WikiSink {
    pub fn new(config: WikiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn page_body(&self, doc: &Deliverable, space: &str) -> serde_json::Value {
        let mut html = String::new();
        let parser = pulldown_cmark::Parser::new_ext(&doc.markdown, pulldown_cmark::Options::ENABLE_TABLES);
        pulldown_cmark::html::push_html(&mut html, parser);

        let mut body = json!({
            "type": "page",
            "title": doc.title,
            "space": { "key": space },
            "body": {
                "storage": { "value": html, "representation": "storage" }
            }
        });
        if let Some(ref parent) = self.config.parent_page_id {
            body["ancestors"] = json!([{ "id": parent }]);
        }
        body
    }
}

#[async_trait]
impl Sink for WikiSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Wiki
    }

    async fn deliver(&self, doc: &Deliverable) -> Result<Option<String>> {
        if !self.config.is_configured() {
            return Err(unavailable(self.kind(), "wiki integration is not configured"));
        }
        let (Some(base), Some(space), Some(token)) =
            (&self.config.base_url, &self.config.space, &self.config.token)
        else {
            return Err(unavailable(self.kind(), "wiki integration is not configured"));
        };
        let base = base.trim_end_matches('/');
        let url = format!("{base}/rest/api/content");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(token)
            .timeout(WIKI_TIMEOUT)
            .header("Content-Type", "application/json")
            .json(&self.page_body(doc, space))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    unavailable(self.kind(), format!("{url}: {e}"))
                } else {
                    failed(self.kind(), format!("HTTP error: {e}"))
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(failed(self.kind(), format!("{status}: {}", text.trim())));
        }

        let page: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| failed(self.kind(), format!("unreadable response: {e}")))?;
        let location = match (page["_links"]["base"].as_str(), page["_links"]["webui"].as_str()) {
            (Some(b), Some(w)) => Some(format!("{b}{w}")),
            _ => page["id"].as_str().map(|id| format!("{base}/pages/viewpage.action?pageId={id}")),
        };
        info!(location = ?location, "wiki page created");
        Ok(location)
    }
}

// ── Display ────────────────────────────────────────────────────

/// Prints the document. Always available.
pub struct DisplaySink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl DisplaySink {
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out: Mutex::new(out) }
    }
}

#[async_trait]
impl Sink for DisplaySink {
    fn kind(&self) -> SinkKind {
        SinkKind::Display
    }

    async fn deliver(&self, doc: &Deliverable) -> Result<Option<String>> {
        let mut out = self.out.lock();
        out.write_all(doc.markdown.as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| failed(SinkKind::Display, e.to_string()))?;
        Ok(None)
    }
}

// ── Adapter ────────────────────────────────────────────────────

/// Outcome of one delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub requested: SinkKind,
    pub delivered: SinkKind,
    pub location: Option<String>,
    /// Set when the requested sink was unavailable and display was used instead.
    pub fallback_reason: Option<String>,
    /// Exactly what was delivered.
    pub content: String,
}

/// Routes an accepted PRD to a sink, falling back to display when the
/// requested sink is unavailable. Failed writes are never retried here.
pub struct PersistenceAdapter {
    sinks: HashMap<SinkKind, Box<dyn Sink>>,
}

impl PersistenceAdapter {
    /// Sinks built from configuration, printing to stdout for display.
    pub fn from_config(output: &OutputConfig, wiki: &WikiConfig) -> Self {
        Self::empty()
            .with_sink(Box::new(FileSink::new(output.dir.clone())))
            .with_sink(Box::new(ClipboardSink::detect()))
            .with_sink(Box::new(WikiSink::new(wiki.clone())))
            .with_sink(Box::new(DisplaySink::stdout()))
    }

    pub fn empty() -> Self {
        Self { sinks: HashMap::new() }
    }

    /// Register `sink`, replacing any sink of the same kind.
    pub fn with_sink(mut self, sink: Box<dyn Sink>) -> Self {
        self.sinks.insert(sink.kind(), sink);
        self
    }

    pub async fn deliver(&self, accepted: &AcceptedPrd, slug: &str, kind: SinkKind) -> Result<DeliveryReport> {
        let doc = Deliverable::new(accepted, slug);
        let attempt = match self.sinks.get(&kind) {
            Some(sink) => sink.deliver(&doc).await,
            None => Err(unavailable(kind, "no sink registered")),
        };

        match attempt {
            Ok(location) => Ok(DeliveryReport {
                requested: kind,
                delivered: kind,
                location,
                fallback_reason: None,
                content: doc.markdown,
            }),
            Err(err @ CodexError::SinkUnavailable { .. }) if kind != SinkKind::Display => {
                warn!(sink = %kind, error = %err, "sink unavailable, falling back to display");
                let display = self
                    .sinks
                    .get(&SinkKind::Display)
                    .ok_or_else(|| unavailable(SinkKind::Display, "no sink registered"))?;
                let location = display.deliver(&doc).await?;
                Ok(DeliveryReport {
                    requested: kind,
                    delivered: SinkKind::Display,
                    location,
                    fallback_reason: Some(err.to_string()),
                    content: doc.markdown,
                })
            }
            Err(err) => Err(err),
        }
    }
}
