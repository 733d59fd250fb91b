//! PDF export orchestration.
//!
//! One export call is a single self-contained unit of work: validate the raw
//! request body, resolve the quote reference, encode the document into a
//! transport token, drive a headless browser to the print host page carrying
//! that token, and capture the result as A4 PDF bytes. The browser session
//! is scoped to the call and released on every exit path.
//!
//! The capture step sits behind [`CaptureBackend`] so the headless-browser
//! implementation can be swapped (or stubbed in tests) without touching the
//! renderer or this orchestration.

use std::{
    net::TcpListener,
    process::{Child, Command, Stdio},
    sync::Arc,
    thread,
    time::Duration,
};

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use fantoccini::{
    wd::{PrintConfigurationBuilder, PrintMargins, PrintSize},
    Client, ClientBuilder, Locator,
};
use rand::{distributions::Alphanumeric, Rng};
use serde_json::{Map, Value};

use crate::codec;
use crate::error::{AddContext, Error};
use crate::quotation::{QuotationDocument, DEFAULT_CURRENCY};
use crate::wire;

/// CSS selector the capture step waits on before printing, so a blank or
/// half-loaded page is never captured.
const CONTENT_ROOT: &str = "#quotation";

/// Prefix of synthesized quote references.
const REFERENCE_PREFIX: &str = "QT";

const NAVIGATION_BACKOFF: Duration = Duration::from_millis(500);

const FALLBACK_FILENAME: &str = "quotation";

/// Settings for one [`Exporter`].
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// WebDriver endpoint the capture backend connects to.
    pub webdriver_url: String,
    /// Internal URL of the print host page, without the token query.
    pub print_page_url: String,
    pub default_currency: String,
    pub default_tax_rate_percent: BigDecimal,
    pub navigation_timeout: Duration,
    pub content_wait_timeout: Duration,
    /// Bounded retry on navigation failures only; content errors never retry.
    pub navigation_attempts: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
            print_page_url: "http://127.0.0.1:8080/print".to_string(),
            default_currency: DEFAULT_CURRENCY.to_string(),
            default_tax_rate_percent: BigDecimal::from(23),
            navigation_timeout: Duration::from_secs(10),
            content_wait_timeout: Duration::from_secs(10),
            navigation_attempts: 3,
        }
    }
}

/// The binary artifact of one export call.
#[derive(Debug, Clone)]
pub struct ExportedPdf {
    pub bytes: Vec<u8>,
    /// Filesystem-safe attachment name, derived from the resolved reference.
    pub filename: String,
    /// The reference embedded in the rendered document.
    pub reference: String,
}

/// Rendering backend behind the capture step.
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Navigate to `url` and return the page captured as PDF bytes.
    async fn capture(&self, url: &str) -> Result<Vec<u8>, Error>;
}

/// [`CaptureBackend`] driving headless Chrome through a WebDriver session.
pub struct WebDriverCapture {
    webdriver_url: String,
    navigation_timeout: Duration,
    content_wait_timeout: Duration,
    navigation_attempts: u32,
}

impl WebDriverCapture {
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            webdriver_url: config.webdriver_url.clone(),
            navigation_timeout: config.navigation_timeout,
            content_wait_timeout: config.content_wait_timeout,
            navigation_attempts: config.navigation_attempts.max(1),
        }
    }

    async fn connect(&self) -> Result<Client, Error> {
        let mut caps = Map::new();
        // Sandbox flags are required for constrained container environments.
        caps.insert(
            "goog:chromeOptions".to_string(),
            serde_json::json!({
                "args": [
                    "--headless",
                    "--no-sandbox",
                    "--disable-dev-shm-usage",
                    "--disable-gpu",
                ]
            }),
        );
        ClientBuilder::native()
            .capabilities(caps)
            .connect(&self.webdriver_url)
            .await
            .map_err(Error::from)
            .add_context("starting browser session")
    }

}

/// One open page inside a browser session. The WebDriver calls sit behind
/// this seam so [`capture_page`]'s retry and sequencing rules can be
/// exercised without a browser.
#[async_trait]
trait PageSession {
    /// Navigation failures are transient and reported as plain text; they
    /// are the only failures eligible for retry.
    async fn navigate(&self, url: &str) -> Result<(), String>;
    async fn wait_for_content_root(&self) -> Result<(), Error>;
    async fn print_to_pdf(&self) -> Result<Vec<u8>, Error>;
}

struct WebDriverSession<'a> {
    client: &'a Client,
    navigation_timeout: Duration,
    content_wait_timeout: Duration,
}

#[async_trait]
impl PageSession for WebDriverSession<'_> {
    async fn navigate(&self, url: &str) -> Result<(), String> {
        match tokio::time::timeout(self.navigation_timeout, self.client.goto(url)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "navigation timed out after {:?}",
                self.navigation_timeout
            )),
        }
    }

    async fn wait_for_content_root(&self) -> Result<(), Error> {
        self.client
            .wait()
            .at_most(self.content_wait_timeout)
            .for_element(Locator::Css(CONTENT_ROOT))
            .await
            .map(|_| ())
            .map_err(|e| Error::render_timeout(e.to_string()))
            .add_context("waiting for quotation content root")
    }

    async fn print_to_pdf(&self) -> Result<Vec<u8>, Error> {
        let print_config = PrintConfigurationBuilder::default()
            .background(true)
            .size(PrintSize::A4)
            .margins(PrintMargins {
                top: 1.0,
                left: 1.0,
                right: 1.0,
                bottom: 1.0,
            })
            .build()
            .map_err(Error::from)
            .add_context("configuring printer")?;
        self.client
            .print(print_config)
            .await
            .map_err(Error::capture)
            .add_context("printing pdf")
    }
}

/// Drive one page to captured PDF bytes. Navigation gets at most `attempts`
/// tries separated by `backoff`; failures after the page has loaded (content
/// wait, print) surface immediately.
async fn capture_page<S>(
    session: &S,
    url: &str,
    attempts: u32,
    backoff: Duration,
) -> Result<Vec<u8>, Error>
where
    S: PageSession + Sync,
{
    let mut attempt = 1u32;
    loop {
        let failure = match session.navigate(url).await {
            Ok(()) => break,
            Err(failure) => failure,
        };
        if attempt >= attempts.max(1) {
            return Err(Error::navigation(failure)).add_context("navigating to print page");
        }
        tracing::warn!(attempt, error = %failure, "navigation failed, retrying");
        attempt += 1;
        tokio::time::sleep(backoff).await;
    }
    session.wait_for_content_root().await?;
    session.print_to_pdf().await
}

#[async_trait]
impl CaptureBackend for WebDriverCapture {
    async fn capture(&self, url: &str) -> Result<Vec<u8>, Error> {
        let client = self.connect().await.add_context("capturing pdf")?;
        let outcome = {
            let session = WebDriverSession {
                client: &client,
                navigation_timeout: self.navigation_timeout,
                content_wait_timeout: self.content_wait_timeout,
            };
            capture_page(&session, url, self.navigation_attempts, NAVIGATION_BACKOFF).await
        };
        // The session must be released whether or not the capture succeeded.
        if let Err(close_error) = client.close().await {
            tracing::warn!(error = ?close_error, "browser session did not close cleanly");
        }
        outcome.add_context("capturing pdf")
    }
}

/// Orchestrates one export call end to end.
pub struct Exporter {
    config: ExportConfig,
    backend: Arc<dyn CaptureBackend>,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        let backend = Arc::new(WebDriverCapture::new(&config));
        Self { config, backend }
    }

    /// Build an exporter with a custom capture backend, e.g. a direct
    /// PDF-drawing engine or a stub for tests.
    pub fn with_backend(config: ExportConfig, backend: Arc<dyn CaptureBackend>) -> Self {
        Self { config, backend }
    }

    /// Export a raw JSON request body to PDF bytes plus a derived filename.
    ///
    /// The body may use full field names or the documented short aliases.
    /// A missing quote reference is synthesized and written back into the
    /// document before encoding, so the rendered PDF and its filename agree.
    pub async fn export(&self, raw: Value) -> Result<ExportedPdf, Error> {
        let mut raw = raw;
        if !raw.is_object() {
            return Err(Error::bad_request("request body must be a JSON object"));
        }
        wire::normalize_aliases(&mut raw);

        let reference = {
            let body = raw
                .as_object_mut()
                .ok_or_else(|| Error::bad_request("request body must be a JSON object"))?;
            body.entry("currency")
                .or_insert_with(|| Value::String(self.config.default_currency.clone()));
            body.entry("taxRatePercent")
                .or_insert_with(|| Value::String(self.config.default_tax_rate_percent.to_string()));
            resolve_reference(body)?
        };

        let document: QuotationDocument = serde_json::from_value(raw)
            .map_err(|e| Error::bad_request(e.to_string()))
            .add_context("deserializing quotation document")?;
        let token = codec::encode(&document).add_context("exporting pdf")?;
        let url = format!("{}?q={}", self.config.print_page_url, token);

        tracing::info!(
            reference = %reference,
            items = document.items.len(),
            "exporting quotation pdf"
        );
        let bytes = self.backend.capture(&url).await.add_context("exporting pdf")?;

        Ok(ExportedPdf {
            bytes,
            filename: format!("{}.pdf", sanitize_filename(&reference)),
            reference,
        })
    }
}

/// Resolve the quote reference: caller-provided `quotationNumber`, else
/// `accountRefNo`, else a synthesized one. The resolved value is written back
/// into the metadata so content and filename cannot disagree.
fn resolve_reference(body: &mut Map<String, Value>) -> Result<String, Error> {
    let meta = body
        .entry("meta")
        .or_insert_with(|| Value::Object(Map::new()));
    let meta = meta
        .as_object_mut()
        .ok_or_else(|| Error::bad_request("meta must be an object"))?;

    let provided = ["quotationNumber", "accountRefNo"].iter().find_map(|key| {
        meta.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    });
    let reference = provided.unwrap_or_else(synthesize_reference);

    meta.insert(
        "quotationNumber".to_string(),
        Value::String(reference.clone()),
    );
    let account_blank = meta
        .get("accountRefNo")
        .and_then(Value::as_str)
        .map(|s| s.trim().is_empty())
        .unwrap_or(true);
    if account_blank {
        meta.insert("accountRefNo".to_string(), Value::String(reference.clone()));
    }
    Ok(reference)
}

/// Current UTC timestamp plus a short random suffix, e.g.
/// `QT-20240314120000-h7Kq`. Two quick successive calls stay distinct.
fn synthesize_reference() -> String {
    let stamp = Utc::now().format("%Y%m%d%H%M%S");
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(char::from)
        .collect();
    format!("{REFERENCE_PREFIX}-{stamp}-{suffix}")
}

/// Strip characters outside `[A-Za-z0-9._-]`, collapsing runs of separators,
/// with a fixed fallback when nothing survives.
pub fn sanitize_filename(reference: &str) -> String {
    let mut out = String::with_capacity(reference.len());
    let mut last_was_separator = false;
    for c in reference.trim().chars() {
        let mapped = if c.is_ascii_alphanumeric() || matches!(c, '.' | '_') {
            c
        } else {
            '-'
        };
        if mapped == '-' {
            if !last_was_separator {
                out.push('-');
                last_was_separator = true;
            }
        } else {
            out.push(mapped);
            last_was_separator = false;
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Start ChromeDriver as a child process on the given port and wait until it
/// binds. Useful for deployments that co-locate the driver with the service.
pub fn start_chromedriver(port: u16) -> Result<Child, Error> {
    if is_port_in_use(port) {
        return Err(
            Error::from(format!("Port {port} is already in use")).add_context("starting chromedriver")
        );
    }

    let mut child = Command::new("chromedriver")
        .arg(format!("--port={port}"))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    for _ in 0..100 {
        if is_port_in_use(port) {
            return Ok(child);
        }

        if child
            .try_wait()
            .map_err(Error::from)
            .add_context("starting chromedriver")?
            .is_some()
        {
            return Err(Error::from(String::from(
                "Chromedriver has stopped unexpectedly",
            ))
            .add_context("starting chromedriver"));
        }

        thread::sleep(Duration::from_millis(10));
    }

    if !is_port_in_use(port) {
        child.kill()?;
        return Err(Error::from(format!(
            "Chromedriver failed to bind to port {port}"
        ))
        .add_context("starting chromedriver"));
    }

    Ok(child)
}

fn is_port_in_use(port: u16) -> bool {
    TcpListener::bind(format!("localhost:{port}")).is_err()
}
