//! Overlay transport.

use camino::{Utf8Path, Utf8PathBuf};
use checker_diagnostics::ClientPayload;
use std::fs::{self, File};
use std::io::{BufWriter, Write};

/// Delivers overlay payloads to the dev server's clients.
///
/// Delivery is fire-and-forget: a transport logs its failures and never
/// reports them to the caller.
pub trait OverlayTransport {
    fn post(&mut self, payload: &ClientPayload);
}

impl<T: OverlayTransport> OverlayTransport for Option<T> {
    fn post(&mut self, payload: &ClientPayload) {
        if let Some(transport) = self {
            transport.post(payload);
        }
    }
}

/// Writes each payload as one JSON line to a file the dev server tails.
#[derive(Debug)]
pub struct JsonLinesTransport {
    path: Utf8PathBuf,
    writer: Option<BufWriter<File>>,
}

impl JsonLinesTransport {
    /// Creates or truncates the file at `path`.
    ///
    /// If the file can't be created the transport stays usable and drops
    /// every payload.
    pub fn create(path: impl Into<Utf8PathBuf>) -> Self {
        let path = path.into();
        let writer = match open(&path) {
            Ok(file) => Some(BufWriter::new(file)),
            Err(e) => {
                tracing::warn!(%path, error = %e, "overlay file unavailable; dropping payloads");
                None
            }
        };
        Self { path, writer }
    }

    /// Returns the file payloads are written to.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

fn open(path: &Utf8Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    File::create(path)
}

impl OverlayTransport for JsonLinesTransport {
    fn post(&mut self, payload: &ClientPayload) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };

        let line = match serde_json::to_string(payload) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize overlay payload");
                return;
            }
        };

        if let Err(e) = writeln!(writer, "{line}").and_then(|()| writer.flush()) {
            tracing::warn!(path = %self.path, error = %e, "failed to write overlay payload");
        }
    }
}
