//! Contract document renderer.
//!
//! Turns a [`DocumentSnapshot`] into a branded PDF at
//! `<output_dir>/contract_<id>.pdf`:
//!
//! ```text
//! snapshot ──compose──► Document (blocks) ──markup──► Typst source ──typst──► pdf ──► file
//! ```
//!
//! The renderer reads nothing but the snapshot and the optional logo file,
//! and it never logs; callers decide what to report.

pub mod blocks;
mod engine;
pub mod markup;
pub mod snapshot;
pub mod style;


use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{Datelike, Local};
use image::ImageFormat;
use thiserror::Error;

use blocks::{compose, Document, Logo, LogoAsset};
pub use snapshot::DocumentSnapshot;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write document {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("typesetting failed: {0}")]
    Typeset(String),

    #[error("PDF export failed: {0}")]
    Export(String),
}

/// Filesystem locations the renderer works with.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Directory rendered documents are written to.
    pub output_dir: PathBuf,
    /// Directory holding static assets.
    pub static_dir: PathBuf,
    /// Logo file name inside `static_dir`.
    pub logo_file: String,
}

impl RendererConfig {
    pub fn logo_path(&self) -> PathBuf {
        self.static_dir.join(&self.logo_file)
    }
}

pub struct Renderer {
    config: RendererConfig,
    /// One write lock per output file.
    write_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self {
            config,
            write_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Where the document for `contract_id` lives, whether or not it exists yet.
    pub fn document_path(&self, contract_id: &str) -> PathBuf {
        self.config.output_dir.join(file_name(contract_id))
    }

    /// Render `snapshot` and write it over any previous document for the same id.
    pub fn render(&self, snapshot: &DocumentSnapshot) -> Result<PathBuf, RenderError> {
        let bytes = self.render_bytes(snapshot)?;
        self.write(&snapshot.contract_id, &bytes)
    }

    /// Render `snapshot` to PDF bytes without touching the output directory.
    pub fn render_bytes(&self, snapshot: &DocumentSnapshot) -> Result<Vec<u8>, RenderError> {
        engine::export_pdf(&self.typeset(snapshot)?)
    }

    /// Typst source for `snapshot`, as [`Renderer::render_bytes`] compiles it.
    pub fn markup(&self, snapshot: &DocumentSnapshot) -> String {
        markup::to_markup(&self.document(snapshot).0)
    }

    fn typeset(&self, snapshot: &DocumentSnapshot) -> Result<typst::model::Document, RenderError> {
        let (document, logo) = self.document(snapshot);
        engine::typeset(markup::to_markup(&document), logo.asset())
    }

    fn document(&self, snapshot: &DocumentSnapshot) -> (Document, Logo) {
        let logo = load_logo(&self.config.logo_path());
        let document = compose(snapshot, logo.clone(), Local::now().year());
        (document, logo)
    }

    fn write(&self, contract_id: &str, bytes: &[u8]) -> Result<PathBuf, RenderError> {
        let dir = &self.config.output_dir;
        fs::create_dir_all(dir).map_err(|source| RenderError::OutputDir {
            path: dir.clone(),
            source,
        })?;

        let name = file_name(contract_id);
        let path = dir.join(&name);
        let tmp = dir.join(format!(".{name}.tmp"));

        let lock = self.acquire_lock(&name);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            fs::write(&tmp, bytes)
                .and_then(|()| fs::rename(&tmp, &path))
                .map_err(|source| {
                    let _ = fs::remove_file(&tmp);
                    RenderError::Write {
                        path: path.clone(),
                        source,
                    }
                })
        };
        self.release_lock(&name, lock);
        result.map(|()| path)
    }

    fn acquire_lock(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .write_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.entry(name.to_string()).or_default().clone()
    }

    /// Drop the table entry once no other writer holds it. Clones are only
    /// handed out under the table lock, so the count cannot grow here.
    fn release_lock(&self, name: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self
            .write_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&lock) == 2 {
            locks.remove(name);
        }
    }

    #[cfg(test)]
    fn held_locks(&self) -> usize {
        self.write_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// `contract_<key>.pdf`. Bytes outside `[A-Za-z0-9_-]` are percent-encoded,
/// so distinct ids never share a file and no id can leave the output
/// directory.
pub fn file_name(contract_id: &str) -> String {
    let mut key = String::with_capacity(contract_id.len());
    for byte in contract_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            key.push(byte as char);
        } else {
            key.push_str(&format!("%{byte:02X}"));
        }
    }
    format!("contract_{key}.pdf")
}

/// Read the logo if the file exists and decodes as PNG or JPEG.
fn load_logo(path: &Path) -> Logo {
    let Ok(data) = fs::read(path) else {
        return Logo::Placeholder;
    };
    let extension = match image::guess_format(&data) {
        Ok(ImageFormat::Png) => "png",
        Ok(ImageFormat::Jpeg) => "jpg",
        _ => return Logo::Placeholder,
    };
    if image::load_from_memory(&data).is_err() {
        return Logo::Placeholder;
    }
    Logo::Image(LogoAsset {
        path: format!("/logo.{extension}"),
        data,
    })
}
