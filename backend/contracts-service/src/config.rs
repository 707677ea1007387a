//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use crate::errors::{Result, ServiceError};
use crate::render::RendererConfig;

#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database file
    pub database_url: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// Directory rendered contract documents are written to
    pub pdf_dir: PathBuf,
    /// Directory holding static assets (logo)
    pub static_dir: PathBuf,
    /// Logo file name inside `static_dir`
    pub logo_file: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            database_url: var("DATABASE_URL", "sqlite:./contracts.db"),
            api_port: var("API_PORT", "8000")
                .parse()
                .map_err(|_| ServiceError::Config("Invalid API_PORT".to_string()))?,
            pdf_dir: PathBuf::from(var("PDF_DIR", "pdfs")),
            static_dir: PathBuf::from(var("STATIC_DIR", "static")),
            logo_file: var("LOGO_FILE", "logoandinatrading.png"),
        })
    }

    pub fn renderer_config(&self) -> RendererConfig {
        RendererConfig {
            output_dir: self.pdf_dir.clone(),
            static_dir: self.static_dir.clone(),
            logo_file: self.logo_file.clone(),
        }
    }
}
