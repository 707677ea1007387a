//! Typst compilation over an in-memory, single-file world.
//!
//! The world serves the generated source, the optional logo and the fonts
//! bundled with `typst-assets`. Nothing is read from disk and the world has
//! no clock, so identical source always compiles to identical bytes.

use std::sync::OnceLock;

use typst::diag::{FileError, FileResult, SourceDiagnostic};
use typst::foundations::{Bytes, Datetime};
use typst::model::Document;
use typst::syntax::{FileId, Source, VirtualPath};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, World};
use typst_pdf::PdfOptions;

use super::blocks::LogoAsset;
use super::RenderError;

/// Virtual path of the generated source.
const MAIN_PATH: &str = "/contract.typ";

struct FontStore {
    book: LazyHash<FontBook>,
    fonts: Vec<Font>,
}

fn fonts() -> &'static FontStore {
    static FONTS: OnceLock<FontStore> = OnceLock::new();
    FONTS.get_or_init(|| {
        let fonts: Vec<Font> = typst_assets::fonts()
            .flat_map(|data| Font::iter(Bytes::from_static(data)))
            .collect();
        FontStore {
            book: LazyHash::new(FontBook::from_fonts(&fonts)),
            fonts,
        }
    })
}

fn library() -> &'static LazyHash<Library> {
    static LIBRARY: OnceLock<LazyHash<Library>> = OnceLock::new();
    LIBRARY.get_or_init(|| LazyHash::new(Library::default()))
}

struct ContractWorld {
    main: Source,
    logo: Option<(FileId, Bytes)>,
}

impl ContractWorld {
    fn new(source: String, logo: Option<&LogoAsset>) -> Self {
        let main = Source::new(FileId::new(None, VirtualPath::new(MAIN_PATH)), source);
        let logo = logo.map(|asset| {
            (
                FileId::new(None, VirtualPath::new(&asset.path)),
                Bytes::from(asset.data.clone()),
            )
        });
        Self { main, logo }
    }
}

impl World for ContractWorld {
    fn library(&self) -> &LazyHash<Library> {
        library()
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &fonts().book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(not_found(id))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        match &self.logo {
            Some((logo_id, bytes)) if *logo_id == id => Ok(bytes.clone()),
            _ => Err(not_found(id)),
        }
    }

    fn font(&self, index: usize) -> Option<Font> {
        fonts().fonts.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        None
    }
}

fn not_found(id: FileId) -> FileError {
    FileError::NotFound(id.vpath().as_rootless_path().to_path_buf())
}

fn describe(diagnostics: &[SourceDiagnostic]) -> String {
    diagnostics
        .iter()
        .map(|diagnostic| diagnostic.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Lay out `source` into pages.
pub fn typeset(source: String, logo: Option<&LogoAsset>) -> Result<Document, RenderError> {
    let world = ContractWorld::new(source, logo);
    typst::compile(&world)
        .output
        .map_err(|errors| RenderError::Typeset(describe(&errors)))
}

/// Serialize laid-out pages to PDF bytes.
pub fn export_pdf(document: &Document) -> Result<Vec<u8>, RenderError> {
    typst_pdf::pdf(document, &PdfOptions::default())
        .map_err(|errors| RenderError::Export(describe(&errors)))
}
