//! Document model: an ordered list of blocks built from a snapshot.
//!
//! [`compose`] is the only place that knows what a contract document says and
//! in which order. The Typst markup writer knows nothing about contracts.

use super::snapshot::DocumentSnapshot;
use super::style::{Style, BODY, CM, FOOTER, HIGHLIGHT, SUBTITLE, TITLE};

pub const BRAND: &str = "AndinaTrading";
pub const SUBTITLE_TEXT: &str = "Contrato de Intermediación Financiera";
pub const DESCRIPTION_HEADING: &str = "Descripción / Observaciones";
pub const SIGNATURE_LINE: &str = "Firma: ____________________";

/// Side length of the logo slot in the header.
pub const LOGO_SIZE: f32 = 3.2 * CM;

/// A stretch of text sharing one font weight.
#[derive(Clone, Debug, PartialEq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

/// Rich text in one style. `\n` inside a run is a hard line break.
#[derive(Clone, Debug, PartialEq)]
pub struct Paragraph {
    pub style: Style,
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn new(style: Style, text: impl Into<String>) -> Self {
        Self {
            style,
            runs: vec![Run::plain(text)],
        }
    }

    pub fn rich(style: Style, runs: Vec<Run>) -> Self {
        Self { style, runs }
    }

    /// Concatenated text of every run.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Logo file contents, served to Typst under `path`.
#[derive(Clone, Debug, PartialEq)]
pub struct LogoAsset {
    /// Virtual path the markup refers to, e.g. `/logo.png`.
    pub path: String,
    /// Encoded image bytes, as read from disk.
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Logo {
    Image(LogoAsset),
    /// Bordered box with the word `LOGO`.
    Placeholder,
}

impl Logo {
    pub fn asset(&self) -> Option<&LogoAsset> {
        match self {
            Logo::Image(asset) => Some(asset),
            Logo::Placeholder => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    /// Brand title and subtitle on the left, logo slot on the right.
    Header {
        title: Paragraph,
        subtitle: Paragraph,
        logo: Logo,
    },
    /// Thin full-width rule.
    Separator,
    Spacer(f32),
    /// Two-column key/value table.
    Grid {
        label_width: f32,
        rows: Vec<(Paragraph, Paragraph)>,
    },
    Paragraph(Paragraph),
    /// Fixed-width columns, one paragraph per cell.
    Columns {
        column_width: f32,
        rows: Vec<Vec<Paragraph>>,
    },
}

/// Blocks in reading order plus document metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub title: String,
    pub author: String,
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn builder(title: impl Into<String>) -> DocumentBuilder {
        DocumentBuilder {
            doc: Document {
                title: title.into(),
                author: BRAND.to_string(),
                blocks: Vec::new(),
            },
        }
    }

    /// Every paragraph in reading order, including grid and column cells.
    pub fn paragraphs(&self) -> Vec<&Paragraph> {
        let mut out = Vec::new();
        for block in &self.blocks {
            match block {
                Block::Header {
                    title, subtitle, ..
                } => out.extend([title, subtitle]),
                Block::Grid { rows, .. } => {
                    for (label, value) in rows {
                        out.extend([label, value]);
                    }
                }
                Block::Paragraph(p) => out.push(p),
                Block::Columns { rows, .. } => out.extend(rows.iter().flatten()),
                Block::Separator | Block::Spacer(_) => {}
            }
        }
        out
    }
}

pub struct DocumentBuilder {
    doc: Document,
}

impl DocumentBuilder {
    pub fn push(mut self, block: Block) -> Self {
        self.doc.blocks.push(block);
        self
    }

    pub fn spacer(self, height: f32) -> Self {
        self.push(Block::Spacer(height))
    }

    pub fn paragraph(self, paragraph: Paragraph) -> Self {
        self.push(Block::Paragraph(paragraph))
    }

    /// Append blocks only when `section` yields some.
    pub fn optional(self, section: Option<Vec<Block>>) -> Self {
        section
            .into_iter()
            .flatten()
            .fold(self, |builder, block| builder.push(block))
    }

    pub fn build(self) -> Document {
        self.doc
    }
}

/// Build the contract document for `snapshot`.
///
/// `logo` reflects whether the logo asset was found for this render; `year`
/// stamps the footer.
pub fn compose(snapshot: &DocumentSnapshot, logo: Logo, year: i32) -> Document {
    Document::builder(format!("Contrato {} - {BRAND}", snapshot.contract_id))
        .push(header(logo))
        .spacer(6.0)
        .push(Block::Separator)
        .spacer(12.0)
        .push(summary_grid(snapshot))
        .spacer(14.0)
        .paragraph(legal_text(snapshot.duration_hours))
        .spacer(10.0)
        .optional(description_section(snapshot))
        .spacer(14.0)
        .push(signatures(&snapshot.client_name))
        .spacer(12.0)
        .paragraph(Paragraph::new(
            FOOTER,
            format!("Documento generado automáticamente — {BRAND} © {year}"),
        ))
        .build()
}

fn header(logo: Logo) -> Block {
    Block::Header {
        title: Paragraph::new(TITLE, BRAND),
        subtitle: Paragraph::new(SUBTITLE, SUBTITLE_TEXT),
        logo,
    }
}

fn summary_grid(snapshot: &DocumentSnapshot) -> Block {
    let mut rows = vec![
        ("ID Contrato:", snapshot.contract_id.clone()),
        ("Cliente:", snapshot.client_name.clone()),
        ("Monto total:", amount(&snapshot.amount_label)),
        ("Fecha de emisión:", snapshot.issue_date_or_now()),
        (
            "Duración del contrato:",
            format!("{} horas", snapshot.duration_hours),
        ),
    ]
    .into_iter()
    .map(|(label, value)| (label.to_string(), value))
    .collect::<Vec<_>>();
    rows.extend(snapshot.extra_rows.iter().cloned());

    Block::Grid {
        label_width: 4.5 * CM,
        rows: rows
            .into_iter()
            .map(|(label, value)| (Paragraph::new(BODY, label), Paragraph::new(HIGHLIGHT, value)))
            .collect(),
    }
}

/// `$` prefix for figures only; labels such as `Por definir` print as is.
fn amount(label: &str) -> String {
    if label.starts_with(|c: char| c.is_ascii_digit()) {
        format!("${label}")
    } else {
        label.to_string()
    }
}

/// The fixed legal text. Only the duration varies.
pub fn legal_text(duration_hours: u32) -> Paragraph {
    Paragraph::rich(
        BODY,
        vec![
            Run::plain(
                "El presente documento representa un acuerdo de intermediación financiera entre ",
            ),
            Run::bold(BRAND),
            Run::plain(
                " y el/la cliente indicado/a. AndinaTrading actuará como comisionista para \
                 ejecutar órdenes bursátiles en nombre del cliente, conforme a la normativa \
                 vigente y las políticas internas de la compañía.\n\n\
                 El cliente autoriza expresamente a AndinaTrading a gestionar, en su nombre, la \
                 creación, modificación y cancelación de órdenes, así como el seguimiento de su \
                 estado. Las comisiones aplicables y demás condiciones particulares se detallan \
                 en el sistema y/o anexo del contrato.\n\n\
                 Al aceptar este contrato, el cliente reconoce haber leído y entendido los \
                 términos y condiciones, así como la política de privacidad y tratamiento de \
                 datos. Este contrato tiene una duración mínima de ",
            ),
            Run::bold(format!("{duration_hours} horas")),
            Run::plain(", contadas a partir de la fecha de emisión y/o aceptación."),
        ],
    )
}

fn description_section(snapshot: &DocumentSnapshot) -> Option<Vec<Block>> {
    let text = snapshot.description_text()?;
    Some(vec![
        Block::Paragraph(Paragraph::new(HIGHLIGHT, DESCRIPTION_HEADING)),
        Block::Spacer(4.0),
        Block::Paragraph(Paragraph::new(BODY, text.replace("\r\n", "\n"))),
        Block::Spacer(10.0),
    ])
}

fn signatures(client_name: &str) -> Block {
    let cell = |text: &str| Paragraph::new(BODY, text);
    let heading = |text: &str| Paragraph::rich(BODY, vec![Run::bold(text)]);
    Block::Columns {
        column_width: 8.0 * CM,
        rows: vec![
            vec![heading("Cliente"), heading(BRAND)],
            vec![cell(client_name), cell("Representante Autorizado")],
            vec![cell(SIGNATURE_LINE), cell(SIGNATURE_LINE)],
        ],
    }
}
