//! Paragraph styles and their Typst `text` settings.

/// Points per centimetre.
pub const CM: f32 = 28.346_457;

/// Font family used for every paragraph; ships with the bundled fonts.
pub const FONT_FAMILY: &str = "Libertinus Serif";

/// `0xRRGGBB` colour.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Rgb(u32);

impl Rgb {
    pub const fn hex(value: u32) -> Self {
        Rgb(value & 0xFF_FFFF)
    }

    /// Typst colour expression, e.g. `rgb("#0b3c5d")`.
    pub fn to_typst(self) -> String {
        format!("rgb(\"#{:06x}\")", self.0)
    }
}

/// A paragraph style.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Style {
    pub bold: bool,
    pub italic: bool,
    pub size: f32,
    /// Baseline-to-baseline distance.
    pub leading: f32,
    pub color: Rgb,
    pub space_after: f32,
}

impl Style {
    /// Arguments for a Typst `set text(..)` rule.
    pub fn text_args(&self) -> String {
        format!(
            "font: \"{FONT_FAMILY}\", size: {}, weight: \"{}\", style: \"{}\", fill: {}",
            pt(self.size),
            if self.bold { "bold" } else { "regular" },
            if self.italic { "italic" } else { "normal" },
            self.color.to_typst(),
        )
    }

    /// Gap between lines as Typst measures it (bottom of one line to the top
    /// of the next).
    pub fn line_gap(&self) -> f32 {
        (self.leading - self.size).max(0.0)
    }
}

/// Typst length literal in points.
pub fn pt(points: f32) -> String {
    format!("{points:.2}pt")
}

pub const TITLE: Style = Style {
    bold: true,
    italic: false,
    size: 18.0,
    leading: 22.0,
    color: Rgb::hex(0x0B3C5D),
    space_after: 8.0,
};

pub const SUBTITLE: Style = Style {
    bold: false,
    italic: false,
    size: 11.0,
    leading: 14.0,
    color: Rgb::hex(0x4A4A4A),
    space_after: 6.0,
};

pub const BODY: Style = Style {
    bold: false,
    italic: false,
    size: 11.0,
    leading: 16.0,
    color: Rgb::hex(0x222222),
    space_after: 0.0,
};

pub const HIGHLIGHT: Style = Style {
    bold: true,
    italic: false,
    size: 11.0,
    leading: 14.0,
    color: Rgb::hex(0x0B61A4),
    space_after: 0.0,
};

pub const FOOTER: Style = Style {
    bold: false,
    italic: true,
    size: 9.0,
    leading: 11.0,
    color: Rgb::hex(0x7A7A7A),
    space_after: 0.0,
};

pub const PLACEHOLDER_BORDER: Rgb = Rgb::hex(0xCCCCCC);
pub const PLACEHOLDER_TEXT: Rgb = Rgb::hex(0x7A7A7A);
pub const SEPARATOR: Rgb = Rgb::hex(0xDDDDDD);
