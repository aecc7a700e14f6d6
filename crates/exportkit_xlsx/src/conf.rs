//! Export constants, header style themes and default presets.

use std::sync::LazyLock;

use crate::spec::{
    EnumBorderStyle, EnumHorizontalAlign, EnumVerticalAlign, SpecAlignment, SpecBorder,
    SpecBorderEdge, SpecColor, SpecFill, SpecFont, SpecHeaderStyle,
};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// MIME type of the delivered document.
pub const C_MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// Worksheet name used when a sheet has none.
pub const C_SHEET_NAME_DEFAULT: &str = "Sheet";
/// Number format of date cells without an explicit one.
pub const C_FMT_DATE_DEFAULT: &str = "yyyy-mm-dd hh:mm:ss";
/// Generic failure text shown to the end user.
pub const C_MSG_EXPORT_FAILURE: &str = "Failed to export the spreadsheet. Please try again.";

/// Measured header length when the header text is empty.
pub const N_WIDTH_HEADER_FALLBACK: usize = 10;
/// Lower bound of a declared column width.
pub const N_WIDTH_DECLARED_MIN: usize = 12;
/// Padding added to measured text length.
pub const N_WIDTH_PADDING: usize = 2;

////////////////////////////////////////////////////////////////////////////////
// #region HeaderStyleThemes

/// Closed set of header style presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnumHeaderStyleTheme {
    /// Neutral gray band with a thin bottom rule.
    Classic,
    /// Bold white text on blue.
    Modern,
    /// Plain white with a hairline underline.
    Minimalist,
    /// Inverted: white on near-black.
    Dark,
    /// Saturated orange.
    Vibrant,
}

impl EnumHeaderStyleTheme {
    /// Every theme, in registry order.
    pub const ALL: [EnumHeaderStyleTheme; 5] = [
        Self::Classic,
        Self::Modern,
        Self::Minimalist,
        Self::Dark,
        Self::Vibrant,
    ];

    /// Registry name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Modern => "modern",
            Self::Minimalist => "minimalist",
            Self::Dark => "dark",
            Self::Vibrant => "vibrant",
        }
    }

    /// Resolve an exact registry name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|theme| theme.as_str() == name)
    }

    /// Preset of this theme.
    pub fn header_style(self) -> &'static SpecHeaderStyle {
        &ARR_HEADER_STYLE_THEMES[self as usize]
    }
}

static ARR_HEADER_STYLE_THEMES: LazyLock<[SpecHeaderStyle; 5]> = LazyLock::new(|| {
    [
        derive_classic_header_style(),
        derive_modern_header_style(),
        derive_minimalist_header_style(),
        derive_dark_header_style(),
        derive_vibrant_header_style(),
    ]
});

/// Look up a header style preset by name.
///
/// Names outside `classic`, `modern`, `minimalist`, `dark`, `vibrant` return `None`.
pub fn get_header_style_theme(name: &str) -> Option<&'static SpecHeaderStyle> {
    EnumHeaderStyleTheme::from_name(name).map(EnumHeaderStyleTheme::header_style)
}

fn derive_header_style(
    font_color: &str,
    font_size: f64,
    fill_color: &str,
    horizontal: EnumHorizontalAlign,
    border: SpecBorder,
) -> SpecHeaderStyle {
    SpecHeaderStyle {
        font: Some(SpecFont {
            name: Some("Calibri".to_string()),
            size: Some(font_size),
            bold: Some(true),
            color: Some(SpecColor::argb(font_color)),
            ..Default::default()
        }),
        alignment: Some(SpecAlignment {
            horizontal: Some(horizontal),
            vertical: Some(EnumVerticalAlign::Middle),
            ..Default::default()
        }),
        fill: Some(SpecFill::solid(fill_color)),
        border: Some(border),
    }
}

fn derive_classic_header_style() -> SpecHeaderStyle {
    derive_header_style(
        "FF000000",
        11.0,
        "FFEFEFEF",
        EnumHorizontalAlign::Center,
        SpecBorder {
            bottom: Some(SpecBorderEdge::new(EnumBorderStyle::Thin)),
            ..Default::default()
        },
    )
}

fn derive_modern_header_style() -> SpecHeaderStyle {
    derive_header_style(
        "FFFFFFFF",
        12.0,
        "FF4F81BD",
        EnumHorizontalAlign::Center,
        SpecBorder {
            bottom: Some(SpecBorderEdge::with_color(
                EnumBorderStyle::Medium,
                "FF2F5597",
            )),
            ..Default::default()
        },
    )
}

fn derive_minimalist_header_style() -> SpecHeaderStyle {
    derive_header_style(
        "FF333333",
        11.0,
        "FFFFFFFF",
        EnumHorizontalAlign::Left,
        SpecBorder {
            bottom: Some(SpecBorderEdge::with_color(
                EnumBorderStyle::Hair,
                "FFBFBFBF",
            )),
            ..Default::default()
        },
    )
}

fn derive_dark_header_style() -> SpecHeaderStyle {
    let edge = SpecBorderEdge::with_color(EnumBorderStyle::Thin, "FF000000");
    derive_header_style(
        "FFFFFFFF",
        11.0,
        "FF262626",
        EnumHorizontalAlign::Center,
        SpecBorder {
            top: Some(edge.clone()),
            left: Some(edge.clone()),
            bottom: Some(edge.clone()),
            right: Some(edge),
        },
    )
}

fn derive_vibrant_header_style() -> SpecHeaderStyle {
    derive_header_style(
        "FFFFFFFF",
        12.0,
        "FFFF6F00",
        EnumHorizontalAlign::Center,
        SpecBorder {
            bottom: Some(SpecBorderEdge::with_color(
                EnumBorderStyle::Thick,
                "FFC43E00",
            )),
            ..Default::default()
        },
    )
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
