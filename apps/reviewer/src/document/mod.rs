//! Document Preprocessor: turns uploaded PDF bytes into what the model can see.
//!
//! The default backend shells out to poppler-utils; see [`poppler`].

pub mod fonts;
pub mod poppler;
#[cfg(test)]
pub(crate) mod testdata;

use serde::Serialize;

use crate::errors::ReviewError;

pub use fonts::{analyze_font_consistency, FontConsistencyReport};
pub use poppler::PopplerPreprocessor;

/// Axis-aligned box in the extractor's page coordinates (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

/// One run of text. Style and position are optional: plain-text extraction
/// only knows the text, and styled extraction may omit a font it cannot
/// resolve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextFragment {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl TextFragment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: None,
            size: None,
            bbox: None,
            page: None,
        }
    }
}

/// Text and formatting metadata pulled from a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedDocument {
    /// Plain text, one fragment per non-empty line.
    pub text: Vec<TextFragment>,
    /// Positioned runs carrying font, size and bounding box.
    pub formatting: Vec<TextFragment>,
}

/// Backend for turning PDF bytes into images and text.
///
/// All methods are blocking; async callers run them on the blocking pool.
pub trait DocumentPreprocessor: Send + Sync {
    /// Renders the first page to PNG and returns it base64-encoded.
    fn convert_to_image(&self, document: &[u8]) -> Result<String, ReviewError>;

    fn extract_text_and_formatting(&self, document: &[u8])
        -> Result<ExtractedDocument, ReviewError>;

    fn page_count(&self, document: &[u8]) -> Result<u32, ReviewError>;

    fn check_single_page(&self, document: &[u8]) -> Result<bool, ReviewError> {
        Ok(self.page_count(document)? == 1)
    }

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// The known-good résumé used as a formatting baseline, prepared once.
#[derive(Debug, Clone)]
pub struct ReferenceDocument {
    pub image_base64: String,
    pub extracted: ExtractedDocument,
}

impl ReferenceDocument {
    pub fn prepare(
        preprocessor: &dyn DocumentPreprocessor,
        document: &[u8],
    ) -> Result<Self, ReviewError> {
        Ok(Self {
            image_base64: preprocessor.convert_to_image(document)?,
            extracted: preprocessor.extract_text_and_formatting(document)?,
        })
    }
}
