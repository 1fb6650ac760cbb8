//! Content transformer
//!
//! Converts the free-form text returned by a content-generation endpoint
//! into markup that can be embedded directly. The conversion is an ordered
//! pipeline of independent stages; later stages operate on the output of
//! earlier ones, so the order in [`Stage::ORDERED`] is part of the contract.
//!
//! No sanitization happens beyond the fixed substitutions: the generation
//! service is treated as a trusted content source.

pub mod stages;

/// One step of the rendering pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    StandaloneImages,
    InlineImages,
    Headings,
    Emphasis,
    Code,
    Blockquotes,
    Paragraphs,
    LineBreaks,
}

impl Stage {
    /// All stages in the order they must run
    pub const ORDERED: [Stage; 8] = [
        Stage::StandaloneImages,
        Stage::InlineImages,
        Stage::Headings,
        Stage::Emphasis,
        Stage::Code,
        Stage::Blockquotes,
        Stage::Paragraphs,
        Stage::LineBreaks,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::StandaloneImages => "standalone_images",
            Stage::InlineImages => "inline_images",
            Stage::Headings => "headings",
            Stage::Emphasis => "emphasis",
            Stage::Code => "code",
            Stage::Blockquotes => "blockquotes",
            Stage::Paragraphs => "paragraphs",
            Stage::LineBreaks => "line_breaks",
        }
    }

    pub fn apply(&self, input: &str) -> String {
        match self {
            Stage::StandaloneImages => stages::embed_standalone_images(input),
            Stage::InlineImages => stages::embed_inline_images(input),
            Stage::Headings => stages::render_headings(input),
            Stage::Emphasis => stages::render_emphasis(input),
            Stage::Code => stages::render_code(input),
            Stage::Blockquotes => stages::render_blockquotes(input),
            Stage::Paragraphs => stages::wrap_paragraphs(input),
            Stage::LineBreaks => stages::convert_line_breaks(input),
        }
    }
}

/// Run the given stages in sequence
pub fn render_with(raw: &str, pipeline: &[Stage]) -> String {
    pipeline.iter().fold(raw.to_string(), |content, stage| {
        log::trace!("Applying stage {}", stage.name());
        stage.apply(&content)
    })
}

/// Render raw service output through the full pipeline.
///
/// Pure: the same input always yields the same markup.
pub fn render_content(raw: &str) -> String {
    log::debug!("Rendering content, length: {}", raw.len());
    let rendered = render_with(raw, &Stage::ORDERED);
    log::debug!("Content rendering completed, length: {}", rendered.len());
    rendered
}
