//! Parser configuration.

use crate::lexer::SourceFormat;

/// Options controlling how a copybook is read and laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Source line format.
    pub source_format: SourceFormat,
    /// Let a `REC LEN : n` comment set the total record length.
    pub honor_record_length: bool,
    /// Cap the layout length of a redefining record at the base length.
    pub cap_redefines: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            source_format: SourceFormat::Free,
            honor_record_length: true,
            cap_redefines: true,
        }
    }
}

impl ParserConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source format.
    pub fn with_source_format(mut self, format: SourceFormat) -> Self {
        self.source_format = format;
        self
    }

    /// Enable or disable the `REC LEN` directive.
    pub fn with_record_length_directive(mut self, honor: bool) -> Self {
        self.honor_record_length = honor;
        self
    }

    /// Enable or disable capping of redefining records.
    pub fn with_redefines_cap(mut self, cap: bool) -> Self {
        self.cap_redefines = cap;
        self
    }
}
