//! Copybook parser entry point.

use tracing::debug;

use crate::ast::ParseResult;
use crate::config::ParserConfig;
use crate::error::Result;
use crate::hierarchy;
use crate::lexer::tokenize;
use crate::record;
use crate::resolver;

/// Parses copybook text into a resolved [`ParseResult`].
///
/// The parser holds only its configuration, so one instance can serve any
/// number of parses, from any number of threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopybookParser {
    config: ParserConfig,
}

impl CopybookParser {
    /// Create a parser with the given configuration.
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse copybook lines. `source_name` labels the result and errors.
    pub fn parse<S: AsRef<str>>(&self, source_name: &str, lines: &[S]) -> Result<ParseResult> {
        let tokens = tokenize(lines, self.config.source_format);
        debug!(source = source_name, entries = tokens.clauses.len(), "tokenized copybook");

        let hierarchy = hierarchy::build(&tokens.clauses, source_name)?;
        let fields = resolver::resolve(&hierarchy);

        let declared = if self.config.honor_record_length {
            tokens.record_length
        } else {
            None
        };
        let layouts = record::extract(&fields, declared, self.config.cap_redefines);
        let total_length = record::total_length(&layouts, declared);
        debug!(
            source = source_name,
            records = layouts.len(),
            total_length,
            "resolved copybook layout"
        );

        Ok(ParseResult {
            source_name: source_name.to_string(),
            total_length,
            fields,
            layouts,
        })
    }

    /// Parse copybook text held in one string.
    pub fn parse_str(&self, source_name: &str, text: &str) -> Result<ParseResult> {
        let lines: Vec<&str> = text.lines().collect();
        self.parse(source_name, &lines)
    }
}

/// Parse copybook text with the default configuration.
pub fn parse_copybook(source_name: &str, text: &str) -> Result<ParseResult> {
    CopybookParser::default().parse_str(source_name, text)
}
