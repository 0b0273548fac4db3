//! Decomposition of composite EPL continuous queries into networks of atomic
//! statements.
//!
//! A query such as
//!
//! ```text
//! SELECT * FROM A#time(20 seconds), B#time(20 seconds)
//! ```
//!
//! is parsed into a [`SelectQuery`], normalized into an operator tree and
//! lowered into an ordered [`Program`] of single-operator statements that
//! communicate through generated intermediate streams:
//!
//! ```
//! use epldecomp::Decomposer;
//!
//! let decomposer = Decomposer::builder().build().unwrap();
//! let (program, _) = decomposer
//!     .decompose("SELECT * FROM A#time(20 seconds), B#time(20 seconds)")
//!     .unwrap();
//! assert_eq!(program.len(), 5);
//! ```

pub mod ast;
pub mod batch;
pub mod config;
pub mod decompose;
pub mod engines;
pub mod error;
pub mod generator;
pub mod harness;
pub mod normalize;
pub mod parser;
pub mod suite;
pub mod utils;

pub use ast::{FromSource, OpNode, PatternSource, SelectQuery, StreamSource, WindowSpec};
pub use config::{DecompositionConfig, SchemaConfig, WindowMode};
pub use decompose::{decompose, decompose_with_config, NameGen, Program, StatementKind};
pub use engines::{CommandEngine, Engine, Event, EventStreams, Value};
pub use error::{DecompositionError, DecompositionResult};
pub use generator::{query_to_epl, to_text};
pub use harness::{compare_outputs, run_original_vs_decomposed, run_semantics_vs_esper, HarnessResult};
pub use normalize::to_operator_tree;
pub use parser::{parse_select_query, EplParser};

use std::path::Path;
use utils::{read_query_file, write_text_file};

/// Parses and decomposes query text under one configuration.
pub struct Decomposer {
    config: DecompositionConfig,
    parser: EplParser,
}

impl Decomposer {
    pub fn new(config: DecompositionConfig) -> DecompositionResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            parser: EplParser::new()?,
        })
    }

    pub fn from_config_file<P: AsRef<Path>>(path: P) -> DecompositionResult<Self> {
        Self::new(DecompositionConfig::from_file(path)?)
    }

    /// Defaults overridden by `EPLDECOMP_*` environment variables.
    pub fn from_environment() -> DecompositionResult<Self> {
        Self::new(DecompositionConfig::from_env())
    }

    pub fn builder() -> DecomposerBuilder {
        DecomposerBuilder::new()
    }

    pub fn config(&self) -> &DecompositionConfig {
        &self.config
    }

    /// Returns the program and the name of the stream holding the final result.
    pub fn decompose(&self, text: &str) -> DecompositionResult<(Program, String)> {
        let query = self.parser.parse(text)?;
        self.decompose_query(&query)
    }

    pub fn decompose_query(&self, query: &SelectQuery) -> DecompositionResult<(Program, String)> {
        decompose_with_config(query, &self.config)
    }

    pub fn can_decompose(&self, text: &str) -> bool {
        self.decompose(text).is_ok()
    }

    pub fn decompose_batch(&self, texts: &[&str]) -> Vec<DecompositionResult<(Program, String)>> {
        texts.iter().map(|text| self.decompose(text)).collect()
    }

    /// Decompose the query in `input` and write the program as a script to
    /// `output`.
    pub fn decompose_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> DecompositionResult<Program> {
        let text = read_query_file(input)?;
        let (program, _) = self.decompose(&text)?;
        write_text_file(output, &format!("{}\n", program.to_script()))?;
        Ok(program)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DecomposerBuilder {
    config: DecompositionConfig,
}

impl DecomposerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window_mode(mut self, window_mode: WindowMode) -> Self {
        self.config.window_mode = window_mode;
        self
    }

    pub fn with_name_prefix(mut self, prefix: &str) -> Self {
        self.config.name_prefix = prefix.to_string();
        self
    }

    pub fn with_aggregate_stream(mut self, stream: &str) -> Self {
        self.config.aggregate_stream = stream.to_string();
        self
    }

    pub fn with_base_event_type(mut self, event_type: &str) -> Self {
        self.config.base_event_type = event_type.to_string();
        self
    }

    pub fn build(self) -> DecompositionResult<Decomposer> {
        Decomposer::new(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builder_applies_settings() {
        let decomposer = Decomposer::builder()
            .with_window_mode(WindowMode::Esper)
            .with_name_prefix("q")
            .with_base_event_type("Reading")
            .build()
            .unwrap();
        let (program, _) = decomposer.decompose("SELECT * FROM A#length(3)").unwrap();
        assert_eq!(program.statements()[0], "CREATE WINDOW q_win_1.win:length(3) as Reading;");
    }

    #[test]
    fn test_builder_rejects_bad_aggregate_stream() {
        let result = Decomposer::builder().with_aggregate_stream("agg out").build();
        assert!(matches!(result, Err(DecompositionError::ConfigError { .. })));
    }

    #[test]
    fn test_can_decompose() {
        let decomposer = Decomposer::builder().build().unwrap();
        assert!(decomposer.can_decompose("SELECT a FROM S"));
        assert!(!decomposer.can_decompose("DELETE FROM S"));
        assert!(!decomposer.can_decompose("SELECT * FROM PATTERN every a=A"));
    }

    #[test]
    fn test_decompose_batch_keeps_order() {
        let decomposer = Decomposer::builder().build().unwrap();
        let results = decomposer.decompose_batch(&["SELECT a FROM S", "nonsense", "SELECT * FROM A, B"]);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].as_ref().is_err_and(|e| e.is_user_error()));
        assert_eq!(results[2].as_ref().map(|(p, _)| p.len()).ok(), Some(1));
    }

    #[test]
    fn test_decompose_file_writes_script() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("query.epl");
        let output = dir.path().join("out").join("program.epl");
        std::fs::write(&input, "SELECT * FROM A, B, C;\n").unwrap();

        let decomposer = Decomposer::builder().build().unwrap();
        let program = decomposer.decompose_file(&input, &output).unwrap();
        assert_eq!(program.len(), 2);
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "INSERT INTO x_join_1\nSELECT *\nFROM A, B;\n\nSELECT *\nFROM x_join_1, C;\n"
        );
    }
}
