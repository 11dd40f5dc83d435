//! Source location tracking
//!
//! Compiled code has no columns; a finding is located by class, method and
//! instruction index, with the source file and line attached when the unit
//! records them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Location of an instruction inside a compiled unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Source file name, if the unit records one
    pub file: Option<String>,
    /// Internal class name
    pub class: String,
    /// Method name followed by its descriptor
    pub method: String,
    /// Instruction index inside the method
    pub instruction: usize,
    /// Source line (1-indexed), if recorded
    pub line: Option<u32>,
}

impl SourceLocation {
    /// Create a location without file or line information
    #[inline]
    pub fn new(
        class: impl Into<String>,
        method: impl Into<String>,
        instruction: usize,
    ) -> Self {
        Self {
            file: None,
            class: class.into(),
            method: method.into(),
            instruction,
            line: None,
        }
    }

    #[inline]
    pub fn with_file(
        mut self,
        file: Option<String>,
    ) -> Self {
        self.file = file;
        self
    }

    #[inline]
    pub fn with_line(
        mut self,
        line: Option<u32>,
    ) -> Self {
        self.line = line;
        self
    }

    /// `File.java:12` when both are known, otherwise the class name
    pub fn origin(&self) -> String {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => format!("{}:{}", file, line),
            (Some(file), None) => file.clone(),
            (None, Some(line)) => format!("{}:{}", self.class, line),
            (None, None) => self.class.clone(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "{} ({}.{} @{})",
            self.origin(),
            self.class,
            self.method,
            self.instruction
        )
    }
}
