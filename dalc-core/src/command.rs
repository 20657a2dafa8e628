use std::fmt::Write;

use crate::value::Value;

/// Size assigned to output-capable parameters that did not specify one.
///
/// Some drivers allocate output buffers up front and reject parameters
/// without a declared maximum size.
pub const DEFAULT_OUTPUT_SIZE: usize = 8000;

/// How a driver should interpret command text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandKind {
    /// The text is a plain command in the driver's query language.
    #[default]
    Text,
    /// The text names a stored procedure.
    StoredProcedure,
}

/// Data flow direction of a command parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Input,
    Output,
    InputOutput,
}

/// A single command parameter.
///
/// Parameters are transient: they live for one command invocation. After a
/// command executes, the values of [`Direction::Output`] and
/// [`Direction::InputOutput`] parameters reflect what the driver wrote back.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub value: Value,
    pub direction: Direction,
    /// Maximum size in bytes of the driver-side buffer for this parameter.
    /// Only meaningful for output-capable directions.
    pub size: Option<usize>,
}

impl Param {
    /// Creates an input parameter.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Param {
            name: name.into(),
            value: value.into(),
            direction: Direction::Input,
            size: None,
        }
    }

    /// Creates an output-only parameter.
    pub fn output(name: impl Into<String>) -> Self {
        Param {
            name: name.into(),
            value: Value::Null,
            direction: Direction::Output,
            size: None,
        }
    }

    /// Creates an input/output parameter.
    pub fn input_output(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Param {
            name: name.into(),
            value: value.into(),
            direction: Direction::InputOutput,
            size: None,
        }
    }

    /// Declares the maximum driver-side buffer size for this parameter.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn is_input(&self) -> bool {
        self.direction == Direction::Input
    }

    fn normalize(&mut self) {
        if self.direction != Direction::Input && self.size.is_none() {
            self.size = Some(DEFAULT_OUTPUT_SIZE);
        }
    }
}

/// Applies the output-size policy before a command is handed to a driver.
pub(crate) fn normalize_params(params: &mut [Param]) {
    for param in params {
        param.normalize();
    }
}

/// Renders command text plus parameter names for error messages.
pub(crate) fn command_context(text: &str, params: &[Param]) -> String {
    if params.is_empty() {
        return text.to_owned();
    }
    let mut out = String::with_capacity(text.len() + 16 * params.len());
    out.push_str(text);
    out.push_str("; parameters: {");
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        // write! to a String cannot fail
        let _ = write!(out, "{}:{}", param.name, param.value);
    }
    out.push('}');
    out
}
