//! @ai:module:intent Line cursor shared by the strict record parsers
//! @ai:module:layer infrastructure
//! @ai:module:internal true
//! @ai:module:stateless false

/// @ai:intent Yields lines one at a time, tracking 1-based line numbers
pub(crate) struct LineReader<'a> {
    lines: std::str::SplitInclusive<'a, char>,
    line_number: usize,
}

/// @ai:intent A line as read from the input, terminator included
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawLine<'a> {
    pub number: usize,
    pub text: &'a str,
}

impl<'a> LineReader<'a> {
    pub(crate) fn new(content: &'a str) -> Self {
        Self {
            lines: content.split_inclusive('\n'),
            line_number: 0,
        }
    }

    /// @ai:intent Read the next raw line, None at end of input
    /// @ai:effects state mutation
    pub(crate) fn next_line(&mut self) -> Option<RawLine<'a>> {
        let text = self.lines.next()?;
        self.line_number += 1;
        Some(RawLine {
            number: self.line_number,
            text,
        })
    }

    /// @ai:intent Line number of the line that would be read next
    pub(crate) fn upcoming_line_number(&self) -> usize {
        self.line_number + 1
    }

    /// @ai:intent Consume the rest of the input as terminator-free lines
    /// @ai:effects state mutation
    pub(crate) fn remaining(&mut self) -> Vec<String> {
        let mut rest = Vec::new();
        while let Some(line) = self.next_line() {
            rest.push(trim_terminator(line.text).to_string());
        }
        rest
    }
}

impl<'a> RawLine<'a> {
    /// @ai:intent Line content without its `\n` / `\r\n` terminator, None if unterminated
    /// @ai:effects pure
    pub(crate) fn terminated(&self) -> Option<&'a str> {
        let body = self.text.strip_suffix('\n')?;
        Some(body.strip_suffix('\r').unwrap_or(body))
    }
}

/// @ai:intent Strip a trailing `\n` or `\r\n` if present
/// @ai:effects pure
pub(crate) fn trim_terminator(line: &str) -> &str {
    let body = line.strip_suffix('\n').unwrap_or(line);
    body.strip_suffix('\r').unwrap_or(body)
}
