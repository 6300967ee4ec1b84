use std::{fmt, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,
    #[error("absolute paths are not allowed: {0}")]
    Absolute(String),
    #[error("path escapes the project root: {0}")]
    EscapesRoot(String),
    #[error("path contains an invalid segment: {0}")]
    InvalidSegment(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("`{verb}` needs a path operand")]
    MissingOperand { verb: &'static str },
    #[error("invalid `{verb}` target: {source}")]
    Path {
        verb: &'static str,
        #[source]
        source: PathError,
    },
}

/// A normalized path beneath the project root. Construction is the only
/// place traversal is checked, so every holder is safe to join onto the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectPath {
    segments: Vec<String>,
}

impl ProjectPath {
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let raw = strip_quotes(raw.trim());
        if raw.starts_with('/') || raw.starts_with('\\') || has_drive_prefix(raw) {
            return Err(PathError::Absolute(raw.to_string()));
        }

        let mut segments: Vec<String> = Vec::new();
        for segment in raw.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(PathError::EscapesRoot(raw.to_string()));
                    }
                }
                other if other.contains('\0') => {
                    return Err(PathError::InvalidSegment(other.replace('\0', "\\0")));
                }
                other => segments.push(other.to_string()),
            }
        }

        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self { segments })
    }

    pub fn top_level(&self) -> &str {
        &self.segments[0]
    }

    pub fn file_name(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    pub fn parent(&self) -> Option<ProjectPath> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn to_relative_path(&self) -> PathBuf {
        self.segments.iter().collect()
    }
}

impl fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

fn has_drive_prefix(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn strip_quotes(raw: &str) -> &str {
    raw.trim_matches(|c: char| c == '"' || c == '\'').trim()
}

/// A recognized project command. Anything that is not one of the three
/// file mutations is carried verbatim as `Exec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Write { path: ProjectPath, content: String },
    Touch { path: ProjectPath },
    Mkdir { path: ProjectPath },
    Exec { command: String },
}

impl Command {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let input = raw.trim();

        if let Some((content, target)) = split_echo_redirect(input) {
            let path =
                ProjectPath::parse(target).map_err(|source| ParseError::Path { verb: "echo", source })?;
            return Ok(Self::Write {
                path,
                content: unescape(content),
            });
        }

        if let Some(operand) = operand(input, "touch") {
            return Ok(Self::Touch {
                path: parse_operand("touch", operand)?,
            });
        }

        if let Some(operand) = operand(input, "mkdir") {
            let operand = operand
                .strip_prefix("-p")
                .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
                .map(str::trim_start)
                .unwrap_or(operand);
            return Ok(Self::Mkdir {
                path: parse_operand("mkdir", operand)?,
            });
        }

        Ok(Self::Exec {
            command: input.to_string(),
        })
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Self::Write { .. } => "write",
            Self::Touch { .. } => "touch",
            Self::Mkdir { .. } => "mkdir",
            Self::Exec { .. } => "exec",
        }
    }

    pub fn path(&self) -> Option<&ProjectPath> {
        match self {
            Self::Write { path, .. } | Self::Touch { path } | Self::Mkdir { path } => Some(path),
            Self::Exec { .. } => None,
        }
    }
}

fn operand<'a>(input: &'a str, verb: &str) -> Option<&'a str> {
    let rest = input.strip_prefix(verb)?;
    if rest.is_empty() {
        return Some("");
    }
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim())
}

fn parse_operand(verb: &'static str, operand: &str) -> Result<ProjectPath, ParseError> {
    if strip_quotes(operand).is_empty() {
        return Err(ParseError::MissingOperand { verb });
    }
    ProjectPath::parse(operand).map_err(|source| ParseError::Path { verb, source })
}

/// Splits `echo "<content>" > <target>`. The content is greedy: the closing
/// quote is the last one followed by a single-line redirect target.
fn split_echo_redirect(input: &str) -> Option<(&str, &str)> {
    let rest = input.strip_prefix("echo")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let body = rest.trim_start().strip_prefix('"')?;

    for (idx, _) in body.rmatch_indices('>') {
        let target = body[idx + 1..].trim();
        if target.is_empty() || target.contains('\n') || target.starts_with('>') {
            continue;
        }
        let Some(content) = body[..idx].trim_end().strip_suffix('"') else {
            continue;
        };
        return Some((content, target));
    }
    None
}

/// Resolves `\"`, `\n`, `\t` and `\\` in one left-to-right pass. Any other
/// backslash sequence is kept as written.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
#[path = "tests/command_tests.rs"]
mod tests;
