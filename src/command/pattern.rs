use thiserror::Error;

/// The type a placeholder token accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Str,
    Float,
    UInt,
}

/// One positional unit of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(ParamKind),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,
    #[error("stray bracket in pattern token `{0}`")]
    StrayBracket(String),
    #[error("unknown placeholder `{0}`, expected [str], [float] or [uint]")]
    UnknownPlaceholder(String),
}

/// A compiled command template. Immutable once parsed; the original text is
/// kept for help listings and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

/// Splits a command line (or a pattern string) into positional tokens:
/// whitespace-separated words, with path words further split on `/`.
/// `vget /object/Cube_0/location` becomes `[vget, object, Cube_0, location]`.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace()
        .flat_map(|word| word.split('/'))
        .filter(|piece| !piece.is_empty())
        .collect()
}

impl Pattern {
    pub fn parse(source: &str) -> Result<Self, PatternError> {
        let mut segments = Vec::new();
        for token in tokenize(source) {
            segments.push(parse_token(token)?);
        }
        if segments.is_empty() {
            return Err(PatternError::Empty);
        }
        Ok(Self {
            source: source.trim().to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Leading literal segments up to the first placeholder, joined as the
    /// table lookup key. Placeholder-free patterns key on the whole sequence.
    pub fn prefix_key(&self) -> String {
        let literals: Vec<&str> = self
            .segments
            .iter()
            .map_while(|seg| match seg {
                Segment::Literal(text) => Some(text.as_str()),
                Segment::Param(_) => None,
            })
            .collect();
        literals.join(" ")
    }

    pub fn param_kinds(&self) -> Vec<ParamKind> {
        self.segments
            .iter()
            .filter_map(|seg| match seg {
                Segment::Param(kind) => Some(*kind),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    pub fn param_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|seg| matches!(seg, Segment::Param(_)))
            .count()
    }

    /// Two patterns collide when the matcher could never tell them apart:
    /// same length, identical literal text at identical positions. Placeholder
    /// kinds are ignored since matching consumes a token regardless of kind.
    pub fn collides_with(&self, other: &Pattern) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(other.segments.iter())
                .all(|(a, b)| match (a, b) {
                    (Segment::Literal(x), Segment::Literal(y)) => x == y,
                    (Segment::Param(_), Segment::Param(_)) => true,
                    _ => false,
                })
    }
}

fn parse_token(token: &str) -> Result<Segment, PatternError> {
    if let Some(inner) = token.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        return match inner {
            "str" => Ok(Segment::Param(ParamKind::Str)),
            "float" => Ok(Segment::Param(ParamKind::Float)),
            "uint" => Ok(Segment::Param(ParamKind::UInt)),
            _ => Err(PatternError::UnknownPlaceholder(token.to_string())),
        };
    }
    if token.contains('[') || token.contains(']') {
        return Err(PatternError::StrayBracket(token.to_string()));
    }
    Ok(Segment::Literal(token.to_string()))
}
