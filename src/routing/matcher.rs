//! Path pattern matching and destination rendering.
//!
//! # Responsibilities
//! - Parse source patterns (`/api/tokens/{id}`, `/api/auth/{*path}`)
//! - Match an inbound path and capture parameters
//! - Render a destination template from the captures
//!
//! # Design Decisions
//! - Path matching is case-sensitive and segment-based
//! - A trailing slash is ignored (`/api/repositories/` == `/api/repositories`)
//! - `{*name}` captures one or more remaining segments and must come last
//! - Captured text is copied verbatim, never decoded or re-encoded
//! - Paths with `.` or `..` segments (plain or percent-encoded) never match,
//!   so a capture cannot climb out of the backend path prefix

use thiserror::Error;

/// Errors raised while compiling a pattern or template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern '{0}' must start with '/'")]
    MissingLeadingSlash(String),

    #[error("pattern '{0}' has an empty parameter name")]
    EmptyParameter(String),

    #[error("pattern '{0}' has a wildcard before its last segment")]
    WildcardNotLast(String),

    #[error("pattern '{0}' has a malformed segment '{1}'")]
    MalformedSegment(String, String),

    #[error("pattern '{0}' declares '{1}' twice")]
    DuplicateParameter(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    CatchAll(String),
}

/// Values captured by a successful match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    values: Vec<(String, String)>,
}

impl Captures {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A compiled inbound path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if !raw.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(raw.to_string()));
        }

        let parts = split_path(raw);
        let mut segments = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            let segment = match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Some(inner) => {
                    let (name, wildcard) = match inner.strip_prefix('*') {
                        Some(name) => (name, true),
                        None => (inner, false),
                    };
                    if name.is_empty() {
                        return Err(PatternError::EmptyParameter(raw.to_string()));
                    }
                    if !is_identifier(name) {
                        return Err(PatternError::MalformedSegment(raw.to_string(), part.to_string()));
                    }
                    if wildcard && i + 1 != parts.len() {
                        return Err(PatternError::WildcardNotLast(raw.to_string()));
                    }
                    if wildcard {
                        Segment::CatchAll(name.to_string())
                    } else {
                        Segment::Param(name.to_string())
                    }
                }
                None if part.contains('{') || part.contains('}') || part.is_empty() => {
                    return Err(PatternError::MalformedSegment(raw.to_string(), part.to_string()));
                }
                None => Segment::Literal(part.to_string()),
            };
            segments.push(segment);
        }

        let pattern = Self {
            raw: raw.to_string(),
            segments,
        };
        let mut seen: Vec<&str> = Vec::new();
        for name in pattern.parameters() {
            if seen.contains(&name) {
                return Err(PatternError::DuplicateParameter(raw.to_string(), name.to_string()));
            }
            seen.push(name);
        }
        Ok(pattern)
    }

    /// The pattern as written in configuration.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Names bound by this pattern.
    pub fn parameters(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) | Segment::CatchAll(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match a request path, returning the captured parameters.
    pub fn matches(&self, path: &str) -> Option<Captures> {
        if has_dot_segment(path) {
            return None;
        }
        let parts = split_path(path);
        let mut captures = Captures::default();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(lit) => {
                    if parts.get(i) != Some(&lit.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = parts.get(i).filter(|v| !v.is_empty())?;
                    captures.values.push((name.clone(), value.to_string()));
                }
                Segment::CatchAll(name) => {
                    let rest = parts.get(i..).filter(|r| !r.is_empty())?;
                    captures.values.push((name.clone(), rest.join("/")));
                    return Some(captures);
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(captures)
    }
}

/// True if any segment of `path` is `.` or `..`, including the `%2e` forms.
pub fn has_dot_segment(path: &str) -> bool {
    path.split('/').any(|segment| {
        let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
        decoded == "." || decoded == ".."
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplatePart {
    Literal(String),
    Placeholder(String),
}

/// A backend path template such as `/auth/{path}`.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    raw: String,
    parts: Vec<TemplatePart>,
}

impl PathTemplate {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if !raw.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(raw.to_string()));
        }

        let mut parts = Vec::new();
        let mut rest = raw;
        while let Some(open) = rest.find('{') {
            if open > 0 {
                parts.push(TemplatePart::Literal(rest[..open].to_string()));
            }
            let close = rest[open..]
                .find('}')
                .map(|c| open + c)
                .ok_or_else(|| PatternError::MalformedSegment(raw.to_string(), rest[open..].to_string()))?;
            let name = &rest[open + 1..close];
            if name.is_empty() {
                return Err(PatternError::EmptyParameter(raw.to_string()));
            }
            if !is_identifier(name) {
                return Err(PatternError::MalformedSegment(raw.to_string(), name.to_string()));
            }
            parts.push(TemplatePart::Placeholder(name.to_string()));
            rest = &rest[close + 1..];
        }
        if rest.contains('}') {
            return Err(PatternError::MalformedSegment(raw.to_string(), rest.to_string()));
        }
        if !rest.is_empty() {
            parts.push(TemplatePart::Literal(rest.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            parts,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names referenced by the template.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|p| match p {
            TemplatePart::Placeholder(name) => Some(name.as_str()),
            TemplatePart::Literal(_) => None,
        })
    }

    /// Substitute captures into the template. Unbound placeholders render empty;
    /// route compilation rejects those up front.
    pub fn render(&self, captures: &Captures) -> String {
        let mut out = String::with_capacity(self.raw.len());
        for part in &self.parts {
            match part {
                TemplatePart::Literal(lit) => out.push_str(lit),
                TemplatePart::Placeholder(name) => out.push_str(captures.get(name).unwrap_or_default()),
            }
        }
        out
    }
}

fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.trim_start_matches('/').trim_end_matches('/');
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

fn is_identifier(name: &str) -> bool {
    name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_pattern() {
        let pattern = PathPattern::parse("/api/repositories/sync").unwrap();
        assert!(pattern.matches("/api/repositories/sync").is_some());
        assert!(pattern.matches("/api/repositories/sync/").is_some());
        assert!(pattern.matches("/api/repositories").is_none());
        assert!(pattern.matches("/api/repositories/sync/extra").is_none());
        assert!(pattern.matches("/API/repositories/sync").is_none()); // Case sensitive
    }

    #[test]
    fn test_param_pattern() {
        let pattern = PathPattern::parse("/api/tokens/{id}").unwrap();
        let captures = pattern.matches("/api/tokens/tok_42").unwrap();
        assert_eq!(captures.get("id"), Some("tok_42"));
        assert!(pattern.matches("/api/tokens").is_none());
        assert!(pattern.matches("/api/tokens/a/b").is_none());
    }

    #[test]
    fn test_catch_all_requires_a_segment() {
        let pattern = PathPattern::parse("/api/auth/{*path}").unwrap();
        assert_eq!(
            pattern.matches("/api/auth/login").unwrap().get("path"),
            Some("login")
        );
        assert_eq!(
            pattern.matches("/api/auth/oauth/github/callback").unwrap().get("path"),
            Some("oauth/github/callback")
        );
        assert!(pattern.matches("/api/auth").is_none());
    }

    #[test]
    fn test_captures_are_not_decoded() {
        let pattern = PathPattern::parse("/api/{*path}").unwrap();
        let captures = pattern.matches("/api/files/a%20b").unwrap();
        assert_eq!(captures.get("path"), Some("files/a%20b"));
    }

    #[test]
    fn test_dot_segments_never_match() {
        let pattern = PathPattern::parse("/api/{*path}").unwrap();
        assert!(pattern.matches("/api/../../admin/secret").is_none());
        assert!(pattern.matches("/api/./repositories").is_none());
        assert!(pattern.matches("/api/%2e%2e/admin").is_none());
        assert!(pattern.matches("/api/.%2E/admin").is_none());
        assert!(pattern.matches("/api/v1.2/..data").is_some());
    }

    #[test]
    fn test_has_dot_segment() {
        assert!(has_dot_segment("/a/../b"));
        assert!(has_dot_segment("/a/%2E"));
        assert!(!has_dot_segment("/a/.well-known/b"));
        assert!(!has_dot_segment("/a/b..c"));
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(matches!(
            PathPattern::parse("api/x"),
            Err(PatternError::MissingLeadingSlash(_))
        ));
        assert!(matches!(
            PathPattern::parse("/api/{*path}/more"),
            Err(PatternError::WildcardNotLast(_))
        ));
        assert!(matches!(
            PathPattern::parse("/api/{}"),
            Err(PatternError::EmptyParameter(_))
        ));
        assert!(matches!(
            PathPattern::parse("/api/{id}/{id}"),
            Err(PatternError::DuplicateParameter(_, _))
        ));
        assert!(matches!(
            PathPattern::parse("/api/x{id}"),
            Err(PatternError::MalformedSegment(_, _))
        ));
    }

    #[test]
    fn test_template_render() {
        let pattern = PathPattern::parse("/api/auth/{*path}").unwrap();
        let template = PathTemplate::parse("/auth/{path}").unwrap();
        let captures = pattern.matches("/api/auth/callback").unwrap();
        assert_eq!(template.render(&captures), "/auth/callback");
        assert_eq!(template.placeholders().collect::<Vec<_>>(), vec!["path"]);
    }

    #[test]
    fn test_template_literal_only() {
        let template = PathTemplate::parse("/api/repositories").unwrap();
        assert_eq!(template.render(&Captures::default()), "/api/repositories");
        assert!(PathTemplate::parse("/auth/{path").is_err());
        assert!(PathTemplate::parse("auth").is_err());
    }
}
