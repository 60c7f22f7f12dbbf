//! Route pattern compilation and matching.
//!
//! # Responsibilities
//! - Compile a pattern such as `/users/:id/posts/:post_id` into tokens
//! - Match a concrete pathname against the compiled tokens
//! - Extract named parameters in declaration order
//!
//! # Design Decisions
//! - No regex: patterns compile to literal and parameter tokens
//! - Matching is anchored at both ends, case-sensitive, no trailing-slash folding
//! - A parameter captures one or more characters, never `/`
//! - Parameter names are `[A-Za-z0-9_]+`; anything after the name is literal
//! - Duplicate or adjacent parameters are rejected at compile time

use std::collections::HashMap;

use crate::routing::RoutingError;

/// Parameters captured from a matched path, keyed by name.
pub type Params = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Param(String),
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    pattern: String,
    tokens: Vec<Token>,
    param_names: Vec<String>,
}

impl PathMatcher {
    /// Compile a route pattern.
    ///
    /// Fails with [`RoutingError::MalformedPattern`] when the pattern is empty,
    /// does not start with `/`, contains a `:` with no name after it, declares
    /// the same name twice, or places two parameters back to back.
    pub fn compile(pattern: &str) -> Result<Self, RoutingError> {
        if pattern.is_empty() {
            return Err(RoutingError::malformed(pattern, "pattern is empty"));
        }
        if !pattern.starts_with('/') {
            return Err(RoutingError::malformed(pattern, "pattern must start with '/'"));
        }

        let mut tokens = Vec::new();
        let mut param_names: Vec<String> = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.char_indices().peekable();

        while let Some((offset, c)) = chars.next() {
            if c != ':' {
                literal.push(c);
                continue;
            }

            let mut name = String::new();
            while let Some(&(_, n)) = chars.peek() {
                if !is_param_char(n) {
                    break;
                }
                name.push(n);
                chars.next();
            }

            if name.is_empty() {
                return Err(RoutingError::malformed(
                    pattern,
                    format!("parameter at offset {offset} has no name"),
                ));
            }
            if param_names.contains(&name) {
                return Err(RoutingError::malformed(
                    pattern,
                    format!("duplicate parameter `{name}`"),
                ));
            }

            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            } else if matches!(tokens.last(), Some(Token::Param(_))) {
                return Err(RoutingError::malformed(
                    pattern,
                    format!("parameter `{name}` directly follows another parameter"),
                ));
            }

            tokens.push(Token::Param(name.clone()));
            param_names.push(name);
        }

        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        Ok(Self {
            pattern: pattern.to_string(),
            tokens,
            param_names,
        })
    }

    /// The source pattern this matcher was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Parameter names in declaration order.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// True when the pattern has no parameters.
    pub fn is_literal(&self) -> bool {
        self.param_names.is_empty()
    }

    /// Match a pathname, returning the captured parameters on success.
    pub fn matches(&self, path: &str) -> Option<Params> {
        if self.is_literal() {
            return (path == self.pattern).then(Params::new);
        }

        let mut captures = Vec::with_capacity(self.param_names.len());
        if !match_tokens(&self.tokens, path, &mut captures) {
            return None;
        }

        Some(
            self.param_names
                .iter()
                .zip(captures)
                .map(|(name, value)| (name.clone(), value.to_string()))
                .collect(),
        )
    }
}

fn is_param_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// Parameters try the longest capture first and back off until the rest matches.
fn match_tokens<'p>(tokens: &[Token], path: &'p str, captures: &mut Vec<&'p str>) -> bool {
    match tokens.split_first() {
        None => path.is_empty(),
        Some((Token::Literal(literal), rest)) => path
            .strip_prefix(literal.as_str())
            .is_some_and(|tail| match_tokens(rest, tail, captures)),
        Some((Token::Param(_), rest)) => {
            let segment_end = path.find('/').unwrap_or(path.len());
            for end in (1..=segment_end).rev() {
                if !path.is_char_boundary(end) {
                    continue;
                }
                captures.push(&path[..end]);
                if match_tokens(rest, &path[end..], captures) {
                    return true;
                }
                captures.pop();
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_literal_pattern_is_exact() {
        let matcher = PathMatcher::compile("/about/team").unwrap();
        assert!(matcher.is_literal());

        assert_eq!(matcher.matches("/about/team"), Some(Params::new()));
        assert_eq!(matcher.matches("/about/team/"), None); // No trailing-slash folding
        assert_eq!(matcher.matches("/About/team"), None); // Case sensitive
        assert_eq!(matcher.matches("/about"), None);
        assert_eq!(matcher.matches("/about/teams"), None);
    }

    #[test]
    fn test_extracts_named_params() {
        let matcher = PathMatcher::compile("/users/:id/posts/:postId").unwrap();
        assert_eq!(matcher.param_names(), &["id".to_string(), "postId".to_string()]);

        assert_eq!(
            matcher.matches("/users/42/posts/7"),
            Some(params(&[("id", "42"), ("postId", "7")]))
        );
    }

    #[test]
    fn test_param_is_single_segment() {
        let matcher = PathMatcher::compile("/users/:id").unwrap();

        assert_eq!(matcher.matches("/users/42/extra"), None);
        assert_eq!(matcher.matches("/users/"), None); // Empty capture
        assert_eq!(matcher.matches("/users"), None);
        assert_eq!(matcher.matches("/users/42"), Some(params(&[("id", "42")])));
    }

    #[test]
    fn test_param_with_trailing_literal() {
        let matcher = PathMatcher::compile("/files/:name.json").unwrap();

        assert_eq!(
            matcher.matches("/files/report.v2.json"),
            Some(params(&[("name", "report.v2")]))
        );
        assert_eq!(matcher.matches("/files/report.xml"), None);
        assert_eq!(matcher.matches("/files/.json"), None);
    }

    #[test]
    fn test_captures_are_not_decoded() {
        let matcher = PathMatcher::compile("/tags/:tag").unwrap();
        assert_eq!(
            matcher.matches("/tags/caf%C3%A9"),
            Some(params(&[("tag", "caf%C3%A9")]))
        );
        assert_eq!(matcher.matches("/tags/café"), Some(params(&[("tag", "café")])));
    }

    #[test]
    fn test_rejects_malformed_patterns() {
        for pattern in ["", "users", "/users/:", "/:/posts", "/a/:x:y"] {
            let err = PathMatcher::compile(pattern).unwrap_err();
            assert!(
                matches!(err, RoutingError::MalformedPattern { .. }),
                "expected {pattern:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_duplicate_param_names() {
        let err = PathMatcher::compile("/a/:id/b/:id").unwrap_err();
        assert_eq!(
            err,
            RoutingError::MalformedPattern {
                pattern: "/a/:id/b/:id".into(),
                reason: "duplicate parameter `id`".into(),
            }
        );
    }
}
