//! Which requests may skip credential verification.
//!
//! Rules are pure data: matching looks only at the request path and method,
//! never at credential state.
//!
//! Rule syntax (used by `AUTH_EXEMPTIONS`, `;`-separated):
//! - `GET,OPTIONS ~^/api/v1/products(?:/.*)?$` regular expression path
//! - `POST /api/v1/users/login` literal path
//! - `* /api/v1/health` any method

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExemptionParseError {
    #[error("rule has no path pattern: {0:?}")]
    MissingPattern(String),
    #[error("rule has no methods: {0:?}")]
    MissingMethods(String),
    #[error("invalid method name: {0:?}")]
    InvalidMethod(String),
    #[error("invalid path regex: {0}")]
    Regex(#[from] regex::Error),
}

#[derive(Debug, Clone)]
pub enum PathPattern {
    Literal(String),
    Regex(Regex),
}

impl PathPattern {
    /// Case-sensitive. Regex patterns follow `Regex::is_match` and are only
    /// anchored if the pattern says so.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Literal(literal) => literal == path,
            PathPattern::Regex(re) => re.is_match(path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodSet {
    Any,
    /// Upper-cased method names.
    Only(Vec<String>),
}

impl MethodSet {
    pub fn only<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Only(
            methods
                .into_iter()
                .map(|m| m.as_ref().trim().to_ascii_uppercase())
                .collect(),
        )
    }

    pub fn contains(&self, method: &str) -> bool {
        match self {
            MethodSet::Any => true,
            MethodSet::Only(methods) => methods.iter().any(|m| m.eq_ignore_ascii_case(method)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExemptionRule {
    pub pattern: PathPattern,
    pub methods: MethodSet,
}

impl ExemptionRule {
    pub fn literal(path: impl Into<String>, methods: MethodSet) -> Self {
        Self {
            pattern: PathPattern::Literal(path.into()),
            methods,
        }
    }

    pub fn regex(pattern: &str, methods: MethodSet) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: PathPattern::Regex(Regex::new(pattern)?),
            methods,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, ExemptionParseError> {
        let raw = raw.trim();
        let (methods, pattern) = raw
            .split_once(char::is_whitespace)
            .ok_or_else(|| ExemptionParseError::MissingPattern(raw.to_string()))?;
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(ExemptionParseError::MissingPattern(raw.to_string()));
        }

        let methods = if methods == "*" {
            MethodSet::Any
        } else {
            let names: Vec<&str> = methods
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .collect();
            if names.is_empty() {
                return Err(ExemptionParseError::MissingMethods(raw.to_string()));
            }
            if let Some(bad) = names
                .iter()
                .find(|m| !m.chars().all(|c| c.is_ascii_alphabetic()))
            {
                return Err(ExemptionParseError::InvalidMethod(bad.to_string()));
            }
            MethodSet::only(names)
        };

        match pattern.strip_prefix('~') {
            Some(re) => Ok(Self::regex(re, methods)?),
            None => Ok(Self::literal(pattern, methods)),
        }
    }

    pub fn matches(&self, path: &str, method: &str) -> bool {
        self.methods.contains(method) && self.pattern.matches(path)
    }
}

/// The deployment's exemption table. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct ExemptionRules {
    rules: Vec<ExemptionRule>,
}

impl ExemptionRules {
    /// Public reads of the catalogue, uploads, login/registration and health.
    pub fn defaults(api_prefix: &str) -> Self {
        let p = regex::escape(api_prefix);
        let read = || MethodSet::only(["GET", "OPTIONS"]);
        let write = || MethodSet::only(["POST", "OPTIONS"]);

        // The patterns are static and escaped, so they always compile.
        let regex_rule = |pattern: String| {
            ExemptionRule::regex(&pattern, read()).map_err(|e| {
                tracing::error!(error = %e, pattern = %pattern, "default exemption failed to compile");
            })
        };

        let rules = [
            regex_rule(r"^/public/uploads(?:/.*)?$".to_string()),
            regex_rule(format!(r"^{p}/products(?:/.*)?$")),
            regex_rule(format!(r"^{p}/categories(?:/.*)?$")),
        ]
        .into_iter()
        .flatten()
        .chain([
            ExemptionRule::literal(format!("{api_prefix}/users/login"), write()),
            ExemptionRule::literal(format!("{api_prefix}/users/register"), write()),
            ExemptionRule::literal(format!("{api_prefix}/health"), MethodSet::only(["GET"])),
        ])
        .collect();

        Self { rules }
    }

    /// Parse a `;`-separated list of rules. Blank entries are skipped.
    pub fn parse_list(raw: &str) -> Result<Self, ExemptionParseError> {
        let rules = raw
            .split(';')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(ExemptionRule::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn is_exempt(&self, path: &str, method: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(path, method))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
