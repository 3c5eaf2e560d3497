use regex::Regex;
use serde::{Deserialize, Serialize};

/// A single action pattern: a regular expression tested against a normalized
/// request path.
///
/// The expression is compiled once, when the pattern is constructed or
/// deserialized. A pattern that fails to compile is kept (with its error) so
/// evaluation can fail closed on it instead of silently dropping the rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ActionPattern {
    source: String,
    compiled: Result<Regex, String>,
}

impl ActionPattern {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let compiled = Regex::new(&source).map_err(|e| e.to_string());
        if let Err(err) = &compiled {
            tracing::warn!(pattern = %source, error = %err, "invalid action pattern");
        }
        Self { source, compiled }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_valid(&self) -> bool {
        self.compiled.is_ok()
    }

    /// Compile error, if the pattern is not a valid expression.
    pub fn error(&self) -> Option<&str> {
        self.compiled.as_ref().err().map(String::as_str)
    }

    /// Test the pattern against a path.
    ///
    /// Unanchored search semantics: `"/pung"` matches `"/x/pung/y"`. Returns the
    /// compile error when the pattern is invalid.
    pub fn matches(&self, path: &str) -> Result<bool, &str> {
        match &self.compiled {
            Ok(re) => Ok(re.is_match(path)),
            Err(err) => Err(err.as_str()),
        }
    }
}

impl PartialEq for ActionPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for ActionPattern {}

impl From<String> for ActionPattern {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for ActionPattern {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<ActionPattern> for String {
    fn from(value: ActionPattern) -> Self {
        value.source
    }
}

impl core::fmt::Display for ActionPattern {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.source)
    }
}

/// A set of path-matching patterns used in either an allow or a deny role.
///
/// `resources` is carried with the statement but is not consulted when
/// evaluating a request; only `actions` are matched against the path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    #[serde(default, alias = "Actions")]
    pub actions: Vec<ActionPattern>,

    #[serde(default, alias = "Resources")]
    pub resources: Vec<String>,
}

impl Statement {
    pub fn new<A, R>(actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<ActionPattern>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            actions: actions.into_iter().map(Into::into).collect(),
            resources: resources.into_iter().map(Into::into).collect(),
        }
    }

    /// Statement over `actions` applying to every resource (`".*"`).
    pub fn for_actions<A>(actions: A) -> Self
    where
        A: IntoIterator,
        A::Item: Into<ActionPattern>,
    {
        Self::new(actions, [".*"])
    }
}

/// A bundle of deny and allow statements, as attached to an access policy.
///
/// A principal may hold several of these (one per policy it is granted,
/// directly or through a policy group).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    #[serde(default, alias = "Denys")]
    pub denys: Vec<Statement>,

    #[serde(default, alias = "Allows")]
    pub allows: Vec<Statement>,
}

impl Permission {
    pub fn new(denys: Vec<Statement>, allows: Vec<Statement>) -> Self {
        Self { denys, allows }
    }

    pub fn allowing<A>(actions: A) -> Self
    where
        A: IntoIterator,
        A::Item: Into<ActionPattern>,
    {
        Self::new(Vec::new(), vec![Statement::for_actions(actions)])
    }

    pub fn denying<A>(actions: A) -> Self
    where
        A: IntoIterator,
        A::Item: Into<ActionPattern>,
    {
        Self::new(vec![Statement::for_actions(actions)], Vec::new())
    }

    /// Patterns in this permission that failed to compile.
    pub fn invalid_patterns(&self) -> impl Iterator<Item = &ActionPattern> {
        self.denys
            .iter()
            .chain(self.allows.iter())
            .flat_map(|s| s.actions.iter())
            .filter(|a| !a.is_valid())
    }
}
