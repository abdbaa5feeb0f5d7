//! Text macros.
//!
//! A macro name may carry several bodies, told apart only by how many parameters they take.
//! Expansion is plain text substitution of `@param` tokens: the result is parsed again as if it
//! had been written inline, so a macro may expand into fragments that are not well formed on their
//! own.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

/// The prefix marking a parameter reference inside a macro body.
pub const PARAM_PREFIX: char = '@';

/// An error occurred when expanding a macro.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MacroError {
    /// No macro with this name was defined.
    #[error("unknown macro `{0}`")]
    UnknownMacro(String),
    /// The macro exists but has no body taking this many arguments.
    #[error("macro `{name}` takes {expected:?} arguments, but {given} were given")]
    ArityMismatch {
        /// The macro name.
        name: String,
        /// How many arguments the invocation passed.
        given: usize,
        /// The arities that are defined.
        expected: Vec<usize>,
    },
}

/// One body of a macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroBody {
    /// Parameter names, without the `@` prefix, in declaration order.
    pub params: Vec<String>,
    /// The body text.
    pub body: String,
}

/// The macros defined in one document.
#[derive(Debug, Clone, Default)]
pub struct MacroEngine {
    macros: HashMap<String, BTreeMap<usize, MacroBody>>,
}

impl MacroEngine {
    /// Creates an engine without definitions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `body` under `name` for `params.len()` arguments, replacing a body of the same arity.
    pub fn define(&mut self, name: &str, params: Vec<String>, body: impl Into<String>) {
        let arity = params.len();
        self.macros.entry(name.to_string()).or_default().insert(
            arity,
            MacroBody {
                params,
                body: body.into(),
            },
        );
    }

    /// Whether any body is defined under `name`.
    #[must_use]
    pub fn is_defined(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    /// Whether `name` has a body taking no arguments, so it may be invoked by its bare name.
    #[must_use]
    pub fn has_nullary(&self, name: &str) -> bool {
        self.macros
            .get(name)
            .is_some_and(|bodies| bodies.contains_key(&0))
    }

    /// Arities defined under `name`, ascending.
    #[must_use]
    pub fn arities(&self, name: &str) -> Vec<usize> {
        self.macros
            .get(name)
            .map(|bodies| bodies.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Substitutes `args` into the body of `name` taking `args.len()` parameters.
    ///
    /// Parameters are replaced longest name first, so `@ab` is never clobbered by a parameter
    /// called `a`.
    ///
    /// # Errors
    ///
    /// [`MacroError::UnknownMacro`] if `name` is undefined, [`MacroError::ArityMismatch`] if no
    /// body takes this many arguments.
    pub fn expand(&self, name: &str, args: &[String]) -> Result<String, MacroError> {
        let bodies = self
            .macros
            .get(name)
            .ok_or_else(|| MacroError::UnknownMacro(name.to_string()))?;
        let body = bodies
            .get(&args.len())
            .ok_or_else(|| MacroError::ArityMismatch {
                name: name.to_string(),
                given: args.len(),
                expected: bodies.keys().copied().collect(),
            })?;

        let mut order: Vec<usize> = (0..body.params.len()).collect();
        order.sort_by(|&a, &b| body.params[b].len().cmp(&body.params[a].len()));

        let mut text = body.body.clone();
        for index in order {
            let token = format!("{PARAM_PREFIX}{}", body.params[index]);
            text = text.replace(&token, &args[index]);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn longest_parameter_first() {
        let mut engine = MacroEngine::new();
        engine.define("m", params(&["a", "ab"]), "@ab @a @ab@a");
        let out = engine
            .expand("m", &["X".to_string(), "YY".to_string()])
            .unwrap();
        assert_eq!(out, "YY X YYX");
    }

    #[test]
    fn arity_selects_body_and_redefinition_replaces() {
        let mut engine = MacroEngine::new();
        engine.define("n", vec![], "p 60;");
        engine.define("n", params(&["p"]), "p @p;");
        engine.define("n", params(&["q"]), "pitch @q;");
        assert_eq!(engine.expand("n", &[]).unwrap(), "p 60;");
        assert_eq!(engine.expand("n", &["62".into()]).unwrap(), "pitch 62;");
        assert_eq!(engine.arities("n"), vec![0, 1]);
        assert!(engine.has_nullary("n"));
    }

    #[test]
    fn errors() {
        let mut engine = MacroEngine::new();
        engine.define("two", params(&["a", "b"]), "@a @b");
        assert_eq!(
            engine.expand("nope", &[]),
            Err(MacroError::UnknownMacro("nope".into()))
        );
        assert_eq!(
            engine.expand("two", &["1".into()]),
            Err(MacroError::ArityMismatch {
                name: "two".into(),
                given: 1,
                expected: vec![2],
            })
        );
        assert!(!engine.has_nullary("two"));
    }

    #[test]
    fn no_parameter_token_survives() {
        let mut engine = MacroEngine::new();
        engine.define("x", params(&["first", "f", "fi"]), "@f@fi@first @first@f");
        let out = engine
            .expand("x", &["1".into(), "2".into(), "3".into()])
            .unwrap();
        assert_eq!(out, "231 12");
        assert!(!out.contains(PARAM_PREFIX));
    }
}
