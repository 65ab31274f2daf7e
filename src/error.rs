//! The crate's error taxonomy, per `spec.md` §7: meta errors (bad or
//! missing front-matter), parse errors (malformed rule text), and
//! action-prerequisite errors (an operation's precondition wasn't met).

use thiserror::Error;

/// Everything that can go wrong while loading, normalizing, recognizing, or
/// interactively deriving a grammar.
#[derive(Debug, Error)]
pub enum CfgError {
    /// No `format:` meta line was found in the input document.
    #[error("input document has no `format` line")]
    MissingFormat,

    /// The `format:` value wasn't one of `char`, `spaced`, or `spaced!`.
    #[error("unknown format `{0}`")]
    UnknownFormat(String),

    /// The `mode:` value wasn't one of the modes the front-end supports.
    #[error("unknown mode `{0}`")]
    UnknownMode(String),

    /// A rule line has no `->`.
    #[error("rule line has no `->`: `{0}`")]
    MissingArrow(String),

    /// A `char`-format letter token contained whitespace.
    #[error("`char` format letters may not contain whitespace: `{0}`")]
    SpaceInCharLetter(String),

    /// A rule line parsed but its shape doesn't make sense (e.g. a
    /// multi-letter or terminal left-hand side).
    #[error("malformed rule line: `{0}`")]
    MalformedRule(String),

    /// An operation that requires a start variable was attempted on a
    /// grammar that has none set.
    #[error("grammar has no start variable")]
    MissingStartVariable,

    /// The candidate word is not recognized by the grammar.
    #[error("word is not recognized by the grammar")]
    WordNotRecognized,

    /// A node id passed to the interactive driver does not carry a letter.
    #[error("node does not carry a letter")]
    NotALetterNode,

    /// An interactive choice named a variable leaf index that doesn't exist.
    #[error("variable index {index} is out of range")]
    InvalidVariableIndex {
        /// The out-of-range index that was requested.
        index: usize,
    },

    /// An interactive choice named a rule index that doesn't exist for the
    /// chosen variable.
    #[error("rule index {index} is out of range")]
    InvalidRuleIndex {
        /// The out-of-range index that was requested.
        index: usize,
    },

    /// A variable has no rules at all, so it can never be expanded.
    #[error("no rules found for variable `{variable}`")]
    NoRulesForVariable {
        /// The variable's display name.
        variable: String,
    },

    /// `undo` was called with nothing left to undo.
    #[error("nothing left to undo")]
    NothingToUndo,

    /// Propagated I/O failure (reading input, writing a report).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
