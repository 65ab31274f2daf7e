//! The text front-end: splitting an input document into meta and parse
//! lines, collapsing meta keywords (last line wins), and parsing rule
//! lines in each of the three surface syntaxes, per `spec.md` §6.
//!
//! `spec.md` §1 lists the tokenizer, the three rule-line syntaxes, and the
//! CLI argument handler as "out of scope... specified only by the
//! interfaces the core consumes," then §6 specifies their exact behavior
//! in full. This module is that front-end: deliberately thin, with no
//! generalized grammar description language and no recovery from malformed
//! input beyond the taxonomy in [`crate::error::CfgError`].

use crate::error::CfgError;
use crate::grammar::Grammar;
use crate::letter::{has_upper, Letter, Word};
use crate::rule::Rule;

const META_KEYWORDS: [&str; 4] = ["mode", "format", "action", "#"];
const EPSILON_TOKENS: [&str; 2] = ["e", "\u{3b5}"];
const ARROWS: [&str; 2] = ["->", "\u{2192}"];

/// The document's collapsed front-matter. `mode`, `format`, and `action`
/// are each set from the *last* meta line bearing that keyword
/// (`spec.md` §6, "last-wins semantics... is the contract, not a bug");
/// earlier lines with the same keyword are discarded outright, not merged.
#[derive(Clone, Debug, Default)]
pub struct MetaData {
    /// The `mode` value, if a `mode` line was present.
    pub mode: Option<String>,
    /// The `format` value, if a `format` line was present.
    pub format: Option<String>,
    /// The `action` token list from the last `action` line, if any.
    pub action: Vec<String>,
}

/// Splits `text` into parse lines and meta lines, in their original
/// relative order within each list. Blank lines are ignored; a line's
/// first whitespace-separated token decides which list it lands in.
pub fn split_lines(text: &str) -> (Vec<&str>, Vec<&str>) {
    let mut parse_lines = Vec::new();
    let mut meta_lines = Vec::new();
    for line in text.trim().lines() {
        if line.trim().is_empty() {
            continue;
        }
        let first_word = line.split_whitespace().next().unwrap_or("");
        if META_KEYWORDS.contains(&first_word) {
            meta_lines.push(line);
        } else {
            parse_lines.push(line);
        }
    }
    (parse_lines, meta_lines)
}

/// Collapses meta lines into a [`MetaData`], keeping only the last line
/// for each keyword.
pub fn parse_meta_lines(meta_lines: &[&str]) -> MetaData {
    let mut meta = MetaData::default();
    for line in meta_lines {
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else { continue };
        let rest: Vec<String> = tokens.map(str::to_string).collect();
        match keyword {
            "mode" => meta.mode = rest.into_iter().next(),
            "format" => meta.format = rest.into_iter().next(),
            "action" => meta.action = rest,
            _ => {}
        }
    }
    meta
}

/// A word parser for one of the three rule-line surface syntaxes.
pub type WordParser = fn(&str) -> Result<Word, CfgError>;

/// Resolves the `format` meta value to its word parser.
pub fn word_parser_for(format: &str) -> Result<WordParser, CfgError> {
    match format {
        "char" => Ok(word_char as WordParser),
        "spaced" => Ok(word_spaced as WordParser),
        "spaced!" => Ok(word_spaced_exclaim as WordParser),
        other => Err(CfgError::UnknownFormat(other.to_string())),
    }
}

/// The `char` format: every character of the (space-free) token is its own
/// letter; uppercase marks a variable. `e`/`ε` alone denote the empty word.
pub fn word_char(text: &str) -> Result<Word, CfgError> {
    let trimmed = text.trim();
    if trimmed.chars().any(char::is_whitespace) {
        return Err(CfgError::SpaceInCharLetter(text.to_string()));
    }
    if EPSILON_TOKENS.contains(&trimmed) {
        return Ok(Vec::new());
    }
    Ok(trimmed
        .chars()
        .map(|c| Letter::new(c.to_string(), c.is_uppercase()))
        .collect())
}

/// The `spaced` format: whitespace-separated tokens; a token with any
/// uppercase character is a variable.
pub fn word_spaced(text: &str) -> Result<Word, CfgError> {
    let trimmed = text.trim();
    if EPSILON_TOKENS.contains(&trimmed) {
        return Ok(Vec::new());
    }
    Ok(trimmed
        .split_whitespace()
        .map(|tok| Letter::new(tok.to_string(), has_upper(tok)))
        .collect())
}

/// The `spaced!` format: whitespace-separated tokens; a token ending in
/// `!` is a variable whose name drops the trailing `!`.
pub fn word_spaced_exclaim(text: &str) -> Result<Word, CfgError> {
    let trimmed = text.trim();
    if EPSILON_TOKENS.contains(&trimmed) {
        return Ok(Vec::new());
    }
    Ok(trimmed
        .split_whitespace()
        .map(|tok| match tok.strip_suffix('!') {
            Some(name) => Letter::variable(name),
            None => Letter::terminal(tok),
        })
        .collect())
}

fn determine_arrow(line: &str) -> Result<&'static str, CfgError> {
    ARROWS
        .into_iter()
        .find(|arrow| line.contains(arrow))
        .ok_or_else(|| CfgError::MissingArrow(line.to_string()))
}

/// Parses a single `start X` line, setting `grammar`'s start variable.
/// Returns `Ok(false)` for any line that isn't a `start` line, leaving
/// `grammar` untouched.
fn try_set_start(grammar: &mut Grammar, line: &str, parser: WordParser) -> Result<bool, CfgError> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("start") {
        return Ok(false);
    }
    let var_token = tokens
        .next()
        .ok_or_else(|| CfgError::MalformedRule(line.to_string()))?;
    let word = parser(var_token)?;
    let letter = word
        .into_iter()
        .next()
        .ok_or_else(|| CfgError::MalformedRule(line.to_string()))?;
    if !letter.is_variable() {
        return Err(CfgError::MalformedRule(line.to_string()));
    }
    grammar.set_start_variable(letter);
    Ok(true)
}

/// Parses one rule line (`input -> alt | alt | ...`) into one rule per
/// `|`-separated alternative.
fn line_to_rules(line: &str, parser: WordParser) -> Result<Vec<Rule>, CfgError> {
    let arrow = determine_arrow(line)?;
    let (input_str, output_str) = line
        .split_once(arrow)
        .ok_or_else(|| CfgError::MissingArrow(line.to_string()))?;
    let input_name = input_str.trim();
    if input_name.is_empty() {
        return Err(CfgError::MalformedRule(line.to_string()));
    }
    let input_letter = Letter::variable(input_name);
    output_str
        .split('|')
        .map(|alt| parser(alt).map(|output| Rule::new(input_letter.clone(), output)))
        .collect()
}

/// Parses a document's parse lines into a [`Grammar`], using `parser` for
/// every rule line's right-hand side.
pub fn lines_to_grammar(parse_lines: &[&str], parser: WordParser) -> Result<Grammar, CfgError> {
    let mut grammar = Grammar::new();
    for &line in parse_lines {
        let trimmed = line.trim();
        if try_set_start(&mut grammar, trimmed, parser)? {
            continue;
        }
        for rule in line_to_rules(trimmed, parser)? {
            grammar.add_rule(rule);
        }
    }
    Ok(grammar)
}

/// The front-end's mode, resolved from the `mode` meta line. `spec.md` §6:
/// "`pda` mode is a placeholder with no handlers defined." A missing
/// `mode` line defaults to `Cfg`, since only `format` is documented as
/// required (§6's "Required: `format` must be present").
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    /// The only mode with any action handlers defined.
    Cfg,
    /// A placeholder mode; parsing succeeds but no actions are available.
    Pda,
}

/// The result of parsing a whole document: the grammar (empty in `Pda`
/// mode, which defines no parser), the resolved mode, and the collapsed
/// action list to run.
pub struct ParsedDocument {
    /// The parsed grammar (empty placeholder in `Pda` mode).
    pub grammar: Grammar,
    /// The resolved front-end mode.
    pub mode: Mode,
    /// The action names to run, in the order they were listed.
    pub actions: Vec<String>,
}

/// Parses a whole input document per `spec.md` §6: splits meta/parse
/// lines, collapses meta keywords, resolves `mode` and `format`, and
/// parses the grammar (in `cfg` mode).
pub fn parse_document(text: &str) -> Result<ParsedDocument, CfgError> {
    let (parse_lines, meta_lines) = split_lines(text);
    let meta = parse_meta_lines(&meta_lines);
    let format = meta.format.ok_or(CfgError::MissingFormat)?;

    let mode = match meta.mode.as_deref() {
        Some("cfg") | None => Mode::Cfg,
        Some("pda") => Mode::Pda,
        Some(other) => return Err(CfgError::UnknownMode(other.to_string())),
    };

    let grammar = match mode {
        Mode::Cfg => {
            let parser = word_parser_for(&format)?;
            lines_to_grammar(&parse_lines, parser)?
        }
        Mode::Pda => Grammar::new(),
    };

    Ok(ParsedDocument {
        grammar,
        mode,
        actions: meta.action,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_meta_and_parse_lines() {
        let text = "format char\n\nS -> aSb | e\nstart S\n# a comment\n";
        let (parse_lines, meta_lines) = split_lines(text);
        assert_eq!(parse_lines, vec!["S -> aSb | e", "start S"]);
        assert_eq!(meta_lines, vec!["format char", "# a comment"]);
    }

    #[test]
    fn last_action_line_wins() {
        let meta_lines = vec!["action clone", "action cnf pda"];
        let meta = parse_meta_lines(&meta_lines);
        assert_eq!(meta.action, vec!["cnf", "pda"]);
    }

    #[test]
    fn char_format_rejects_spaces() {
        assert!(matches!(word_char("a b"), Err(CfgError::SpaceInCharLetter(_))));
    }

    #[test]
    fn char_format_classifies_case() {
        let word = word_char("aSb").unwrap();
        assert_eq!(
            word,
            vec![Letter::terminal("a"), Letter::variable("S"), Letter::terminal("b")]
        );
    }

    #[test]
    fn spaced_exclaim_marks_variable_by_suffix() {
        let word = word_spaced_exclaim("a! b b!").unwrap();
        assert_eq!(
            word,
            vec![
                Letter::variable("a"),
                Letter::terminal("b"),
                Letter::variable("b"),
            ]
        );
    }

    #[test]
    fn epsilon_tokens_parse_to_empty_word() {
        assert_eq!(word_char("e").unwrap(), Vec::new());
        assert_eq!(word_spaced("\u{3b5}").unwrap(), Vec::new());
    }

    #[test]
    fn parses_full_document_into_grammar() {
        let text = "mode cfg\nformat char\naction cnf\n\nstart S\nS -> aSb | e\n";
        let doc = parse_document(text).unwrap();
        assert_eq!(doc.mode, Mode::Cfg);
        assert_eq!(doc.actions, vec!["cnf"]);
        assert_eq!(doc.grammar.start_variable(), Some(&Letter::variable("S")));
        assert_eq!(doc.grammar.rule_count(), 2);
    }

    #[test]
    fn missing_format_is_an_error() {
        let text = "mode cfg\n\nS -> a\n";
        assert!(matches!(parse_document(text), Err(CfgError::MissingFormat)));
    }

    #[test]
    fn unknown_mode_is_an_error() {
        let text = "mode weird\nformat char\n";
        assert!(matches!(parse_document(text), Err(CfgError::UnknownMode(_))));
    }

    #[test]
    fn rule_line_without_arrow_is_an_error() {
        assert!(matches!(
            line_to_rules("S aSb", word_char as WordParser),
            Err(CfgError::MissingArrow(_))
        ));
    }
}
