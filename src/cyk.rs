//! CYK membership recognition and leftmost-derivation witness reconstruction
//! over a CNF grammar (`spec.md` §4.4).

use std::collections::{HashSet, VecDeque};

use crate::grammar::Grammar;
use crate::letter::Letter;
use crate::tree::ParseTree;

/// `(row, offset)`: row 1 sits just above the header row (row 0, the input
/// word itself); the final cell is `(n, 0)`.
pub type Position = (usize, usize);

/// A record in a CYK cell: the variable occupying the cell, the cell's own
/// position, and up to two back-pointers into cells strictly below. Row-1
/// items carry exactly one back-pointer (to a header letter); higher rows
/// carry exactly two, per `spec.md` §3.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CykItem {
    variable: Letter,
    position: Position,
    back_pointers: Vec<(Position, Letter)>,
}

impl CykItem {
    /// The variable this item records for its cell.
    pub fn variable(&self) -> &Letter {
        &self.variable
    }

    /// This item's own cell position.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Up to two `(destination position, destination variable)` pairs.
    pub fn back_pointers(&self) -> &[(Position, Letter)] {
        &self.back_pointers
    }

    /// A sort key making item selection deterministic, per `spec.md` §9:
    /// sort by `(variable name, back-pointer positions)`.
    fn sort_key(&self) -> (String, Vec<Position>) {
        (
            self.variable.name().to_string(),
            self.back_pointers.iter().map(|(pos, _)| *pos).collect(),
        )
    }
}

/// An upper-triangular CYK table over a candidate word.
#[derive(Clone, Debug)]
pub struct CykTable {
    headers: Vec<Letter>,
    /// `cells[row - 1][offset]` for `row` in `1..=n`.
    cells: Vec<Vec<HashSet<CykItem>>>,
}

impl CykTable {
    fn empty_for(word: &[Letter]) -> Self {
        let n = word.len();
        let cells = (1..=n).map(|row| vec![HashSet::new(); n - row + 1]).collect();
        CykTable {
            headers: word.to_vec(),
            cells,
        }
    }

    /// The length of the word this table was built over.
    pub fn word_len(&self) -> usize {
        self.headers.len()
    }

    /// The header row: the input word's own letters.
    pub fn headers(&self) -> &[Letter] {
        &self.headers
    }

    /// The cell at `(row, offset)`. `row` must be in `1..=word_len()`.
    pub fn cell(&self, row: usize, offset: usize) -> &HashSet<CykItem> {
        &self.cells[row - 1][offset]
    }

    fn cell_mut(&mut self, row: usize, offset: usize) -> &mut HashSet<CykItem> {
        &mut self.cells[row - 1][offset]
    }

    /// The final cell, `(n, 0)`.
    pub fn final_position(&self) -> Position {
        (self.word_len(), 0)
    }

    /// Iterates over every cell position, row 1 first, then row 2, etc.;
    /// within a row, offset 0 upward, per `spec.md` §4.4.
    pub fn iter_positions(&self) -> impl Iterator<Item = Position> + '_ {
        let n = self.word_len();
        (1..=n).flat_map(move |row| (0..=n - row).map(move |offset| (row, offset)))
    }

    /// The distinct variables recorded at a position.
    pub fn variables_at(&self, pos: Position) -> HashSet<Letter> {
        self.cell(pos.0, pos.1)
            .iter()
            .map(|item| item.variable.clone())
            .collect()
    }

    fn mark(&mut self, pos: Position, variable: Letter, back_pointers: Vec<(Position, Letter)>) {
        self.cell_mut(pos.0, pos.1).insert(CykItem {
            variable,
            position: pos,
            back_pointers,
        });
    }

    /// Fills a CYK table for `word` against a CNF `grammar`, per the
    /// bottom-up fill order and split enumeration of `spec.md` §4.4.
    pub fn fill(grammar: &Grammar, word: &[Letter]) -> CykTable {
        let mut table = CykTable::empty_for(word);
        for (row, offset) in table.iter_positions().collect::<Vec<_>>() {
            if row == 1 {
                let header = table.headers[offset].clone();
                for rule in grammar.rules() {
                    if rule.output().len() == 1 && rule.output()[0] == header {
                        table.mark(
                            (row, offset),
                            rule.input().clone(),
                            vec![((0, offset), header.clone())],
                        );
                    }
                }
            } else {
                for split in 1..row {
                    let pos_a = (split, offset);
                    let pos_b = (row - split, offset + split);
                    let items_a: Vec<CykItem> = table.cell(pos_a.0, pos_a.1).iter().cloned().collect();
                    let items_b: Vec<CykItem> = table.cell(pos_b.0, pos_b.1).iter().cloned().collect();
                    if items_a.is_empty() || items_b.is_empty() {
                        continue;
                    }
                    for a in &items_a {
                        for b in &items_b {
                            for rule in grammar.rules() {
                                if rule.output().len() == 2
                                    && rule.output()[0] == a.variable
                                    && rule.output()[1] == b.variable
                                {
                                    table.mark(
                                        (row, offset),
                                        rule.input().clone(),
                                        vec![(pos_a, a.variable.clone()), (pos_b, b.variable.clone())],
                                    );
                                }
                            }
                        }
                    }
                }
            }
        }
        table
    }

    /// Renders the table the way the original program's pretty-printer
    /// does: row numbers descending from `n` to `1` on the left, the header
    /// row at the bottom, `--` for empty cells, and comma-separated sorted
    /// variable names for cells with more than one item.
    pub fn to_pretty_string(&self) -> String {
        let n = self.word_len();
        let mut rows: Vec<Vec<String>> = Vec::new();
        for row in (1..=n).rev() {
            let mut cells = vec![row.to_string()];
            for offset in 0..=n - row {
                let vars = self.variables_at((row, offset));
                let text = if vars.is_empty() {
                    "--".to_string()
                } else {
                    let mut names: Vec<&str> = vars.iter().map(|l| l.name()).collect();
                    names.sort_unstable();
                    names.join(", ")
                };
                cells.push(text);
            }
            rows.push(cells);
        }
        let mut header_row = vec![String::new()];
        header_row.extend(self.headers.iter().map(|l| l.name().to_string()));
        rows.push(header_row);

        let columns = n + 1;
        let mut widths = vec![0usize; columns];
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
        let render_row = |row: &[String]| -> String {
            row.iter()
                .enumerate()
                .map(|(i, cell)| format!(" {:>width$} ", cell, width = widths[i]))
                .collect::<Vec<_>>()
                .join("|")
        };
        let mut out: Vec<String> = rows[..n].iter().map(|r| render_row(r)).collect();
        let rule_width: usize = render_row(&rows[0]).chars().count();
        out.push("=".repeat(rule_width));
        out.push(render_row(&rows[n]));
        out.join("\n")
    }
}

/// Whether `word` is recognized by `grammar` (which must already be in
/// CNF): the final cell contains the start variable, or, for the empty
/// word, the grammar has a nulling rule for the start variable.
pub fn recognize(grammar: &Grammar, word: &[Letter]) -> bool {
    let Some(start) = grammar.start_variable() else {
        return false;
    };
    if word.is_empty() {
        return grammar.rules().any(|r| r.input() == start && r.is_nulling());
    }
    let table = CykTable::fill(grammar, word);
    table.variables_at(table.final_position()).contains(start)
}

/// Builds a CYK witness parse tree for `word` against `grammar`, or `None`
/// if the word is not recognized. See `spec.md` §4.4 for the worklist
/// algorithm.
pub fn derive_witness(grammar: &Grammar, word: &[Letter]) -> Option<ParseTree> {
    let start = grammar.start_variable()?;
    if word.is_empty() {
        return grammar
            .rules()
            .any(|r| r.input() == start && r.is_nulling())
            .then(|| ParseTree::new(&[]));
    }

    let table = CykTable::fill(grammar, word);
    let final_pos = table.final_position();
    let mut candidates: Vec<&CykItem> = table
        .cell(final_pos.0, final_pos.1)
        .iter()
        .filter(|item| &item.variable == start)
        .collect();
    candidates.sort_by_key(|item| item.sort_key());
    let start_item = candidates.first()?.clone().clone();

    let mut tree = ParseTree::new(std::slice::from_ref(start));
    let root_leaf = tree.variable_leaves()[0];
    let mut worklist: VecDeque<(crate::tree::NodeId, CykItem)> = VecDeque::new();
    worklist.push_back((root_leaf, start_item));

    while let Some((node, item)) = worklist.pop_front() {
        let word: Vec<Letter> = item.back_pointers.iter().map(|(_, l)| l.clone()).collect();
        let new_children = tree.branch_word(node, &word, false);
        if word.len() == 1 && !word[0].is_variable() {
            continue;
        }
        for (&child, (pos, letter)) in new_children.iter().zip(item.back_pointers.iter()) {
            let mut matches: Vec<&CykItem> = table
                .cell(pos.0, pos.1)
                .iter()
                .filter(|candidate| &candidate.variable == letter)
                .collect();
            matches.sort_by_key(|candidate| candidate.sort_key());
            if let Some(next_item) = matches.first() {
                worklist.push_back((child, (*next_item).clone()));
            }
        }
    }
    Some(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;

    fn cnf_ab_grammar() -> Grammar {
        let mut g = Grammar::new();
        let s = Letter::variable("S");
        let a = Letter::variable("A");
        let b = Letter::variable("B");
        g.set_start_variable(s.clone());
        g.add_rule(Rule::new(s, vec![a.clone(), b.clone()]));
        g.add_rule(Rule::new(a, vec![Letter::terminal("a")]));
        g.add_rule(Rule::new(b, vec![Letter::terminal("b")]));
        g
    }

    #[test]
    fn recognizes_matching_word() {
        let g = cnf_ab_grammar();
        let word = vec![Letter::terminal("a"), Letter::terminal("b")];
        assert!(recognize(&g, &word));
        let table = CykTable::fill(&g, &word);
        assert_eq!(table.variables_at((1, 0)), HashSet::from([Letter::variable("A")]));
        assert_eq!(table.variables_at((1, 1)), HashSet::from([Letter::variable("B")]));
        assert_eq!(table.variables_at((2, 0)), HashSet::from([Letter::variable("S")]));
    }

    #[test]
    fn rejects_non_matching_word() {
        let g = cnf_ab_grammar();
        let word = vec![Letter::terminal("b"), Letter::terminal("a")];
        assert!(!recognize(&g, &word));
        let table = CykTable::fill(&g, &word);
        assert!(table.variables_at(table.final_position()).is_empty());
    }

    #[test]
    fn witness_yield_matches_input_word() {
        let g = cnf_ab_grammar();
        let word = vec![Letter::terminal("a"), Letter::terminal("b")];
        let tree = derive_witness(&g, &word).expect("word is recognized");
        let yield_word: Vec<Letter> = tree.leaves().into_iter().map(|id| tree.letter(id).unwrap().clone()).collect();
        assert_eq!(yield_word, word);
    }
}
