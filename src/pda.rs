//! Compiles a grammar into an equivalent nondeterministic pushdown
//! automaton, per `spec.md` §4.5.
//!
//! The construction follows the classic "one state family per grammar
//! rule" shape: a fixed `init`/`main`/`ed` skeleton, one intermediate state
//! per variable (`varV`) used to fan out over that variable's
//! alternatives, and one intermediate state per terminal (`alphat`) used
//! to match a single input symbol against the stack top. A dedicated
//! bottom-of-stack marker `$` is pushed under the start variable so that
//! popping it back off is exactly the signal to accept.

use crate::grammar::Grammar;
use crate::letter::Letter;

/// An index into a [`Pda`]'s state list.
pub type StateId = usize;

/// What role a state plays in the compiled automaton.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StateKind {
    /// The single initial state, before the start variable is pushed.
    Init,
    /// The single looping state every rule and terminal match returns to.
    Main,
    /// The single accepting state.
    Accept,
    /// An intermediate state fanning out over one variable's rule bodies.
    Variable(Letter),
    /// An intermediate state matching a single terminal against the stack.
    Terminal(Letter),
}

/// The bottom-of-stack marker pushed under the start variable. Not a
/// grammar letter; it never appears in any rule, only in `init`'s push and
/// `main`'s accepting pop.
fn bottom_marker() -> Letter {
    Letter::terminal("$")
}

/// A single edge. `read` is the input symbol consumed (`None` for an
/// epsilon move on the input tape); `pop` is the symbol required on top of
/// the stack (`None` means no symbol is popped); `push` is the sequence of
/// symbols pushed, in the order they appear in the rendered label (the
/// first name listed is pushed first).
#[derive(Clone, Debug)]
pub struct Transition {
    from: StateId,
    to: StateId,
    read: Option<Letter>,
    pop: Option<Letter>,
    push: Vec<Letter>,
}

impl Transition {
    /// The state this transition leaves from.
    pub fn from(&self) -> StateId {
        self.from
    }

    /// The state this transition arrives at.
    pub fn to(&self) -> StateId {
        self.to
    }

    /// The input symbol consumed, if any.
    pub fn read(&self) -> Option<&Letter> {
        self.read.as_ref()
    }

    /// The stack symbol required on top, if any.
    pub fn pop(&self) -> Option<&Letter> {
        self.pop.as_ref()
    }

    /// The symbols pushed onto the stack, in label order.
    pub fn push(&self) -> &[Letter] {
        &self.push
    }

    /// Wraps a multi-character name in a `<SUB>` tag on every character
    /// but the first, matching the original tool's diagram labels; a
    /// single-character name is left bare.
    fn subscript(name: &str) -> String {
        let mut chars = name.chars();
        match chars.next() {
            None => String::new(),
            Some(first) => {
                let rest: String = chars.collect();
                if rest.is_empty() {
                    first.to_string()
                } else {
                    format!("{}<SUB>{}</SUB>", first, rest)
                }
            }
        }
    }

    /// Renders an HTML-tagged `op(names)` token, or a bare `e` when there
    /// is nothing to name (an empty push, e.g. an ε-rule's right-hand side).
    fn tagged(op: &str, letters: &[Letter]) -> String {
        if letters.is_empty() {
            return "e".to_string();
        }
        let body: String = letters.iter().map(|l| Self::subscript(l.name())).collect();
        format!("<{}({})>", op, body)
    }

    /// Renders this transition's label: a `pop(...)` token (if any symbol
    /// is popped), a `push(...)` token (if any symbols are pushed), and the
    /// bare (untagged) terminal name for a transition that only reads the
    /// input tape.
    fn label(&self) -> String {
        let mut parts = Vec::new();
        if let Some(pop) = &self.pop {
            parts.push(Self::tagged("pop", std::slice::from_ref(pop)));
        }
        if !self.push.is_empty() {
            parts.push(Self::tagged("push", &self.push));
        }
        if let Some(read) = &self.read {
            parts.push(read.name().to_string());
        }
        if parts.is_empty() {
            "e".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// A compiled pushdown automaton: a state list, a transition list, a single
/// initial state and a single accepting state.
#[derive(Clone, Debug)]
pub struct Pda {
    states: Vec<StateKind>,
    transitions: Vec<Transition>,
    init: StateId,
    accept: StateId,
}

impl Pda {
    /// The automaton's states.
    pub fn states(&self) -> &[StateKind] {
        &self.states
    }

    /// The automaton's transitions.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// The single initial state.
    pub fn init(&self) -> StateId {
        self.init
    }

    /// The single accepting state.
    pub fn accept(&self) -> StateId {
        self.accept
    }

    fn push_state(&mut self, kind: StateKind) -> StateId {
        let id = self.states.len();
        self.states.push(kind);
        id
    }

    fn state_name(&self, id: StateId) -> String {
        match &self.states[id] {
            StateKind::Init => "init".to_string(),
            StateKind::Main => "main".to_string(),
            StateKind::Accept => "ed".to_string(),
            StateKind::Variable(letter) => format!("var{}", letter.name()),
            StateKind::Terminal(letter) => format!("alpha{}", letter.name()),
        }
    }

    /// Renders a fixed header (`start`/`end` state declaration) followed by
    /// one `start content end` line per transition — the label sits between
    /// the two state names, matching `original_source/processors_cfg/pda.py`
    /// — sorted by `(from, label, to)` for determinism.
    pub fn to_text(&self) -> String {
        let mut lines: Vec<String> = self
            .transitions
            .iter()
            .map(|t| format!("{} {} {}", self.state_name(t.from), t.label(), self.state_name(t.to)))
            .collect();
        lines.sort();
        format!(
            "start {}\nend {}\n\n{}",
            self.state_name(self.init),
            self.state_name(self.accept),
            lines.join("\n")
        )
    }
}

/// Compiles `grammar` into a [`Pda`]. `grammar` must have a start variable
/// set; the grammar need not be in CNF, since this construction works
/// directly from arbitrary rule bodies.
pub fn compile(grammar: &Grammar) -> Pda {
    let start = grammar
        .start_variable()
        .cloned()
        .expect("pda compilation requires a start variable");
    let dollar = bottom_marker();

    let mut pda = Pda {
        states: Vec::new(),
        transitions: Vec::new(),
        init: 0,
        accept: 0,
    };
    let init = pda.push_state(StateKind::Init);
    let main = pda.push_state(StateKind::Main);
    let accept = pda.push_state(StateKind::Accept);
    pda.init = init;
    pda.accept = accept;

    // Family 1: bootstrap the stack with the start variable over the
    // bottom-of-stack marker, per `spec.md` §4.5 item 1 (`init -push(S$)-> main`).
    pda.transitions.push(Transition {
        from: init,
        to: main,
        read: None,
        pop: None,
        push: vec![start.clone(), dollar.clone()],
    });

    // Family 2 (part 1): accept once the marker resurfaces, per item 2
    // (`main -pop($)-> ed`).
    pda.transitions.push(Transition {
        from: main,
        to: accept,
        read: None,
        pop: Some(dollar),
        push: Vec::new(),
    });

    // Family 3: one fan-out state per variable, one edge per rule back to
    // `main`, with each rule's right-hand side pushed in reverse so the
    // leftmost symbol ends up on top of the stack (`spec.md` §4.5 item 3).
    let rules_map = grammar.rules_map();
    let mut variables: Vec<&Letter> = rules_map.keys().collect();
    variables.sort();
    for variable in variables {
        let var_state = pda.push_state(StateKind::Variable(variable.clone()));
        pda.transitions.push(Transition {
            from: main,
            to: var_state,
            read: None,
            pop: Some(variable.clone()),
            push: Vec::new(),
        });
        let mut alternatives = rules_map[variable].clone();
        alternatives.sort_by_key(|r| r.output().iter().map(|l| l.to_string()).collect::<Vec<_>>());
        for rule in alternatives {
            let mut reversed = rule.output().clone();
            reversed.reverse();
            pda.transitions.push(Transition {
                from: var_state,
                to: main,
                read: None,
                pop: None,
                push: reversed,
            });
        }
    }

    // Family 4: one matching state per terminal; the pop happens on the
    // way in, the read happens on the way back out, per `spec.md` §4.5
    // item 4 (`main -pop(t)-> alphat`, `alphat -read(t)-> main`).
    let mut alphabet: Vec<Letter> = grammar.all_alphabet().into_iter().collect();
    alphabet.sort();
    for terminal in alphabet {
        let term_state = pda.push_state(StateKind::Terminal(terminal.clone()));
        pda.transitions.push(Transition {
            from: main,
            to: term_state,
            read: None,
            pop: Some(terminal.clone()),
            push: Vec::new(),
        });
        pda.transitions.push(Transition {
            from: term_state,
            to: main,
            read: Some(terminal),
            pop: None,
            push: Vec::new(),
        });
    }

    pda
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;

    fn toy_grammar() -> Grammar {
        let mut g = Grammar::new();
        let s = Letter::variable("S");
        g.set_start_variable(s.clone());
        g.add_rule(Rule::new(s.clone(), vec![Letter::terminal("a"), s, Letter::terminal("b")]));
        g.add_rule(Rule::new(Letter::variable("S"), vec![]));
        g
    }

    #[test]
    fn compiles_one_variable_state_per_grammar_variable() {
        let pda = compile(&toy_grammar());
        let variable_states = pda
            .states()
            .iter()
            .filter(|k| matches!(k, StateKind::Variable(_)))
            .count();
        assert_eq!(variable_states, 1);
    }

    #[test]
    fn compiles_one_terminal_state_per_grammar_terminal() {
        let pda = compile(&toy_grammar());
        let terminal_states = pda
            .states()
            .iter()
            .filter(|k| matches!(k, StateKind::Terminal(_)))
            .count();
        assert_eq!(terminal_states, 2);
    }

    #[test]
    fn bootstraps_stack_with_start_and_bottom_marker() {
        let pda = compile(&toy_grammar());
        let boot = pda
            .transitions()
            .iter()
            .find(|t| t.from == pda.init())
            .expect("init must have an outgoing transition");
        assert_eq!(boot.push(), &[Letter::variable("S"), Letter::terminal("$")]);
    }

    #[test]
    fn accepts_by_popping_bottom_marker() {
        let pda = compile(&toy_grammar());
        let accepting = pda
            .transitions()
            .iter()
            .find(|t| t.to == pda.accept())
            .expect("some transition must reach the accept state");
        assert_eq!(accepting.pop(), Some(&Letter::terminal("$")));
    }

    #[test]
    fn rule_push_is_reversed() {
        let pda = compile(&toy_grammar());
        let var_state = pda
            .states()
            .iter()
            .position(|k| matches!(k, StateKind::Variable(_)))
            .unwrap();
        let pushes: Vec<&Transition> = pda
            .transitions()
            .iter()
            .filter(|t| t.from == var_state)
            .collect();
        assert!(pushes
            .iter()
            .any(|t| t.push() == [Letter::terminal("b"), Letter::variable("S"), Letter::terminal("a")]));
    }

    #[test]
    fn terminal_pop_precedes_read() {
        let pda = compile(&toy_grammar());
        let term_state = pda
            .states()
            .iter()
            .position(|k| matches!(k, StateKind::Terminal(letter) if letter.name() == "a"))
            .unwrap();
        let into_term = pda.transitions().iter().find(|t| t.to == term_state).unwrap();
        let out_of_term = pda.transitions().iter().find(|t| t.from == term_state).unwrap();
        assert_eq!(into_term.pop(), Some(&Letter::terminal("a")));
        assert!(into_term.read().is_none());
        assert_eq!(out_of_term.read(), Some(&Letter::terminal("a")));
        assert!(out_of_term.pop().is_none());
    }
}
