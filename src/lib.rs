//! Toolkit for normalizing, recognizing, and deriving context-free
//! grammars: a Chomsky Normal Form rewrite pipeline, a CYK
//! membership/witness recognizer, a leftmost-derivation parse tree, and a
//! grammar-to-pushdown-automaton compiler.

#![deny(missing_docs,
        missing_copy_implementations,
        trivial_casts,
        trivial_numeric_casts,
        unused_import_braces,
        unused_qualifications)]

#![cfg_attr(test, deny(warnings))]

pub mod cnf;
pub mod cyk;
pub mod error;
pub mod grammar;
pub mod interactive;
pub mod letter;
pub mod pda;
pub mod rule;
pub mod text;
pub mod tree;

pub use error::CfgError;
pub use grammar::Grammar;
pub use letter::{Letter, Word};
pub use rule::Rule;
pub use tree::ParseTree;
