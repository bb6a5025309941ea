//! This crate contains a normal-order evaluator for the untyped lambda
//! calculus: it parses an expression such as `((λx.(xz))(λt.tt))`, reduces it
//! to beta normal form and renders the result back as text.

pub mod box_tree_impl;
pub mod code_generation;
pub mod end_to_end;
pub mod lexical_analysis;

pub use end_to_end::{evaluate, evaluate_with_config, EvalError};
