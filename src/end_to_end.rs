//! Evaluation entry points, plus the code to configure and run the
//! interpreter from the command line.

use std::fs;

use clap::Parser;
use thiserror::Error;

use crate::box_tree_impl::box_tree_ast::dispose_term;
use crate::box_tree_impl::box_tree_execution::{
    evaluate_term, DivergenceError, EvalConfig, DEFAULT_MAX_REDUCTIONS,
};
use crate::box_tree_impl::box_tree_recursive_descent_parsing::{
    parse_recursive_descent, ParseError,
};
use crate::code_generation::generate_javascript;

/// Errors that may be produced while evaluating an expression string.
#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum EvalError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Divergence(#[from] DivergenceError),
}

/// Parses `source`, reduces it to beta normal form and renders the result,
/// e.g. `(λx.xx)y` evaluates to `(yy)`.
pub fn evaluate(source: &str) -> Result<String, EvalError> {
    return evaluate_with_config(source, EvalConfig::default());
}

/// Same as `evaluate`, with an explicit reduction ceiling.
pub fn evaluate_with_config(source: &str, config: EvalConfig) -> Result<String, EvalError> {
    let term = parse_recursive_descent(source)?;
    let outcome = evaluate_term(term, config)?;
    let rendered = outcome.normal_form.to_string();
    dispose_term(outcome.normal_form);

    return Ok(rendered);
}

/// Config for the interpreter. Instantiate via `InterpreterConfig::parse()`.
#[derive(Parser, Debug, Default)]
#[command(version, about, long_about = None)]
pub struct InterpreterConfig {
    /// Lambda expression to evaluate, e.g. "(λx.xx)y".
    #[arg(short, long)]
    pub expr: Option<String>,

    /// File containing the lambda expression to evaluate.
    #[arg(short = 'f', long = "file")]
    pub src_filepath: Option<String>,

    /// Number of beta reductions after which evaluation is abandoned as
    /// divergent.
    #[arg(long, default_value_t = DEFAULT_MAX_REDUCTIONS)]
    pub max_reductions: usize,

    /// Print the expression as JavaScript instead of evaluating it.
    #[arg(short, long)]
    pub generate: bool,

    /// Log every reduction step to standard error.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Errors that may be thrown when running the interpreter.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Interpreter configuration error: {0}")]
    ConfigError(String),

    #[error("Input file error: {0}")]
    InputFileError(#[from] std::io::Error),

    #[error(transparent)]
    EvalError(#[from] EvalError),
}

// Gets the expression source from either the command line or the input file.
fn read_source(config: &InterpreterConfig) -> Result<String, RunError> {
    match (&config.expr, &config.src_filepath) {
        (Some(expr), None) => {
            return Ok(expr.clone());
        }
        (None, Some(src_filepath)) => {
            let file_contents = fs::read_to_string(src_filepath)?;
            return Ok(String::from(
                file_contents.trim_end_matches(|c: char| c == '\n' || c == '\r'),
            ));
        }
        (Some(_), Some(_)) => {
            return Err(RunError::ConfigError(String::from(
                "--expr and --file cannot be used together",
            )));
        }
        (None, None) => {
            return Err(RunError::ConfigError(String::from(
                "an expression is required, use --expr or --file",
            )));
        }
    }
}

/// Run the interpreter (i.e. the lexer, parser, and evaluation or code
/// generation) given an interpreter config.
pub fn run_interpreter(config: &InterpreterConfig) -> Result<String, RunError> {
    let source = read_source(config)?;

    if config.generate {
        let term = parse_recursive_descent(source.as_str()).map_err(EvalError::from)?;
        let generated = generate_javascript(&term);
        dispose_term(term);

        return Ok(generated);
    }

    let eval_config = EvalConfig {
        max_reductions: config.max_reductions,
    };

    return Ok(evaluate_with_config(source.as_str(), eval_config)?);
}
