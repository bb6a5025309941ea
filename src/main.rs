//! Evaluate a lambda calculus expression and print its normal form to
//! standard output.
//!
//! Example usage:
//!
//!     cargo run -- --expr "((λx.(xz))(λt.tt))"
//!
//!     cargo run -- --file expression.lc --max-reductions 500 --verbose

use clap::Parser;
use lambda_normalizer::end_to_end::{run_interpreter, InterpreterConfig};
use tracing::Level;

fn main() {
    let interpreter_config = InterpreterConfig::parse();

    let max_level = if interpreter_config.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_writer(std::io::stderr)
        .init();

    let interpreter_result = run_interpreter(&interpreter_config);

    match interpreter_result {
        Ok(execution_result) => {
            println!("{}", execution_result);
        }

        Err(run_error) => {
            println!("{}", run_error);
            std::process::exit(1);
        }
    }
}
