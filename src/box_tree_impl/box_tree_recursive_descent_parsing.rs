//! Recursive descent parser that constructs lambda-calculus terms in the
//! box-tree representation from an expression string.
//!
//! Grammar, where juxtaposition folds to the right (`xyz` is `x(yz)`):
//!
//! ```text
//! sequence    -> expression sequence | expression
//! expression  -> '(' sequence ')' | abstraction | variable
//! abstraction -> 'λ' variable '.' sequence
//! variable    -> [a-z]
//! ```
//!
//! An abstraction body extends as far as possible, i.e. up to the closing
//! parenthesis of the enclosing group or the end of input.

use thiserror::Error;

use crate::box_tree_impl::box_tree_ast::{
    dispose_term, Term, MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE,
};
use crate::lexical_analysis::{run_lexical_analysis, Token, TokenClass};

/// Represents a parsing error. Every variant carries the 0-based character
/// position at which the problem was detected.
#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum ParseError {
    #[error("Empty expression is not expected at position {position}")]
    EmptyExpression { position: usize },

    #[error("Unknown symbol '{symbol}' at position {position}")]
    UnknownSymbol { symbol: String, position: usize },

    #[error("Unexpected symbol '{symbol}' at position {position}")]
    UnexpectedSymbol { symbol: String, position: usize },

    #[error("Unmatched closing parenthesis in '{expression}' at position {position}")]
    UnmatchedClosingParenthesis { expression: String, position: usize },

    #[error("Missing closing parenthesis in '{expression}' at position {position}")]
    MissingClosingParenthesis { expression: String, position: usize },

    #[error("Incomplete function definition at position {position}")]
    IncompleteFunctionDefinition { position: usize },
}

impl ParseError {
    pub fn position(&self) -> usize {
        match self {
            Self::EmptyExpression { position }
            | Self::UnknownSymbol { position, .. }
            | Self::UnexpectedSymbol { position, .. }
            | Self::UnmatchedClosingParenthesis { position, .. }
            | Self::MissingClosingParenthesis { position, .. }
            | Self::IncompleteFunctionDefinition { position } => {
                return *position;
            }
        }
    }

    /// The human-readable message, identical to the `Display` output.
    pub fn message(&self) -> String {
        return self.to_string();
    }
}

// Everything the parsing rules share besides the cursor, which is threaded
// through them explicitly as start_idx.
struct ParseState<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    bracket_depth: usize,
}

impl<'a> ParseState<'a> {
    fn new(source: &'a str) -> Self {
        return Self {
            source: source,
            tokens: run_lexical_analysis(source),
            bracket_depth: 0,
        };
    }

    // Class of the token at idx, or None past the end of input.
    fn token_class_at(&self, idx: usize) -> Option<TokenClass> {
        return self.tokens.get(idx).map(|token| token.token_class);
    }

    // Whether the current run of juxtaposed terms (or an abstraction body)
    // stops at idx.
    fn at_sequence_end(&self, idx: usize) -> bool {
        return matches!(
            self.token_class_at(idx),
            None | Some(TokenClass::CloseParenthesis)
        );
    }

    fn unmatched_closing_parenthesis(&self, idx: usize) -> ParseError {
        return ParseError::UnmatchedClosingParenthesis {
            expression: String::from(self.source),
            position: idx + 1,
        };
    }

    fn missing_closing_parenthesis(&self, idx: usize) -> ParseError {
        return ParseError::MissingClosingParenthesis {
            expression: String::from(self.source),
            position: idx,
        };
    }

    fn unknown_symbol(&self, idx: usize) -> ParseError {
        let token = &self.tokens[idx];
        return ParseError::UnknownSymbol {
            symbol: token.token_text.clone(),
            position: token.position,
        };
    }
}

/// Tries to parse an expression that looks like `[IDENTIFIER]`.
fn try_var_rule(state: &ParseState, start_idx: usize) -> Result<(Box<Term>, usize), ParseError> {
    let var_token = &state.tokens[start_idx];

    return Ok((
        Box::new(Term::Variable {
            name: var_token.token_text.clone(),
        }),
        start_idx + 1,
    ));
}

/// Tries to parse an expression that looks like `λ[IDENTIFIER].[SEQUENCE]`,
/// where start_idx points at the `λ`.
fn try_abstraction_rule(
    state: &mut ParseState,
    start_idx: usize,
) -> Result<(Box<Term>, usize), ParseError> {
    let param_idx = start_idx + 1;

    match state.token_class_at(param_idx) {
        Some(TokenClass::Identifier) => {}
        Some(TokenClass::Error) => return Err(state.unknown_symbol(param_idx)),
        _ => {
            return Err(ParseError::IncompleteFunctionDefinition {
                position: param_idx,
            })
        }
    }

    let dot_idx = param_idx + 1;

    match state.token_class_at(dot_idx) {
        Some(TokenClass::Dot) => {}
        Some(TokenClass::Error) => return Err(state.unknown_symbol(dot_idx)),
        _ => {
            return Err(ParseError::IncompleteFunctionDefinition { position: dot_idx });
        }
    }

    let body_idx = dot_idx + 1;

    if state.at_sequence_end(body_idx) {
        return Err(ParseError::EmptyExpression { position: body_idx });
    }

    let (body, end_idx) = try_sequence_rule(state, body_idx)?;

    return Ok((
        Box::new(Term::Abstraction {
            parameter: state.tokens[param_idx].token_text.clone(),
            body: body,
        }),
        end_idx,
    ));
}

/// Tries to parse an expression that looks like `([SEQUENCE])`, where
/// start_idx points at the `(`.
fn try_parenthesis_rule(
    state: &mut ParseState,
    start_idx: usize,
) -> Result<(Box<Term>, usize), ParseError> {
    state.bracket_depth += 1;

    let (inner_term, end_idx) = try_sequence_rule(state, start_idx + 1)?;

    match state.token_class_at(end_idx) {
        Some(TokenClass::CloseParenthesis) => {
            state.bracket_depth -= 1;
            return Ok((inner_term, end_idx + 1));
        }
        // A sequence only stops at a closing parenthesis or the end of input.
        _ => {
            dispose_term(*inner_term);
            return Err(state.missing_closing_parenthesis(end_idx));
        }
    }
}

/// Tries to parse a single expression: a parenthesized group, an abstraction
/// or a variable.
fn try_expression_rule(
    state: &mut ParseState,
    start_idx: usize,
) -> Result<(Box<Term>, usize), ParseError> {
    let Some(token_class) = state.token_class_at(start_idx) else {
        return Err(ParseError::EmptyExpression {
            position: start_idx,
        });
    };

    match token_class {
        TokenClass::OpenParenthesis => return try_parenthesis_rule(state, start_idx),
        TokenClass::Lambda => return try_abstraction_rule(state, start_idx),
        TokenClass::Identifier => return try_var_rule(state, start_idx),
        TokenClass::CloseParenthesis => {
            if state.bracket_depth == 0 {
                return Err(state.unmatched_closing_parenthesis(start_idx));
            }
            return Err(ParseError::EmptyExpression {
                position: start_idx,
            });
        }
        TokenClass::Dot => {
            return Err(ParseError::UnexpectedSymbol {
                symbol: state.tokens[start_idx].token_text.clone(),
                position: start_idx,
            });
        }
        TokenClass::Error => return Err(state.unknown_symbol(start_idx)),
    }
}

/// Tries to parse a run of juxtaposed expressions, folding them to the right:
/// `e1 e2 e3` becomes `e1 (e2 e3)`. Stops in front of a closing parenthesis
/// or at the end of input.
fn try_sequence_rule(
    state: &mut ParseState,
    start_idx: usize,
) -> Result<(Box<Term>, usize), ParseError> {
    return stacker::maybe_grow(MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE, || {
        try_sequence_rule_impl(state, start_idx)
    });
}

fn try_sequence_rule_impl(
    state: &mut ParseState,
    start_idx: usize,
) -> Result<(Box<Term>, usize), ParseError> {
    let (first_term, next_idx) = try_expression_rule(state, start_idx)?;

    if state.at_sequence_end(next_idx) {
        return Ok((first_term, next_idx));
    }

    let (rest_term, end_idx) = match try_sequence_rule(state, next_idx) {
        Ok(parsed) => parsed,
        Err(parse_error) => {
            dispose_term(*first_term);
            return Err(parse_error);
        }
    };

    return Ok((
        Box::new(Term::Application {
            function: first_term,
            argument: rest_term,
        }),
        end_idx,
    ));
}

/// Uses recursive descent to parse an expression string into a `Term`.
///
/// The whole input has to be consumed and every bracket closed. Whitespace is
/// not skipped and is reported as an unknown symbol.
pub fn parse_recursive_descent(source: &str) -> Result<Term, ParseError> {
    let mut state = ParseState::new(source);

    let (term, end_idx) = try_sequence_rule(&mut state, 0)?;

    // The top-level sequence only stops early in front of a `)` that has no
    // opening partner.
    if end_idx < state.tokens.len() {
        dispose_term(*term);
        return Err(state.unmatched_closing_parenthesis(end_idx));
    }

    return Ok(*term);
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    // Parses every input and checks it against the expected term.
    fn run_parse_test(test_cases: Vec<(&str, Term)>) {
        for (source, expected_output) in test_cases {
            let generated_output = parse_recursive_descent(source)
                .expect("parse_recursive_descent returned unexpected parse error");

            assert_eq!(generated_output, expected_output, "parsing {source:?}");
        }
    }

    // Generates a random term over a few single-letter names.
    fn random_term(rng: &mut StdRng, depth: usize) -> Term {
        let names = ["a", "b", "x", "y", "z"];
        let name = names[rng.gen_range(0..names.len())];

        if depth == 0 {
            return Term::var(name);
        }

        match rng.gen_range(0..3) {
            0 => return Term::var(name),
            1 => return Term::abs(name, random_term(rng, depth - 1)),
            _ => {
                return Term::app(random_term(rng, depth - 1), random_term(rng, depth - 1));
            }
        }
    }

    #[test]
    fn test_simple_terms() {
        run_parse_test(vec![
            ("x", Term::var("x")),
            ("λx.x", Term::abs("x", Term::var("x"))),
            ("xy", Term::app(Term::var("x"), Term::var("y"))),
        ]);
    }

    // Test that redundant parentheses disappear.
    #[test]
    fn test_parentheses() {
        run_parse_test(vec![
            ("(x)", Term::var("x")),
            ("(λx.x)", Term::abs("x", Term::var("x"))),
            ("(xy)", Term::app(Term::var("x"), Term::var("y"))),
            ("(((x((y)))))", Term::app(Term::var("x"), Term::var("y"))),
        ]);
    }

    #[test]
    fn test_nested_terms() {
        run_parse_test(vec![
            (
                "((λx.x)z)",
                Term::app(Term::abs("x", Term::var("x")), Term::var("z")),
            ),
            (
                "(λx.(λy.y))",
                Term::abs("x", Term::abs("y", Term::var("y"))),
            ),
            (
                "(λx.(λy.(λz.((zy)x))))",
                Term::abs(
                    "x",
                    Term::abs(
                        "y",
                        Term::abs(
                            "z",
                            Term::app(Term::app(Term::var("z"), Term::var("y")), Term::var("x")),
                        ),
                    ),
                ),
            ),
            (
                "((λx.(xy))z)",
                Term::app(
                    Term::abs("x", Term::app(Term::var("x"), Term::var("y"))),
                    Term::var("z"),
                ),
            ),
        ]);
    }

    // Test that an abstraction body runs until the enclosing closing bracket.
    #[test]
    fn test_abstraction_body_extent() {
        let xy = Term::app(Term::var("x"), Term::var("y"));

        run_parse_test(vec![
            (
                "(λx.(xy)z)",
                Term::abs("x", Term::app(xy.clone(), Term::var("z"))),
            ),
            (
                "(λx.((xy)z))",
                Term::abs("x", Term::app(xy.clone(), Term::var("z"))),
            ),
            (
                "(λx.x(λy.(yx)z))",
                Term::abs(
                    "x",
                    Term::app(
                        Term::var("x"),
                        Term::abs(
                            "y",
                            Term::app(Term::app(Term::var("y"), Term::var("x")), Term::var("z")),
                        ),
                    ),
                ),
            ),
            (
                "λx.λy.λz.f",
                Term::abs("x", Term::abs("y", Term::abs("z", Term::var("f")))),
            ),
        ]);
    }

    #[test]
    fn test_y_combinator() {
        let half = Term::abs(
            "x",
            Term::app(Term::var("f"), Term::app(Term::var("x"), Term::var("x"))),
        );

        run_parse_test(vec![(
            "(λf.(λx.f(xx))(λx.f(xx)))",
            Term::abs("f", Term::app(half.clone(), half)),
        )]);
    }

    // Test that juxtaposition folds to the right unless parenthesized.
    #[test]
    fn test_application_association() {
        let y = Term::var("y");
        let x = Term::var("x");
        let z = Term::var("z");
        let h = Term::var("h");

        run_parse_test(vec![
            (
                "yxz",
                Term::app(y.clone(), Term::app(x.clone(), z.clone())),
            ),
            (
                "(y(xz))",
                Term::app(y.clone(), Term::app(x.clone(), z.clone())),
            ),
            (
                "((yx)z)",
                Term::app(Term::app(y.clone(), x.clone()), z.clone()),
            ),
            (
                "(y(x)z)",
                Term::app(y.clone(), Term::app(x.clone(), z.clone())),
            ),
            (
                "(y(xz)h)",
                Term::app(y.clone(), Term::app(Term::app(x.clone(), z.clone()), h.clone())),
            ),
        ]);
    }

    // Test the reported message for every kind of malformed input.
    #[test]
    fn test_invalid_expressions() {
        let test_cases = vec![
            ("", "Empty expression is not expected at position 0"),
            ("λ", "Incomplete function definition at position 1"),
            ("λx", "Incomplete function definition at position 2"),
            ("λx.", "Empty expression is not expected at position 3"),
            ("(λx.)z", "Empty expression is not expected at position 4"),
            ("(λ)", "Incomplete function definition at position 2"),
            ("λxy.y", "Incomplete function definition at position 2"),
            ("λ1.x", "Unknown symbol '1' at position 1"),
            ("()", "Empty expression is not expected at position 1"),
            ("1", "Unknown symbol '1' at position 0"),
            ("[x]", "Unknown symbol '[' at position 0"),
            ("xy?", "Unknown symbol '?' at position 2"),
            ("X", "Unknown symbol 'X' at position 0"),
            ("x.y", "Unexpected symbol '.' at position 1"),
            ("x)", "Unmatched closing parenthesis in 'x)' at position 2"),
            (")x", "Unmatched closing parenthesis in ')x' at position 1"),
            ("(x))", "Unmatched closing parenthesis in '(x))' at position 4"),
            ("(x", "Missing closing parenthesis in '(x' at position 2"),
            ("((x)", "Missing closing parenthesis in '((x)' at position 4"),
            ("(λx.x", "Missing closing parenthesis in '(λx.x' at position 5"),
        ];

        for (source, error_message) in test_cases {
            let parse_error = parse_recursive_descent(source)
                .expect_err("parse_recursive_descent accepted malformed input");

            assert_eq!(parse_error.to_string(), error_message, "parsing {source:?}");
        }
    }

    #[test]
    fn test_error_position_and_message() {
        let parse_error = parse_recursive_descent("x)").expect_err("expected a parse error");

        assert_eq!(parse_error.position(), 2);
        assert_eq!(
            parse_error,
            ParseError::UnmatchedClosingParenthesis {
                expression: String::from("x)"),
                position: 2,
            }
        );
        assert_eq!(
            parse_error.message(),
            "Unmatched closing parenthesis in 'x)' at position 2"
        );
    }

    // Test that whitespace is rejected rather than skipped.
    #[test]
    fn test_whitespace_is_rejected() {
        let test_cases = vec![
            ("x y", "Unknown symbol ' ' at position 1"),
            (" x", "Unknown symbol ' ' at position 0"),
            ("x\n", "Unknown symbol '\n' at position 1"),
            ("λx. x", "Unknown symbol ' ' at position 3"),
        ];

        for (source, error_message) in test_cases {
            let parse_error = parse_recursive_descent(source)
                .expect_err("parse_recursive_descent accepted whitespace");

            assert_eq!(parse_error.to_string(), error_message, "parsing {source:?}");
        }
    }

    // Test that rendering and re-parsing a random term is stable.
    #[test]
    fn test_render_parse_round_trip() {
        let mut rng = StdRng::seed_from_u64(0x1a3bda);

        for _ in 0..500 {
            let term = random_term(&mut rng, 6);
            let rendered = term.to_string();

            let reparsed = parse_recursive_descent(rendered.as_str())
                .expect("canonical rendering did not parse");

            assert_eq!(reparsed, term, "round trip of {rendered}");
            assert_eq!(reparsed.to_string(), rendered);
        }
    }

    // Test deeply nested groups and long runs of juxtaposed variables.
    #[test]
    fn test_deep_input() {
        let depth = 50000;

        let source = format!("{}x{}", "(".repeat(depth), ")".repeat(depth));
        let term = parse_recursive_descent(source.as_str()).expect("nested groups did not parse");
        assert_eq!(term, Term::var("x"));

        let source = "x".repeat(depth);
        let term = parse_recursive_descent(source.as_str()).expect("long sequence did not parse");
        let rendered = term.to_string();
        assert_eq!(rendered.len(), 3 * depth - 2);
        dispose_term(term);

        let source = format!("{}x{}", "(".repeat(depth), ")".repeat(depth - 1));
        let parse_error = parse_recursive_descent(source.as_str()).expect_err("expected an error");
        assert_eq!(parse_error.position(), 2 * depth);

        let source = format!("{}?", "x".repeat(depth));
        let parse_error = parse_recursive_descent(source.as_str()).expect_err("expected an error");
        assert_eq!(parse_error.to_string(), format!("Unknown symbol '?' at position {depth}"));
    }
}
