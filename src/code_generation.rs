//! Renders a term as JavaScript source instead of evaluating it.

use crate::box_tree_impl::box_tree_ast::{Term, MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE};

// Two spaces of indentation per nesting level.
fn make_padding(depth: usize) -> String {
    return "  ".repeat(depth);
}

/// Generates JavaScript for `term`, nested `depth` levels deep.
///
/// Abstractions become unary `function` literals and applications become
/// call expressions, so `((λx.y)z)` turns into
///
/// ```text
/// (function(x) {
///   return y;
/// })(z)
/// ```
pub fn generate_javascript_at_depth(term: &Term, depth: usize) -> String {
    return stacker::maybe_grow(MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE, || {
        generate_javascript_helper(term, depth)
    });
}

fn generate_javascript_helper(term: &Term, depth: usize) -> String {
    match term {
        Term::Variable { name } => {
            return name.clone();
        }
        Term::Abstraction { parameter, body } => {
            let padding = make_padding(depth);
            return format!(
                "function({}) {{\n{}  return {};\n{}}}",
                parameter,
                padding,
                generate_javascript_at_depth(body, depth + 1),
                padding
            );
        }
        Term::Application { function, argument } => {
            return format!(
                "({})({})",
                generate_javascript_at_depth(function, depth),
                generate_javascript_at_depth(argument, depth)
            );
        }
    };
}

/// Generates JavaScript for a top-level term.
pub fn generate_javascript(term: &Term) -> String {
    return generate_javascript_at_depth(term, 0);
}
