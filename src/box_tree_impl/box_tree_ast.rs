/// Data structures to represent lambda calculus terms, and the pure
/// operations defined over them: free variables, capture-avoiding
/// substitution, alpha renaming and rendering.
use std::collections::HashSet;

use tracing::trace;

/// Remaining stack below which recursive walks over a term switch to a fresh
/// stack segment. Divergent reductions nest terms thousands of levels deep.
pub(crate) const MIN_STACK_RED_ZONE: usize = 32 * 1024;

/// Size of each stack segment allocated when running low (1 MB).
pub(crate) const STACK_GROWTH_SIZE: usize = 1024 * 1024;

/// Represents a lambda-calculus term.
///
/// Equality is syntactic: `(λx.x)` and `(λy.y)` are different values even
/// though they are alpha-equivalent.
#[derive(Debug, PartialEq, Eq)]
pub enum Term {
    Variable {
        name: String,
    },
    Abstraction {
        parameter: String,
        body: Box<Term>,
    },
    Application {
        function: Box<Term>,
        argument: Box<Term>,
    },
}

impl Term {
    pub fn var(name: &str) -> Term {
        return Term::Variable {
            name: String::from(name),
        };
    }

    pub fn abs(parameter: &str, body: Term) -> Term {
        return Term::Abstraction {
            parameter: String::from(parameter),
            body: Box::new(body),
        };
    }

    pub fn app(function: Term, argument: Term) -> Term {
        return Term::Application {
            function: Box::new(function),
            argument: Box::new(argument),
        };
    }

    /// Whether this term is an application whose function side is an
    /// abstraction.
    pub fn is_redex(&self) -> bool {
        return matches!(
            self,
            Term::Application { function, .. } if matches!(**function, Term::Abstraction { .. })
        );
    }
}

impl Clone for Term {
    fn clone(&self) -> Self {
        return stacker::maybe_grow(MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE, || match self {
            Term::Variable { name } => Term::Variable { name: name.clone() },
            Term::Abstraction { parameter, body } => Term::Abstraction {
                parameter: parameter.clone(),
                body: body.clone(),
            },
            Term::Application { function, argument } => Term::Application {
                function: function.clone(),
                argument: argument.clone(),
            },
        });
    }
}

/// Drops a term one node at a time instead of through the recursive drop glue
/// of `Box`, which cannot grow the stack.
pub fn dispose_term(term: Term) {
    let mut pending = vec![term];

    while let Some(term) = pending.pop() {
        match term {
            Term::Variable { .. } => {}
            Term::Abstraction { body, .. } => {
                pending.push(*body);
            }
            Term::Application { function, argument } => {
                pending.push(*function);
                pending.push(*argument);
            }
        }
    }
}

/// Hands out the synthetic names `t_0, t_1, ...` used by alpha renaming.
///
/// One counter lives for exactly one top-level evaluation, so independent
/// evaluations always start again from `t_0`.
#[derive(Debug, Default)]
pub struct RenameCounter {
    next_index: usize,
}

impl RenameCounter {
    pub fn new() -> Self {
        return Self::default();
    }

    pub fn fresh_name(&mut self) -> String {
        let name = format!("t_{}", self.next_index);
        self.next_index += 1;
        return name;
    }

    /// Number of names handed out so far.
    pub fn names_generated(&self) -> usize {
        return self.next_index;
    }
}

// Helper function to produce the canonical, fully parenthesized string
// representation of a Term.
fn term_to_string_helper(term: &Term, string_so_far: &mut String) {
    stacker::maybe_grow(MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE, || {
        term_to_string_helper_impl(term, string_so_far)
    });
}

fn term_to_string_helper_impl(term: &Term, string_so_far: &mut String) {
    match term {
        Term::Variable { name } => {
            string_so_far.push_str(name.as_str());
        }
        Term::Abstraction { parameter, body } => {
            string_so_far.push_str("(λ");
            string_so_far.push_str(parameter.as_str());
            string_so_far.push('.');
            term_to_string_helper(body, string_so_far);
            string_so_far.push(')');
        }
        Term::Application { function, argument } => {
            string_so_far.push('(');
            term_to_string_helper(function, string_so_far);
            term_to_string_helper(argument, string_so_far);
            string_so_far.push(')');
        }
    };
}

/// Converts a term to its canonical string form, e.g. `((λx.(xx))y)`.
pub fn term_to_string(term: &Term) -> String {
    let mut out_string = String::new();
    term_to_string_helper(term, &mut out_string);
    return out_string;
}

// Display trait implementation for Term using term_to_string.
impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f.write_str(term_to_string(self).as_str());
    }
}

/// Computes the free variables in the given lambda calculus term.
pub fn get_all_free_variables(term: &Term) -> HashSet<&str> {
    return stacker::maybe_grow(MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE, || {
        get_all_free_variables_impl(term)
    });
}

fn get_all_free_variables_impl(term: &Term) -> HashSet<&str> {
    match term {
        Term::Variable { name } => {
            return HashSet::from([name.as_str()]);
        }
        Term::Application { function, argument } => {
            let function_free_vars = get_all_free_variables(function);
            let argument_free_vars = get_all_free_variables(argument);

            return function_free_vars
                .union(&argument_free_vars)
                .copied()
                .collect();
        }
        Term::Abstraction { parameter, body } => {
            let mut body_free_vars = get_all_free_variables(body);
            body_free_vars.remove(parameter.as_str());
            return body_free_vars;
        }
    };
}

/// Renames the parameter of the abstraction `λparameter.body` to a fresh
/// name from `rename_counter`, replacing it throughout the body.
pub fn alpha_rename(parameter: &str, body: &Term, rename_counter: &mut RenameCounter) -> Term {
    let fresh_parameter = rename_counter.fresh_name();

    trace!(from = parameter, to = %fresh_parameter, "alpha renaming");

    let renamed_body = substitute(
        body,
        parameter,
        &Term::var(fresh_parameter.as_str()),
        rename_counter,
    );

    return Term::Abstraction {
        parameter: fresh_parameter,
        body: Box::new(renamed_body),
    };
}

// Substitutes replacement for free occurrences of var_name in term.
// replacement_free_vars is computed once by the caller.
fn substitute_helper(
    term: &Term,
    var_name: &str,
    replacement: &Term,
    replacement_free_vars: &HashSet<&str>,
    rename_counter: &mut RenameCounter,
) -> Term {
    return stacker::maybe_grow(MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE, || {
        substitute_helper_impl(
            term,
            var_name,
            replacement,
            replacement_free_vars,
            rename_counter,
        )
    });
}

fn substitute_helper_impl(
    term: &Term,
    var_name: &str,
    replacement: &Term,
    replacement_free_vars: &HashSet<&str>,
    rename_counter: &mut RenameCounter,
) -> Term {
    match term {
        Term::Variable { name } => {
            if name == var_name {
                return replacement.clone();
            }
            return term.clone();
        }

        Term::Application { function, argument } => {
            let subbed_function = substitute_helper(
                function,
                var_name,
                replacement,
                replacement_free_vars,
                rename_counter,
            );
            let subbed_argument = substitute_helper(
                argument,
                var_name,
                replacement,
                replacement_free_vars,
                rename_counter,
            );

            return Term::Application {
                function: Box::new(subbed_function),
                argument: Box::new(subbed_argument),
            };
        }

        Term::Abstraction { parameter, body } => {
            // The parameter shadows var_name, so nothing inside is free.
            if parameter == var_name {
                return term.clone();
            }

            // The replacement mentions the parameter freely, so the binder
            // has to move out of the way before substituting.
            if replacement_free_vars.contains(parameter.as_str()) {
                let Term::Abstraction {
                    parameter: fresh_parameter,
                    body: renamed_body,
                } = alpha_rename(parameter, body, rename_counter)
                else {
                    unreachable!("alpha_rename always returns an abstraction");
                };

                let subbed_body = substitute_helper(
                    &renamed_body,
                    var_name,
                    replacement,
                    replacement_free_vars,
                    rename_counter,
                );
                dispose_term(*renamed_body);

                return Term::Abstraction {
                    parameter: fresh_parameter,
                    body: Box::new(subbed_body),
                };
            }

            let subbed_body = substitute_helper(
                body,
                var_name,
                replacement,
                replacement_free_vars,
                rename_counter,
            );

            return Term::Abstraction {
                parameter: parameter.clone(),
                body: Box::new(subbed_body),
            };
        }
    };
}

/// Capture-avoiding substitution of `replacement` for the free occurrences of
/// `var_name` in `term`. The input term is left untouched.
pub fn substitute(
    term: &Term,
    var_name: &str,
    replacement: &Term,
    rename_counter: &mut RenameCounter,
) -> Term {
    let replacement_free_vars = get_all_free_variables(replacement);
    return substitute_helper(
        term,
        var_name,
        replacement,
        &replacement_free_vars,
        rename_counter,
    );
}
