//! Reduces lambda-calculus terms in the box-tree representation to beta
//! normal form, always contracting the leftmost-outermost redex first.
//!
//! If a term has a normal form at all, this order is guaranteed to reach it.
//! Evaluating arguments first, as an eager language would, can loop forever
//! on terms such as `((λx.y)((λx.(xx))(λx.(xx))))` that normalize to `y`.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::box_tree_impl::box_tree_ast::{
    dispose_term, substitute, RenameCounter, Term, MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE,
};

/// Reduction ceiling used when none is configured.
pub const DEFAULT_MAX_REDUCTIONS: usize = 10000;

/// Settings for a single evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalConfig {
    /// How many beta reductions may be performed before the evaluation is
    /// considered divergent.
    pub max_reductions: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        return Self {
            max_reductions: DEFAULT_MAX_REDUCTIONS,
        };
    }
}

/// Raised when the reduction ceiling is hit before a normal form is found.
#[derive(Debug, PartialEq, Eq, Clone, Error)]
#[error("Potential infinite loop detected while evaluating {term}, aborting...")]
pub struct DivergenceError {
    /// Rendering of the term as it was before any reduction.
    pub term: String,
    pub max_reductions: usize,
}

/// Represents the result of a successful evaluation.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct EvalOutcome {
    pub normal_form: Term,
    pub reduction_count: usize,
}

/// State of a `ReductionEngine` after a call to `step`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum EvalState {
    Reducing,
    NormalForm,
    DivergenceDetected,
}

/// One step on the way from a term's root down to one of its subterms.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PathStep {
    Body,
    Function,
    Argument,
}

/// Location of a redex, as the steps leading to it from the root.
pub type RedexPath = Vec<PathStep>;

// Pre-order, left-first search. An application whose function side is an
// abstraction is returned before anything inside it is looked at.
fn find_leftmost_redex_helper(term: &Term, path_so_far: &mut RedexPath) -> bool {
    return stacker::maybe_grow(MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE, || {
        find_leftmost_redex_helper_impl(term, path_so_far)
    });
}

fn find_leftmost_redex_helper_impl(term: &Term, path_so_far: &mut RedexPath) -> bool {
    if term.is_redex() {
        return true;
    }

    match term {
        Term::Variable { .. } => {
            return false;
        }

        Term::Abstraction { body, .. } => {
            path_so_far.push(PathStep::Body);
            if find_leftmost_redex_helper(body, path_so_far) {
                return true;
            }
            path_so_far.pop();
            return false;
        }

        Term::Application { function, argument } => {
            path_so_far.push(PathStep::Function);
            if find_leftmost_redex_helper(function, path_so_far) {
                return true;
            }
            path_so_far.pop();

            path_so_far.push(PathStep::Argument);
            if find_leftmost_redex_helper(argument, path_so_far) {
                return true;
            }
            path_so_far.pop();

            return false;
        }
    };
}

/// Finds the leftmost-outermost redex of `term`. Returns `None` when the term
/// is already in normal form.
pub fn find_leftmost_redex(term: &Term) -> Option<RedexPath> {
    let mut path = RedexPath::new();

    if find_leftmost_redex_helper(term, &mut path) {
        return Some(path);
    }

    return None;
}

/// Follows `path` from `term` and returns the subterm it leads to, if any.
pub fn subterm_at<'a>(term: &'a Term, path: &[PathStep]) -> Option<&'a Term> {
    let mut current = term;

    for step in path {
        current = match (current, step) {
            (Term::Abstraction { body, .. }, PathStep::Body) => &**body,
            (Term::Application { function, .. }, PathStep::Function) => &**function,
            (Term::Application { argument, .. }, PathStep::Argument) => &**argument,
            _ => return None,
        };
    }

    return Some(current);
}

/// Performs one beta reduction: `((λx.body)argument)` becomes
/// `body[x := argument]`.
///
/// Only ever called on a redex located by `find_leftmost_redex`.
pub fn reduce_redex(redex: Term, rename_counter: &mut RenameCounter) -> Term {
    let Term::Application { function, argument } = redex else {
        unreachable!("reduce_redex called on a term that is not an application");
    };

    let Term::Abstraction { parameter, body } = *function else {
        unreachable!("reduce_redex called on an application of a non-abstraction");
    };

    let reduced = substitute(&body, parameter.as_str(), &argument, rename_counter);
    dispose_term(*body);
    dispose_term(*argument);

    return reduced;
}

// Rebuilds term bottom-up along path, with the subterm at the end of the path
// replaced by the reduction of the redex found there.
fn reduce_at_path(term: Term, path: &[PathStep], rename_counter: &mut RenameCounter) -> Term {
    return stacker::maybe_grow(MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE, || {
        reduce_at_path_impl(term, path, rename_counter)
    });
}

fn reduce_at_path_impl(term: Term, path: &[PathStep], rename_counter: &mut RenameCounter) -> Term {
    let Some((step, rest_of_path)) = path.split_first() else {
        return reduce_redex(term, rename_counter);
    };

    match (term, step) {
        (Term::Abstraction { parameter, body }, PathStep::Body) => {
            return Term::Abstraction {
                parameter: parameter,
                body: Box::new(reduce_at_path(*body, rest_of_path, rename_counter)),
            };
        }
        (Term::Application { function, argument }, PathStep::Function) => {
            return Term::Application {
                function: Box::new(reduce_at_path(*function, rest_of_path, rename_counter)),
                argument: argument,
            };
        }
        (Term::Application { function, argument }, PathStep::Argument) => {
            return Term::Application {
                function: function,
                argument: Box::new(reduce_at_path(*argument, rest_of_path, rename_counter)),
            };
        }
        (term, step) => {
            unreachable!("redex path step {step:?} does not fit {term}");
        }
    }
}

/// Drives a single evaluation to normal form one reduction at a time.
///
/// Owns the live root term and the rename counter for this evaluation only,
/// so separate engines never influence each other's synthetic names.
pub struct ReductionEngine {
    current_term: Term,
    original_term: String,
    rename_counter: RenameCounter,
    reduction_count: usize,
    state: EvalState,
    config: EvalConfig,
}

impl ReductionEngine {
    pub fn new(term: Term, config: EvalConfig) -> Self {
        return Self {
            original_term: term.to_string(),
            current_term: term,
            rename_counter: RenameCounter::new(),
            reduction_count: 0,
            state: EvalState::Reducing,
            config: config,
        };
    }

    pub fn state(&self) -> EvalState {
        return self.state;
    }

    pub fn reduction_count(&self) -> usize {
        return self.reduction_count;
    }

    pub fn current_term(&self) -> &Term {
        return &self.current_term;
    }

    /// Contracts the leftmost-outermost redex, if there is one and the
    /// ceiling allows it. Once a final state is reached further calls do
    /// nothing.
    pub fn step(&mut self) -> EvalState {
        if self.state != EvalState::Reducing {
            return self.state;
        }

        let Some(redex_path) = find_leftmost_redex(&self.current_term) else {
            self.state = EvalState::NormalForm;
            return self.state;
        };

        if self.reduction_count >= self.config.max_reductions {
            self.state = EvalState::DivergenceDetected;
            return self.state;
        }

        let term = std::mem::replace(&mut self.current_term, Term::var(""));
        self.current_term = reduce_at_path(term, &redex_path, &mut self.rename_counter);
        self.reduction_count += 1;

        debug!(
            step = self.reduction_count,
            term = %self.current_term,
            "reduced leftmost redex"
        );

        return self.state;
    }

    /// Steps until a final state is reached.
    pub fn run(mut self) -> Result<EvalOutcome, DivergenceError> {
        loop {
            match self.step() {
                EvalState::Reducing => continue,
                EvalState::NormalForm => {
                    info!(
                        reductions = self.reduction_count,
                        normal_form = %self.current_term,
                        "reached normal form"
                    );

                    return Ok(EvalOutcome {
                        normal_form: std::mem::replace(&mut self.current_term, Term::var("")),
                        reduction_count: self.reduction_count,
                    });
                }
                EvalState::DivergenceDetected => {
                    warn!(
                        max_reductions = self.config.max_reductions,
                        term = %self.original_term,
                        "reduction ceiling exceeded"
                    );

                    return Err(DivergenceError {
                        term: std::mem::take(&mut self.original_term),
                        max_reductions: self.config.max_reductions,
                    });
                }
            }
        }
    }
}

impl Drop for ReductionEngine {
    fn drop(&mut self) {
        dispose_term(std::mem::replace(&mut self.current_term, Term::var("")));
    }
}

/// Evaluates `term` to beta normal form with a fresh rename counter.
pub fn evaluate_term(term: Term, config: EvalConfig) -> Result<EvalOutcome, DivergenceError> {
    return ReductionEngine::new(term, config).run();
}
