//! Splits an expression string into single-character tokens, each tagged with
//! its class and its character position in the input.

use lazy_static::lazy_static;
use regex::Regex;

/// The different classes of tokens that compose the language.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum TokenClass {
    Identifier,
    Lambda,
    Dot,
    OpenParenthesis,
    CloseParenthesis,
    Error,
}

/// Represents a single token of the language.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Token {
    pub token_class: TokenClass,
    pub token_text: String,
    /// 0-based position counted in characters, not bytes.
    pub position: usize,
}

// Represents how to recognize a token class.
#[derive(Debug)]
struct TokenRule {
    token_class: TokenClass,
    regex: Regex,
}

// Vector of regex patterns that correspond to each token class. Every rule is
// anchored to the start of the remaining input. The Error rule must stay last
// so that it only wins when nothing else matches.
lazy_static! {
    static ref TOKEN_RULES: Vec<TokenRule> = vec![
        TokenRule {
            token_class: TokenClass::Identifier,
            regex: Regex::new(r"^[a-z]").expect("Unable to compile Identifier rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Lambda,
            regex: Regex::new(r"^λ").expect("Unable to compile Lambda rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Dot,
            regex: Regex::new(r"^\.").expect("Unable to compile Dot rule regex."),
        },
        TokenRule {
            token_class: TokenClass::OpenParenthesis,
            regex: Regex::new(r"^\(").expect("Unable to compile OpenParenthesis rule regex."),
        },
        TokenRule {
            token_class: TokenClass::CloseParenthesis,
            regex: Regex::new(r"^\)").expect("Unable to compile CloseParenthesis rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Error,
            regex: Regex::new(r"(?s)^.").expect("Unable to compile Error rule regex."),
        },
    ];
}

// Finds the rule that matches the most bytes from the start of the input
// string. Only empty input matches no rule.
fn get_longest_matching_rule(input_str: &str) -> Option<(&'static TokenRule, usize)> {
    let mut longest_match: Option<(&'static TokenRule, usize)> = None;

    for token_rule in TOKEN_RULES.iter() {
        let Some(match_obj) = token_rule.regex.find(input_str) else {
            continue;
        };

        let is_longer = match longest_match {
            None => true,
            Some((_, longest_match_len)) => match_obj.len() > longest_match_len,
        };

        if is_longer {
            longest_match = Some((token_rule, match_obj.len()));
        }
    }

    return longest_match;
}

/// Given an expression string, returns the vector of tokens that comprise it.
///
/// Nothing is discarded: whitespace has no token class of its own, so a space
/// comes back as an `Error` token and the parser reports it as an unknown
/// symbol.
pub fn run_lexical_analysis(program_str: &str) -> Vec<Token> {
    let mut curr_idx: usize = 0;
    let mut position: usize = 0;
    let mut out = Vec::new();

    while curr_idx < program_str.len() {
        let Some((token_rule, match_len)) = get_longest_matching_rule(&program_str[curr_idx..])
        else {
            break;
        };

        out.push(Token {
            token_class: token_rule.token_class,
            token_text: String::from(&program_str[curr_idx..curr_idx + match_len]),
            position: position,
        });

        curr_idx += match_len;
        position += 1;
    }

    return out;
}
