//! Function, event, and custom-error extraction from Solidity source.
//!
//! Extraction is regex-based scanning over comment-stripped text, not a
//! grammar. Parameter lists containing nested parentheses (tuple or mapping
//! types), keywords inside string literals, and declarations split by
//! preprocessor-like tricks are out of scope and are skipped rather than
//! rejected.

use std::path::Path;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::errors::{SigscanError, SigscanResult};
use crate::indexer::canonical::{canonicalize, event_topic, function_selector};
use crate::indexer::imports::{extract_imports, extract_inherits};
use crate::models::{
    Category, ContractRecord, Parameter, SignatureEntry, SignatureKind, StateMutability,
    Visibility,
};

/// Keywords that may sit between a parameter's type and its name.
const TYPE_QUALIFIERS: &[&str] = &["memory", "storage", "calldata", "payable"];

// ---------------------------------------------------------------------------
// Compiled regex patterns (LazyLock for one-time init)
// ---------------------------------------------------------------------------

static CONTRACT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:abstract\s+)?contract\s+([A-Za-z_$][A-Za-z0-9_$]*)").unwrap()
});

static FUNCTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\bfunction\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*\(([^()]*)\)([^{;]*)[{;]").unwrap()
});

static CONSTRUCTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\bconstructor\s*\(([^()]*)\)([^{;]*)\{").unwrap());

static EVENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\bevent\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*\(([^()]*)\)\s*(?:anonymous\s*)?;")
        .unwrap()
});

static ERROR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\berror\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*\(([^()]*)\)\s*;").unwrap()
});

static RETURNS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\breturns\s*\(([^()]*)\)").unwrap());

static MODIFIER_ARGS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^()]*\)").unwrap());

static OPEN_BRACKET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\[\s*").unwrap());

static CLOSE_BRACKET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\]").unwrap());

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap());

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// True for plain Solidity identifiers (`^[A-Za-z_][A-Za-z0-9_]*$`).
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name)
}

/// Fallback contract name: the file name without its extension.
pub fn contract_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Remove `//` and `/* */` comments, leaving string literals intact.
/// Newlines inside block comments are kept.
pub fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => {
                quote = Some(c);
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    prev = skipped;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

/// Split a single parameter declaration into whitespace tokens, gluing array
/// brackets onto their base type first (`uint256 [ ] x` -> `uint256[]`, `x`).
fn parameter_tokens(chunk: &str) -> Vec<String> {
    let opened = OPEN_BRACKET_RE.replace_all(chunk, "[");
    let closed = CLOSE_BRACKET_RE.replace_all(&opened, "]");
    closed.split_whitespace().map(str::to_string).collect()
}

/// Last token after the type that is not a data-location qualifier.
fn parameter_name(tokens: &[String]) -> String {
    tokens
        .iter()
        .skip(1)
        .rev()
        .find(|t| !TYPE_QUALIFIERS.contains(&t.as_str()))
        .cloned()
        .unwrap_or_default()
}

/// Parse a raw comma-separated parameter list.
///
/// Each entry becomes `{type, name}`; a single token is taken as the type
/// with an empty name, and entries with an empty type are dropped.
pub fn build_parameters(params_raw: &str) -> Vec<Parameter> {
    if params_raw.trim().is_empty() {
        return Vec::new();
    }
    params_raw
        .split(',')
        .filter_map(|chunk| {
            let tokens = parameter_tokens(chunk.trim());
            let type_ = tokens.first()?.clone();
            Some(Parameter::new(type_, parameter_name(&tokens)))
        })
        .filter(|p| !p.type_.trim().is_empty())
        .collect()
}

/// Parse an event parameter list. The `indexed` marker may appear anywhere
/// before the name and is paired with the type/name it belongs to.
pub fn build_event_parameters(params_raw: &str) -> Vec<Parameter> {
    if params_raw.trim().is_empty() {
        return Vec::new();
    }
    params_raw
        .split(',')
        .filter_map(|chunk| {
            let tokens = parameter_tokens(chunk.trim());
            let indexed = tokens.iter().any(|t| t == "indexed");
            let rest: Vec<String> = tokens.into_iter().filter(|t| t != "indexed").collect();
            let type_ = rest.first()?.clone();
            Some(Parameter {
                name: parameter_name(&rest),
                type_,
                indexed: Some(indexed),
            })
        })
        .filter(|p| !p.type_.trim().is_empty())
        .collect()
}

/// Pull visibility and mutability keywords out of a function header tail
/// (everything between the parameter list and `{`/`;`).
fn header_keywords(tail: &str) -> (Option<Visibility>, Option<StateMutability>) {
    let without_returns = RETURNS_RE.replace_all(tail, " ");
    let without_args = MODIFIER_ARGS_RE.replace_all(&without_returns, " ");
    let mut visibility = None;
    let mut mutability = None;
    for word in without_args.split_whitespace() {
        if visibility.is_none() {
            visibility = Visibility::from_keyword(word);
        }
        if mutability.is_none() {
            mutability = StateMutability::from_keyword(word);
        }
    }
    (visibility, mutability)
}

// ---------------------------------------------------------------------------
// Per-kind extraction
// ---------------------------------------------------------------------------

fn signature_entry(
    kind: SignatureKind,
    name: &str,
    inputs: Vec<Parameter>,
    contract_name: &str,
    file_path: &Path,
) -> SignatureEntry {
    let signature = canonicalize(name, &inputs);
    let selector = match kind {
        SignatureKind::Event => event_topic(&signature),
        SignatureKind::Function | SignatureKind::Error => function_selector(&signature),
    };
    SignatureEntry {
        kind,
        name: name.to_string(),
        signature,
        selector,
        inputs,
        outputs: Vec::new(),
        visibility: None,
        state_mutability: None,
        contract_name: contract_name.to_string(),
        file_path: file_path.to_path_buf(),
    }
}

fn extract_functions(source: &str, contract_name: &str, file_path: &Path) -> Vec<SignatureEntry> {
    let mut functions = Vec::new();

    for caps in FUNCTION_RE.captures_iter(source) {
        let name = &caps[1];
        if !is_valid_identifier(name) {
            continue;
        }
        let tail = &caps[3];
        let (visibility, mutability) = header_keywords(tail);
        let outputs = RETURNS_RE
            .captures(tail)
            .map(|r| build_parameters(&r[1]))
            .unwrap_or_default();

        let mut entry = signature_entry(
            SignatureKind::Function,
            name,
            build_parameters(&caps[2]),
            contract_name,
            file_path,
        );
        entry.outputs = outputs;
        entry.visibility = Some(visibility.unwrap_or(Visibility::Public));
        entry.state_mutability = Some(mutability.unwrap_or(StateMutability::Nonpayable));
        functions.push(entry);
    }

    // At most one constructor per file.
    if let Some(caps) = CONSTRUCTOR_RE.captures(source) {
        let (visibility, mutability) = header_keywords(&caps[2]);
        let mut entry = signature_entry(
            SignatureKind::Function,
            "constructor",
            build_parameters(&caps[1]),
            contract_name,
            file_path,
        );
        entry.visibility = Some(visibility.unwrap_or(Visibility::Public));
        entry.state_mutability = Some(if mutability == Some(StateMutability::Payable) {
            StateMutability::Payable
        } else {
            StateMutability::Nonpayable
        });
        functions.push(entry);
    }

    functions
}

fn extract_events(source: &str, contract_name: &str, file_path: &Path) -> Vec<SignatureEntry> {
    EVENT_RE
        .captures_iter(source)
        .filter(|caps| is_valid_identifier(&caps[1]))
        .map(|caps| {
            signature_entry(
                SignatureKind::Event,
                &caps[1],
                build_event_parameters(&caps[2]),
                contract_name,
                file_path,
            )
        })
        .collect()
}

fn extract_errors(source: &str, contract_name: &str, file_path: &Path) -> Vec<SignatureEntry> {
    ERROR_RE
        .captures_iter(source)
        .filter(|caps| is_valid_identifier(&caps[1]))
        .map(|caps| {
            signature_entry(
                SignatureKind::Error,
                &caps[1],
                build_parameters(&caps[2]),
                contract_name,
                file_path,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Extract a contract record from source text.
///
/// The record is named after the first `contract` declaration, or the file
/// stem when there is none (interface- and library-only files included).
/// Returns `None` only when the file declares no contract and no function,
/// event, or error.
/// The category defaults to `Contracts`; the scanner reassigns it.
pub fn extract_contract(
    source: &str,
    file_path: &Path,
    last_modified: DateTime<Utc>,
) -> Option<ContractRecord> {
    let cleaned = strip_comments(source);
    let declared = CONTRACT_RE.captures(&cleaned).map(|caps| caps[1].to_string());
    let name = declared
        .clone()
        .unwrap_or_else(|| contract_name_from_path(file_path));

    let functions = extract_functions(&cleaned, &name, file_path);
    let events = extract_events(&cleaned, &name, file_path);
    let errors = extract_errors(&cleaned, &name, file_path);

    if declared.is_none() && functions.is_empty() && events.is_empty() && errors.is_empty() {
        return None;
    }

    Some(ContractRecord {
        name,
        file_path: file_path.to_path_buf(),
        category: Category::Contracts,
        functions,
        events,
        errors,
        imports: extract_imports(&cleaned),
        inherits: extract_inherits(&cleaned),
        last_modified,
        source: cleaned,
    })
}

/// Read and extract one file from disk.
pub fn extract_file(path: &Path) -> SigscanResult<Option<ContractRecord>> {
    let source = std::fs::read_to_string(path).map_err(|e| SigscanError::io(path, e))?;
    let last_modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());
    Ok(extract_contract(&source, path, last_modified))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
