//! Canonical signature assembly and selector hashing.
//!
//! Selectors and event topics are Keccak-256 (the pre-NIST padding variant)
//! over the raw bytes of the canonical signature.

use std::sync::LazyLock;

use regex::Regex;
use sha3::{Digest, Keccak256};

use crate::models::Parameter;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static EMPTY_BRACKETS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\s*\]").unwrap());

/// Normalize a declared type: drop all whitespace and collapse blank array
/// brackets to `[]`.
pub fn normalize_type(raw: &str) -> String {
    let collapsed = EMPTY_BRACKETS_RE.replace_all(raw, "[]");
    WHITESPACE_RE.replace_all(&collapsed, "").into_owned()
}

/// Build `name(type1,type2,...)` from a declaration. Parameter names and
/// `indexed` markers never take part.
pub fn canonicalize(name: &str, params: &[Parameter]) -> String {
    let types: Vec<String> = params.iter().map(|p| normalize_type(&p.type_)).collect();
    format!("{}({})", name, types.join(","))
}

fn keccak_hex(signature: &str) -> String {
    format!("{:x}", Keccak256::digest(signature.as_bytes()))
}

/// First four bytes of the Keccak-256 hash, as `0x` + 8 lower-case hex chars.
pub fn function_selector(signature: &str) -> String {
    let digest = keccak_hex(signature);
    format!("0x{}", &digest[..8])
}

/// Full Keccak-256 hash, as `0x` + 64 lower-case hex chars.
pub fn event_topic(signature: &str) -> String {
    format!("0x{}", keccak_hex(signature))
}
