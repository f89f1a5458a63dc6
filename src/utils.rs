// ABOUTME: Small shared helpers: category slugs, content hashing and record ids
// ABOUTME: Everything here is pure and synchronous

use rand::Rng;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const ID_LENGTH: usize = 15;

struct SlugPatterns {
    disallowed: Regex,
    separators: Regex,
    edges: Regex,
}

fn slug_patterns() -> &'static SlugPatterns {
    static PATTERNS: OnceLock<SlugPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| SlugPatterns {
        disallowed: Regex::new(r"[^A-Za-z0-9\- ]+").expect("valid slug pattern"),
        separators: Regex::new(r"[\- ]+").expect("valid slug pattern"),
        edges: Regex::new(r"^[\- ]+|[\- ]+$").expect("valid slug pattern"),
    })
}

/// Normalises a category name.
///
/// Letters, digits, spaces and hyphens survive with their casing. Anything else
/// becomes a hyphen. A run of separators collapses to one space if it contained
/// a space, otherwise to one hyphen. Leading and trailing separators are dropped.
/// Applying it twice gives the same result as applying it once.
pub fn slugify(text: &str) -> String {
    let patterns = slug_patterns();

    let replaced = patterns.disallowed.replace_all(text.trim(), "-");
    let collapsed = patterns.separators.replace_all(&replaced, |caps: &regex::Captures| {
        if caps[0].contains(' ') { " " } else { "-" }
    });

    patterns.edges.replace_all(&collapsed, "").into_owned()
}

/// Hex-encoded SHA-256 of the full file contents.
pub fn compute_file_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// 15 lowercase alphanumerics, the shape every record id takes.
pub fn new_record_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Reduces an uploaded file name to a safe blob name, keeping the extension.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_lowercase()
    }
}
