//! Ref name validation following git-style conventions.
//!
//! Valid ref names:
//! - Must be non-empty
//! - Must not contain whitespace, `~`, `^`, `:`, `?`, `*`, `[`, `\`
//! - Must not contain `..` (double dot) or `@{`
//! - Must not start or end with `.` or `/`
//! - Must not end with `.lock`
//! - Must not contain consecutive slashes (`//`)
//! - Components between slashes must be non-empty and not start with `.`

use crate::error::{RefError, RefResult};

/// Characters that are forbidden anywhere in a ref name.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

/// Validate a ref name, returning `Ok(())` if valid.
///
/// Ref names map to file paths under the ref directory, so the rules also
/// keep names safe as relative paths.
///
/// # Examples
///
/// ```
/// use strata_refs::names::validate_ref_name;
///
/// assert!(validate_ref_name("main").is_ok());
/// assert!(validate_ref_name("backups/laptop").is_ok());
/// assert!(validate_ref_name("").is_err());
/// assert!(validate_ref_name("bad..name").is_err());
/// ```
pub fn validate_ref_name(name: &str) -> RefResult<()> {
    let invalid = |reason: String| RefError::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("ref name must not be empty".into()));
    }

    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(invalid(format!("contains forbidden character: {ch:?}")));
        }
    }

    // `..` would allow path traversal when the name becomes a file path.
    if name.contains("..") {
        return Err(invalid("must not contain '..'".into()));
    }

    if name.contains("@{") {
        return Err(invalid("must not contain '@{'".into()));
    }

    if name.starts_with('.') || name.ends_with('.') {
        return Err(invalid("must not start or end with '.'".into()));
    }

    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid("must not start or end with '/'".into()));
    }

    if name.ends_with(".lock") {
        return Err(invalid("must not end with '.lock'".into()));
    }

    if name.contains("//") {
        return Err(invalid("must not contain consecutive slashes '//'".into()));
    }

    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid("path components must not be empty".into()));
        }
        if component.starts_with('.') {
            return Err(invalid(format!(
                "component must not start with '.': {component:?}"
            )));
        }
    }

    Ok(())
}
