//! Term canonicalization.

/// Canonicalize a raw term into a lookup key: trim surrounding whitespace
/// and lowercase. Total and idempotent; `normalize_term("") == ""`.
///
/// Both the live ledger and the legacy migration deduplicate through this
/// function, so `Foo`, `foo` and ` FOO ` all hit the same record.
pub fn normalize_term(raw: &str) -> String {
    raw.trim().to_lowercase()
}
