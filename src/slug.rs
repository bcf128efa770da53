/// Canonical transform from a display name or title to a URL-safe identifier.
///
/// Lowercases, turns whitespace runs into single hyphens, drops anything
/// outside `[a-z0-9-]`, collapses repeated hyphens and trims the ends.
/// Every place a slug is derived (category defaulting, article defaulting,
/// legacy name-as-slug matching) goes through this one function.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_hyphen = false;
    for ch in input.to_lowercase().chars() {
        if ch.is_whitespace() || ch == '-' {
            pending_hyphen = !out.is_empty();
        } else if ch.is_ascii_alphanumeric() {
            if pending_hyphen {
                out.push('-');
                pending_hyphen = false;
            }
            out.push(ch);
        }
        // anything else is stripped outright
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(slugify("Web Development"), "web-development");
        assert_eq!(slugify("  Spaced   Out  Title "), "spaced-out-title");
    }

    #[test]
    fn strips_special_characters() {
        assert_eq!(slugify("Rust & Tokio!"), "rust-tokio");
        assert_eq!(slugify("C++ (the hard parts)"), "c-the-hard-parts");
    }

    #[test]
    fn collapses_and_trims_hyphens() {
        assert_eq!(slugify("--already -- slugged--"), "already-slugged");
    }

    #[test]
    fn idempotent() {
        for input in ["Web Development", "Rust & Tokio!", "5 Min Reads", "ümlaut city"] {
            let once = slugify(input);
            assert_eq!(slugify(&once), once, "slugify not idempotent for {input:?}");
        }
    }

    #[test]
    fn empty_and_symbol_only_inputs() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }
}
