/// Turn a label into a URL slug: lowercase, punctuation dropped, runs of
/// whitespace, `_` and `-` collapsed to a single `-`, no leading or trailing `-`.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.trim().to_lowercase().chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_dash = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn basic() {
        assert_eq!(slugify("Budget 2024"), "budget-2024");
    }

    #[test]
    fn punctuation_and_separators() {
        assert_eq!(slugify("  Hello, World!  "), "hello-world");
        assert_eq!(slugify("a -- b__c"), "a-b-c");
        assert_eq!(slugify("--edge--"), "edge");
    }

    #[test]
    fn dropped_punctuation_does_not_split_words() {
        assert_eq!(slugify("Don't panic"), "dont-panic");
    }

    #[test]
    fn empty_when_nothing_usable() {
        assert_eq!(slugify("!!!"), "");
    }
}
