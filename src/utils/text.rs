use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\s+"));

static UNSPEAKABLE_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"[^\w\s.,!?-]"));

/// Collapses whitespace and drops characters a synthesizer would read out
/// literally (icons, brackets, symbols). Letters of any script are kept.
pub fn speakable(raw: &str) -> String {
    let cleaned = match &*UNSPEAKABLE_RE {
        Ok(regex) => regex.replace_all(raw, "").into_owned(),
        Err(_) => raw
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace() || ".,!?-_".contains(*c))
            .collect(),
    };
    let collapsed = match &*WHITESPACE_RE {
        Ok(regex) => regex.replace_all(&cleaned, " ").into_owned(),
        Err(_) => cleaned.split_whitespace().collect::<Vec<_>>().join(" "),
    };
    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::speakable;

    #[test]
    fn collapses_whitespace_and_strips_symbols() {
        let raw = "  Engine   Hours:\n\t1,240 h  (ok) ✅ ";
        assert_eq!(speakable(raw), "Engine Hours 1,240 h ok");
    }

    #[test]
    fn keeps_sentence_punctuation() {
        assert_eq!(speakable("Check tires! Ready? Go-now."), "Check tires! Ready? Go-now.");
    }

    #[test]
    fn keeps_non_latin_letters() {
        assert_eq!(speakable("टायर  जांचें"), "टायर जांचें");
    }

    #[test]
    fn symbols_between_words_leave_one_space() {
        assert_eq!(speakable("Fuel ⛽ low"), "Fuel low");
    }

    #[test]
    fn blank_input_becomes_empty() {
        assert_eq!(speakable(" \n 📍 "), "");
    }
}
