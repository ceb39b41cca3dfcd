//! Acronym-aware tokenizing of compact identifiers such as `VirtualMachineScaleSetVMs`.
//!
//! Tokens are recognised at the current scan position, in priority order:
//!
//! 1. a keyword/acronym literal (longest match wins),
//! 2. a run of uppercase letters ending before a keyword, a capitalized word, or the end,
//! 3. a capitalized word (`[A-Z][0-9]*[a-z]*`) ending before a keyword, an uppercase letter, or the end,
//! 4. a run of lowercase letters with the same boundary as (3).
//!
//! Each alternative takes the shortest span that reaches its boundary.

/// Acronyms and brand names that are never split apart.
pub const KEYWORDS: &[&str] = &[
    "BI", "IP", "ML", "MAM", "OS", "VMs", "VM", "APIM", "vCenters", "WANs", "WAN", "IDs", "ID",
    "REST", "OAuth2", "SignalR", "iOS", "IOS", "PlayFab", "OpenId", "NuGet",
];

struct Tokenizer {
    keywords: Vec<Vec<char>>,
}

impl Tokenizer {
    fn new(extra: &[String]) -> Self {
        let mut keywords: Vec<Vec<char>> = Vec::new();
        for word in KEYWORDS.iter().copied().chain(extra.iter().map(String::as_str)) {
            let chars: Vec<char> = word.chars().collect();
            if !chars.is_empty() && !keywords.contains(&chars) {
                keywords.push(chars);
            }
        }
        Self { keywords }
    }

    /// Length of the longest keyword starting at `pos`.
    fn keyword_at(&self, chars: &[char], pos: usize) -> Option<usize> {
        self.keywords
            .iter()
            .filter(|kw| chars[pos..].starts_with(kw))
            .map(Vec::len)
            .max()
    }

    fn word_boundary(&self, chars: &[char], pos: usize) -> bool {
        pos == chars.len()
            || self.keyword_at(chars, pos).is_some()
            || chars[pos].is_ascii_uppercase()
    }

    fn acronym_boundary(&self, chars: &[char], pos: usize) -> bool {
        pos == chars.len()
            || self.keyword_at(chars, pos).is_some()
            || (chars[pos].is_ascii_uppercase()
                && chars.get(pos + 1).is_some_and(char::is_ascii_lowercase))
    }

    fn uppercase_run(&self, chars: &[char], pos: usize) -> Option<usize> {
        let mut end = pos;
        while end < chars.len() && chars[end].is_ascii_uppercase() {
            end += 1;
            if self.acronym_boundary(chars, end) {
                return Some(end - pos);
            }
        }
        None
    }

    fn capitalized_word(&self, chars: &[char], pos: usize) -> Option<usize> {
        if !chars[pos].is_ascii_uppercase() {
            return None;
        }
        let digits_start = pos + 1;
        let mut digits_end = digits_start;
        loop {
            let mut end = digits_end;
            loop {
                if self.word_boundary(chars, end) {
                    return Some(end - pos);
                }
                if end < chars.len() && chars[end].is_ascii_lowercase() {
                    end += 1;
                } else {
                    break;
                }
            }
            if digits_end < chars.len() && chars[digits_end].is_ascii_digit() {
                digits_end += 1;
            } else {
                return None;
            }
        }
    }

    fn lowercase_run(&self, chars: &[char], pos: usize) -> Option<usize> {
        let mut end = pos;
        while end < chars.len() && chars[end].is_ascii_lowercase() {
            end += 1;
            if self.word_boundary(chars, end) {
                return Some(end - pos);
            }
        }
        None
    }

    fn next_token(&self, chars: &[char], pos: usize) -> Option<usize> {
        self.keyword_at(chars, pos)
            .or_else(|| self.uppercase_run(chars, pos))
            .or_else(|| self.capitalized_word(chars, pos))
            .or_else(|| self.lowercase_run(chars, pos))
    }

    /// Split `input` into tokens, or `None` if some position matches no rule.
    fn tokenize(&self, input: &str) -> Option<Vec<String>> {
        let chars: Vec<char> = input.chars().collect();
        let mut tokens = Vec::new();
        let mut pos = 0;
        while pos < chars.len() {
            let len = self.next_token(&chars, pos)?;
            tokens.push(chars[pos..pos + len].iter().collect());
            pos += len;
        }
        Some(tokens)
    }
}

/// Turn an identifier into a space-separated display name.
///
/// Names that already contain a space are returned as-is, `_`/`-` delimited
/// names only have their delimiters replaced. If any position cannot be
/// tokenized the whole input is returned unchanged.
pub fn display_name(name: &str, no_split_words: &[String]) -> String {
    if name.contains(' ') {
        return name.to_string();
    }
    if name.contains('_') || name.contains('-') {
        return name.replace(['_', '-'], " ");
    }

    match Tokenizer::new(no_split_words).tokenize(name) {
        Some(tokens) => tokens.join(" "),
        None => name.to_string(),
    }
}

/// Turn an identifier into a file name segment whose tokens are joined by `separator`.
///
/// The input is cut on spaces and underscores first. If any chunk fails to
/// tokenize, the entire original input is returned, not only that chunk.
pub fn file_name_segment(name: &str, no_split_words: &[String], separator: &str) -> String {
    let tokenizer = Tokenizer::new(no_split_words);
    let mut result = Vec::new();
    for chunk in name.split([' ', '_']) {
        match tokenizer.tokenize(chunk) {
            Some(tokens) => result.extend(tokens),
            None => return name.to_string(),
        }
    }
    result.join(separator)
}

/// Replace characters that are unsafe in URLs when `enabled`.
pub fn formalize_url(path: &str, enabled: bool) -> String {
    if !enabled {
        return path.to_string();
    }
    path.replace(['%', '\\', '"', '^', '`'], "")
        .replace('<', "(")
        .replace('>', ")")
        .replace('{', "((")
        .replace('}', "))")
        .replace('|', "_")
        .replace(' ', "-")
}
