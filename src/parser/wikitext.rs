use std::sync::LazyLock;

use regex::Regex;

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

const FILE_NAMESPACES: &[&str] = &["file", "image"];

/// One top-level `{{Name|key=value|...}}` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    /// (lowercased name, trimmed value), in source order.
    params: Vec<(String, String)>,
}

impl Template {
    /// Non-empty value of `key`; `"0"` counts as a value.
    pub fn value(&self, key: &str) -> Option<&str> {
        let key = key.trim().to_lowercase();
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Whether `key` is present at all, empty or not.
    pub fn has_param(&self, key: &str) -> bool {
        let key = key.trim().to_lowercase();
        self.params.iter().any(|(k, _)| *k == key)
    }

    /// `key{version}` if it has a value, else bare `key`.
    pub fn versioned(&self, key: &str, version: u32) -> Option<&str> {
        self.value(&format!("{}{}", key, version))
            .or_else(|| self.value(key))
    }
}

/// An embedded `[[File:...]]` link.
#[derive(Debug, Clone, PartialEq)]
pub struct FileLink {
    /// Exact link text as written, brackets included.
    pub wikitext: String,
    /// Title without namespace, underscored, first letter upper-cased.
    pub target: String,
}

#[derive(Debug, Clone, Default)]
pub struct Wikitext {
    pub templates: Vec<Template>,
    pub files: Vec<FileLink>,
}

impl Wikitext {
    /// First instance of the template called `name`.
    pub fn template(&self, name: &str) -> Option<&Template> {
        let name = normalize_name(name);
        self.templates.iter().find(|t| t.name == name)
    }

    /// Target title of the file whose link text is exactly `wikitext`.
    pub fn file_target(&self, wikitext: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.wikitext == wikitext)
            .map(|f| f.target.as_str())
    }
}

/// Parse page markup into its top-level templates and file links.
pub fn parse(markup: &str) -> Wikitext {
    let text = COMMENT_RE.replace_all(markup, "");
    Wikitext {
        templates: find_templates(&text),
        files: find_files(&text),
    }
}

fn find_templates(text: &str) -> Vec<Template> {
    let bytes = text.as_bytes();
    let mut templates = Vec::new();
    let mut i = 0;

    while i + 1 < bytes.len() {
        if &bytes[i..i + 2] != b"{{" {
            i += 1;
            continue;
        }
        match closing(bytes, i, b'{', b'}') {
            Some(end) => {
                let inner = &text[i + 2..end - 2];
                // `{{{arg}}}` is a parameter reference, not a template
                if !inner.starts_with('{') {
                    if let Some(t) = parse_template(inner) {
                        templates.push(t);
                    }
                }
                i = end;
            }
            None => i += 2,
        }
    }

    templates
}

fn parse_template(inner: &str) -> Option<Template> {
    let mut parts = split_top_level(inner, b'|').into_iter();
    let name = normalize_name(parts.next()?);
    if name.is_empty() {
        return None;
    }

    let mut params = Vec::new();
    let mut unnamed = 0;
    for part in parts {
        match find_top_level(part, b'=') {
            Some(eq) => params.push((
                part[..eq].trim().to_lowercase(),
                part[eq + 1..].trim().to_string(),
            )),
            None => {
                unnamed += 1;
                params.push((unnamed.to_string(), part.trim().to_string()));
            }
        }
    }

    Some(Template { name, params })
}

fn find_files(text: &str) -> Vec<FileLink> {
    let bytes = text.as_bytes();
    let mut files = Vec::new();
    let mut i = 0;

    while i + 1 < bytes.len() {
        if &bytes[i..i + 2] != b"[[" {
            i += 1;
            continue;
        }
        if let Some(end) = closing(bytes, i, b'[', b']') {
            let inner = &text[i + 2..end - 2];
            if let Some(target) = file_target(inner) {
                files.push(FileLink {
                    wikitext: text[i..end].to_string(),
                    target,
                });
            }
        }
        // Step inside: captions may hold further links
        i += 2;
    }

    files
}

fn file_target(inner: &str) -> Option<String> {
    let (ns, rest) = inner.split_once(':')?;
    let ns = ns.trim().to_lowercase();
    if !FILE_NAMESPACES.contains(&ns.as_str()) {
        return None;
    }
    let title = rest.split('|').next()?.trim();
    if title.is_empty() {
        return None;
    }
    let words: Vec<&str> = title.split(|c: char| c == ' ' || c == '_').filter(|w| !w.is_empty()).collect();
    Some(ucfirst(&words.join("_")))
}

/// Byte index just past the pair closing the one opened at `start`.
fn closing(bytes: &[u8], start: usize, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut j = start;
    while j + 1 < bytes.len() {
        if bytes[j] == open && bytes[j + 1] == open {
            depth += 1;
            j += 2;
        } else if bytes[j] == close && bytes[j + 1] == close {
            depth -= 1;
            j += 2;
            if depth == 0 {
                return Some(j);
            }
        } else {
            j += 1;
        }
    }
    None
}

/// Split on `sep` where it is not nested in `{{ }}` or `[[ ]]`.
fn split_top_level(s: &str, sep: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = s;
    while let Some(idx) = find_top_level(rest, sep) {
        parts.push(&rest[..idx]);
        rest = &rest[idx + 1..];
    }
    parts.push(rest);
    parts
}

fn find_top_level(s: &str, sep: u8) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut j = 0;
    while j < bytes.len() {
        let pair = bytes.get(j..j + 2);
        match pair {
            Some(b"{{") | Some(b"[[") => {
                depth += 1;
                j += 2;
            }
            Some(b"}}") | Some(b"]]") => {
                depth = depth.saturating_sub(1);
                j += 2;
            }
            _ => {
                if bytes[j] == sep && depth == 0 {
                    return Some(j);
                }
                j += 1;
            }
        }
    }
    None
}

fn normalize_name(raw: &str) -> String {
    let name = raw.trim();
    let name = match name.split_once(':') {
        Some((ns, rest)) if ns.trim().eq_ignore_ascii_case("template") => rest.trim(),
        _ => name,
    };
    let words: Vec<&str> = name.split(|c: char| c == '_' || c.is_whitespace()).filter(|w| !w.is_empty()).collect();
    ucfirst(&words.join(" "))
}

fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ── Tests ──
