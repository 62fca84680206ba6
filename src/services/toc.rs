// Table of contents for markdown post bodies

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

static HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ {0,3}(#{1,6})[ \t]+(.+?)(?:[ \t]+#+)?[ \t]*$").expect("heading regex")
});

static FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ {0,3}(```|~~~)").expect("fence regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub level: u8,
    pub title: String,
    pub anchor: String,
}

/// Lowercase, keep alphanumerics, `-` and `_`, turn whitespace into `-`, drop the rest.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for ch in title.trim().chars() {
        if ch.is_whitespace() {
            slug.push('-');
        } else if ch.is_alphanumeric() || ch == '-' || ch == '_' {
            slug.extend(ch.to_lowercase());
        }
    }
    slug
}

/// Suffix `base` with `-1`, `-2`, ... until it collides with no anchor handed out so far.
fn unique_anchor(seen: &mut HashMap<String, usize>, base: String) -> String {
    let mut anchor = base.clone();
    if let Some(mut count) = seen.get(&base).copied() {
        loop {
            count += 1;
            anchor = format!("{}-{}", base, count);
            if !seen.contains_key(&anchor) {
                break;
            }
        }
        seen.insert(base, count);
    }
    seen.insert(anchor.clone(), 0);
    anchor
}

/// ATX headings outside fenced code blocks, with unique anchors.
pub fn extract_toc(markdown: &str) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut open_fence: Option<&str> = None;

    for line in markdown.lines() {
        if let Some(fence) = FENCE.captures(line) {
            let marker = fence.get(1).map_or("", |m| m.as_str());
            match open_fence {
                None => open_fence = Some(marker),
                Some(open) if open == marker => open_fence = None,
                Some(_) => {}
            }
            continue;
        }
        if open_fence.is_some() {
            continue;
        }

        let Some(caps) = HEADING.captures(line) else {
            continue;
        };
        let level = caps[1].len() as u8;
        let title = caps[2].trim().to_string();

        let anchor = unique_anchor(&mut seen, slugify(&title));
        entries.push(TocEntry { level, title, anchor });
    }

    entries
}
