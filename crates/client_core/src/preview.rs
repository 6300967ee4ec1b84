//! Builds one self-contained HTML document from the project's files so a
//! site can be previewed without serving it.

use crate::tree::FileTree;

/// The file open in the editor, with whatever the user has typed so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub path: String,
    pub live_content: String,
}

impl Selection {
    pub fn new(path: impl Into<String>, live_content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            live_content: live_content.into(),
        }
    }

    pub fn is_html(&self) -> bool {
        has_extension(&self.path, "html")
    }
}

pub trait Compositor: Send + Sync {
    /// Returns an empty string when there is no HTML to anchor on.
    fn compose(&self, tree: &FileTree, selection: Option<&Selection>) -> String;
}

/// Splices styles and scripts into the anchor document by locating tags
/// textually. The HTML is never parsed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextSpliceCompositor;

impl Compositor for TextSpliceCompositor {
    fn compose(&self, tree: &FileTree, selection: Option<&Selection>) -> String {
        let Some(anchor) = anchor_document(tree, selection) else {
            return String::new();
        };

        let css = joined_sources(tree, "css");
        let js = joined_sources(tree, "js");

        let mut html = anchor;
        if let Some(css) = css {
            html = splice_styles(&html, &css);
        }
        if let Some(js) = js {
            html = splice_scripts(&html, &js);
        }
        html
    }
}

fn has_extension(path: &str, ext: &str) -> bool {
    path.rsplit_once('.')
        .is_some_and(|(_, found)| found.eq_ignore_ascii_case(ext))
}

fn anchor_document(tree: &FileTree, selection: Option<&Selection>) -> Option<String> {
    if let Some(selected) = selection.filter(|s| s.is_html() && !s.live_content.trim().is_empty()) {
        return Some(selected.live_content.clone());
    }
    tree.files()
        .find(|file| has_extension(&file.path, "html") && !file.content.trim().is_empty())
        .map(|file| file.content.to_string())
}

fn joined_sources(tree: &FileTree, ext: &str) -> Option<String> {
    let sources: Vec<&str> = tree
        .files()
        .filter(|file| has_extension(&file.path, ext) && !file.content.trim().is_empty())
        .map(|file| file.content)
        .collect();
    (!sources.is_empty()).then(|| sources.join("\n"))
}

/// Byte offset of `needle` in `haystack`, ignoring ASCII case.
fn find_tag(haystack: &str, needle: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().find(needle)
}

/// End offset (just past `>`) of the first `<html` opening tag.
fn html_open_tag_end(html: &str) -> Option<usize> {
    let lower = html.to_ascii_lowercase();
    let mut from = 0;
    while let Some(found) = lower[from..].find("<html") {
        let start = from + found;
        let after = start + "<html".len();
        match lower[after..].chars().next() {
            Some('>') => return Some(after + 1),
            Some(c) if c.is_ascii_whitespace() => {
                return lower[after..].find('>').map(|close| after + close + 1);
            }
            _ => from = after,
        }
    }
    None
}

fn splice_styles(html: &str, css: &str) -> String {
    let style = format!("<style>\n{css}\n</style>\n");
    if let Some(at) = find_tag(html, "</head>") {
        return format!("{}{style}{}", &html[..at], &html[at..]);
    }
    if let Some(at) = html_open_tag_end(html) {
        return format!("{}\n<head>\n{style}</head>{}", &html[..at], &html[at..]);
    }
    format!("<!DOCTYPE html>\n<html>\n<head>\n{style}</head>\n<body>\n{html}\n</body>\n</html>")
}

fn splice_scripts(html: &str, js: &str) -> String {
    if let Some(at) = find_tag(html, "</body>") {
        return format!("{}<script>\n{js}\n</script>\n{}", &html[..at], &html[at..]);
    }
    format!("{html}\n<script>\n{js}\n</script>")
}

#[cfg(test)]
#[path = "tests/preview_tests.rs"]
mod tests;
