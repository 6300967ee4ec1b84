use super::*;

fn tree(files: &[(&str, &str)]) -> FileTree {
    let mut tree = FileTree::new();
    for (path, content) in files {
        tree.insert(path, content).expect("insert");
    }
    tree
}

fn compose(tree: &FileTree, selection: Option<&Selection>) -> String {
    TextSpliceCompositor.compose(tree, selection)
}

#[test]
fn styles_go_before_head_close_and_scripts_before_body_close() {
    let tree = tree(&[
        ("site/index.html", "<html><head><title>T</title></head><body><p>x</p></body></html>"),
        ("site/style.css", "p { color: red; }"),
        ("site/script.js", "console.log(1);"),
    ]);

    assert_eq!(
        compose(&tree, None),
        "<html><head><title>T</title><style>\np { color: red; }\n</style>\n</head>\
         <body><p>x</p><script>\nconsole.log(1);\n</script>\n</body></html>"
    );
}

#[test]
fn tag_matching_ignores_case() {
    let tree = tree(&[
        ("site/index.html", "<HTML><HEAD></HEAD><BODY></BODY></HTML>"),
        ("site/style.css", "a{}"),
        ("site/app.JS", "go()"),
    ]);
    let html = compose(&tree, None);
    assert!(html.starts_with("<HTML><HEAD><style>\na{}\n</style>\n</HEAD>"));
    assert!(html.contains("<BODY><script>\ngo()\n</script>\n</BODY>"));
}

#[test]
fn head_is_created_after_html_open_tag_when_missing() {
    let tree = tree(&[
        ("site/index.html", "<html lang=\"en\"><body>hi</body></html>"),
        ("site/style.css", "b{}"),
    ]);
    assert_eq!(
        compose(&tree, None),
        "<html lang=\"en\">\n<head>\n<style>\nb{}\n</style>\n</head><body>hi</body></html>"
    );
}

#[test]
fn fragment_is_wrapped_in_a_skeleton() {
    let tree = tree(&[
        ("site/index.html", "<h1>Hello</h1>"),
        ("site/style.css", "h1{}"),
        ("site/script.js", "run()"),
    ]);
    assert_eq!(
        compose(&tree, None),
        "<!DOCTYPE html>\n<html>\n<head>\n<style>\nh1{}\n</style>\n</head>\n<body>\n<h1>Hello</h1>\n\
         <script>\nrun()\n</script>\n</body>\n</html>"
    );
}

#[test]
fn scripts_are_appended_without_body_close() {
    let tree = tree(&[("site/index.html", "<p>x</p>"), ("site/script.js", "a()")]);
    assert_eq!(compose(&tree, None), "<p>x</p>\n<script>\na()\n</script>");
}

#[test]
fn no_assets_leaves_the_anchor_untouched() {
    let tree = tree(&[("site/index.html", "<p>plain</p>"), ("site/empty.css", "")]);
    assert_eq!(compose(&tree, None), "<p>plain</p>");
}

#[test]
fn multiple_stylesheets_are_joined_in_tree_order() {
    let tree = tree(&[
        ("site/index.html", "<head></head>"),
        ("site/a.css", "a{}"),
        ("site/b.css", "b{}"),
    ]);
    assert_eq!(
        compose(&tree, None),
        "<head><style>\na{}\nb{}\n</style>\n</head>"
    );
}

#[test]
fn selected_html_with_live_content_wins() {
    let tree = tree(&[
        ("site/index.html", "<p>saved</p>"),
        ("site/about.html", "<p>about</p>"),
    ]);
    let live = Selection::new("site/about.html", "<p>typing</p>");
    assert_eq!(compose(&tree, Some(&live)), "<p>typing</p>");

    let blank = Selection::new("site/about.html", "   ");
    assert_eq!(compose(&tree, Some(&blank)), "<p>saved</p>");

    let css = Selection::new("site/style.css", "<p>not html</p>");
    assert_eq!(compose(&tree, Some(&css)), "<p>saved</p>");
}

#[test]
fn empty_html_files_are_skipped_when_choosing_an_anchor() {
    let tree = tree(&[("a/index.html", ""), ("b/index.html", "<p>b</p>")]);
    assert_eq!(compose(&tree, None), "<p>b</p>");
}

#[test]
fn no_html_produces_an_empty_document() {
    let tree = tree(&[("site/style.css", "a{}")]);
    assert_eq!(compose(&tree, None), "");
    assert_eq!(compose(&FileTree::new(), None), "");
}

#[test]
fn html5_like_tags_are_not_mistaken_for_the_root() {
    assert_eq!(html_open_tag_end("<html5-widget>x"), None);
    assert_eq!(html_open_tag_end("<htmlx><html>"), Some(13));
}
