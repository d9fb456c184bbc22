// src/github/rewrite.rs
// =============================================================================
// Rewrites relative links in GitHub-rendered README HTML.
//
// GitHub renders README markdown with paths relative to the repository, e.g.
// <img src="docs/shot.png">. Embedded in our page those would resolve
// against *our* origin and break, so we make them absolute:
//
//   <img src>  -> https://raw.githubusercontent.com/{owner}/{repo}/HEAD/{src}
//   <a href>   -> https://github.com/{owner}/{repo}/blob/HEAD/{href}
//
// Left alone:
//   - anything already absolute (has a scheme, or starts with //)
//   - data: image URIs
//   - #fragment links (in-page anchors)
//
// Every non-fragment link also gets target="_blank" and
// rel="noopener noreferrer" so it opens outside the portfolio.
//
// We use `scraper` (html5ever) to parse the fragment and then serialize the
// tree back ourselves, swapping attribute values on the way out. If anything
// goes wrong the caller gets the original HTML back untouched.
// =============================================================================

use ego_tree::NodeRef;
use scraper::{Html, Node};
use url::Url;

/// Base URLs that relative README targets are resolved against.
#[derive(Debug, Clone)]
pub struct LinkBases {
    /// Prefix for images, ending in `/`.
    pub raw: Url,
    /// Prefix for links, ending in `/`.
    pub blob: Url,
}

impl LinkBases {
    /// Builds `{raw_base}/{owner}/{repo}/HEAD/` and `{web_base}/{owner}/{repo}/blob/HEAD/`.
    pub fn for_repo(
        raw_base: &str,
        web_base: &str,
        owner: &str,
        repo: &str,
    ) -> Result<Self, url::ParseError> {
        let raw_base = raw_base.trim_end_matches('/');
        let web_base = web_base.trim_end_matches('/');
        Ok(Self {
            raw: Url::parse(&format!("{}/{}/{}/HEAD/", raw_base, owner, repo))?,
            blob: Url::parse(&format!("{}/{}/{}/blob/HEAD/", web_base, owner, repo))?,
        })
    }
}

// Elements that never have a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

// Elements whose text content is emitted verbatim
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

const LINK_REL: &str = "noopener noreferrer";

/// Rewrites `html`, or returns it unchanged if rewriting is not possible.
pub fn rewrite_readme_html(html: &str, bases: &LinkBases) -> String {
    match try_rewrite(html, bases) {
        Some(rewritten) => rewritten,
        None => {
            tracing::warn!("README rewrite failed, serving original HTML");
            html.to_string()
        }
    }
}

fn try_rewrite(html: &str, bases: &LinkBases) -> Option<String> {
    let fragment = Html::parse_fragment(html);

    // parse_fragment wraps the content in a synthetic <html> element
    let root = fragment
        .tree
        .root()
        .children()
        .find(|n| matches!(n.value(), Node::Element(e) if e.name() == "html"))?;

    let mut out = String::with_capacity(html.len() + html.len() / 8);
    for child in root.children() {
        write_node(child, bases, false, &mut out);
    }
    Some(out)
}

fn write_node(node: NodeRef<'_, Node>, bases: &LinkBases, raw_text: bool, out: &mut String) {
    match node.value() {
        Node::Text(text) => {
            if raw_text {
                out.push_str(text);
            } else {
                escape_text(text, out);
            }
        }
        Node::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        Node::Element(element) => {
            let name = element.name();
            out.push('<');
            out.push_str(name);

            let mut is_link = false;
            for (attr, value) in element.attrs() {
                let value = match (name, attr) {
                    ("img", "src") => resolve_image(value, &bases.raw),
                    ("a", "href") => {
                        is_link = !value.trim().starts_with('#');
                        resolve_link(value, &bases.blob)
                    }
                    // Replaced below for links
                    ("a", "target") | ("a", "rel") => continue,
                    _ => value.to_string(),
                };
                write_attr(attr, &value, out);
            }

            if name == "a" {
                // Keep whatever target/rel an in-page anchor already had
                if is_link {
                    write_attr("target", "_blank", out);
                    write_attr("rel", LINK_REL, out);
                } else {
                    for (attr, value) in element.attrs() {
                        if attr == "target" || attr == "rel" {
                            write_attr(attr, value, out);
                        }
                    }
                }
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&name) {
                return;
            }

            let raw_children = RAW_TEXT_ELEMENTS.contains(&name);
            for child in node.children() {
                write_node(child, bases, raw_children, out);
            }

            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        // Nothing else can appear inside a body fragment
        _ => {
            for child in node.children() {
                write_node(child, bases, raw_text, out);
            }
        }
    }
}

fn is_absolute(target: &str) -> bool {
    target.starts_with("//") || Url::parse(target).is_ok()
}

/// Resolves an image source against the raw-content base.
pub fn resolve_image(src: &str, raw: &Url) -> String {
    let trimmed = src.trim();
    if trimmed.is_empty() || trimmed.starts_with("data:") || is_absolute(trimmed) {
        return src.to_string();
    }
    join(raw, trimmed).unwrap_or_else(|| src.to_string())
}

/// Resolves a link target against the blob-view base.
pub fn resolve_link(href: &str, blob: &Url) -> String {
    let trimmed = href.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || is_absolute(trimmed) {
        return href.to_string();
    }
    join(blob, trimmed).unwrap_or_else(|| href.to_string())
}

// A leading slash means "repository root" in a README, not "host root"
fn join(base: &Url, target: &str) -> Option<String> {
    base.join(target.trim_start_matches('/'))
        .ok()
        .map(|u| u.to_string())
}

fn write_attr(name: &str, value: &str, out: &mut String) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out.push('"');
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why not edit the DOM in place?
//    - scraper's tree is read-only from the outside (element attributes are
//      private), so we stream it back out as text instead
//    - html5ever has already normalised the markup, so the serializer only
//      needs to handle elements, text and comments
//
// 2. Why trim the leading '/' before joining?
//    - Url::join("/docs/a.png") would replace the whole path, giving
//      https://raw.githubusercontent.com/docs/a.png
//    - On GitHub a root-relative README path means the repository root
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn bases() -> LinkBases {
        LinkBases::for_repo(
            "https://raw.githubusercontent.com",
            "https://github.com",
            "acme",
            "widgets",
        )
        .unwrap()
    }

    #[test]
    fn test_relative_image_goes_to_raw_host() {
        let out = rewrite_readme_html(r#"<img src="assets/pic.png">"#, &bases());
        assert!(
            out.contains(r#"src="https://raw.githubusercontent.com/acme/widgets/HEAD/assets/pic.png""#),
            "{}",
            out
        );
    }

    #[test]
    fn test_absolute_image_unchanged() {
        let out = rewrite_readme_html(r#"<p><img src="https://x.com/a.png" alt="a"></p>"#, &bases());
        assert!(out.contains(r#"src="https://x.com/a.png""#), "{}", out);
        assert!(out.contains(r#"alt="a""#));
    }

    #[test]
    fn test_data_uri_unchanged() {
        let src = "data:image/png;base64,iVBORw0KGgo=";
        assert_eq!(resolve_image(src, &bases().raw), src);
    }

    #[test]
    fn test_root_relative_image_stays_in_repo() {
        assert_eq!(
            resolve_image("/docs/a.png", &bases().raw),
            "https://raw.githubusercontent.com/acme/widgets/HEAD/docs/a.png"
        );
        assert_eq!(
            resolve_image("./docs/a.png", &bases().raw),
            "https://raw.githubusercontent.com/acme/widgets/HEAD/docs/a.png"
        );
    }

    #[test]
    fn test_relative_link_goes_to_blob_view() {
        let out = rewrite_readme_html(r#"<a href="docs/GUIDE.md">guide</a>"#, &bases());
        assert_eq!(
            out,
            r#"<a href="https://github.com/acme/widgets/blob/HEAD/docs/GUIDE.md" target="_blank" rel="noopener noreferrer">guide</a>"#
        );
    }

    #[test]
    fn test_fragment_link_untouched() {
        let out = rewrite_readme_html(r##"<a href="#install">Install</a>"##, &bases());
        assert_eq!(out, r##"<a href="#install">Install</a>"##);
    }

    #[test]
    fn test_padded_fragment_link_untouched() {
        let out = rewrite_readme_html(r##"<a href=" #usage" target="_self">Usage</a>"##, &bases());
        assert_eq!(out, r##"<a href=" #usage" target="_self">Usage</a>"##);
    }

    #[test]
    fn test_absolute_link_kept_but_opens_in_new_tab() {
        let out = rewrite_readme_html(
            r#"<a href="https://crates.io/crates/x" rel="nofollow">x</a>"#,
            &bases(),
        );
        assert_eq!(
            out,
            r#"<a href="https://crates.io/crates/x" target="_blank" rel="noopener noreferrer">x</a>"#
        );
    }

    #[test]
    fn test_mailto_is_absolute() {
        assert_eq!(resolve_link("mailto:a@b.c", &bases().blob), "mailto:a@b.c");
    }

    #[test]
    fn test_text_and_structure_survive() {
        let html = "<h1>Title &amp; more</h1>\n<pre><code>a &lt; b</code></pre><br><!-- note -->";
        let out = rewrite_readme_html(html, &bases());
        assert_eq!(out, html);
    }

    #[test]
    fn test_attribute_quotes_are_escaped() {
        let out = rewrite_readme_html(r#"<img src="a.png" alt='say "hi"'>"#, &bases());
        assert!(out.contains(r#"alt="say &quot;hi&quot;""#), "{}", out);
    }
}
