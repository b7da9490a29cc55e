//! Parser-agnostic view of an HTML document.
//!
//! The extractor only needs a handful of questions answered: which elements
//! exist (in document order), what their tag is, which element children they
//! have, and what text they contain. [`DocumentTree`] captures exactly that so
//! the heuristics can run against `scraper` output or a hand-built tree.

use scraper::{ElementRef, Html};

/// Elements whose text never counts as visible label text.
const INVISIBLE: &[&str] = &["script", "style", "template", "noscript"];

pub trait DocumentTree {
    type Node<'a>: Copy + PartialEq
    where
        Self: 'a;

    /// Every element, in document (pre-)order.
    fn elements(&self) -> Vec<Self::Node<'_>>;

    /// Lower-case tag name.
    fn tag_name<'a>(&'a self, node: Self::Node<'a>) -> &'a str;

    /// Direct element children, in document order.
    fn children<'a>(&'a self, node: Self::Node<'a>) -> Vec<Self::Node<'a>>;

    /// Concatenated descendant text with markup discarded.
    fn text_content<'a>(&'a self, node: Self::Node<'a>) -> String;

    /// All elements whose tag is one of `tags`, in document order.
    fn find_all(&self, tags: &[&str]) -> Vec<Self::Node<'_>> {
        self.elements()
            .into_iter()
            .filter(|&n| tag_matches(self.tag_name(n), tags))
            .collect()
    }

    fn children_with_tag<'a>(&'a self, node: Self::Node<'a>, tag: &str) -> Vec<Self::Node<'a>> {
        self.children(node)
            .into_iter()
            .filter(|&c| self.tag_name(c).eq_ignore_ascii_case(tag))
            .collect()
    }

    fn count_children<'a>(&'a self, node: Self::Node<'a>, tag: &str) -> usize {
        self.children(node)
            .into_iter()
            .filter(|&c| self.tag_name(c).eq_ignore_ascii_case(tag))
            .count()
    }

    /// First element after `anchor` in document order (descendants of
    /// `anchor` included) whose tag is in `tags` and whose text satisfies `accept`.
    fn next_matching<'a>(
        &'a self,
        anchor: Self::Node<'a>,
        tags: &[&str],
        accept: impl Fn(&str) -> bool,
    ) -> Option<Self::Node<'a>> {
        let all = self.elements();
        let pos = all.iter().position(|&n| n == anchor)?;
        all.into_iter()
            .skip(pos + 1)
            .find(|&n| tag_matches(self.tag_name(n), tags) && accept(&self.text_content(n)))
    }
}

fn tag_matches(tag: &str, tags: &[&str]) -> bool {
    tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

/// [`DocumentTree`] over a document parsed by `scraper` (html5ever).
pub struct HtmlTree {
    html: Html,
}

impl HtmlTree {
    pub fn parse(document: &str) -> Self {
        Self {
            html: Html::parse_document(document),
        }
    }

    /// Parse errors html5ever recovered from; useful when the page shape drifts.
    pub fn recovered_errors(&self) -> usize {
        self.html.errors.len()
    }
}

impl DocumentTree for HtmlTree {
    type Node<'a> = ElementRef<'a>;

    fn elements(&self) -> Vec<ElementRef<'_>> {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .collect()
    }

    fn tag_name<'a>(&'a self, node: ElementRef<'a>) -> &'a str {
        node.value().name()
    }

    fn children<'a>(&'a self, node: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        node.children().filter_map(ElementRef::wrap).collect()
    }

    fn text_content<'a>(&'a self, node: ElementRef<'a>) -> String {
        let mut out = String::new();
        for descendant in node.descendants() {
            let Some(text) = descendant.value().as_text() else {
                continue;
            };
            let hidden = descendant
                .ancestors()
                .take_while(|a| a.id() != node.id())
                .filter_map(|a| a.value().as_element())
                .any(|e| INVISIBLE.contains(&e.name()));
            if !hidden {
                out.push_str(text);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <h3>日本のトレンド</h3>
          <h2>現在</h2>
          <ul id="a"><li>one</li><li>two<ul><li>nested</li></ul></li></ul>
          <ol id="b"><li>x</li></ol>
        </body></html>"#;

    #[test]
    fn finds_lists_in_document_order() {
        let tree = HtmlTree::parse(PAGE);
        let lists = tree.find_all(&["ul", "ol"]);
        let ids: Vec<_> = lists.iter().map(|l| l.value().id()).collect();
        assert_eq!(ids, vec![Some("a"), None, Some("b")]);
    }

    #[test]
    fn counts_only_direct_item_children() {
        let tree = HtmlTree::parse(PAGE);
        let first = tree.find_all(&["ul"])[0];
        assert_eq!(tree.count_children(first, "li"), 2);
    }

    #[test]
    fn text_skips_markup_and_scripts() {
        let tree = HtmlTree::parse(
            "<ul><li><span>1.</span><a href='#'>東京<b>都</b></a><script>var x=1;</script></li></ul>",
        );
        let li = tree.find_all(&["li"])[0];
        assert_eq!(tree.text_content(li), "1.東京都");
    }

    #[test]
    fn next_matching_walks_forward_only() {
        let tree = HtmlTree::parse(PAGE);
        let heading = tree.find_all(&["h3"])[0];
        let current = tree
            .next_matching(heading, &["h2", "h3"], |t| t.contains("現在"))
            .expect("current heading");
        assert_eq!(tree.tag_name(current), "h2");

        let list = tree.next_matching(current, &["ul", "ol"], |_| true).unwrap();
        assert_eq!(list.value().id(), Some("a"));

        let ol = tree.find_all(&["ol"])[0];
        assert!(tree.next_matching(ol, &["h2"], |_| true).is_none());
    }
}
