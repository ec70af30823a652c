//! Queryable view over one parsed chapter or appendix file.
//!
//! Only the handful of lookups the extractor needs are exposed: tag/class
//! searches, id lookup, sibling and ancestor steps, and text with or without
//! one subtree left out.

use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex::Regex;
use std::rc::Rc;
use xml5ever::driver::parse_document;
use xml5ever::tendril::TendrilSink;

/// How an element's `class` attribute has to look for a query to match it.
#[derive(Clone, Copy, Debug)]
pub enum ClassFilter<'a> {
    Any,
    /// One whitespace-separated class token equals this string.
    Token(&'a str),
    /// The pattern is found somewhere in one of the class tokens.
    Pattern(&'a Regex),
}

impl ClassFilter<'_> {
    fn accepts(&self, class_attr: Option<&str>) -> bool {
        match self {
            ClassFilter::Any => true,
            ClassFilter::Token(want) => class_attr
                .map(|c| c.split_whitespace().any(|t| t == *want))
                .unwrap_or(false),
            ClassFilter::Pattern(re) => class_attr
                .map(|c| c.split_whitespace().any(|t| re.is_match(t)))
                .unwrap_or(false),
        }
    }
}

pub struct Document {
    dom: RcDom,
}

impl Document {
    /// Parses XHTML as XML, so self-closing elements such as `<title/>` or
    /// `<a id="x"/>` stay empty.
    pub fn parse(markup: &str) -> Self {
        let dom = parse_document(RcDom::default(), Default::default()).one(markup);
        Document { dom }
    }

    pub fn root(&self) -> Node {
        Node(self.dom.document.clone())
    }

    pub fn find_all(&self, tag: &str, class: ClassFilter<'_>) -> Vec<Node> {
        self.root().find_all(tag, class)
    }

    /// First element (any tag) whose `id` attribute equals `id`.
    pub fn find_by_id(&self, id: &str) -> Option<Node> {
        fn walk(node: &Handle, id: &str) -> Option<Handle> {
            for c in node.children.borrow().iter() {
                if let NodeData::Element { attrs, .. } = &c.data {
                    let hit = attrs
                        .borrow()
                        .iter()
                        .any(|a| &*a.name.local == "id" && &*a.value == id);
                    if hit {
                        return Some(c.clone());
                    }
                }
                if let Some(found) = walk(c, id) {
                    return Some(found);
                }
            }
            None
        }
        walk(&self.dom.document, id).map(Node)
    }
}

#[derive(Clone)]
pub struct Node(Handle);

impl Node {
    /// Lowercased local name, `None` for text, comments and the document itself.
    pub fn tag(&self) -> Option<String> {
        match &self.0.data {
            NodeData::Element { name, .. } => Some(name.local.to_string().to_ascii_lowercase()),
            _ => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        match &self.0.data {
            NodeData::Element { attrs, .. } => attrs
                .borrow()
                .iter()
                .find(|a| a.name.local.to_string().eq_ignore_ascii_case(name))
                .map(|a| a.value.to_string()),
            _ => None,
        }
    }

    pub fn is(&self, tag: &str, class: ClassFilter<'_>) -> bool {
        match &self.0.data {
            NodeData::Element { name, .. }
                if name.local.to_string().eq_ignore_ascii_case(tag) =>
            {
                class.accepts(self.attr("class").as_deref())
            }
            _ => false,
        }
    }

    /// All matching descendants in document order (the node itself excluded).
    pub fn find_all(&self, tag: &str, class: ClassFilter<'_>) -> Vec<Node> {
        fn walk(node: &Handle, tag: &str, class: ClassFilter<'_>, out: &mut Vec<Node>) {
            for c in node.children.borrow().iter() {
                let n = Node(c.clone());
                if n.is(tag, class) {
                    out.push(n);
                }
                walk(c, tag, class, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.0, tag, class, &mut out);
        out
    }

    /// First descendant with this tag, depth-first.
    pub fn find_first(&self, tag: &str) -> Option<Node> {
        fn walk(node: &Handle, tag: &str) -> Option<Node> {
            for c in node.children.borrow().iter() {
                let n = Node(c.clone());
                if n.is(tag, ClassFilter::Any) {
                    return Some(n);
                }
                if let Some(found) = walk(c, tag) {
                    return Some(found);
                }
            }
            None
        }
        walk(&self.0, tag)
    }

    /// Direct element children with this tag.
    pub fn child_elements(&self, tag: &str) -> Vec<Node> {
        self.0
            .children
            .borrow()
            .iter()
            .map(|c| Node(c.clone()))
            .filter(|n| n.is(tag, ClassFilter::Any))
            .collect()
    }

    pub fn parent(&self) -> Option<Node> {
        let weak = self.0.parent.take();
        let parent = weak.as_ref().and_then(|w| w.upgrade());
        self.0.parent.set(weak);
        parent.map(Node)
    }

    /// Next element sibling, stepping over text and comments in between.
    pub fn next_sibling_element(&self) -> Option<Node> {
        let parent = self.parent()?;
        let siblings = parent.0.children.borrow();
        let pos = siblings.iter().position(|c| Rc::ptr_eq(c, &self.0))?;
        let next = siblings[pos + 1..]
            .iter()
            .find(|c| matches!(c.data, NodeData::Element { .. }))
            .map(|c| Node(c.clone()));
        next
    }

    /// Closest element matching tag and class, starting at this node and walking up.
    pub fn nearest_ancestor(&self, tag: &str, class: ClassFilter<'_>) -> Option<Node> {
        let mut cur = Some(self.clone());
        while let Some(node) = cur {
            if node.is(tag, class) {
                return Some(node);
            }
            cur = node.parent();
        }
        None
    }

    /// Raw concatenation of every descendant text node.
    pub fn text(&self) -> String {
        self.collect_text(None)
    }

    /// Like [`Node::text`], but the `skip` subtree contributes nothing.
    /// The tree itself is left untouched.
    pub fn text_excluding(&self, skip: &Node) -> String {
        self.collect_text(Some(&skip.0))
    }

    fn collect_text(&self, skip: Option<&Handle>) -> String {
        fn walk(node: &Handle, skip: Option<&Handle>, out: &mut String) {
            if skip.is_some_and(|s| Rc::ptr_eq(s, node)) {
                return;
            }
            if let NodeData::Text { contents } = &node.data {
                out.push_str(&contents.borrow());
            }
            for c in node.children.borrow().iter() {
                walk(c, skip, out);
            }
        }
        let mut out = String::new();
        walk(&self.0, skip, &mut out);
        out
    }
}

/// Collapses whitespace runs to one space and trims both ends, so wrapped
/// source lines end up on a single output line.
pub fn normalize_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_ws = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            in_ws = true;
            continue;
        }
        if in_ws && !out.is_empty() {
            out.push(' ');
        }
        in_ws = false;
        out.push(ch);
    }
    out
}
