//! CSS selectors evaluated against a [`PageSnapshot`].
//!
//! Parsing is done by `scraper`, matching by the `selectors` crate through an
//! [`Element`] implementation over snapshot indices, so both engines share
//! one selector engine: combinators, attribute operators and tree-structural
//! pseudo-classes (`:root`, `:first-child`, `:nth-child()`, ...) all work.
//! Other pseudo-classes (`:hover`, `:focus`, ...) fail to parse.

use crate::page::{ElementSnapshot, PageSnapshot};
use crate::{Error, Result};
use scraper::selector::{NonTSPseudoClass, PseudoElement, Simple};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::matching::{self, ElementSelectorFlags, MatchingContext, MatchingMode, QuirksMode};
use selectors::parser::{self, SelectorImpl};
use selectors::{Element, OpaqueElement};
use std::fmt;

type LocalName = <Simple as SelectorImpl>::LocalName;
type Namespace = <Simple as SelectorImpl>::NamespaceUrl;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// An element of a [`PageSnapshot`], addressed by index.
#[derive(Clone, Copy)]
pub struct SnapshotElement<'a> {
    page: &'a PageSnapshot,
    index: usize,
}

impl<'a> SnapshotElement<'a> {
    fn new(page: &'a PageSnapshot, index: usize) -> Option<Self> {
        (index < page.elements.len()).then_some(Self { page, index })
    }

    fn element(&self) -> &'a ElementSnapshot {
        &self.page.elements[self.index]
    }

    fn parent_index(&self) -> Option<usize> {
        self.element().parent
    }
}

impl fmt::Debug for SnapshotElement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> #{}", self.element().tag, self.index)
    }
}

/// Tree-structural matching only; elements are always HTML.
impl<'a> Element for SnapshotElement<'a> {
    type Impl = Simple;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self.element())
    }

    fn parent_element(&self) -> Option<Self> {
        self.parent_index().and_then(|p| Self::new(self.page, p))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    // Elements are stored in document order: the previous sibling is the
    // nearest earlier element with the same parent, stopping at the parent.
    fn prev_sibling_element(&self) -> Option<Self> {
        let parent = self.parent_index();
        (0..self.index)
            .rev()
            .take_while(|&i| Some(i) != parent)
            .find(|&i| self.page.elements[i].parent == parent)
            .and_then(|i| Self::new(self.page, i))
    }

    // Skips this element's own subtree; anything else that is not a sibling
    // means the parent has been closed.
    fn next_sibling_element(&self) -> Option<Self> {
        let parent = self.parent_index();
        for i in self.index + 1..self.page.elements.len() {
            let candidate = self.page.elements[i].parent;
            if candidate == parent {
                return Self::new(self.page, i);
            }
            match candidate {
                Some(p) if p >= self.index => continue,
                _ => return None,
            }
        }
        None
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, local_name: &LocalName) -> bool {
        self.element().tag.as_str() == &**local_name
    }

    fn has_namespace(&self, ns: &Namespace) -> bool {
        &**ns == HTML_NAMESPACE
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.element().tag == other.element().tag
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&Namespace>,
        local_name: &LocalName,
        operation: &AttrSelectorOperation<&String>,
    ) -> bool {
        if matches!(*ns, NamespaceConstraint::Specific(url) if !url.is_empty()) {
            return false;
        }
        self.element()
            .attributes
            .iter()
            .any(|(name, value)| name.as_str() == &**local_name && operation.eval_str(value))
    }

    fn match_non_ts_pseudo_class<F>(
        &self,
        pc: &NonTSPseudoClass,
        _context: &mut MatchingContext<Self::Impl>,
        _flags_setter: &mut F,
    ) -> bool
    where
        F: FnMut(&Self, ElementSelectorFlags),
    {
        match *pc {}
    }

    fn match_pseudo_element(&self, pe: &PseudoElement, _context: &mut MatchingContext<Self::Impl>) -> bool {
        match *pe {}
    }

    fn is_link(&self) -> bool {
        matches!(self.element().tag.as_str(), "a" | "area" | "link") && self.element().attr("href").is_some()
    }

    fn is_html_slot_element(&self) -> bool {
        false
    }

    fn has_id(&self, id: &LocalName, case_sensitivity: CaseSensitivity) -> bool {
        self.element()
            .id()
            .is_some_and(|value| case_sensitivity.eq(id.as_bytes(), value.as_bytes()))
    }

    fn has_class(&self, name: &LocalName, case_sensitivity: CaseSensitivity) -> bool {
        self.element()
            .class_name()
            .split_whitespace()
            .any(|class| case_sensitivity.eq(name.as_bytes(), class.as_bytes()))
    }

    fn exported_part(&self, _name: &LocalName) -> Option<LocalName> {
        None
    }

    fn imported_part(&self, _name: &LocalName) -> Option<LocalName> {
        None
    }

    fn is_part(&self, _name: &LocalName) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        let has_child = self
            .page
            .elements
            .get(self.index + 1)
            .is_some_and(|next| next.parent == Some(self.index));
        !has_child && self.element().text.is_empty()
    }

    fn is_root(&self) -> bool {
        self.parent_index().is_none()
    }
}

/// One complex selector.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector(parser::Selector<Simple>);

impl Selector {
    pub fn matches(&self, page: &PageSnapshot, index: usize) -> bool {
        let Some(element) = SnapshotElement::new(page, index) else {
            return false;
        };
        let mut context = MatchingContext::new(MatchingMode::Normal, None, None, QuirksMode::NoQuirks);
        matching::matches_selector(&self.0, 0, None, &element, &mut context, &mut |_, _| {})
    }

    /// Specificity as `(ids, classes + attributes + pseudo-classes, types)`.
    pub fn specificity(&self) -> (u32, u32, u32) {
        // packed as a << 20 | b << 10 | c
        let packed = self.0.specificity();
        (packed >> 20, (packed >> 10) & 0x3ff, packed & 0x3ff)
    }
}

/// A comma-separated selector list.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    selectors: Vec<Selector>,
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self> {
        let parsed = scraper::Selector::parse(input)
            .map_err(|e| Error::Other(format!("Invalid selector {:?}: {:?}", input, e.kind)))?;
        Ok(Self {
            selectors: parsed.selectors.into_iter().map(Selector).collect(),
        })
    }

    pub fn matches(&self, page: &PageSnapshot, index: usize) -> bool {
        self.selectors.iter().any(|s| s.matches(page, index))
    }

    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }
}

/// Parse a selector that is part of the crate's own source.
pub(crate) fn static_selector(input: &str) -> SelectorList {
    SelectorList::parse(input).expect("built-in selector must parse")
}
