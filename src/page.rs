//! Immutable snapshot of a rendered page.
//!
//! Engines flatten the live document into a document-ordered list of
//! [`ElementSnapshot`]s. Each element carries the handful of computed style
//! properties and the bounding box the signal extractor looks at, so the
//! extractor can run against a synthetic page in tests.

use crate::selector::SelectorList;
use crate::Viewport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Computed style values as CSS strings (empty when unknown).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComputedStyle {
    pub background_color: String,
    pub color: String,
    pub border_color: String,
    pub font_family: String,
    pub font_size: String,
    pub font_weight: String,
}

/// Bounding box in CSS pixels, relative to the viewport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementRect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementSnapshot {
    /// Lowercase tag name.
    pub tag: String,
    /// Index of the parent element in [`PageSnapshot::elements`].
    pub parent: Option<usize>,
    pub attributes: BTreeMap<String, String>,
    /// Trimmed text content.
    pub text: String,
    pub style: ComputedStyle,
    pub rect: ElementRect,
    /// Serialized outer markup; only filled for inline SVG.
    pub markup: Option<String>,
}

impl ElementSnapshot {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn class_name(&self) -> &str {
        self.attr("class").unwrap_or("")
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_name().split_whitespace().any(|c| c == class)
    }
}

/// A flattened page: root custom properties plus every element in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageSnapshot {
    pub url: String,
    pub viewport: Viewport,
    /// Custom properties declared on the root element, in declaration order.
    pub root_properties: Vec<(String, String)>,
    pub elements: Vec<ElementSnapshot>,
}

impl PageSnapshot {
    /// Append an element and return its index.
    pub fn push(&mut self, element: ElementSnapshot) -> usize {
        self.elements.push(element);
        self.elements.len() - 1
    }

    /// Parents of `index`, nearest first.
    pub fn ancestors(&self, index: usize) -> Ancestors<'_> {
        Ancestors {
            page: self,
            next: self.elements.get(index).and_then(|e| e.parent),
        }
    }

    pub fn is_descendant_of(&self, index: usize, ancestor: usize) -> bool {
        self.ancestors(index).any(|(i, _)| i == ancestor)
    }

    /// Elements matching `selectors`, in document order.
    pub fn select<'a>(
        &'a self,
        selectors: &'a SelectorList,
    ) -> impl Iterator<Item = (usize, &'a ElementSnapshot)> + 'a {
        self.elements
            .iter()
            .enumerate()
            .filter(move |(i, _)| selectors.matches(self, *i))
    }

    pub fn select_first(&self, selectors: &SelectorList) -> Option<(usize, &ElementSnapshot)> {
        self.elements
            .iter()
            .enumerate()
            .find(|(i, _)| selectors.matches(self, *i))
    }

    /// Elements under `root` matching `selectors`, in document order.
    pub fn select_within<'a>(
        &'a self,
        root: usize,
        selectors: &'a SelectorList,
    ) -> impl Iterator<Item = (usize, &'a ElementSnapshot)> + 'a {
        self.select(selectors)
            .filter(move |(i, _)| self.is_descendant_of(*i, root))
    }
}

pub struct Ancestors<'a> {
    page: &'a PageSnapshot,
    next: Option<usize>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = (usize, &'a ElementSnapshot);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        let element = self.page.elements.get(index)?;
        self.next = element.parent;
        Some((index, element))
    }
}
