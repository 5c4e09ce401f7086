//! Extracted query elements.
//!
//! An extractor turns one natural-language query into an [`ElementSet`]: a
//! grouping of [`Element`]s by [`ElementType`]. Entities usually carry a
//! category label (an NER tag such as `GPE` or `ORG`); noun phrases, verbs and
//! dependency-role concepts are bare text.
//!
//! JSON shape (what extractor plugins emit):
//!
//! ```json
//! {
//!   "entities": [{ "text": "Seattle", "label": "GPE" }],
//!   "noun_phrases": ["popular attractions"],
//!   "verbs": ["visit"],
//!   "concepts": ["attractions"]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const TYPE_ENTITIES: &str = "entities";
pub const TYPE_NOUN_PHRASES: &str = "noun_phrases";
pub const TYPE_VERBS: &str = "verbs";
pub const TYPE_CONCEPTS: &str = "concepts";

/// The kind of an extracted element.
///
/// The four built-in kinds cover what the extractors produce today; anything
/// else round-trips through [`ElementType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementType {
    Entities,
    NounPhrases,
    Verbs,
    Concepts,
    Other(String),
}

impl ElementType {
    /// Built-in kinds, in canonical listing order.
    pub const BUILTIN: [ElementType; 4] = [
        ElementType::Entities,
        ElementType::NounPhrases,
        ElementType::Verbs,
        ElementType::Concepts,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ElementType::Entities => TYPE_ENTITIES,
            ElementType::NounPhrases => TYPE_NOUN_PHRASES,
            ElementType::Verbs => TYPE_VERBS,
            ElementType::Concepts => TYPE_CONCEPTS,
            ElementType::Other(name) => name,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim() {
            TYPE_ENTITIES => ElementType::Entities,
            TYPE_NOUN_PHRASES => ElementType::NounPhrases,
            TYPE_VERBS => ElementType::Verbs,
            TYPE_CONCEPTS => ElementType::Concepts,
            other => ElementType::Other(other.to_string()),
        }
    }
}

impl From<String> for ElementType {
    fn from(s: String) -> Self {
        ElementType::parse(&s)
    }
}

impl From<&str> for ElementType {
    fn from(s: &str) -> Self {
        ElementType::parse(s)
    }
}

impl From<ElementType> for String {
    fn from(t: ElementType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single extracted unit.
///
/// Graph identity is `(element type, text)`; the label is carried as a node
/// attribute only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, from = "RawElement")]
pub enum Element {
    Labeled { text: String, label: String },
    Plain(String),
}

/// Wire shape; converted through [`Element::labeled`] so a blank label
/// never survives deserialization.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawElement {
    Labeled {
        text: String,
        #[serde(default)]
        label: String,
    },
    Plain(String),
}

impl From<RawElement> for Element {
    fn from(raw: RawElement) -> Self {
        match raw {
            RawElement::Labeled { text, label } => Element::labeled(text, label),
            RawElement::Plain(text) => Element::Plain(text),
        }
    }
}

impl Element {
    /// A labeled element. An empty label degrades to a plain element.
    pub fn labeled(text: impl Into<String>, label: impl Into<String>) -> Self {
        let label = label.into();
        if label.trim().is_empty() {
            Element::Plain(text.into())
        } else {
            Element::Labeled {
                text: text.into(),
                label,
            }
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Element::Plain(text.into())
    }

    pub fn text(&self) -> &str {
        match self {
            Element::Labeled { text, .. } => text,
            Element::Plain(text) => text,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Element::Labeled { label, .. } => Some(label),
            Element::Plain(_) => None,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Labeled { text, label } => write!(f, "{text} ({label})"),
            Element::Plain(text) => f.write_str(text),
        }
    }
}

impl From<&str> for Element {
    fn from(s: &str) -> Self {
        Element::plain(s)
    }
}

/// All elements extracted from one query, grouped by type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementSet {
    groups: BTreeMap<ElementType, Vec<Element>>,
}

impl ElementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// An element set with all four built-in types present and empty.
    pub fn with_builtin_types() -> Self {
        let mut set = Self::new();
        for ty in ElementType::BUILTIN {
            set.groups.entry(ty).or_default();
        }
        set
    }

    /// Builder-style insert of a whole group.
    pub fn with<I, E>(mut self, element_type: impl Into<ElementType>, items: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Element>,
    {
        self.groups
            .entry(element_type.into())
            .or_default()
            .extend(items.into_iter().map(Into::into));
        self
    }

    pub fn push(&mut self, element_type: impl Into<ElementType>, element: Element) {
        self.groups
            .entry(element_type.into())
            .or_default()
            .push(element);
    }

    /// Elements of one type; a missing type reads as empty.
    pub fn get(&self, element_type: &ElementType) -> &[Element] {
        self.groups
            .get(element_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn types(&self) -> impl Iterator<Item = &ElementType> {
        self.groups.keys()
    }

    pub fn groups(&self) -> impl Iterator<Item = (&ElementType, &[Element])> {
        self.groups.iter().map(|(ty, items)| (ty, items.as_slice()))
    }

    /// Every `(type, element)` pair in canonical type order.
    pub fn iter(&self) -> impl Iterator<Item = (&ElementType, &Element)> {
        self.groups
            .iter()
            .flat_map(|(ty, items)| items.iter().map(move |item| (ty, item)))
    }

    /// Total number of elements across all types.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Extend<(ElementType, Element)> for ElementSet {
    fn extend<T: IntoIterator<Item = (ElementType, Element)>>(&mut self, iter: T) {
        for (ty, element) in iter {
            self.push(ty, element);
        }
    }
}
