//! Selector Model
//!
//! Simple selectors, selector chains, combinators and specificity.

use std::fmt;

/// Relation between a selector and the next selector in its chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// Nothing follows (the subject of the chain)
    #[default]
    None,
    /// Whitespace: next selector is a descendant
    Descendant,
    /// `>`: next selector is a direct child
    Child,
    /// `+`: next selector is the immediately following sibling
    NextSibling,
    /// `~`: next selector is any following sibling
    SubsequentSibling,
}

impl Combinator {
    /// Parse a combinator token as buffered by the parser.
    ///
    /// An empty token is the descendant combinator.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "" => Some(Self::Descendant),
            ">" => Some(Self::Child),
            "+" => Some(Self::NextSibling),
            "~" => Some(Self::SubsequentSibling),
            _ => None,
        }
    }

    /// Text placed between two selectors when serializing
    pub fn as_css(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Descendant => " ",
            Self::Child => " > ",
            Self::NextSibling => " + ",
            Self::SubsequentSibling => " ~ ",
        }
    }
}

/// Simple selector: optional tag, optional id, any number of classes
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Selector {
    /// Tag name; empty or `*` matches any tag
    pub tag: String,
    /// Id; empty means unconstrained
    pub id: String,
    /// Required classes, in source order
    pub classes: Vec<String>,
    /// Relation to the next selector in the chain
    pub combinator: Combinator,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selector with just a tag name
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_combinator(mut self, combinator: Combinator) -> Self {
        self.combinator = combinator;
        self
    }

    /// True if the tag places no constraint on the node
    pub fn is_universal_tag(&self) -> bool {
        self.tag.is_empty() || self.tag == "*"
    }

    /// True if nothing has been set on this selector yet
    pub fn is_empty(&self) -> bool {
        self.tag.is_empty() && self.id.is_empty() && self.classes.is_empty()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)?;
        if !self.id.is_empty() {
            write!(f, "#{}", self.id)?;
        }
        for class in &self.classes {
            write!(f, ".{}", class)?;
        }
        Ok(())
    }
}

/// Selectors from the outermost constraint (index 0) to the subject (last)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SelectorChain(pub Vec<Selector>);

impl SelectorChain {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, selector: Selector) {
        self.0.push(selector);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The selector the rule ultimately targets
    pub fn subject(&self) -> Option<&Selector> {
        self.0.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Selector> {
        self.0.iter()
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut Selector> {
        self.0.last_mut()
    }

    pub fn specificity(&self) -> Specificity {
        Specificity::of_chain(self)
    }
}

impl From<Vec<Selector>> for SelectorChain {
    fn from(selectors: Vec<Selector>) -> Self {
        Self(selectors)
    }
}

impl<'a> IntoIterator for &'a SelectorChain {
    type Item = &'a Selector;
    type IntoIter = std::slice::Iter<'a, Selector>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for SelectorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for selector in &self.0 {
            write!(f, "{}{}", selector, selector.combinator.as_css())?;
        }
        Ok(())
    }
}

/// Selector chain specificity, packed as `ids:classes:tags` in 8-bit fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Specificity(pub u32);

impl Specificity {
    /// Pack the three counts; each saturates at 255 so fields never bleed
    pub fn new(ids: usize, classes: usize, tags: usize) -> Self {
        let clamp = |n: usize| n.min(u8::MAX as usize) as u32;
        Self((clamp(ids) << 16) | (clamp(classes) << 8) | clamp(tags))
    }

    pub fn of_chain(chain: &SelectorChain) -> Self {
        let mut ids = 0;
        let mut classes = 0;
        let mut tags = 0;
        for selector in chain {
            if !selector.id.is_empty() {
                ids += 1;
            }
            classes += selector.classes.len();
            if !selector.is_universal_tag() {
                tags += 1;
            }
        }
        Self::new(ids, classes, tags)
    }

    pub fn ids(&self) -> u8 {
        ((self.0 >> 16) & 0xFF) as u8
    }

    pub fn classes(&self) -> u8 {
        ((self.0 >> 8) & 0xFF) as u8
    }

    pub fn tags(&self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Specificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.ids(), self.classes(), self.tags())
    }
}
