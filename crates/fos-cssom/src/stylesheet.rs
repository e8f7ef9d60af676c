//! Stylesheet
//!
//! Styles are (selector chain, property list) pairs. Every selector chain of
//! a comma separated group shares one property list through an [`Arc`], so a
//! list lives exactly as long as the last style that refers to it.

use std::collections::BTreeMap;
use std::io::{self, Read};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::matching::{chain_matches, Crawler};
use crate::parser::{CssParser, ParseListener};
use crate::selector::{Combinator, Selector, SelectorChain, Specificity};
use crate::Result;

/// Bytes requested from the source per read
const READ_CHUNK_SIZE: usize = 4096;

static NEXT_STYLE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Property identifier chosen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyId(pub u32);

/// Declared properties of one declaration block, ordered by id
pub type PropertyList<V> = BTreeMap<PropertyId, V>;

/// A selector chain with its (possibly shared) declarations
#[derive(Debug)]
pub struct Style<V> {
    selectors: SelectorChain,
    properties: Arc<PropertyList<V>>,
    specificity: Specificity,
    /// Construction sequence number
    order: u64,
}

impl<V> Style<V> {
    pub fn new(selectors: SelectorChain, properties: Arc<PropertyList<V>>) -> Self {
        let specificity = selectors.specificity();
        Self {
            selectors,
            properties,
            specificity,
            order: NEXT_STYLE_SEQ.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn selectors(&self) -> &SelectorChain {
        &self.selectors
    }

    pub fn properties(&self) -> &PropertyList<V> {
        &self.properties
    }

    /// The shared handle, for identity comparisons
    pub fn shared_properties(&self) -> &Arc<PropertyList<V>> {
        &self.properties
    }

    pub fn specificity(&self) -> Specificity {
        self.specificity
    }

    pub(crate) fn order(&self) -> u64 {
        self.order
    }

    /// True if this style's chain matches the crawler's current node
    pub fn matches<C: Crawler + ?Sized>(&self, crawler: &mut C) -> bool {
        chain_matches(&self.selectors, crawler)
    }
}

impl<V> Clone for Style<V> {
    fn clone(&self) -> Self {
        Self {
            selectors: self.selectors.clone(),
            properties: Arc::clone(&self.properties),
            specificity: self.specificity,
            order: self.order,
        }
    }
}

/// Outcome of a property query
#[derive(Debug)]
pub struct QueryResult<'a, V> {
    /// Winning value, if any matching style declares the property
    pub value: Option<&'a V>,
    /// Specificity of the style the value came from (zero when absent)
    pub specificity: Specificity,
}

impl<V> QueryResult<'_, V> {
    pub fn is_found(&self) -> bool {
        self.value.is_some()
    }
}

/// Styles sorted by descending specificity
#[derive(Debug)]
pub struct Stylesheet<V> {
    styles: Vec<Style<V>>,
}

impl<V> Stylesheet<V> {
    pub fn new() -> Self {
        Self { styles: Vec::new() }
    }

    /// Parse a complete stylesheet from a string
    pub fn parse<N, P>(css: &str, name_to_id: N, parse_value: P) -> Result<Self>
    where
        N: FnMut(&str) -> Option<PropertyId>,
        P: FnMut(PropertyId, String) -> Option<V>,
    {
        Self::read(css.as_bytes(), name_to_id, parse_value)
    }

    /// Read a stylesheet from a byte source until it is exhausted
    pub fn read<R, N, P>(mut source: R, name_to_id: N, parse_value: P) -> Result<Self>
    where
        R: Read,
        N: FnMut(&str) -> Option<PropertyId>,
        P: FnMut(PropertyId, String) -> Option<V>,
    {
        let mut parser = CssParser::new();
        let mut builder = StyleBuilder::new(name_to_id, parse_value);
        let mut buf = [0u8; READ_CHUNK_SIZE];

        loop {
            let n = match source.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            parser.feed(&buf[..n], &mut builder)?;
        }
        parser.finish()?;

        let sheet = builder.into_stylesheet();
        tracing::debug!("Parsed {} styles from {} lines", sheet.len(), parser.line());
        Ok(sheet)
    }

    /// Build a sheet from existing styles
    pub fn from_styles(styles: Vec<Style<V>>) -> Self {
        let mut sheet = Self { styles };
        sheet.sort_by_specificity();
        sheet
    }

    /// Number of styles
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn styles(&self) -> &[Style<V>] {
        &self.styles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Style<V>> {
        self.styles.iter()
    }

    /// Add one style, keeping the sheet sorted
    pub fn insert(&mut self, style: Style<V>) {
        self.styles.push(style);
        self.sort_by_specificity();
    }

    /// Stable sort, highest specificity first; ties keep insertion order
    pub fn sort_by_specificity(&mut self) {
        self.styles.sort_by(|a, b| b.specificity.cmp(&a.specificity));
    }

    /// Move all styles of `other` into this sheet and re-sort
    pub fn append(&mut self, other: &mut Stylesheet<V>) {
        self.styles.append(&mut other.styles);
        self.sort_by_specificity();
    }

    /// Resolve the value of one property for the crawler's node.
    ///
    /// Styles are tried from highest specificity down; the first one that
    /// both matches and declares the property wins. A matching style that
    /// does not declare it is skipped, even if it is more specific.
    pub fn query<C: Crawler + ?Sized>(&self, crawler: &mut C, property: PropertyId) -> QueryResult<'_, V> {
        for style in &self.styles {
            crawler.reset();
            if !style.matches(crawler) {
                continue;
            }
            if let Some(value) = style.properties.get(&property) {
                return QueryResult {
                    value: Some(value),
                    specificity: style.specificity,
                };
            }
        }
        crawler.reset();

        QueryResult {
            value: None,
            specificity: Specificity::default(),
        }
    }
}

impl<V> Default for Stylesheet<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, V> IntoIterator for &'a Stylesheet<V> {
    type Item = &'a Style<V>;
    type IntoIter = std::slice::Iter<'a, Style<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.styles.iter()
    }
}

/// Parse listener that builds styles.
///
/// Chains are collected until their declaration block closes; every chain
/// collected since the previous block then shares that block's list.
pub struct StyleBuilder<V, N, P> {
    name_to_id: N,
    parse_value: P,
    selector: Selector,
    chain: SelectorChain,
    pending: Vec<SelectorChain>,
    properties: PropertyList<V>,
    property: Option<PropertyId>,
    styles: Vec<Style<V>>,
}

impl<V, N, P> StyleBuilder<V, N, P>
where
    N: FnMut(&str) -> Option<PropertyId>,
    P: FnMut(PropertyId, String) -> Option<V>,
{
    pub fn new(name_to_id: N, parse_value: P) -> Self {
        Self {
            name_to_id,
            parse_value,
            selector: Selector::new(),
            chain: SelectorChain::new(),
            pending: Vec::new(),
            properties: PropertyList::new(),
            property: None,
            styles: Vec::new(),
        }
    }

    /// Finished styles, sorted by specificity
    pub fn into_stylesheet(self) -> Stylesheet<V> {
        Stylesheet::from_styles(self.styles)
    }
}

impl<V, N, P> ParseListener for StyleBuilder<V, N, P>
where
    N: FnMut(&str) -> Option<PropertyId>,
    P: FnMut(PropertyId, String) -> Option<V>,
{
    fn on_selector_tag(&mut self, tag: String) {
        self.selector.tag = tag;
    }

    fn on_selector_id(&mut self, id: String) {
        self.selector.id = id;
    }

    fn on_selector_class(&mut self, class: String) {
        self.selector.classes.push(class);
    }

    fn on_combinator(&mut self, combinator: Combinator) {
        debug_assert!(self.selector.is_empty());
        if let Some(last) = self.chain.last_mut() {
            last.combinator = combinator;
        }
    }

    fn on_selector_end(&mut self) {
        self.chain.push(std::mem::take(&mut self.selector));
    }

    fn on_selector_chain_end(&mut self) {
        debug_assert!(self.selector.is_empty());
        self.pending.push(std::mem::take(&mut self.chain));
    }

    fn on_property_name(&mut self, name: String) {
        self.property = (self.name_to_id)(&name);
        if self.property.is_none() {
            tracing::trace!("Dropping unknown property '{}'", name);
        }
    }

    fn on_property_value(&mut self, value: String) {
        let Some(id) = self.property.take() else {
            return;
        };
        match (self.parse_value)(id, value) {
            Some(parsed) => {
                self.properties.insert(id, parsed);
            }
            None => tracing::trace!("Dropping unparsable value for property {:?}", id),
        }
    }

    fn on_style_properties_end(&mut self) {
        let properties = Arc::new(std::mem::take(&mut self.properties));
        for selectors in self.pending.drain(..) {
            self.styles.push(Style::new(selectors, Arc::clone(&properties)));
        }
    }
}
