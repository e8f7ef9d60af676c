//! Shared test harness: a tiny document tree and a crawler over it.

#![allow(dead_code)]

use fos_cssom::{Crawler, PropertyId, Styleable, Stylesheet};

pub const FILL: PropertyId = PropertyId(0);
pub const STROKE: PropertyId = PropertyId(1);
pub const STROKE_WIDTH: PropertyId = PropertyId(2);
pub const FILL_RULE: PropertyId = PropertyId(3);
pub const BACKGROUND_COLOR: PropertyId = PropertyId(4);

const NAMES: [&str; 5] = ["fill", "stroke", "stroke-width", "fill-rule", "background-color"];

pub fn name_to_id(name: &str) -> Option<PropertyId> {
    NAMES.iter().position(|n| *n == name).map(|i| PropertyId(i as u32))
}

pub fn id_to_name(id: PropertyId) -> Option<String> {
    NAMES.get(id.0 as usize).map(|n| n.to_string())
}

/// Parse with raw string values
pub fn read_css(css: &str) -> Stylesheet<String> {
    Stylesheet::parse(css, name_to_id, |_, value| Some(value)).expect("valid CSS")
}

pub fn write_css(sheet: &Stylesheet<String>) -> String {
    sheet.to_css_string(id_to_name, |_, value| value.clone())
}

#[derive(Debug, Clone)]
pub struct Node {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            id: None,
            classes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }
}

impl Styleable for Node {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }
}

/// Crawler addressing a node by its child-index path from the root list
pub struct PathCrawler<'a> {
    roots: &'a [Node],
    target: Vec<usize>,
    path: Vec<usize>,
}

impl<'a> PathCrawler<'a> {
    pub fn new(roots: &'a [Node], target: &[usize]) -> Self {
        assert!(!target.is_empty(), "path must address a node");
        Self {
            roots,
            target: target.to_vec(),
            path: target.to_vec(),
        }
    }

    fn siblings(&self) -> &'a [Node] {
        let mut list = self.roots;
        for &i in &self.path[..self.path.len() - 1] {
            list = &list[i].children;
        }
        list
    }
}

impl Crawler for PathCrawler<'_> {
    fn get(&self) -> &dyn Styleable {
        let index = self.path[self.path.len() - 1];
        &self.siblings()[index]
    }

    fn move_up(&mut self) -> bool {
        if self.path.len() == 1 {
            return false;
        }
        self.path.pop();
        true
    }

    fn move_left(&mut self) -> bool {
        let last = self.path.len() - 1;
        if self.path[last] == 0 {
            return false;
        }
        self.path[last] -= 1;
        true
    }

    fn reset(&mut self) {
        self.path.clone_from(&self.target);
    }
}

/// Query one property and return the raw value
pub fn query(sheet: &Stylesheet<String>, roots: &[Node], target: &[usize], id: PropertyId) -> Option<String> {
    let mut crawler = PathCrawler::new(roots, target);
    sheet.query(&mut crawler, id).value.cloned()
}
