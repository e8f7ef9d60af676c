//! Selector Matching
//!
//! Selector chains are matched right to left: the subject selector is
//! checked against the node under query, then each preceding selector is
//! resolved by walking the caller's tree through a [`Crawler`].

use crate::selector::{Combinator, Selector, SelectorChain};

/// The part of a document node selectors can see
pub trait Styleable {
    /// Tag name
    fn tag(&self) -> &str;

    /// Id attribute, if the node has one
    fn id(&self) -> Option<&str>;

    /// Class list
    fn classes(&self) -> &[String];

    /// True if the node carries the given class
    fn has_class(&self, class: &str) -> bool {
        self.classes().iter().any(|c| c == class)
    }
}

/// Cursor over a caller-owned document tree.
///
/// The crawler starts at the node under query. Matching only moves it up
/// or to the left; [`Crawler::reset`] returns it to the starting node.
pub trait Crawler {
    /// Node at the current position
    fn get(&self) -> &dyn Styleable;

    /// Move to the parent node. Returns false at the root.
    fn move_up(&mut self) -> bool;

    /// Move to the immediately preceding sibling. Returns false at the first child.
    fn move_left(&mut self) -> bool;

    /// Return to the node under query
    fn reset(&mut self);
}

impl Selector {
    /// Match this simple selector against a single node (combinator ignored)
    pub fn matches(&self, node: &dyn Styleable) -> bool {
        if !self.is_universal_tag() && self.tag != node.tag() {
            return false;
        }

        if !self.id.is_empty() && node.id() != Some(self.id.as_str()) {
            return false;
        }

        self.classes.iter().all(|class| node.has_class(class))
    }
}

/// Match a chain against the node the crawler is positioned at.
///
/// On a failed match the crawler is left wherever it last moved.
pub fn chain_matches<C: Crawler + ?Sized>(chain: &SelectorChain, crawler: &mut C) -> bool {
    let mut selectors = chain.iter().rev();

    let Some(subject) = selectors.next() else {
        return false;
    };
    if !subject.matches(crawler.get()) {
        return false;
    }

    selectors.all(|selector| match selector.combinator {
        Combinator::Descendant => find_ancestor(crawler, selector),
        Combinator::Child => crawler.move_up() && selector.matches(crawler.get()),
        Combinator::NextSibling => crawler.move_left() && selector.matches(crawler.get()),
        Combinator::SubsequentSibling => find_preceding_sibling(crawler, selector),
        // No relation given: constrain the node reached so far
        Combinator::None => selector.matches(crawler.get()),
    })
}

fn find_ancestor<C: Crawler + ?Sized>(crawler: &mut C, selector: &Selector) -> bool {
    while crawler.move_up() {
        if selector.matches(crawler.get()) {
            return true;
        }
    }
    false
}

fn find_preceding_sibling<C: Crawler + ?Sized>(crawler: &mut C, selector: &Selector) -> bool {
    while crawler.move_left() {
        if selector.matches(crawler.get()) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Node {
        tag: String,
        id: Option<String>,
        classes: Vec<String>,
    }

    impl Node {
        fn new(tag: &str, classes: &[&str]) -> Self {
            Self {
                tag: tag.to_string(),
                id: None,
                classes: classes.iter().map(|c| c.to_string()).collect(),
            }
        }

        fn with_id(mut self, id: &str) -> Self {
            self.id = Some(id.to_string());
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

    /// Each level is a row of siblings; the node under query is the last
    /// node of the last level, and every level's last node is the parent
    /// of the next level.
    struct LevelCrawler {
        levels: Vec<Vec<Node>>,
        depth: usize,
        index: usize,
        moves: usize,
    }

    impl LevelCrawler {
        fn new(levels: Vec<Vec<Node>>) -> Self {
            let mut crawler = Self { levels, depth: 0, index: 0, moves: 0 };
            crawler.reset();
            crawler
        }
    }

    impl Crawler for LevelCrawler {
        fn get(&self) -> &dyn Styleable {
            &self.levels[self.depth][self.index]
        }

        fn move_up(&mut self) -> bool {
            if self.depth == 0 {
                return false;
            }
            self.depth -= 1;
            self.index = self.levels[self.depth].len() - 1;
            self.moves += 1;
            true
        }

        fn move_left(&mut self) -> bool {
            if self.index == 0 {
                return false;
            }
            self.index -= 1;
            self.moves += 1;
            true
        }

        fn reset(&mut self) {
            self.depth = self.levels.len() - 1;
            self.index = self.levels[self.depth].len() - 1;
        }
    }

    fn chain(selectors: Vec<Selector>) -> SelectorChain {
        SelectorChain::from(selectors)
    }

    #[test]
    fn test_simple_selector_matching() {
        let node = Node::new("circle", &["myGreen", "big"]).with_id("c1");

        assert!(Selector::new().matches(&node));
        assert!(Selector::tag("*").matches(&node));
        assert!(Selector::tag("circle").matches(&node));
        assert!(!Selector::tag("rect").matches(&node));
        assert!(Selector::new().with_id("c1").matches(&node));
        assert!(!Selector::new().with_id("c2").matches(&node));
        assert!(Selector::new().with_class("big").with_class("myGreen").matches(&node));
        assert!(!Selector::new().with_class("myGreen").with_class("red").matches(&node));
    }

    #[test]
    fn test_id_required_when_node_has_none() {
        let node = Node::new("rect", &[]);
        assert!(!Selector::tag("rect").with_id("r").matches(&node));
    }

    #[test]
    fn test_descendant_vs_child() {
        // body > g > circle.myGreen
        let levels = || {
            vec![
                vec![Node::new("body", &[])],
                vec![Node::new("g", &[])],
                vec![Node::new("circle", &["myGreen"])],
            ]
        };
        let descendant = chain(vec![
            Selector::tag("body").with_combinator(Combinator::Descendant),
            Selector::tag("circle").with_class("myGreen"),
        ]);
        let child = chain(vec![
            Selector::tag("body").with_combinator(Combinator::Child),
            Selector::tag("circle").with_class("myGreen"),
        ]);

        assert!(chain_matches(&descendant, &mut LevelCrawler::new(levels())));
        assert!(!chain_matches(&child, &mut LevelCrawler::new(levels())));
    }

    #[test]
    fn test_descendant_exhausted() {
        let mut crawler = LevelCrawler::new(vec![vec![Node::new("g", &[])], vec![Node::new("rect", &[])]]);
        let c = chain(vec![
            Selector::tag("svg").with_combinator(Combinator::Descendant),
            Selector::tag("rect"),
        ]);
        assert!(!chain_matches(&c, &mut crawler));
    }

    #[test]
    fn test_sibling_combinators() {
        let levels = || {
            vec![vec![
                Node::new("title", &[]),
                Node::new("desc", &[]),
                Node::new("rect", &[]),
            ]]
        };
        let next = |tag: &str| {
            chain(vec![
                Selector::tag(tag).with_combinator(Combinator::NextSibling),
                Selector::tag("rect"),
            ])
        };
        let subsequent = |tag: &str| {
            chain(vec![
                Selector::tag(tag).with_combinator(Combinator::SubsequentSibling),
                Selector::tag("rect"),
            ])
        };

        assert!(chain_matches(&next("desc"), &mut LevelCrawler::new(levels())));
        assert!(!chain_matches(&next("title"), &mut LevelCrawler::new(levels())));
        assert!(chain_matches(&subsequent("title"), &mut LevelCrawler::new(levels())));
        assert!(!chain_matches(&subsequent("rect"), &mut LevelCrawler::new(levels())));
    }

    #[test]
    fn test_chain_walks_from_matched_position() {
        // svg > (a, g > rect): "a ~ g > rect" needs the sibling walk to
        // start from the g matched by the child step.
        let levels = vec![
            vec![Node::new("svg", &[])],
            vec![Node::new("a", &[]), Node::new("g", &[])],
            vec![Node::new("rect", &[])],
        ];
        let c = chain(vec![
            Selector::tag("a").with_combinator(Combinator::SubsequentSibling),
            Selector::tag("g").with_combinator(Combinator::Child),
            Selector::tag("rect"),
        ]);
        assert!(chain_matches(&c, &mut LevelCrawler::new(levels)));
    }

    #[test]
    fn test_subject_mismatch_does_not_move() {
        let mut crawler = LevelCrawler::new(vec![vec![Node::new("g", &[])], vec![Node::new("rect", &[])]]);
        let c = chain(vec![
            Selector::tag("g").with_combinator(Combinator::Descendant),
            Selector::tag("circle"),
        ]);
        assert!(!chain_matches(&c, &mut crawler));
        assert_eq!(crawler.moves, 0);
    }

    #[test]
    fn test_missing_combinator_constrains_same_node() {
        let levels = || vec![vec![Node::new("g", &[])], vec![Node::new("rect", &["a"])]];
        let same = chain(vec![Selector::new().with_class("a"), Selector::tag("rect")]);
        let other = chain(vec![Selector::new().with_class("b"), Selector::tag("rect")]);
        assert!(chain_matches(&same, &mut LevelCrawler::new(levels())));
        assert!(!chain_matches(&other, &mut LevelCrawler::new(levels())));
    }

    #[test]
    fn test_empty_chain_never_matches() {
        let mut crawler = LevelCrawler::new(vec![vec![Node::new("g", &[])]]);
        assert!(!chain_matches(&SelectorChain::new(), &mut crawler));
    }
}
