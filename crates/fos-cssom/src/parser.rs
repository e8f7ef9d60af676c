//! Incremental CSS Parser
//!
//! A resumable byte-driven state machine. Text is pushed in arbitrary chunks
//! with [`CssParser::feed`]; structural events are reported to a
//! [`ParseListener`] as soon as they are recognized. A token may span any
//! number of chunks.

use crate::selector::Combinator;
use crate::{CssError, Result};

/// Receiver of parser events
pub trait ParseListener {
    fn on_selector_tag(&mut self, tag: String);
    fn on_selector_id(&mut self, id: String);
    fn on_selector_class(&mut self, class: String);

    /// Relation between the last finished selector and the next one
    fn on_combinator(&mut self, combinator: Combinator);

    /// The simple selector being built is complete
    fn on_selector_end(&mut self);

    /// A selector chain is complete (before `{` or `,`)
    fn on_selector_chain_end(&mut self);

    fn on_property_name(&mut self, name: String);
    fn on_property_value(&mut self, value: String);

    /// The declaration block was closed with `}`
    fn on_style_properties_end(&mut self);
}

/// Parser events as plain data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent {
    SelectorTag(String),
    SelectorId(String),
    SelectorClass(String),
    Combinator(Combinator),
    SelectorEnd,
    SelectorChainEnd,
    PropertyName(String),
    PropertyValue(String),
    StylePropertiesEnd,
}

/// Records every event in order
impl ParseListener for Vec<ParseEvent> {
    fn on_selector_tag(&mut self, tag: String) {
        self.push(ParseEvent::SelectorTag(tag));
    }

    fn on_selector_id(&mut self, id: String) {
        self.push(ParseEvent::SelectorId(id));
    }

    fn on_selector_class(&mut self, class: String) {
        self.push(ParseEvent::SelectorClass(class));
    }

    fn on_combinator(&mut self, combinator: Combinator) {
        self.push(ParseEvent::Combinator(combinator));
    }

    fn on_selector_end(&mut self) {
        self.push(ParseEvent::SelectorEnd);
    }

    fn on_selector_chain_end(&mut self) {
        self.push(ParseEvent::SelectorChainEnd);
    }

    fn on_property_name(&mut self, name: String) {
        self.push(ParseEvent::PropertyName(name));
    }

    fn on_property_value(&mut self, value: String) {
        self.push(ParseEvent::PropertyValue(value));
    }

    fn on_style_properties_end(&mut self) {
        self.push(ParseEvent::StylePropertiesEnd);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum State {
    /// Between rules or after a combinator, expecting a simple selector
    #[default]
    Idle,
    SelectorTag,
    SelectorId,
    SelectorClass,
    /// After a simple selector: combinator, next selector or block start
    Combinator,
    /// Inside a declaration block, before a property name
    StyleIdle,
    PropertyName,
    /// Expecting `:`
    PropertyValueDelimiter,
    PropertyValue,
    /// Expecting `;` or `}`
    PropertyValueTerminator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Tag,
    Id,
    Class,
}

/// Resumable CSS parser
#[derive(Debug)]
pub struct CssParser {
    state: State,
    buf: Vec<u8>,
    line: u32,
    /// A selector was started and its block has not closed yet
    open_rule: bool,
}

impl CssParser {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            buf: Vec::new(),
            line: 1,
            open_rule: false,
        }
    }

    /// Current line (1-based)
    pub fn line(&self) -> u32 {
        self.line
    }

    /// True when the input so far ends on a rule boundary
    pub fn is_idle(&self) -> bool {
        self.state == State::Idle && !self.open_rule
    }

    /// Feed the next chunk of UTF-8 text
    pub fn feed<L: ParseListener + ?Sized>(
        &mut self,
        chunk: impl AsRef<[u8]>,
        listener: &mut L,
    ) -> Result<()> {
        let chunk = chunk.as_ref();
        tracing::trace!("Feeding {} bytes at line {}", chunk.len(), self.line);

        for &byte in chunk {
            if byte == b'\n' {
                self.line += 1;
            }
            self.step(byte, listener)?;
        }
        Ok(())
    }

    /// Signal end of input. Fails if a rule is left unterminated.
    pub fn finish(&mut self) -> Result<()> {
        match self.state {
            _ if self.is_idle() => Ok(()),
            State::StyleIdle
            | State::PropertyName
            | State::PropertyValueDelimiter
            | State::PropertyValue
            | State::PropertyValueTerminator => {
                Err(self.malformed("unexpected end of input inside a declaration block"))
            }
            _ => Err(self.malformed("unexpected end of input inside a selector")),
        }
    }

    fn step<L: ParseListener + ?Sized>(&mut self, byte: u8, listener: &mut L) -> Result<()> {
        match self.state {
            State::Idle => self.parse_idle(byte),
            State::SelectorTag => self.parse_selector(Token::Tag, byte, listener),
            State::SelectorId => self.parse_selector(Token::Id, byte, listener),
            State::SelectorClass => self.parse_selector(Token::Class, byte, listener),
            State::Combinator => self.parse_combinator(byte, listener),
            State::StyleIdle => self.parse_style_idle(byte, listener),
            State::PropertyName => self.parse_property_name(byte, listener),
            State::PropertyValueDelimiter => self.parse_property_value_delimiter(byte),
            State::PropertyValue => self.parse_property_value(byte, listener),
            State::PropertyValueTerminator => self.parse_property_value_terminator(byte, listener),
        }
    }

    fn parse_idle(&mut self, byte: u8) -> Result<()> {
        debug_assert!(self.buf.is_empty());
        match byte {
            b if is_space(b) => {}
            b'.' => {
                self.open_rule = true;
                self.state = State::SelectorClass;
            }
            b'#' => {
                self.open_rule = true;
                self.state = State::SelectorId;
            }
            b'[' | b':' => return Err(self.unsupported(byte)),
            b'>' | b'+' | b'~' => {
                return Err(self.malformed(format!(
                    "unexpected combinator {}, expected a selector",
                    describe(byte)
                )));
            }
            b'{' | b'}' | b',' | b';' => {
                return Err(self.malformed(format!(
                    "unexpected {}, expected a selector",
                    describe(byte)
                )));
            }
            _ => {
                self.open_rule = true;
                self.buf.push(byte);
                self.state = State::SelectorTag;
            }
        }
        Ok(())
    }

    fn parse_selector<L: ParseListener + ?Sized>(
        &mut self,
        token: Token,
        byte: u8,
        listener: &mut L,
    ) -> Result<()> {
        match byte {
            b if is_space(b) => {
                self.notify_selector(token, listener)?;
                listener.on_selector_end();
                self.state = State::Combinator;
            }
            b'{' => {
                self.notify_selector(token, listener)?;
                listener.on_selector_end();
                listener.on_selector_chain_end();
                self.state = State::StyleIdle;
            }
            b',' => {
                self.notify_selector(token, listener)?;
                listener.on_selector_end();
                listener.on_selector_chain_end();
                self.state = State::Idle;
            }
            b'>' | b'+' | b'~' => {
                self.notify_selector(token, listener)?;
                listener.on_selector_end();
                self.buf.push(byte);
                self.state = State::Combinator;
            }
            b'.' => {
                self.notify_selector(token, listener)?;
                self.state = State::SelectorClass;
            }
            b'#' => {
                if token == Token::Id {
                    return Err(self.malformed("unexpected '#' inside an id selector"));
                }
                self.notify_selector(token, listener)?;
                self.state = State::SelectorId;
            }
            b'[' | b':' => return Err(self.unsupported(byte)),
            b'}' | b';' => {
                return Err(self.malformed(format!("unexpected {} in selector", describe(byte))));
            }
            _ => self.buf.push(byte),
        }
        Ok(())
    }

    fn end_block<L: ParseListener + ?Sized>(&mut self, listener: &mut L) {
        listener.on_style_properties_end();
        self.open_rule = false;
        self.state = State::Idle;
    }

    fn notify_selector<L: ParseListener + ?Sized>(
        &mut self,
        token: Token,
        listener: &mut L,
    ) -> Result<()> {
        let text = self.take_token()?;
        match token {
            Token::Tag => listener.on_selector_tag(text),
            Token::Id if text.is_empty() => return Err(self.malformed("empty id selector")),
            Token::Id => listener.on_selector_id(text),
            Token::Class if text.is_empty() => return Err(self.malformed("empty class selector")),
            Token::Class => listener.on_selector_class(text),
        }
        Ok(())
    }

    fn parse_combinator<L: ParseListener + ?Sized>(
        &mut self,
        byte: u8,
        listener: &mut L,
    ) -> Result<()> {
        match byte {
            b if is_space(b) => {
                if !self.buf.is_empty() {
                    self.notify_combinator(listener)?;
                    self.state = State::Idle;
                }
            }
            b'>' | b'+' | b'~' => {
                if !self.buf.is_empty() {
                    self.buf.push(byte);
                    return Err(self.malformed(format!(
                        "unknown combinator '{}'",
                        String::from_utf8_lossy(&self.buf)
                    )));
                }
                self.buf.push(byte);
            }
            b'{' | b',' => {
                if !self.buf.is_empty() {
                    return Err(self.malformed(format!(
                        "unexpected combinator '{}' before {}",
                        String::from_utf8_lossy(&self.buf),
                        describe(byte)
                    )));
                }
                listener.on_selector_chain_end();
                self.state = if byte == b'{' { State::StyleIdle } else { State::Idle };
            }
            b'[' | b':' => return Err(self.unsupported(byte)),
            b'}' | b';' => {
                return Err(self.malformed(format!("unexpected {} in selector", describe(byte))));
            }
            b'.' => {
                self.notify_combinator(listener)?;
                self.state = State::SelectorClass;
            }
            b'#' => {
                self.notify_combinator(listener)?;
                self.state = State::SelectorId;
            }
            _ => {
                self.notify_combinator(listener)?;
                self.buf.push(byte);
                self.state = State::SelectorTag;
            }
        }
        Ok(())
    }

    fn notify_combinator<L: ParseListener + ?Sized>(&mut self, listener: &mut L) -> Result<()> {
        let text = self.take_token()?;
        let combinator = Combinator::from_token(&text)
            .ok_or_else(|| self.malformed(format!("unknown combinator '{}'", text)))?;
        listener.on_combinator(combinator);
        Ok(())
    }

    fn parse_style_idle<L: ParseListener + ?Sized>(
        &mut self,
        byte: u8,
        listener: &mut L,
    ) -> Result<()> {
        debug_assert!(self.buf.is_empty());
        match byte {
            b if is_space(b) => {}
            // empty declaration
            b';' => {}
            b'}' => {
                self.end_block(listener);
            }
            b'{' | b':' => {
                return Err(self.malformed(format!(
                    "unexpected {}, expected a property name",
                    describe(byte)
                )));
            }
            _ => {
                self.buf.push(byte);
                self.state = State::PropertyName;
            }
        }
        Ok(())
    }

    fn parse_property_name<L: ParseListener + ?Sized>(
        &mut self,
        byte: u8,
        listener: &mut L,
    ) -> Result<()> {
        match byte {
            b if is_space(b) => {
                let name = self.take_token()?;
                listener.on_property_name(name);
                self.state = State::PropertyValueDelimiter;
            }
            b':' => {
                let name = self.take_token()?;
                listener.on_property_name(name);
                self.state = State::PropertyValue;
            }
            b'{' | b'}' | b';' => {
                return Err(self.malformed(format!(
                    "expected ':' after property name '{}', found {}",
                    String::from_utf8_lossy(&self.buf),
                    describe(byte)
                )));
            }
            _ => self.buf.push(byte),
        }
        Ok(())
    }

    fn parse_property_value_delimiter(&mut self, byte: u8) -> Result<()> {
        debug_assert!(self.buf.is_empty());
        match byte {
            b if is_space(b) => {}
            b':' => self.state = State::PropertyValue,
            _ => {
                return Err(self.malformed(format!(
                    "unexpected {} after property name",
                    describe(byte)
                )));
            }
        }
        Ok(())
    }

    fn parse_property_value<L: ParseListener + ?Sized>(
        &mut self,
        byte: u8,
        listener: &mut L,
    ) -> Result<()> {
        match byte {
            b if is_space(b) => {
                if !self.buf.is_empty() {
                    let value = self.take_token()?;
                    listener.on_property_value(value);
                    self.state = State::PropertyValueTerminator;
                }
            }
            b';' => {
                let value = self.take_token()?;
                listener.on_property_value(value);
                self.state = State::StyleIdle;
            }
            b'}' => {
                let value = self.take_token()?;
                listener.on_property_value(value);
                self.end_block(listener);
            }
            b'{' => {
                return Err(self.malformed("unexpected '{' in property value"));
            }
            _ => self.buf.push(byte),
        }
        Ok(())
    }

    fn parse_property_value_terminator<L: ParseListener + ?Sized>(
        &mut self,
        byte: u8,
        listener: &mut L,
    ) -> Result<()> {
        debug_assert!(self.buf.is_empty());
        match byte {
            b if is_space(b) => {}
            b';' => self.state = State::StyleIdle,
            b'}' => {
                self.end_block(listener);
            }
            _ => {
                return Err(self.malformed(format!(
                    "unexpected {} after property value",
                    describe(byte)
                )));
            }
        }
        Ok(())
    }

    fn take_token(&mut self) -> Result<String> {
        let bytes = std::mem::take(&mut self.buf);
        String::from_utf8(bytes).map_err(|_| self.malformed("invalid UTF-8 in token"))
    }

    fn malformed(&self, message: impl Into<String>) -> CssError {
        CssError::Malformed {
            line: self.line,
            message: message.into(),
        }
    }

    fn unsupported(&self, byte: u8) -> CssError {
        let feature = match byte {
            b'[' => "attribute selectors",
            _ => "pseudo-classes and pseudo-elements",
        };
        CssError::Unsupported {
            line: self.line,
            feature,
        }
    }
}

impl Default for CssParser {
    fn default() -> Self {
        Self::new()
    }
}

fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n')
}

fn describe(byte: u8) -> String {
    if byte.is_ascii_graphic() {
        format!("'{}'", byte as char)
    } else {
        format!("byte 0x{:02x}", byte)
    }
}
