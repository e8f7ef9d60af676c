//! CSS Serializer
//!
//! Writes a stylesheet back as text. Styles that share one property list are
//! written as a single selector group. Groups are ordered by their rendered
//! declarations and then by their selector text, so the output does not
//! depend on specificity order or on where the styles came from.

use std::collections::HashMap;
use std::fmt::{self, Write as _};
use std::io;
use std::sync::Arc;

use crate::stylesheet::{PropertyId, Style, Stylesheet};
use crate::Result;

/// Serializer settings
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Prefix for every output line
    pub indent: String,
}

impl WriteOptions {
    pub fn with_indent(indent: impl Into<String>) -> Self {
        Self { indent: indent.into() }
    }
}

struct Group<'a, V> {
    styles: Vec<&'a Style<V>>,
}

struct RenderedGroup {
    selectors: String,
    declarations: String,
}

impl<V> Stylesheet<V> {
    /// Render the sheet with default options
    pub fn to_css_string<N, S>(&self, id_to_name: N, value_to_string: S) -> String
    where
        N: FnMut(PropertyId) -> Option<String>,
        S: FnMut(PropertyId, &V) -> String,
    {
        self.to_css_string_with(&WriteOptions::default(), id_to_name, value_to_string)
    }

    /// Render the sheet.
    ///
    /// Properties whose name is unknown (`None` or empty) are left out.
    pub fn to_css_string_with<N, S>(
        &self,
        options: &WriteOptions,
        mut id_to_name: N,
        mut value_to_string: S,
    ) -> String
    where
        N: FnMut(PropertyId) -> Option<String>,
        S: FnMut(PropertyId, &V) -> String,
    {
        let indent = options.indent.as_str();

        let mut rendered: Vec<RenderedGroup> = self
            .groups()
            .into_iter()
            .map(|group| {
                let selectors = group
                    .styles
                    .iter()
                    .map(|style| style.selectors().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");

                let mut declarations = String::new();
                for (id, value) in group.styles[0].properties() {
                    let Some(name) = id_to_name(*id).filter(|n| !n.is_empty()) else {
                        continue;
                    };
                    let value = value_to_string(*id, value);
                    let _ = writeln!(declarations, "{indent}\t{name}: {value};");
                }

                RenderedGroup { selectors, declarations }
            })
            .collect();

        rendered.sort_by(|a, b| {
            a.declarations
                .cmp(&b.declarations)
                .then_with(|| a.selectors.cmp(&b.selectors))
        });

        let mut out = String::new();
        for group in &rendered {
            let _ = write!(
                out,
                "{indent}{} {{\n{}{indent}}}\n",
                group.selectors, group.declarations
            );
        }

        tracing::debug!("Serialized {} styles in {} groups", self.len(), rendered.len());
        out
    }

    /// Write the sheet to a formatter sink
    pub fn write_css<W, N, S>(
        &self,
        out: &mut W,
        options: &WriteOptions,
        id_to_name: N,
        value_to_string: S,
    ) -> Result<()>
    where
        W: fmt::Write + ?Sized,
        N: FnMut(PropertyId) -> Option<String>,
        S: FnMut(PropertyId, &V) -> String,
    {
        out.write_str(&self.to_css_string_with(options, id_to_name, value_to_string))?;
        Ok(())
    }

    /// Write the sheet to a byte sink
    pub fn write_to<W, N, S>(
        &self,
        mut out: W,
        options: &WriteOptions,
        id_to_name: N,
        value_to_string: S,
    ) -> Result<()>
    where
        W: io::Write,
        N: FnMut(PropertyId) -> Option<String>,
        S: FnMut(PropertyId, &V) -> String,
    {
        let text = self.to_css_string_with(options, id_to_name, value_to_string);
        out.write_all(text.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    /// Styles grouped by property list identity, members in construction order
    fn groups(&self) -> Vec<Group<'_, V>> {
        let mut index: HashMap<*const _, usize> = HashMap::new();
        let mut groups: Vec<Group<'_, V>> = Vec::new();

        for style in self.iter() {
            let key = Arc::as_ptr(style.shared_properties());
            match index.get(&key) {
                Some(&i) => groups[i].styles.push(style),
                None => {
                    index.insert(key, groups.len());
                    groups.push(Group { styles: vec![style] });
                }
            }
        }

        for group in &mut groups {
            group.styles.sort_by_key(|style| style.order());
        }
        groups
    }
}
