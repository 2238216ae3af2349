// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::escape::escape;
use indexmap::IndexSet;
use std::{borrow::Cow, fmt};

static LINE_BREAK: &str = "\n";
static DEFAULT_XML_DECLARATION: &str = r#"version="1.0" encoding="UTF-8""#;

/// Settings for an [`XmlWriter`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct XmlWriterSettings {
    /// The contents of the `<?xml ...?>` declaration written at the start of every document.
    pub xml_declaration: String,

    /// Names of elements that get a line break after their opening tag and around their closing
    /// tag.
    pub line_break_at: IndexSet<String>,
}

impl XmlWriterSettings {
    /// Creates settings with the default declaration and no line breaks.
    pub fn new() -> Self {
        Self {
            xml_declaration: DEFAULT_XML_DECLARATION.to_owned(),
            line_break_at: IndexSet::new(),
        }
    }

    /// Sets the XML declaration.
    pub fn set_xml_declaration(&mut self, xml_declaration: impl Into<String>) -> &mut Self {
        self.xml_declaration = xml_declaration.into();
        self
    }

    /// Adds element names that should receive automatic line breaks.
    pub fn add_line_breaks_at(
        &mut self,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> &mut Self {
        self.line_break_at.extend(names.into_iter().map(Into::into));
        self
    }
}

impl Default for XmlWriterSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// The value of an attribute passed to [`XmlWriter::start`] or [`XmlWriter::empty`].
///
/// Attributes whose value is absent are omitted from the output entirely.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AttrValue<'a>(Option<Cow<'a, str>>);

impl<'a> AttrValue<'a> {
    /// An absent value.
    pub const ABSENT: Self = Self(None);

    /// Creates a value from anything displayable.
    pub fn display(value: impl fmt::Display) -> Self {
        Self(Some(Cow::Owned(value.to_string())))
    }

    /// Returns the value, if present.
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<'a> From<&'a str> for AttrValue<'a> {
    fn from(value: &'a str) -> Self {
        Self(Some(Cow::Borrowed(value)))
    }
}

impl From<String> for AttrValue<'_> {
    fn from(value: String) -> Self {
        Self(Some(Cow::Owned(value)))
    }
}

impl<'a> From<Cow<'a, str>> for AttrValue<'a> {
    fn from(value: Cow<'a, str>) -> Self {
        Self(Some(value))
    }
}

macro_rules! attr_value_from_display {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for AttrValue<'_> {
                fn from(value: $ty) -> Self {
                    Self::display(value)
                }
            }
        )*
    };
}

attr_value_from_display!(u32, u64, usize, i32, i64, f64, bool);

impl<'a, T> From<Option<T>> for AttrValue<'a>
where
    T: Into<AttrValue<'a>>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::ABSENT, Into::into)
    }
}

/// A low-level streaming XML builder.
///
/// The writer holds an append-only list of text fragments and a stack of open element names. The
/// XML declaration is written as soon as the writer is created.
///
/// # Examples
///
/// ```
/// use junit_xml_writer::{AttrValue, XmlWriter, XmlWriterSettings};
///
/// let mut settings = XmlWriterSettings::new();
/// settings.add_line_breaks_at(["testsuites"]);
///
/// let mut writer = XmlWriter::new(settings);
/// writer.start("testsuites", [("tests", AttrValue::from(1_u64))]);
/// writer.empty("testsuite", [("name", AttrValue::from("a&b"))]);
///
/// // The still-open `testsuites` element is closed automatically.
/// assert_eq!(
///     writer.get_string(),
///     "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
///      <testsuites tests=\"1\">\n\
///      <testsuite name=\"a&amp;b\" />\n\
///      </testsuites>",
/// );
/// ```
#[derive(Clone, Debug)]
pub struct XmlWriter {
    line_break_at: IndexSet<String>,
    fragments: Vec<String>,
    stack: Vec<String>,
}

impl XmlWriter {
    /// Creates a new writer and writes the XML declaration.
    pub fn new(settings: XmlWriterSettings) -> Self {
        let XmlWriterSettings {
            xml_declaration,
            line_break_at,
        } = settings;

        let mut writer = Self {
            line_break_at,
            fragments: vec![],
            stack: vec![],
        };
        writer.processing_instruction("xml", Some(&xml_declaration));
        writer
    }

    /// Opens a container element. It stays open until a matching [`end`](Self::end), or until
    /// [`get_string`](Self::get_string) closes it.
    pub fn start<'a>(
        &mut self,
        name: &str,
        attrs: impl IntoIterator<Item = (&'a str, AttrValue<'a>)>,
    ) {
        self.stack.push(name.to_owned());
        self.write_tag(name, attrs, ">");
    }

    /// Writes a self-closing element. The stack is left untouched.
    pub fn empty<'a>(
        &mut self,
        name: &str,
        attrs: impl IntoIterator<Item = (&'a str, AttrValue<'a>)>,
    ) {
        self.write_tag(name, attrs, " />");
    }

    /// Closes the most recently opened element.
    ///
    /// Does nothing if no element is open.
    pub fn end(&mut self) {
        let Some(name) = self.stack.pop() else {
            return;
        };
        self.add_line_break(&name);
        self.fragments.push(format!("</{name}>"));
        self.add_line_break(&name);
    }

    /// Writes escaped text.
    pub fn text(&mut self, value: impl fmt::Display) {
        let value = value.to_string();
        self.fragments.push(escape(&value).into_owned());
    }

    /// Writes a CDATA section. The contents are not escaped, so they must not contain `]]>`.
    pub fn cdata(&mut self, value: &str) {
        self.fragments.push(format!("<![CDATA[{value}]]>"));
    }

    /// Writes a comment.
    pub fn comment(&mut self, value: &str) {
        self.fragments.push(format!("<!--{value}-->"));
    }

    /// Writes a processing instruction followed by a line break.
    pub fn processing_instruction(&mut self, target: &str, value: Option<&str>) {
        let fragment = match value {
            Some(value) if !value.is_empty() => format!("<?{target} {value}?>\n"),
            _ => format!("<?{target}?>\n"),
        };
        self.fragments.push(fragment);
    }

    /// Writes a document type declaration followed by a line break.
    pub fn doctype(&mut self, value: &str) {
        self.fragments.push(format!("<!DOCTYPE {value}>\n"));
    }

    /// Returns the number of elements that are currently open.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Closes any elements that are still open, then returns the document.
    ///
    /// A single trailing line break is removed. Calling this more than once returns the same
    /// string.
    pub fn get_string(&mut self) -> String {
        while !self.stack.is_empty() {
            self.end();
        }

        let mut out = self.fragments.concat();
        if out.ends_with(LINE_BREAK) {
            out.truncate(out.len() - LINE_BREAK.len());
        }
        out
    }

    /// Clears all written fragments and open elements.
    ///
    /// The XML declaration is not written again.
    pub fn reset(&mut self) {
        self.fragments.clear();
        self.stack.clear();
    }

    fn write_tag<'a>(
        &mut self,
        name: &str,
        attrs: impl IntoIterator<Item = (&'a str, AttrValue<'a>)>,
        close: &'static str,
    ) {
        self.fragments.push(format!("<{name}"));
        for (key, value) in attrs {
            if let Some(value) = value.as_str() {
                self.fragments
                    .push(format!(" {}=\"{}\"", escape(key), escape(value)));
            }
        }
        self.fragments.push(close.to_owned());
        self.add_line_break(name);
    }

    fn add_line_break(&mut self, name: &str) {
        let last_is_break = self
            .fragments
            .last()
            .is_some_and(|fragment| fragment == LINE_BREAK);
        if self.line_break_at.contains(name) && !last_is_break {
            self.fragments.push(LINE_BREAK.to_owned());
        }
    }
}
