// Tag vocabulary - canonical attribute and tag names
//
// Explicit static mapping tables from enum variants to the strings the
// driver sees. The compiler keeps the tables total; adding a variant without
// its string is a build error.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Commonly queried element attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagAttribute {
    Id,
    Name,
    Class,
    Value,
    OnClick,
    Src,
    Title,
    Href,
    Type,
    Style,
    Rel,
}

impl TagAttribute {
    /// Canonical attribute name as it appears in markup.
    pub const fn as_str(self) -> &'static str {
        match self {
            TagAttribute::Id => "id",
            TagAttribute::Name => "name",
            TagAttribute::Class => "class",
            TagAttribute::Value => "value",
            TagAttribute::OnClick => "onclick",
            TagAttribute::Src => "src",
            TagAttribute::Title => "title",
            TagAttribute::Href => "href",
            TagAttribute::Type => "type",
            TagAttribute::Style => "style",
            TagAttribute::Rel => "rel",
        }
    }
}

impl fmt::Display for TagAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag names with dedicated handling somewhere in the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagName {
    TextArea,
    Input,
    Link,
    Span,
    InlineFrame,
    Div,
    Image,
}

impl TagName {
    /// Canonical tag name as it appears in markup.
    pub const fn as_str(self) -> &'static str {
        match self {
            TagName::TextArea => "textarea",
            TagName::Input => "input",
            TagName::Link => "a",
            TagName::Span => "span",
            TagName::InlineFrame => "iframe",
            TagName::Div => "div",
            TagName::Image => "img",
        }
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Synthetic events dispatched through the script collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsEvent {
    KeyUp,
    Click,
}

impl JsEvent {
    /// Event name as the page-side dispatch helper expects it.
    pub const fn as_str(self) -> &'static str {
        match self {
            JsEvent::KeyUp => "keyup",
            JsEvent::Click => "click",
        }
    }
}

impl fmt::Display for JsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
