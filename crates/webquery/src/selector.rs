// Selector - structured primary search criterion
//
// The first criterion added to a query becomes its primary selector, the one
// handed to the driver for the coarse document lookup. Keeping the variants
// structured (instead of pre-rendered path strings) lets drivers use native
// lookups where they have them and lets a fake driver match without parsing
// XPath; `to_xpath()` renders the canonical path expression for drivers that
// only take path strings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Primary search criterion executed against the live document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selector {
    /// Elements carrying the named attribute with a matching value
    Attribute {
        name: String,
        value: String,
        exact: bool,
    },
    /// Elements with the given tag name
    TagName(String),
    /// Elements whose text matches
    Text { text: String, exact: bool },
    /// A raw XPath expression supplied by the caller
    XPath(String),
}

impl Selector {
    /// Renders the selector as an XPath expression.
    pub fn to_xpath(&self) -> String {
        match self {
            Selector::Attribute {
                name,
                value,
                exact: true,
            } => format!("//*[@{name}=\"{value}\"]"),
            Selector::Attribute {
                name,
                value,
                exact: false,
            } => format!("//*[contains(@{name}, \"{value}\")]"),
            Selector::TagName(tag) => format!("//{tag}"),
            Selector::Text { text, exact: true } => format!("//*[text()=\"{text}\"]"),
            Selector::Text { text, exact: false } => {
                format!("//*[contains(text(), \"{text}\")]")
            }
            Selector::XPath(path) => path.clone(),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xpath())
    }
}
