use std::collections::HashMap;

/// Typed search operators. Queries mix long forms (`author:`) and
/// shorthand prefixes (`@:`), normalized here to the long form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchOperator {
    Message,
    Author,
    Commit,
    File,
    Change,
}

impl SearchOperator {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "message" | "=" => Some(Self::Message),
            "author" | "@" => Some(Self::Author),
            "commit" | "#" => Some(Self::Commit),
            "file" | "?" => Some(Self::File),
            "change" | "~" => Some(Self::Change),
            _ => None,
        }
    }
}

/// A free-text search request.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub query: String,
    /// AND message patterns together instead of OR.
    pub match_all: bool,
    pub match_case: bool,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

/// Decompose a query string into operator → values. Values accumulate
/// per operator; bare terms classify as `message:`. Quoted values may
/// contain spaces.
pub fn parse_search_operations(query: &str) -> HashMap<SearchOperator, Vec<String>> {
    let mut operations: HashMap<SearchOperator, Vec<String>> = HashMap::new();
    let mut rest = query.trim();

    while !rest.is_empty() {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        let (operator, value_text) = match rest.split_once(':') {
            Some((prefix, after))
                if !prefix.contains(char::is_whitespace) && SearchOperator::from_token(prefix).is_some() =>
            {
                (SearchOperator::from_token(prefix).unwrap(), after)
            }
            _ => (SearchOperator::Message, rest),
        };

        let (value, remainder) = take_value(value_text);
        if !value.is_empty() {
            operations.entry(operator).or_default().push(value);
        }
        rest = remainder;
    }

    operations
}

/// Take one value off the front: a quoted run (quotes stripped) or a
/// whitespace-delimited word.
fn take_value(text: &str) -> (String, &str) {
    let text = text.trim_start();
    if let Some(inner) = text.strip_prefix('"') {
        match inner.find('"') {
            Some(end) => return (inner[..end].to_string(), &inner[end + 1..]),
            None => return (inner.to_string(), ""),
        }
    }
    match text.find(char::is_whitespace) {
        Some(end) => (text[..end].to_string(), &text[end..]),
        None => (text.to_string(), ""),
    }
}
