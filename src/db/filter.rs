//! Listing filters: structured filters, sort modes, predicate construction
//! and the free-text search grammar.
//!
//! Predicates are built as clause lists per group and joined explicitly.
//! Filter values only ever travel as bound parameters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Restriction applied to an item listing.
///
/// Every tag in `tags` must be attached to an item; when `filenames` is not
/// empty, the item path must match at least one of its `LIKE` patterns
/// (`%` and `_` wildcards).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub filenames: Vec<String>,
    /// Patterns use `\` to escape `%`, `_` and `\`. Off for plain `LIKE`
    /// patterns, where a backslash is an ordinary path character.
    #[serde(default)]
    pub escaped: bool,
}

impl Filter {
    pub fn with_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            filenames: Vec::new(),
            escaped: false,
        }
    }

    pub fn with_filenames<I, S>(filenames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: Vec::new(),
            filenames: filenames.into_iter().map(Into::into).collect(),
            escaped: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.filenames.is_empty()
    }

    /// Build the `WHERE` fragment for this filter, or `None` if it restricts
    /// nothing. Items are aliased `m` in the listing query.
    pub fn predicate(&self) -> Option<Predicate> {
        let mut params = Vec::new();
        let mut groups = Vec::new();

        if !self.tags.is_empty() {
            let clauses: Vec<&str> = self
                .tags
                .iter()
                .map(|tag| {
                    params.push(tag.clone());
                    TAG_CLAUSE
                })
                .collect();
            groups.push(clauses.join(" AND "));
        }

        if !self.filenames.is_empty() {
            let clause = if self.escaped {
                ESCAPED_FILENAME_CLAUSE
            } else {
                FILENAME_CLAUSE
            };
            let clauses: Vec<&str> = self
                .filenames
                .iter()
                .map(|pattern| {
                    params.push(pattern.clone());
                    clause
                })
                .collect();
            groups.push(format!("({})", clauses.join(" OR ")));
        }

        if groups.is_empty() {
            return None;
        }

        Some(Predicate {
            sql: groups.join(" AND "),
            params,
        })
    }
}

const TAG_CLAUSE: &str = "EXISTS (SELECT 1 FROM ItemTags ft JOIN Tags t ON t.Id = ft.TagId \
                          WHERE ft.Item = m.Path AND t.Name = ?)";

const FILENAME_CLAUSE: &str = "m.Path LIKE ?";

const ESCAPED_FILENAME_CLAUSE: &str = r"m.Path LIKE ? ESCAPE '\'";

/// SQL fragment plus its positional parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub sql: String,
    pub params: Vec<String>,
}

/// Field an item listing is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Modification time recorded when the item was added
    #[default]
    Modified,
    /// Path, alphabetical
    Filename,
    /// Size recorded when the item was added
    Size,
}

impl SortMode {
    pub(crate) fn column(&self) -> &'static str {
        match self {
            SortMode::Modified => "m.Modified",
            SortMode::Filename => "m.Path",
            SortMode::Size => "m.Size",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Modified => "modified",
            SortMode::Filename => "filename",
            SortMode::Size => "size",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "modified" => Ok(SortMode::Modified),
            "filename" | "path" | "name" => Ok(SortMode::Filename),
            "size" => Ok(SortMode::Size),
            other => Err(format!("unknown sort field: {}", other)),
        }
    }
}

/// Parse a free-text search into a [`Filter`].
///
/// Words are split on whitespace; double quotes group words. A word starting
/// with `#` requires that tag. Any other word matches as a substring of the
/// path, where `*` matches any run of characters and `?` any single one.
/// An unterminated quote runs to the end of the input.
pub fn filter_from_str(query: &str) -> Filter {
    let mut filter = Filter {
        escaped: true,
        ..Filter::default()
    };

    for token in tokenize(query) {
        if let Some(tag) = token.strip_prefix('#') {
            if !tag.is_empty() && !filter.tags.iter().any(|t| t == tag) {
                filter.tags.push(tag.to_string());
            }
        } else {
            filter.filenames.push(substring_pattern(&token));
        }
    }

    filter
}

fn tokenize(query: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in query.chars() {
        match c {
            '"' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

fn substring_pattern(token: &str) -> String {
    let mut pattern = String::with_capacity(token.len() + 2);
    pattern.push('%');
    for c in token.chars() {
        match c {
            '%' | '_' | '\\' => {
                pattern.push('\\');
                pattern.push(c);
            }
            '*' => pattern.push('%'),
            '?' => pattern.push('_'),
            c => pattern.push(c),
        }
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_has_no_predicate() {
        assert_eq!(Filter::default().predicate(), None);
    }

    #[test]
    fn test_tag_group_is_conjunctive() {
        let predicate = Filter::with_tags(["a", "b"]).predicate().unwrap();
        assert_eq!(predicate.sql, format!("{} AND {}", TAG_CLAUSE, TAG_CLAUSE));
        assert_eq!(predicate.params, vec!["a", "b"]);
    }

    #[test]
    fn test_filename_group_is_disjunctive() {
        let predicate = Filter::with_filenames(["%.mp4", "%.mkv"]).predicate().unwrap();
        assert_eq!(
            predicate.sql,
            format!("({} OR {})", FILENAME_CLAUSE, FILENAME_CLAUSE)
        );
        assert_eq!(predicate.params, vec!["%.mp4", "%.mkv"]);
    }

    #[test]
    fn test_groups_are_joined_with_and() {
        let filter = Filter {
            tags: vec!["cool".into()],
            filenames: vec!["%a%".into(), "%b%".into()],
            escaped: false,
        };
        let predicate = filter.predicate().unwrap();
        assert_eq!(
            predicate.sql,
            format!("{} AND ({} OR {})", TAG_CLAUSE, FILENAME_CLAUSE, FILENAME_CLAUSE)
        );
        assert_eq!(predicate.params, vec!["cool", "%a%", "%b%"]);
        assert_eq!(predicate.sql.matches('?').count(), predicate.params.len());
    }

    #[test]
    fn test_values_never_reach_sql_text() {
        let filter = Filter {
            tags: vec!["x' OR '1'='1".into()],
            filenames: vec!["'; DROP TABLE Tags; --".into()],
            escaped: true,
        };
        let predicate = filter.predicate().unwrap();
        assert!(!predicate.sql.contains("DROP"));
        assert!(!predicate.sql.contains("'1'='1"));
    }

    #[test]
    fn test_filter_from_str_grammar() {
        let filter = filter_from_str("  #cool holiday  #new #cool ");
        assert_eq!(filter.tags, vec!["cool", "new"]);
        assert_eq!(filter.filenames, vec!["%holiday%"]);
        assert!(filter.escaped);
    }

    #[test]
    fn test_plain_patterns_have_no_escape_character() {
        let plain = Filter::with_filenames([r"C:\Videos\%"]).predicate().unwrap();
        assert_eq!(plain.sql, format!("({})", FILENAME_CLAUSE));
        assert!(!plain.sql.contains("ESCAPE"));

        let typed = filter_from_str("clip").predicate().unwrap();
        assert_eq!(typed.sql, format!("({})", ESCAPED_FILENAME_CLAUSE));
    }

    #[test]
    fn test_filter_from_str_unterminated_quote() {
        let filter = filter_from_str(r#"#a "open  ended #words"#);
        assert_eq!(filter.tags, vec!["a"]);
        assert_eq!(filter.filenames, vec!["%open  ended #words%"]);
    }

    #[test]
    fn test_filter_from_str_quotes_and_wildcards() {
        let filter = filter_from_str(r##""#two words" "summer trip" *.mp4 clip_?"##);
        assert_eq!(filter.tags, vec!["two words"]);
        assert_eq!(
            filter.filenames,
            vec!["%summer trip%", "%%.mp4%", r"%clip\__%"]
        );
    }

    #[test]
    fn test_filter_from_str_escapes_like_metacharacters() {
        let filter = filter_from_str(r"100%\x");
        assert_eq!(filter.filenames, vec![r"%100\%\\x%"]);
    }

    #[test]
    fn test_filter_from_blank_string_is_empty() {
        assert!(filter_from_str("   ").is_empty());
        assert!(filter_from_str("#").is_empty());
    }

    #[test]
    fn test_sort_mode_parsing() {
        assert_eq!("Size".parse::<SortMode>().unwrap(), SortMode::Size);
        assert_eq!("path".parse::<SortMode>().unwrap(), SortMode::Filename);
        assert!("colour".parse::<SortMode>().is_err());
        assert_eq!(SortMode::default(), SortMode::Modified);
    }
}
