use std::collections::HashMap;

/// Street-name abbreviations used in the resale records and their expansions.
pub const STREET_ABBREVIATIONS: &[(&str, &str)] = &[
    ("AVE", "AVENUE"),
    ("BT", "BUKIT"),
    ("C'WEALTH", "COMMONWEALTH"),
    ("CL", "CLOSE"),
    ("CRES", "CRESCENT"),
    ("CTRL", "CENTRAL"),
    ("DR", "DRIVE"),
    ("GDNS", "GARDENS"),
    ("JLN", "JALAN"),
    ("KG", "KAMPUNG"),
    ("LOR", "LORONG"),
    ("NTH", "NORTH"),
    ("PK", "PARK"),
    ("PL", "PLACE"),
    ("RD", "ROAD"),
    ("ST", "STREET"),
    ("ST.", "SAINT"),
    ("STH", "SOUTH"),
    ("TER", "TERRACE"),
    ("TG", "TANJONG"),
    ("UPP", "UPPER"),
];

/// Immutable token → expansion table. Matching is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abbreviations {
    map: HashMap<String, String>,
}

impl Abbreviations {
    pub fn new<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            map: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Copy of this table with `extra` entries added; an existing token is overridden.
    pub fn with_overrides<K, V, I>(&self, extra: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = self.map.clone();
        map.extend(extra.into_iter().map(|(k, v)| (k.into(), v.into())));
        Self { map }
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.map.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Replace every whitespace-separated token that has an expansion and
    /// rejoin with single spaces.
    pub fn expand(&self, text: &str) -> String {
        text.split_whitespace()
            .map(|token| self.get(token).unwrap_or(token))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for Abbreviations {
    fn default() -> Self {
        Self::new(STREET_ABBREVIATIONS.iter().copied())
    }
}
