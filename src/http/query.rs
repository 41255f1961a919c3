//! Query string decoding
//!
//! Decodes `application/x-www-form-urlencoded` query strings. When a key
//! repeats, the first value is kept.

use std::collections::HashMap;

/// Decoded query parameters
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    values: HashMap<String, String>,
}

impl QueryParams {
    pub fn parse(query: Option<&str>) -> Self {
        let mut values = HashMap::new();
        if let Some(query) = query {
            for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
                values
                    .entry(key.into_owned())
                    .or_insert_with(|| value.into_owned());
            }
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}
