use std::collections::BTreeMap;

use crate::domain::SourcePage;

pub const SOURCE_FIELD: &str = "From Address";
pub const REPLY_TO_FIELD: &str = "_reply_to";
pub const NAME_FIELD: &str = "name";

/// Fields of one form post, iterated in key order.
#[derive(Debug, Default)]
pub struct Submission(BTreeMap<String, String>);

impl Submission {
    /// The first value seen for a key wins.
    pub fn from_fields<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut map = BTreeMap::new();
        for (key, value) in fields {
            map.entry(key).or_insert(value);
        }
        Self(map)
    }

    /// Records where the submission came from, overriding any posted field of the same name.
    pub fn insert_source(&mut self, source: &SourcePage) {
        self.0
            .insert(SOURCE_FIELD.to_string(), source.referer().to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn reply_to(&self) -> &str {
        self.get(REPLY_TO_FIELD).unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.get(NAME_FIELD).unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// HTML body of the notification: one escaped `key:value<br/>` per field.
    pub fn render_body(&self) -> String {
        let mut body = String::new();
        for (key, value) in &self.0 {
            body.push_str(&format!(
                "{}:{}<br/>",
                htmlescape::encode_minimal(key),
                htmlescape::encode_minimal(value)
            ));
        }
        body
    }
}

pub fn render_subject(name: &str, host: &str) -> String {
    format!(
        "{name}在{host}有新的留言",
        name = htmlescape::encode_minimal(name),
        host = htmlescape::encode_minimal(host)
    )
}
