use once_cell::sync::Lazy;
use url::{ParseError, Url};

// Relative referers are resolved against this only to check that they parse.
static RELATIVE_BASE: Lazy<Url> =
    Lazy::new(|| Url::parse("http://relative.invalid/").expect("Failed to parse base URL"));

/// The page a submission was posted from, taken from the `Referer` header.
///
/// Absolute and relative references are both accepted; only the host of an
/// absolute (or scheme-relative) reference is kept.
#[derive(Debug, Clone)]
pub struct SourcePage {
    referer: String,
    host: String,
}

impl SourcePage {
    pub fn parse(referer: &str) -> Result<SourcePage, ParseError> {
        let host = match Url::parse(referer) {
            Ok(url) => host_and_port(&url),
            Err(ParseError::RelativeUrlWithoutBase) => {
                let url = Url::options()
                    .base_url(Some(&*RELATIVE_BASE))
                    .parse(referer)?;
                if referer.starts_with("//") {
                    host_and_port(&url)
                } else {
                    String::new()
                }
            }
            Err(e) => return Err(e),
        };
        Ok(Self {
            referer: referer.to_string(),
            host,
        })
    }

    /// The header value exactly as received.
    pub fn referer(&self) -> &str {
        &self.referer
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

fn host_and_port(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}
