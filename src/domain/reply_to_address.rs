use lettre::Address;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?-u:\w)+([-+.'](?-u:\w)+)*@(?-u:\w)+([-.](?-u:\w)+)*\.(?-u:\w)+([-.](?-u:\w)+)*$")
        .expect("Failed to compile email pattern")
});

/// The address a notification should be answered to, as typed by the visitor.
///
/// Besides the form's pattern the address must be a valid RFC 5321 mailbox,
/// which bounds the length of the local part and domain labels.
#[derive(Debug, Clone)]
pub struct ReplyToAddress(Address);

impl ReplyToAddress {
    pub fn parse(s: String) -> Result<ReplyToAddress, String> {
        if !EMAIL_PATTERN.is_match(&s) {
            return Err(format!("{} is not a valid reply-to address", s));
        }
        s.parse::<Address>()
            .map(Self)
            .map_err(|e| format!("{} is not a valid reply-to address: {}", s, e))
    }

    pub fn address(&self) -> &Address {
        &self.0
    }
}

impl AsRef<str> for ReplyToAddress {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

impl std::fmt::Display for ReplyToAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
