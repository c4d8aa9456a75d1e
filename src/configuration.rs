use lettre::address::AddressError;
use lettre::message::Mailbox;
use secrecy::Secret;
use serde_aux::field_attributes::deserialize_number_from_string;

// config 0.11 lowercases keys, `alias` keeps the case-preserving spelling working.
#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_host", alias = "Host")]
    pub host: String,
    #[serde(alias = "Port", deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    #[serde(rename = "smtphost", alias = "SMTPHost")]
    pub smtp_host: String,
    #[serde(
        rename = "smtpport",
        alias = "SMTPPort",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub smtp_port: u16,
    #[serde(alias = "Account")]
    pub account: String,
    #[serde(alias = "Password")]
    pub password: Secret<String>,
    #[serde(rename = "emailname", alias = "EmailName")]
    pub email_name: String,
    #[serde(rename = "toaddress", alias = "ToAddress")]
    pub to_address: String,
    #[serde(default, alias = "Path")]
    pub path: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

impl Settings {
    pub fn address(&self) -> String {
        format!("{host}:{port}", host = self.host, port = self.port)
    }

    /// The `From` mailbox: the configured display name in front of the account.
    pub fn sender(&self) -> Result<Mailbox, AddressError> {
        Ok(Mailbox::new(
            Some(self.email_name.clone()),
            self.account.parse()?,
        ))
    }

    pub fn recipient(&self) -> Result<Mailbox, AddressError> {
        self.to_address.parse()
    }

    /// Route the form handler is mounted on, always with a single leading slash.
    pub fn form_path(&self) -> String {
        format!("/{}", self.path.trim_start_matches('/'))
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let mut settings = config::Config::default();

    // Read config file
    settings.merge(config::File::with_name("config"))?;
    // APP_SMTPPORT=2525 overrides SMTPPort
    settings.merge(config::Environment::with_prefix("app"))?;

    settings.try_into()
}
