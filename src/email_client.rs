use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, Secret};

use crate::domain::ReplyToAddress;

/// SMTP settings the client needs; everything else about the relay lives elsewhere.
pub struct SmtpSettings<'a> {
    pub host: &'a str,
    pub port: u16,
    pub account: &'a str,
    pub password: &'a Secret<String>,
}

#[derive(Clone)]
pub struct EmailClient {
    sender: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailClient {
    /// Upgrades to TLS when the server offers STARTTLS and authenticates with PLAIN.
    pub fn new(
        smtp: SmtpSettings<'_>,
        sender: Mailbox,
    ) -> Result<Self, lettre::transport::smtp::Error> {
        let tls = TlsParameters::new(smtp.host.to_string())?;
        let credentials = Credentials::new(
            smtp.account.to_string(),
            smtp.password.expose_secret().to_string(),
        );
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp.host)
            .port(smtp.port)
            .tls(Tls::Opportunistic(tls))
            .credentials(credentials)
            .authentication(vec![Mechanism::Plain])
            .build();

        Ok(Self { sender, transport })
    }

    #[tracing::instrument(
        name = "Sending notification email",
        skip(self, subject, text_content, html_content, recipient),
        fields(recipient = %recipient.email)
    )]
    pub async fn send_email(
        &self,
        reply_to: &ReplyToAddress,
        subject: &str,
        text_content: &str,
        html_content: &str,
        recipient: &Mailbox,
    ) -> Result<(), anyhow::Error> {
        let message = self.compose(reply_to, subject, text_content, html_content, recipient)?;
        self.transport.send(message).await?;
        Ok(())
    }

    /// A message with an empty text part is sent as HTML only.
    fn compose(
        &self,
        reply_to: &ReplyToAddress,
        subject: &str,
        text_content: &str,
        html_content: &str,
        recipient: &Mailbox,
    ) -> Result<Message, lettre::error::Error> {
        let builder = Message::builder()
            .from(self.sender.clone())
            .reply_to(Mailbox::new(None, reply_to.address().clone()))
            .to(recipient.clone())
            .subject(subject);

        if text_content.is_empty() {
            builder
                .header(ContentType::TEXT_HTML)
                .body(html_content.to_string())
        } else {
            builder.multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_content.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_content.to_string()),
                    ),
            )
        }
    }
}
