use anyhow::Context;
use formrelay::configuration::get_configuration;
use formrelay::email_client::{EmailClient, SmtpSettings};
use formrelay::startup::{run, FormPath, Recipient};
use formrelay::telemetry::{get_subscriber, init_subscriber};
use std::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber(
        "formrelay".into(),
        "info".into(),
        std::io::stdout,
    );
    init_subscriber(subscriber);

    let config = get_configuration()
        .context("Failed to read config file")?;

    let sender = config.sender()
        .context("Invalid sender address in config")?;
    let recipient = config.recipient()
        .context("Invalid recipient address in config")?;
    let email_client = EmailClient::new(
        SmtpSettings {
            host: &config.smtp_host,
            port: config.smtp_port,
            account: &config.account,
            password: &config.password,
        },
        sender,
    )
        .context("Failed to configure the SMTP transport")?;

    let address = config.address();
    let listener = TcpListener::bind(&address)
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!(%address, path = %config.form_path(), "Listening for contact form submissions");

    run(listener, email_client, Recipient(recipient), FormPath(config.form_path()))?.await?;
    Ok(())
}
