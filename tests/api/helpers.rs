use formrelay::configuration::{get_configuration, Settings};
use formrelay::email_client::{EmailClient, SmtpSettings};
use formrelay::startup::{run, FormPath, Recipient};
use formrelay::telemetry::{get_subscriber, init_subscriber};
use once_cell::sync::Lazy;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

static TRACING: Lazy<()> = Lazy::new(|| {

    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(
            subscriber_name,
            default_filter_level,
            std::io::stdout
        );
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(
            subscriber_name,
            default_filter_level,
            std::io::sink
        );
        init_subscriber(subscriber);
    }

});

/// What the fake SMTP server answers to `AUTH`.
#[derive(Clone, Copy)]
pub enum Authentication {
    Accept,
    Reject,
}

#[derive(Debug, Default, Clone)]
pub struct ReceivedEmail {
    pub mail_from: String,
    pub rcpt_to: Vec<String>,
    pub data: String,
}

/// Just enough of an SMTP server for lettre to deliver a message to.
pub struct SmtpServer {
    pub port: u16,
    received: Arc<Mutex<Vec<ReceivedEmail>>>,
}

impl SmtpServer {
    pub async fn start(authentication: Authentication) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake SMTP server");
        let port = listener.local_addr().unwrap().port();
        let received = Arc::new(Mutex::new(Vec::new()));

        let outbox = received.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let outbox = outbox.clone();
                tokio::spawn(async move {
                    let _ = serve_session(stream, authentication, outbox).await;
                });
            }
        });

        Self { port, received }
    }

    pub fn received_emails(&self) -> Vec<ReceivedEmail> {
        self.received.lock().unwrap().clone()
    }
}

async fn serve_session(
    stream: tokio::net::TcpStream,
    authentication: Authentication,
    outbox: Arc<Mutex<Vec<ReceivedEmail>>>,
) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    let mut current = ReceivedEmail::default();

    writer.write_all(b"220 localhost ESMTP test server\r\n").await?;
    while let Some(line) = lines.next_line().await? {
        let command = line.to_ascii_uppercase();
        let reply = if command.starts_with("EHLO") {
            "250-localhost\r\n250 AUTH PLAIN LOGIN"
        } else if command.starts_with("HELO") {
            "250 localhost"
        } else if command.starts_with("AUTH") {
            match authentication {
                Authentication::Accept => "235 2.7.0 Authentication successful",
                Authentication::Reject => "535 5.7.8 Authentication credentials invalid",
            }
        } else if command.starts_with("MAIL FROM:") {
            current.mail_from = line["MAIL FROM:".len()..].trim().to_string();
            "250 OK"
        } else if command.starts_with("RCPT TO:") {
            current.rcpt_to.push(line["RCPT TO:".len()..].trim().to_string());
            "250 OK"
        } else if command == "DATA" {
            writer.write_all(b"354 End data with <CR><LF>.<CR><LF>\r\n").await?;
            while let Some(data_line) = lines.next_line().await? {
                if data_line == "." {
                    break;
                }
                current.data.push_str(&data_line);
                current.data.push('\n');
            }
            outbox.lock().unwrap().push(std::mem::take(&mut current));
            "250 OK queued"
        } else if command.starts_with("QUIT") {
            writer.write_all(b"221 Bye\r\n").await?;
            break;
        } else if command.starts_with("RSET") || command.starts_with("NOOP") {
            "250 OK"
        } else {
            "502 Command not implemented"
        };
        writer.write_all(format!("{}\r\n", reply).as_bytes()).await?;
    }
    Ok(())
}

pub struct TestApp {
    pub address: String,
    pub configuration: Settings,
    pub email_server: SmtpServer,
}

impl TestApp {
    pub async fn post_form(&self, referer: Option<&str>, fields: &[(&str, &str)]) -> reqwest::Response {
        let mut request = reqwest::Client::new()
            .post(&self.form_url())
            .form(fields);
        if let Some(referer) = referer {
            request = request.header("Referer", referer);
        }
        request
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Posts `body` as is, with no `Content-Type` unless one is given.
    pub async fn post_raw(
        &self,
        referer: Option<&str>,
        content_type: Option<&str>,
        query: &str,
        body: String,
    ) -> reqwest::Response {
        let mut request = reqwest::Client::new()
            .post(&format!("{}{}", self.form_url(), query))
            .body(body);
        if let Some(referer) = referer {
            request = request.header("Referer", referer);
        }
        if let Some(content_type) = content_type {
            request = request.header("Content-Type", content_type);
        }
        request
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub fn form_url(&self) -> String {
        format!("{}{}", self.address, self.configuration.form_path())
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(Authentication::Accept).await
}

pub async fn spawn_app_with(authentication: Authentication) -> TestApp {
    let email_server = SmtpServer::start(authentication).await;
    spawn_app_against(email_server.port, email_server).await
}

/// Points the relay at `smtp_port`, which need not be the fake server's.
pub async fn spawn_app_against(smtp_port: u16, email_server: SmtpServer) -> TestApp {
    Lazy::force(&TRACING);
    let configuration = {
        let mut c = get_configuration()
            .expect("Failed to read config file");
        c.smtp_host = "127.0.0.1".to_string();
        c.smtp_port = smtp_port;
        c
    };

    let listener = TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    // We retrieve the port assigned to us by the OS
    let port = listener.local_addr()
        .unwrap()
        .port();

    let email_client = EmailClient::new(
        SmtpSettings {
            host: &configuration.smtp_host,
            port: configuration.smtp_port,
            account: &configuration.account,
            password: &configuration.password,
        },
        configuration.sender().expect("Invalid sender found in config"),
    )
        .expect("Failed to build email client");
    let recipient = configuration.recipient()
        .expect("Invalid recipient found in config");

    let server = run(
        listener,
        email_client,
        Recipient(recipient),
        FormPath(configuration.form_path()),
    )
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        configuration,
        email_server,
    }
}
