use actix_web::http::header::{self, ContentType};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use anyhow::Context;
use std::fmt::Formatter;
use url::form_urlencoded;

use crate::domain::{render_subject, ReplyToAddress, SourcePage, Submission};
use crate::email_client::EmailClient;
use crate::startup::Recipient;

pub const DELIVERED: &str = "邮件发送成功";
pub const INFORMATION: &str = "Get请求";

#[derive(thiserror::Error)]
pub enum SendFormError {
    #[error("来源地址格式错误")]
    SourceAddress(#[source] anyhow::Error),
    #[error("电子邮件地址格式错误或者HTML模版渲染错误")]
    Validation(#[source] anyhow::Error),
    #[error(transparent)]
    Delivery(anyhow::Error),
}

impl std::fmt::Debug for SendFormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SendFormError {
    fn status_code(&self) -> StatusCode {
        match self {
            SendFormError::SourceAddress(_) | SendFormError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            SendFormError::Delivery(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        status_page(self.status_code(), &self.to_string())
    }
}

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

/// Every answer of the form route has the same shape: `完成:` followed by the escaped message.
fn status_page(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status)
        .content_type(ContentType::plaintext())
        .body(format!("完成:{}", htmlescape::encode_minimal(message)))
}

/// Subject and body of the notification for a validated submission.
#[derive(Debug)]
struct Notification {
    reply_to: ReplyToAddress,
    subject: String,
    html_content: String,
}

impl TryFrom<(Submission, &SourcePage)> for Notification {
    type Error = String;

    fn try_from((mut submission, source): (Submission, &SourcePage)) -> Result<Self, Self::Error> {
        submission.insert_source(source);
        let reply_to = ReplyToAddress::parse(submission.reply_to().to_string())?;
        let subject = render_subject(submission.name(), source.host());
        let html_content = submission.render_body();
        Ok(Self {
            reply_to,
            subject,
            html_content,
        })
    }
}

/// Fields posted as `application/x-www-form-urlencoded`, followed by the query string's.
/// Any other body contributes no fields.
fn submitted_fields(request: &HttpRequest, body: &[u8]) -> Vec<(String, String)> {
    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("application/x-www-form-urlencoded")
        })
        .unwrap_or(false);
    let body: &[u8] = if is_form { body } else { &[] };

    form_urlencoded::parse(body)
        .chain(form_urlencoded::parse(request.query_string().as_bytes()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

#[tracing::instrument(
    name = "Relaying a contact form submission",
    skip(request, body, email_client, recipient),
    fields(
        source_page = tracing::field::Empty,
        reply_to = tracing::field::Empty
    )
)]
pub async fn send_form(
    request: HttpRequest,
    body: web::Bytes,
    email_client: web::Data<EmailClient>,
    recipient: web::Data<Recipient>,
) -> Result<HttpResponse, SendFormError> {
    // A missing header is an empty referer, which parses as a relative reference.
    let referer = request
        .headers()
        .get(header::REFERER)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .unwrap_or_default();
    let source = SourcePage::parse(&referer)
        .with_context(|| format!("{} is not a valid URL", referer))
        .map_err(SendFormError::SourceAddress)?;
    tracing::Span::current().record("source_page", &tracing::field::display(source.referer()));

    let submission = Submission::from_fields(submitted_fields(&request, &body));
    let notification = Notification::try_from((submission, &source))
        .map_err(|e| SendFormError::Validation(anyhow::anyhow!(e)))?;
    tracing::Span::current().record("reply_to", &tracing::field::display(&notification.reply_to));

    email_client
        .send_email(
            &notification.reply_to,
            &notification.subject,
            "",
            &notification.html_content,
            &recipient.0,
        )
        .await
        .map_err(SendFormError::Delivery)?;

    Ok(status_page(StatusCode::OK, DELIVERED))
}

/// Anything other than a POST on the form route.
pub async fn form_information() -> HttpResponse {
    status_page(StatusCode::OK, INFORMATION)
}
