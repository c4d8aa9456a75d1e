use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::web::Data;
use actix_web::{web, App, HttpServer};
use lettre::message::Mailbox;
use tracing_actix_web::TracingLogger;

use crate::email_client::EmailClient;
use crate::routes;

/// Where notifications are delivered.
pub struct Recipient(pub Mailbox);

/// Largest request body the form route reads, 10 MiB.
pub const MAX_FORM_BODY: usize = 10 * 1024 * 1024;

/// Route the contact form posts to, e.g. `/send`.
pub struct FormPath(pub String);

pub fn run(
    listener: TcpListener,
    email_client: EmailClient,
    recipient: Recipient,
    form_path: FormPath,
) -> Result<Server, std::io::Error> {
    let path = form_path.0.clone();
    let email_client = Data::new(email_client);
    let recipient = Data::new(recipient);
    let form_path = Data::new(form_path);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health", web::get().to(routes::health_check::health_check))
            .route("/favicon.ico", web::get().to(routes::static_pages::favicon))
            .route("/test", web::get().to(routes::static_pages::test_form))
            .route(&path, web::post().to(routes::contact_form::send_form))
            .route(&path, web::to(routes::contact_form::form_information))
            .app_data(web::PayloadConfig::new(MAX_FORM_BODY))
            .app_data(email_client.clone())
            .app_data(recipient.clone())
            .app_data(form_path.clone())
    })
        .listen(listener)?
        .run();
    Ok(server)
}
