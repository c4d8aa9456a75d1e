use actix_web::http::header::ContentType;
use actix_web::{web, HttpResponse};

use crate::startup::FormPath;

/// A bare form for trying the relay out by hand.
pub async fn test_form(form_path: web::Data<FormPath>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(format!(
            r#"
<html>
    <body>
        <p>
            <form action="{action}" method="POST">
                name:<input type="text" name="name"><br/>
                say:<input type="text" name="say"><br/>
                reply<input type="email" name="_reply_to"><br/>
                <input type="submit" value="Send">
            </form>
        </p>
    </body>
</html>
            "#,
            action = htmlescape::encode_minimal(&form_path.0)
        ))
}

pub async fn favicon() -> HttpResponse {
    HttpResponse::Ok().finish()
}
