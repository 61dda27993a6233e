pub mod chat;
pub mod documents;

use axum::response::Html;

const LANDING_PAGE: &str = r#"<!doctype html>
<html>
  <head><title>ClassDocs</title></head>
  <body style="font-family: sans-serif; text-align: center; margin-top: 80px;">
    <h1>ClassDocs</h1>
    <p>Ask questions about uploaded course documents.</p>
    <p>
      POST /upload &middot; GET /documents &middot; DELETE /documents/{name}
      &middot; WebSocket /ws &middot; integration API under /v1
    </p>
  </body>
</html>
"#;

pub async fn root() -> Html<&'static str> {
    Html(LANDING_PAGE)
}
