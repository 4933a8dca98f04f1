use actix_web::{web, HttpResponse, Responder};
use maud::{html, Markup, DOCTYPE};

use crate::web::AppState;

/// CSS for the generator page
fn styles() -> &'static str {
    r#"
    :root {
        --text-color: #24292f;
        --muted-color: #57606a;
        --border-color: #d0d7de;
        --accent-color: #0969da;
    }
    body {
        font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Helvetica, Arial, sans-serif;
        color: var(--text-color);
        max-width: 720px;
        margin: 40px auto;
        padding: 0 16px;
    }
    .subtitle {
        color: var(--muted-color);
        margin-bottom: 24px;
    }
    form {
        display: flex;
        gap: 8px;
        margin-bottom: 24px;
    }
    input[type=text] {
        flex: 1;
        padding: 6px 8px;
        border: 1px solid var(--border-color);
        border-radius: 6px;
    }
    button {
        padding: 6px 16px;
        border: 1px solid var(--border-color);
        border-radius: 6px;
        background: var(--accent-color);
        color: white;
    }
    .output label {
        display: block;
        font-weight: 600;
        margin-top: 16px;
    }
    .output input {
        width: 100%;
        font-family: monospace;
        padding: 4px;
        border: 1px solid var(--border-color);
        box-sizing: border-box;
    }
    .preview {
        margin-top: 16px;
    }
    "#
}

/// Renders the link generator; the URLs themselves are composed in the browser
pub fn render_generator(prefix: &str, project: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Build badge generator" }
                style { (maud::PreEscaped(styles())) }
                script src={ (prefix) "/generator.js" } defer {}
            }
            body {
                h1 { "Build badge generator" }
                div class="subtitle" {
                    "Badges for Cloud Build builds in project " code { (project) }
                }

                form id="generator" data-prefix=(prefix) {
                    input type="text" id="tag" name="tag" placeholder="build tag, e.g. my-repo" required;
                    button type="submit" { "Generate" }
                }

                div class="output" hidden id="output" {
                    label for="image-url" { "Badge image" }
                    input type="text" id="image-url" readonly;
                    label for="json-url" { "Badge JSON (shields.io endpoint)" }
                    input type="text" id="json-url" readonly;
                    label for="log-url" { "Build history" }
                    input type="text" id="log-url" readonly;
                    label for="markdown" { "Markdown" }
                    input type="text" id="markdown" readonly;
                    div class="preview" {
                        a id="preview-link" target="_blank" {
                            img id="preview-image" alt="build status";
                        }
                    }
                }
            }
        }
    }
}

/// Mounted at both "" and "/" so `/badger` and `/badger/` serve the page
pub async fn index(state: web::Data<AppState>) -> impl Responder {
    let markup = render_generator(&state.config.path_prefix, &state.config.project);

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(markup.into_string())
}
