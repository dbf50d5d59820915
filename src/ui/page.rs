//! Full-page views: the token gate and the main chat view.

use crate::api::inference::ClientError;
use crate::core::models::ModelRegistry;
use crate::core::session::{Notice, Session};
use crate::ui::markup::{document, escape_text};
use crate::ui::transcript::render_transcript;

pub const PAGE_TITLE: &str = "LLM Chat Interface";

const PAGE_STYLE: &str = r#"
body { margin: 0; font-family: Arial, sans-serif; background: #0e1117; color: #fafafa; }
.layout { display: flex; min-height: 100vh; }
.sidebar { width: 260px; padding: 24px 16px; background: #262730; box-sizing: border-box; }
.sidebar h2 { margin-top: 0; font-size: 1.2em; }
.sidebar select, .sidebar button { width: 100%; margin-top: 8px; }
.sidebar button {
    border: none;
    border-radius: 0;
    border-bottom: 2px solid gray;
    background-color: transparent;
    color: inherit;
    padding: 6px 0;
    cursor: pointer;
}
.sidebar button:focus, .sidebar button:hover {
    border-bottom: 2px solid rgb(255, 153, 154);
    color: rgb(255, 153, 154);
}
.sidebar hr { border: none; border-top: 1px solid #555; margin: 16px 0; }
.identity { font-size: 0.85em; color: #aaa; }
.main { flex: 1; padding: 24px 32px; box-sizing: border-box; }
.gate { max-width: 560px; margin: 10vh auto; }
.notice { padding: 10px 14px; border-radius: 6px; margin-bottom: 12px; background: #3e2326; color: #ffb4b4; }
form.send { display: flex; gap: 8px; margin-top: 12px; }
form.send input[type=text] { flex: 1; }
input[type=text], input[type=password], select { padding: 6px; box-sizing: border-box; }
"#;

fn render_notices(out: &mut String, notices: &[Notice]) {
    for notice in notices {
        out.push_str(&format!(
            "<div class=\"notice\" role=\"alert\">{}</div>\n",
            escape_text(&notice.text)
        ));
    }
}

/// The token form. The input always starts empty.
pub fn render_gate(notices: &[Notice]) -> String {
    let mut body = String::from("<main class=\"gate\">\n");
    body.push_str(&format!("<h1>{}</h1>\n", escape_text(PAGE_TITLE)));
    render_notices(&mut body, notices);
    body.push_str(
        "<form method=\"post\" action=\"/token\">\n\
<label for=\"token\">Please enter your Hugging Face token.</label><br>\n\
<input type=\"password\" id=\"token\" name=\"token\" value=\"\" autocomplete=\"off\" style=\"width: 100%\">\n\
<button type=\"submit\">Validate</button>\n\
</form>\n</main>",
    );
    document(PAGE_TITLE, PAGE_STYLE, &body)
}

fn render_sidebar(out: &mut String, session: &Session, registry: &ModelRegistry) {
    out.push_str("<aside class=\"sidebar\">\n<h2>Choose Model</h2>\n");
    if let Some(identity) = session.identity() {
        out.push_str(&format!(
            "<p class=\"identity\">Signed in as {}</p>\n",
            escape_text(identity)
        ));
    }

    out.push_str(
        "<form method=\"post\" action=\"/model\">\n\
<label for=\"model\">Choose an LLM model:</label>\n\
<select id=\"model\" name=\"model\">\n",
    );
    for entry in registry.entries() {
        let selected = if entry.name == session.model() {
            " selected"
        } else {
            ""
        };
        let name = escape_text(&entry.name);
        out.push_str(&format!(
            "<option value=\"{name}\"{selected}>{name}</option>\n"
        ));
    }
    out.push_str("</select>\n<button type=\"submit\">Apply</button>\n</form>\n<hr>\n");

    out.push_str(
        "<form method=\"post\" action=\"/reset-token\">\n\
<button type=\"submit\">Reset Hugging Face Token?</button>\n</form>\n<hr>\n\
<form method=\"post\" action=\"/reset\">\n\
<button type=\"submit\">Reset Application</button>\n</form>\n</aside>\n",
    );
}

/// The chat view. When no client can be built for the session, only the
/// sidebar and the error are shown.
pub fn render_main(
    session: &Session,
    registry: &ModelRegistry,
    client: Result<(), &ClientError>,
    notices: &[Notice],
) -> String {
    let mut body = String::from("<div class=\"layout\">\n");
    render_sidebar(&mut body, session, registry);

    body.push_str("<main class=\"main\">\n");
    body.push_str(&format!("<h1>{}</h1>\n", escape_text(PAGE_TITLE)));
    render_notices(&mut body, notices);

    match client {
        Err(err) => {
            render_notices(&mut body, &[Notice::error(err.to_string())]);
        }
        Ok(()) => {
            body.push_str(&render_transcript(session.conversation()));
            body.push_str(
                "<form class=\"send\" method=\"post\" action=\"/message\">\n\
<label for=\"text\">You:</label>\n\
<input type=\"text\" id=\"text\" name=\"text\" value=\"\" autocomplete=\"off\" autofocus>\n\
<button type=\"submit\">Send</button>\n</form>\n",
            );
        }
    }

    body.push_str("</main>\n</div>");
    document(PAGE_TITLE, PAGE_STYLE, &body)
}
