//! The four pages served by the HTTP front.

use std::path::PathBuf;

use crate::template::escape_html;
use crate::{PageError, Template};

/// Built-in page layout, used when no layout file is configured.
const DEFAULT_LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{title}} | {{app_name}}</title>
</head>
<body>
<header><a href="{{app_url}}">{{app_name}}</a></header>
<main>
<h1>{{title}}</h1>
{{{content}}}
</main>
</body>
</html>
"#;

/// Configuration for [`Pages`].
#[derive(Debug, Clone)]
pub struct PageConfig {
    /// Shown in the page header and title.
    pub app_name: String,

    /// Target of the header link.
    pub app_url: String,

    /// Optional layout file. It receives `app_name`, `app_url`, `title`
    /// and the pre-rendered `content` (use `{{{content}}}`).
    pub layout_path: Option<PathBuf>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            app_name: "E-mail proxy auth".to_string(),
            app_url: "http://127.0.0.1:8080/".to_string(),
            layout_path: None,
        }
    }
}

/// Renders the login form, error, success and landing pages.
#[derive(Debug, Clone)]
pub struct Pages {
    layout: Template,
    app_name: String,
    app_url: String,
}

impl Pages {
    /// Builds the renderer, loading the layout file if one is configured.
    pub fn new(config: PageConfig) -> Result<Self, PageError> {
        let layout = match &config.layout_path {
            Some(path) => Template::load(path)?,
            None => Template::parse(DEFAULT_LAYOUT)?,
        };
        Ok(Self {
            layout,
            app_name: config.app_name,
            app_url: config.app_url,
        })
    }

    /// The email form. Submitting it keeps `redirect_to` in the query so
    /// the emailed link can send the user back there.
    pub fn login(&self, redirect_to: &str) -> String {
        let action = if redirect_to.is_empty() {
            String::new()
        } else {
            let encoded: String =
                url::form_urlencoded::byte_serialize(redirect_to.as_bytes()).collect();
            format!("?to={encoded}")
        };

        let content = format!(
            concat!(
                "<form method=\"post\" action=\"{action}\">\n",
                "<label for=\"email\">E-Mail</label>\n",
                "<input type=\"email\" id=\"email\" name=\"email\" required autofocus>\n",
                "<button type=\"submit\">Send login link</button>\n",
                "</form>",
            ),
            action = escape_html(&action),
        );
        self.render("Log in", &content)
    }

    /// A failure page. `status` is the HTTP status the front responds with.
    pub fn error(&self, message: &str, status: u16) -> String {
        let content = format!(
            "<p class=\"error\">{}</p>\n<p><a href=\"{}\">Back</a></p>",
            escape_html(message),
            escape_html(&self.app_url),
        );
        self.render(&format!("Error {status}"), &content)
    }

    /// A plain confirmation message.
    pub fn success(&self, message: &str) -> String {
        let content = format!("<p class=\"success\">{}</p>", escape_html(message));
        self.render("Success", &content)
    }

    /// The landing page for an authenticated request, with a logout button.
    pub fn logged_in(&self) -> String {
        let content = concat!(
            "<p>You are logged in.</p>\n",
            "<form method=\"post\">\n",
            "<input type=\"hidden\" name=\"logout\" value=\"1\">\n",
            "<button type=\"submit\">Log out</button>\n",
            "</form>",
        );
        self.render("Logged in", content)
    }

    fn render(&self, title: &str, content: &str) -> String {
        self.layout.render(&[
            ("app_name", self.app_name.as_str()),
            ("app_url", self.app_url.as_str()),
            ("title", title),
            ("content", content),
        ])
    }
}
