//! Content of the login email: link, subject and body.

use std::path::Path;

use maillink_page::Template;
use maillink_session::Session;
use url::Url;

use crate::MailError;

/// Built-in email body, used when no template file is configured.
///
/// Placeholders: `app_name`, `email`, `link`.
const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<body>
<p>Hello {{email}},</p>
<p>someone (hopefully you) asked to log in to {{app_name}}.
Click the link below to continue:</p>
<p><a href="{{link}}">{{link}}</a></p>
<p>The link works once. If you did not ask for it, ignore this email.</p>
</body>
</html>
"#;

/// Everything needed to turn a session into a login email.
#[derive(Debug, Clone)]
pub struct LoginEmail {
    base: Url,
    app_name: String,
    template: Template,
}

impl LoginEmail {
    /// # Errors
    /// - [`MailError::InvalidBaseUrl`]: `app_url` is not an absolute URL
    /// - [`MailError::Template`]: the template file is missing or broken
    pub fn new(
        app_name: &str,
        app_url: &str,
        template_path: Option<&Path>,
    ) -> Result<Self, MailError> {
        let template = match template_path {
            Some(path) => Template::load(path)?,
            None => Template::parse(DEFAULT_TEMPLATE)?,
        };
        Ok(Self {
            base: Url::parse(app_url)?,
            app_name: app_name.to_string(),
            template,
        })
    }

    /// Builds `<base>?login=<secret>&to=<redirect_to>`.
    ///
    /// The `to` pair is left out when `redirect_to` is empty; the front
    /// then sends the user to the base URL.
    pub fn link(&self, session: &Session, redirect_to: &str) -> Url {
        let mut link = self.base.clone();
        {
            let mut query = link.query_pairs_mut();
            query.append_pair("login", session.secret());
            if !redirect_to.is_empty() {
                query.append_pair("to", redirect_to);
            }
        }
        link
    }

    pub fn subject(&self) -> String {
        format!("{} login link", self.app_name)
    }

    /// Renders the HTML body for `session`.
    pub fn body(&self, session: &Session, redirect_to: &str) -> String {
        let link = self.link(session, redirect_to);
        self.template.render(&[
            ("app_name", self.app_name.as_str()),
            ("email", session.profile().email.as_str()),
            ("link", link.as_str()),
        ])
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }
}
