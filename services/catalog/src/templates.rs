//! HTML rendering for the confirmation email and pages
//!
//! Templates are compiled into the binary. Every template name ends in
//! `.html`, so Tera escapes interpolated values.

use std::sync::Arc;
use tera::{Context, Tera};

const TEMPLATES: [(&str, &str); 6] = [
    ("index.html", include_str!("../templates/index.html")),
    ("user_activation.html", include_str!("../templates/user_activation.html")),
    ("user_confirmation.html", include_str!("../templates/user_confirmation.html")),
    ("user_confirmed.html", include_str!("../templates/user_confirmed.html")),
    ("user_notfound.html", include_str!("../templates/user_notfound.html")),
    ("confirm_error.html", include_str!("../templates/confirm_error.html")),
];

/// Compiled template set, cheap to clone
#[derive(Clone)]
pub struct Templates {
    tera: Arc<Tera>,
}

impl Templates {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)?;
        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    pub fn index(&self) -> Result<String, tera::Error> {
        self.tera.render("index.html", &Context::new())
    }

    /// Body of the confirmation email
    pub fn activation_email(&self, login: &str, link: &str) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("login", login);
        context.insert("link", link);
        self.tera.render("user_activation.html", &context)
    }

    /// Page shown when a confirmation link activates an account
    pub fn activated(&self, login: &str, email: &str) -> Result<String, tera::Error> {
        self.render_user("user_confirmation.html", login, email)
    }

    /// Page shown when the account was already active
    pub fn already_active(&self, login: &str, email: &str) -> Result<String, tera::Error> {
        self.render_user("user_confirmed.html", login, email)
    }

    pub fn user_not_found(&self) -> Result<String, tera::Error> {
        self.tera.render("user_notfound.html", &Context::new())
    }

    pub fn confirm_error(&self) -> Result<String, tera::Error> {
        self.tera.render("confirm_error.html", &Context::new())
    }

    fn render_user(&self, name: &str, login: &str, email: &str) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("login", login);
        context.insert("email", email);
        self.tera.render(name, &context)
    }
}
