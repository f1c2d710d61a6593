//! HTML pages rendered with minijinja.
//!
//! Templates are compiled into the binary; `.html` names get HTML
//! auto-escaping.

use axum::response::Html;
use minijinja::Environment;
use serde::Serialize;

use crate::http::error::AppError;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../../templates/base.html")),
    ("chat.html", include_str!("../../templates/chat.html")),
    ("login.html", include_str!("../../templates/login.html")),
    ("signup.html", include_str!("../../templates/signup.html")),
];

pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<Html<String>, AppError> {
        let template = self.env.get_template(name)?;
        Ok(Html(template.render(context)?))
    }
}
