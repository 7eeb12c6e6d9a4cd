//! Landing page rendering with Handlebars.

use std::sync::Arc;

use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde_json::json;

use crate::policy::DEVELOPER_DAYS;

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html.hbs");
const INDEX: &str = "index";

/// Compiled page templates, shared across handlers.
#[derive(Clone)]
pub struct Pages {
    handlebars: Arc<Handlebars<'static>>,
}

impl Pages {
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars
            .register_template_string(INDEX, INDEX_TEMPLATE)
            .context("compile index template")?;
        Ok(Self {
            handlebars: Arc::new(handlebars),
        })
    }

    /// The landing page; developer controls only when `is_developer`.
    pub fn index(&self, is_developer: bool) -> Result<String> {
        let vars = json!({
            "is_developer": is_developer,
            "developer_days": DEVELOPER_DAYS,
        });
        self.handlebars
            .render(INDEX, &vars)
            .context("render index template")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn developer_section_only_for_developers() {
        let pages = Pages::new().unwrap();
        let dev = pages.index(true).unwrap();
        assert!(dev.contains(r#"id="developer""#));
        assert!(dev.contains(r#"<option value="90">90 days</option>"#));

        let public = pages.index(false).unwrap();
        assert!(!public.contains(r#"id="developer""#));
        assert!(public.contains("/api/get-client-key"));
        assert!(!public.contains("/api/generate-developer-key"));
    }
}
