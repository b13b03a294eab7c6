//! Theme engine
//!
//! Renders HTML pages with Tera. Templates are embedded into the binary from
//! the `templates/` directory, so a deployment is a single file.
//! Every page is rendered with a set of standard variables (site name,
//! request path, year and the logged-in blogger).

use anyhow::Result;
use chrono::Datelike;
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use tera::{Context as TeraContext, Tera};

use crate::models::Blogger;

mod error;

pub use error::ThemeError;

/// HTML templates compiled into the binary
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct EmbeddedTemplates;

/// Template engine for rendering pages
pub struct ThemeEngine {
    tera: Tera,
}

impl ThemeEngine {
    /// Create an engine over the embedded templates
    pub fn new() -> Result<Self> {
        let mut templates = Vec::new();
        for name in EmbeddedTemplates::iter() {
            let file = EmbeddedTemplates::get(&name)
                .ok_or_else(|| ThemeError::NotFound(name.to_string()))?;
            let content = String::from_utf8(file.data.into_owned()).map_err(|e| {
                ThemeError::TemplateError(format!("Template {} is not UTF-8: {}", name, e))
            })?;
            templates.push((name.to_string(), content));
        }

        let engine = Self::from_templates(templates)?;
        tracing::debug!("Loaded {} templates", engine.template_names().len());
        Ok(engine)
    }

    /// Create an engine from `(name, source)` pairs
    pub fn from_templates<I, N, S>(templates: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, S)>,
        N: AsRef<str>,
        S: AsRef<str>,
    {
        // Added as one batch so `extends` resolves regardless of order
        let mut tera = Tera::default();
        tera.add_raw_templates(templates)
            .map_err(|e| ThemeError::TemplateError(describe_error("Failed to load templates", &e)))?;

        Ok(Self { tera })
    }

    /// Names of all loaded templates, sorted
    pub fn template_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tera.get_template_names().collect();
        names.sort_unstable();
        names
    }

    /// Check whether a template exists
    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Render a template with the given context
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String> {
        if !self.has_template(template) {
            return Err(ThemeError::NotFound(template.to_string()).into());
        }

        self.tera.render(template, context).map_err(|e| {
            let prefix = format!("Failed to render '{}'", template);
            ThemeError::TemplateError(describe_error(&prefix, &e)).into()
        })
    }

    /// Render a template with standard variables added to `context`
    pub fn render_with_standard_vars(
        &self,
        template: &str,
        context: &TeraContext,
        standard_vars: &StandardTemplateVars,
    ) -> Result<String> {
        let mut full_context = context.clone();

        full_context.insert("site_name", &standard_vars.site_name);
        full_context.insert("request_path", &standard_vars.request_path);
        full_context.insert("year", &standard_vars.year);

        if let Some(ref user) = standard_vars.current_user {
            full_context.insert("current_user", user);
        }

        self.render(template, &full_context)
    }
}

/// Tera nests the useful detail in the source chain
fn describe_error(prefix: &str, err: &tera::Error) -> String {
    let mut message = format!("{}: {}", prefix, err);
    let mut source = err.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

/// Variables available to every page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardTemplateVars {
    /// Blog name
    pub site_name: String,
    /// Current logged-in blogger (optional)
    pub current_user: Option<CurrentUser>,
    /// Current request path
    pub request_path: String,
    /// Current year (for the footer)
    pub year: i32,
}

impl StandardTemplateVars {
    pub fn new(
        site_name: impl Into<String>,
        request_path: impl Into<String>,
        current_user: Option<&Blogger>,
    ) -> Self {
        Self {
            site_name: site_name.into(),
            current_user: current_user.map(CurrentUser::from),
            request_path: request_path.into(),
            year: chrono::Utc::now().year(),
        }
    }
}

/// Logged-in blogger as exposed to templates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub is_staff: bool,
}

impl From<&Blogger> for CurrentUser {
    fn from(blogger: &Blogger) -> Self {
        Self {
            id: blogger.id,
            email: blogger.email.clone(),
            is_staff: blogger.is_staff,
        }
    }
}
