//! Template engine
//!
//! This module provides page rendering using Tera.
//! Features:
//! - Templates embedded in the binary
//! - Optional on-disk override directory
//! - Standard template variables
//! - Fallback page when rendering fails

use chrono::Datelike;
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::error::Error as StdError;
use std::fs;
use std::path::Path;
use tera::{Context as TeraContext, Tera, Value};

use crate::models::User;

mod error;

pub use error::ThemeError;

/// Templates bundled with the binary
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct BundledTemplates;

/// Template engine for rendering pages
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Create a template engine from the bundled templates.
    ///
    /// Any `.html` file under `override_dir` replaces the bundled template
    /// with the same relative name, or adds a new one.
    pub fn new(override_dir: Option<&Path>) -> Result<Self, ThemeError> {
        let mut templates: BTreeMap<String, String> = BTreeMap::new();

        for name in BundledTemplates::iter() {
            if let Some(file) = BundledTemplates::get(&name) {
                let content = String::from_utf8_lossy(&file.data).into_owned();
                templates.insert(name.into_owned(), content);
            }
        }

        if let Some(dir) = override_dir {
            if dir.is_dir() {
                let before = templates.len();
                let mut overrides = Vec::new();
                collect_templates_from_dir(dir, dir, &mut overrides)?;
                let count = overrides.len();
                templates.extend(overrides);
                tracing::info!(
                    "Loaded {} template override(s) from {:?} ({} new)",
                    count,
                    dir,
                    templates.len() - before
                );
            } else {
                tracing::warn!("Template override directory {:?} does not exist", dir);
            }
        }

        let mut tera = Tera::default();
        tera.register_filter("linebreaksbr", linebreaksbr);
        tera.add_raw_templates(templates)
            .map_err(|e| ThemeError::TemplateError(format!("Failed to load templates: {}", describe(&e))))?;

        Ok(Self { tera })
    }

    /// Whether a template with this name is loaded
    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Render a template with context
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String, ThemeError> {
        self.tera.render(template, context).map_err(|e| {
            ThemeError::TemplateError(format!("Failed to render '{}': {}", template, describe(&e)))
        })
    }

    /// Render a template with the standard variables added
    pub fn render_page(
        &self,
        template: &str,
        context: &TeraContext,
        vars: &StandardTemplateVars,
    ) -> Result<String, ThemeError> {
        let mut full_context = context.clone();
        vars.apply(&mut full_context);
        self.render(template, &full_context)
    }

    /// Like [`render_page`](Self::render_page), but a failure is logged and
    /// replaced by a minimal error page.
    pub fn render_with_fallback(
        &self,
        template: &str,
        context: &TeraContext,
        vars: &StandardTemplateVars,
    ) -> String {
        match self.render_page(template, context, vars) {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("{}", e);
                fallback_page(&vars.site_name)
            }
        }
    }
}

/// Full error chain of a Tera error
fn describe(e: &tera::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

fn collect_templates_from_dir(
    base_path: &Path,
    current_path: &Path,
    templates: &mut Vec<(String, String)>,
) -> Result<(), ThemeError> {
    for entry in fs::read_dir(current_path)? {
        let path = entry?.path();

        if path.is_dir() {
            collect_templates_from_dir(base_path, &path, templates)?;
        } else if path.extension().is_some_and(|ext| ext == "html") {
            let relative_path = path
                .strip_prefix(base_path)
                .map_err(|_| ThemeError::TemplateError("Failed to get relative path".to_string()))?;

            let template_name = relative_path.to_string_lossy().replace('\\', "/");
            let content = fs::read_to_string(&path)?;
            templates.push((template_name, content));
        }
    }
    Ok(())
}

/// Escape text and turn newlines into `<br>` tags
fn linebreaksbr(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("linebreaksbr expects a string"))?;
    let html = tera::escape_html(&text.replace("\r\n", "\n")).replace('\n', "<br>");
    Ok(Value::String(html))
}

fn fallback_page(site_name: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title></head>\
         <body><h1>Server error</h1><p>The page could not be displayed.</p></body></html>",
        tera::escape_html(site_name)
    )
}

/// Variables every page receives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardTemplateVars {
    pub site_name: String,
    /// Current logged-in user
    pub current_user: Option<CurrentUser>,
    /// Current request path
    pub request_path: String,
    /// Current year (for copyright)
    pub year: i32,
}

/// Current user information for templates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub is_staff: bool,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name(),
            is_staff: user.is_staff,
        }
    }
}

impl StandardTemplateVars {
    pub fn new(site_name: impl Into<String>, request_path: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
            current_user: None,
            request_path: request_path.into(),
            year: chrono::Utc::now().year(),
        }
    }

    /// Set the current user
    pub fn with_user(mut self, user: Option<&User>) -> Self {
        self.current_user = user.map(CurrentUser::from);
        self
    }

    fn apply(&self, context: &mut TeraContext) {
        context.insert("site_name", &self.site_name);
        context.insert("request_path", &self.request_path);
        context.insert("year", &self.year);
        context.insert("current_user", &self.current_user);
    }
}

#[cfg(test)]
mod tests;
