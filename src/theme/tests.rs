//! Tests for the template engine

use super::*;
use crate::models::{PagedResult, PostView};
use std::fs;
use tempfile::TempDir;
use tera::Context as TeraContext;

const BUNDLED: &[&str] = &[
    "base.html",
    "includes/paginator.html",
    "includes/post_card.html",
    "blog/index.html",
    "blog/category.html",
    "blog/profile.html",
    "blog/detail.html",
    "blog/create.html",
    "blog/comment.html",
    "blog/user.html",
    "registration/login.html",
    "registration/registration_form.html",
    "pages/about.html",
    "pages/rules.html",
    "pages/404.html",
    "pages/500.html",
];

fn vars(path: &str) -> StandardTemplateVars {
    StandardTemplateVars::new("Blogicum", path)
}

#[test]
fn test_bundled_templates_load() {
    let engine = TemplateEngine::new(None).unwrap();
    for name in BUNDLED {
        assert!(engine.has_template(name), "missing template {}", name);
    }
}

#[test]
fn test_render_static_page_with_standard_vars() {
    let engine = TemplateEngine::new(None).unwrap();
    let html = engine
        .render_page("pages/about.html", &TeraContext::new(), &vars("/pages/about/"))
        .unwrap();

    assert!(html.contains("<title>About | Blogicum</title>"));
    assert!(html.contains("Log in"));
    assert!(!html.contains("Log out"));
}

#[test]
fn test_render_with_current_user() {
    let engine = TemplateEngine::new(None).unwrap();
    let mut user = User::new("ann".into(), String::new(), "hash".into());
    user.first_name = "Ann".into();

    let html = engine
        .render_page(
            "pages/rules.html",
            &TeraContext::new(),
            &vars("/pages/rules/").with_user(Some(&user)),
        )
        .unwrap();

    assert!(html.contains("Log out"));
    assert!(html.contains("/profile/ann/"));
    assert!(html.contains(">Ann<"));
}

#[test]
fn test_render_empty_index() {
    let engine = TemplateEngine::new(None).unwrap();
    let mut context = TeraContext::new();
    context.insert("page", &PagedResult::<PostView>::default());
    context.insert("total_posts", &0);

    let html = engine
        .render_page("blog/index.html", &context, &vars("/"))
        .unwrap();
    assert!(html.contains("No posts yet."));
}

#[test]
fn test_override_directory_replaces_and_adds() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("pages")).unwrap();
    fs::write(
        dir.path().join("pages/about.html"),
        r#"{% extends "base.html" %}{% block content %}Custom about{% endblock content %}"#,
    )
    .unwrap();
    fs::write(dir.path().join("extra.html"), "Hello {{ site_name }}").unwrap();

    let engine = TemplateEngine::new(Some(dir.path())).unwrap();
    let about = engine
        .render_page("pages/about.html", &TeraContext::new(), &vars("/pages/about/"))
        .unwrap();
    assert!(about.contains("Custom about"));

    let extra = engine
        .render_page("extra.html", &TeraContext::new(), &vars("/"))
        .unwrap();
    assert_eq!(extra, "Hello Blogicum");
}

#[test]
fn test_missing_override_directory_is_ignored() {
    let dir = TempDir::new().unwrap();
    let engine = TemplateEngine::new(Some(&dir.path().join("nope"))).unwrap();
    assert!(engine.has_template("base.html"));
}

#[test]
fn test_broken_override_is_an_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.html"), "{% if %}").unwrap();

    assert!(matches!(
        TemplateEngine::new(Some(dir.path())),
        Err(ThemeError::TemplateError(_))
    ));
}

#[test]
fn test_render_with_fallback() {
    let engine = TemplateEngine::new(None).unwrap();
    let html = engine.render_with_fallback("nope.html", &TeraContext::new(), &vars("/"));
    assert!(html.contains("Server error"));
    assert!(html.contains("<title>Blogicum</title>"));
}

#[test]
fn test_linebreaksbr_escapes() {
    let value = Value::String("<b>hi</b>\r\nthere".to_string());
    let html = linebreaksbr(&value, &HashMap::new()).unwrap();
    assert_eq!(html, Value::String("&lt;b&gt;hi&lt;&#x2F;b&gt;<br>there".to_string()));
}
