//! Built-in spacetraveling templates using the Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping is off because it
//! would also escape URLs; text fields are escaped when the context data is
//! built.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

/// Stylesheet written next to the generated pages
pub const STYLESHEET: &str = include_str!("spacetraveling/style.css");

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("spacetraveling/layout.html")),
            ("home.html", include_str!("spacetraveling/home.html")),
            ("post.html", include_str!("spacetraveling/post.html")),
            ("loading.html", include_str!("spacetraveling/loading.html")),
            ("error.html", include_str!("spacetraveling/error.html")),
            (
                "partials/header.html",
                include_str!("spacetraveling/partials/header.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub language: String,
    pub root: String,
    pub stylesheet: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelsData {
    pub load_more: String,
    pub loading: String,
}

/// A post in the listing
#[derive(Debug, Clone, Serialize)]
pub struct PostCardData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub url: String,
    pub published: Option<String>,
    pub datetime: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionData {
    pub heading: String,
    pub anchor: String,
    pub html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostPageData {
    pub title: String,
    pub author: String,
    pub banner_url: String,
    pub published: Option<String>,
    pub datetime: Option<String>,
    pub reading_time: Option<String>,
    pub sections: Vec<SectionData>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteData {
        SiteData {
            title: "spacetraveling".to_string(),
            language: "pt-BR".to_string(),
            root: "/".to_string(),
            stylesheet: "/style.css".to_string(),
        }
    }

    fn labels() -> LabelsData {
        LabelsData {
            load_more: "Carregar mais posts".to_string(),
            loading: "Carregando...".to_string(),
        }
    }

    fn card(title: &str) -> PostCardData {
        PostCardData {
            title: title.to_string(),
            subtitle: "Pensando em sincronização".to_string(),
            author: "Joseph Oliveira".to_string(),
            url: "/post/a/".to_string(),
            published: Some("25 mar 2021".to_string()),
            datetime: Some("2021-03-25T19:25:28+00:00".to_string()),
        }
    }

    #[test]
    fn test_home_without_more_pages_has_no_button() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = Context::new();
        context.insert("site", &site());
        context.insert("labels", &labels());
        context.insert("posts", &vec![card("Como utilizar Hooks")]);
        context.insert("load_more", &Option::<String>::None);

        let html = renderer.render("home.html", &context).unwrap();
        assert!(html.contains("Como utilizar Hooks"));
        assert!(html.contains("25 mar 2021"));
        assert!(!html.contains("Carregar mais posts"));
        assert!(!html.contains("reading-time"));
    }

    #[test]
    fn test_home_with_more_pages_has_button() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = Context::new();
        context.insert("site", &site());
        context.insert("labels", &labels());
        context.insert("posts", &vec![card("a")]);
        context.insert("load_more", &Some("/page/2/"));

        let html = renderer.render("home.html", &context).unwrap();
        assert!(html.contains(r#"href="/page/2/""#));
        assert!(html.contains("Carregar mais posts"));
    }

    #[test]
    fn test_post_body_is_not_escaped() {
        let renderer = TemplateRenderer::new().unwrap();
        let post = PostPageData {
            title: "Criando um app CRA do zero".to_string(),
            author: "Danilo Vieira".to_string(),
            banner_url: String::new(),
            published: None,
            datetime: None,
            reading_time: Some("4 min".to_string()),
            sections: vec![SectionData {
                heading: "Introdução".to_string(),
                anchor: "introducao".to_string(),
                html: "<p><strong>Olá</strong></p>".to_string(),
            }],
        };
        let mut context = Context::new();
        context.insert("site", &site());
        context.insert("post", &post);

        let html = renderer.render("post.html", &context).unwrap();
        assert!(html.contains("<p><strong>Olá</strong></p>"));
        assert!(html.contains("4 min"));
        assert!(html.contains(r#"<section id="introducao">"#));
        assert!(html.contains("<title>Criando um app CRA do zero | spacetraveling</title>"));
        assert!(!html.contains("class=\"banner\""));
    }

    #[test]
    fn test_loading_page_refreshes() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = Context::new();
        context.insert("site", &site());
        context.insert("labels", &labels());
        context.insert("refresh", &1);

        let html = renderer.render("loading.html", &context).unwrap();
        assert!(html.contains(r#"<meta http-equiv="refresh" content="1">"#));
        assert!(html.contains("Carregando..."));
    }
}
