//! Site composition: the document shell around a selected page component.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use minijinja::context;

use crate::config::{ConfigError, SiteConfig};
use crate::navigation::Navigation;
use crate::page::PageType;
use crate::templates::TemplateEngine;

/// A single page render request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteProps {
    /// Page type tag (e.g. "dmg-console", "game")
    pub page_type: String,

    /// Document title
    pub title: String,

    /// Properties passed through unchanged to the page component
    #[serde(default)]
    pub page_props: Value,

    /// Total console submissions shown in the footer
    #[serde(default)]
    pub console_submission_count: u32,

    /// Total cartridge submissions shown in the footer
    #[serde(default)]
    pub cartridge_submission_count: u32,
}

/// Errors that can occur while rendering a page.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Invalid site configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to render template: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Unknown page type `{0}`")]
    UnknownPageType(String),
}

/// Renders full HTML documents for the site.
pub struct SiteRenderer {
    config: SiteConfig,
    navigation: Navigation,
    templates: TemplateEngine,
}

impl SiteRenderer {
    /// Create a renderer from a validated site configuration.
    pub fn new(config: SiteConfig) -> Result<Self, RenderError> {
        let navigation = Navigation::from_config(&config)?;
        let templates = TemplateEngine::new()?;

        Ok(Self {
            config,
            navigation,
            templates,
        })
    }

    /// The console navigation used in the header.
    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    /// Render the content region for a page type.
    ///
    /// Unknown tags render no content (`None`) unless `strict_page_types` is
    /// set, in which case they are an error.
    pub fn select_page(&self, page_type: &str, props: &Value) -> Result<Option<String>, RenderError> {
        let Some(kind) = PageType::from_tag(page_type) else {
            if self.config.strict_page_types {
                return Err(RenderError::UnknownPageType(page_type.to_string()));
            }
            tracing::warn!("Unknown page type `{}`, rendering empty content", page_type);
            return Ok(None);
        };

        let ctx = self.page_context(kind, props);
        let html = self.templates.render(kind.template(), &ctx)?;

        Ok(Some(html))
    }

    /// Render a complete HTML document.
    pub fn render_site(&self, props: &SiteProps) -> Result<String, RenderError> {
        let content = self.select_page(&props.page_type, &props.page_props)?;
        let nav = self.navigation.compute(&props.page_type);

        let html = self.templates.render(
            "site.html",
            context! {
                title => &props.title,
                analytics => analytics_snippet(&self.config.analytics_id),
                nav => nav,
                content => content,
                console_submission_count => props.console_submission_count,
                cartridge_submission_count => props.cartridge_submission_count,
            },
        )?;

        Ok(html)
    }

    /// Page props spread at the top level, plus a reserved `page` entry
    /// describing the component itself.
    fn page_context(&self, kind: PageType, props: &Value) -> Value {
        let mut ctx = match props {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };

        let mut page = json!({
            "tag": kind.to_string(),
            "component": kind.component(),
        });
        if let PageType::Console(console) = kind {
            page["console"] = json!({
                "code": console.code(),
                "model": console.code().to_uppercase(),
                "name": self.config.console_name(console),
            });
        }
        ctx.insert("page".to_string(), page);

        Value::Object(ctx)
    }
}

fn analytics_snippet(analytics_id: &str) -> String {
    format!(
        "window.ga=window.ga||function(){{(ga.q=ga.q||[]).push(arguments)}};ga.l=+new Date;\n  ga('create', '{analytics_id}', 'auto');\n  ga('send', 'pageview');"
    )
}
