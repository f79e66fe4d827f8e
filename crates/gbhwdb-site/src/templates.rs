//! Embedded templates for the site shell and the page components.

use minijinja::Environment;
use serde::Serialize;

/// Template engine using minijinja.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a template engine with the built-in templates registered.
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();

        env.add_template("site.html", SITE_TEMPLATE)?;
        env.add_template("header.html", HEADER_TEMPLATE)?;
        env.add_template("footer.html", FOOTER_TEMPLATE)?;

        env.add_template("pages/console.html", CONSOLE_TEMPLATE)?;
        env.add_template("pages/cartridges.html", CARTRIDGES_TEMPLATE)?;
        env.add_template("pages/cartridge.html", CARTRIDGE_TEMPLATE)?;
        env.add_template("pages/game.html", GAME_TEMPLATE)?;
        env.add_template("pages/mapper.html", MAPPER_TEMPLATE)?;

        Ok(Self { env })
    }

    /// Render a registered template with the given context.
    pub fn render<S: Serialize>(&self, template: &str, ctx: S) -> Result<String, minijinja::Error> {
        self.env.get_template(template)?.render(ctx)
    }
}

const SITE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta http-equiv="X-UA-Compatible" content="IE=edge">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{ title }}</title>
<link rel="stylesheet" href="//fonts.googleapis.com/css?family=Lato:400,700">
<link rel="stylesheet" href="/static/gbhwdb.css">
<link rel="apple-touch-icon" sizes="180x180" href="/apple-touch-icon.png">
<link rel="icon" type="image/png" sizes="32x32" href="/favicon-32x32.png">
<link rel="icon" type="image/png" sizes="16x16" href="/favicon-16x16.png">
<link rel="manifest" href="/site.webmanifest">
<link rel="mask-icon" href="/safari-pinned-tab.svg" color="#5bbad5">
<meta name="msapplication-TileColor" content="#2b5797">
<meta name="theme-color" content="#ffffff">
<script>{{ analytics | safe }}</script>
<script async src="https://www.google-analytics.com/analytics.js"></script>
</head>
<body>
{% include "header.html" %}
<main class="site-main">
<div class="site-main__content">{% if content %}{{ content | safe }}{% endif %}</div>
</main>
{% include "footer.html" %}
</body>
</html>
"##;

const HEADER_TEMPLATE: &str = r##"<header class="site-header">
<h1 class="site-header__title"><a href="/">Game Boy hardware database<aside>by Gekkio and contributors</aside></a></h1>
<nav class="site-navigation">
<ul>
{% for entry in nav %}<li{% if entry.active %} class="active"{% endif %}><a href="/consoles/{{ entry.code }}"><strong>{{ entry.model }}</strong><span class="name">{{ entry.name }}</span></a></li>
{% endfor %}</ul>
</nav>
</header>"##;

const FOOTER_TEMPLATE: &str = r##"<footer class="site-footer">
<div class="site-footer__content">
<aside class="site-footer__stats">
<p>Console submissions: <strong>{{ console_submission_count }}</strong></p>
<p>Cartridge submissions: <strong>{{ cartridge_submission_count }}</strong></p>
</aside>
<aside class="site-footer__license">
<p>Data and photos are licensed under <a href="https://creativecommons.org/licenses/by-sa/4.0/">CC BY-SA 4.0</a> unless stated otherwise.</p>
</aside>
</div>
</footer>"##;

const CONSOLE_TEMPLATE: &str = r##"<article class="page page-console page-console--{{ page.console.code }}" data-component="{{ page.component }}">
<h2 class="page-console__title">{{ page.console.name }} ({{ page.console.model }})</h2>
{% if content_html %}<div class="page-console__intro">{{ content_html | safe }}</div>
{% endif %}{% if submissions %}<table class="submission-list">
<thead><tr><th>Entry</th><th>Release</th><th>Contributor</th></tr></thead>
<tbody>
{% for submission in submissions %}<tr><td><a href="/consoles/{{ page.console.code }}/{{ submission.slug }}.html">{{ submission.title }}</a></td><td>{{ submission.release }}</td><td>{{ submission.contributor }}</td></tr>
{% endfor %}</tbody>
</table>{% else %}<p class="page-console__empty">No submissions yet.</p>{% endif %}
</article>"##;

const CARTRIDGES_TEMPLATE: &str = r##"<article class="page page-cartridges" data-component="{{ page.component }}">
<h2 class="page-cartridges__title">Cartridges</h2>
{% if content_html %}<div class="page-cartridges__intro">{{ content_html | safe }}</div>
{% endif %}{% if games %}<table class="game-list">
<thead><tr><th>Game</th><th>Platform</th><th>Submissions</th></tr></thead>
<tbody>
{% for game in games %}<tr><td><a href="/cartridges/{{ game.slug }}.html">{{ game.name }}</a></td><td>{{ game.platform }}</td><td>{{ game.submissions }}</td></tr>
{% endfor %}</tbody>
</table>{% else %}<p class="page-cartridges__empty">No cartridges yet.</p>{% endif %}
</article>"##;

const CARTRIDGE_TEMPLATE: &str = r##"<article class="page page-cartridge" data-component="{{ page.component }}">
<h2 class="page-cartridge__title">{{ title }}{% if code %} <span class="page-cartridge__code">{{ code }}</span>{% endif %}</h2>
<dl class="page-cartridge__details">
{% if game %}<dt>Game</dt><dd>{% if game_slug %}<a href="/cartridges/{{ game_slug }}.html">{{ game }}</a>{% else %}{{ game }}{% endif %}</dd>
{% endif %}{% if board %}<dt>Board</dt><dd>{{ board }}</dd>
{% endif %}{% if mapper %}<dt>Mapper</dt><dd>{{ mapper }}</dd>
{% endif %}{% if contributor %}<dt>Contributor</dt><dd>{{ contributor }}</dd>
{% endif %}</dl>
{% if photos %}<div class="page-cartridge__photos">
{% for photo in photos %}<a href="{{ photo.url }}"><img src="{{ photo.url }}" alt="{{ photo.caption }}"></a>
{% endfor %}</div>
{% endif %}{% if content_html %}<div class="page-cartridge__notes">{{ content_html | safe }}</div>
{% endif %}</article>"##;

const GAME_TEMPLATE: &str = r##"<article class="page page-game" data-component="{{ page.component }}">
<h2 class="page-game__title">{{ title }}</h2>
{% if platform %}<p class="page-game__platform">Platform: {{ platform }}</p>
{% endif %}{% if content_html %}<div class="page-game__intro">{{ content_html | safe }}</div>
{% endif %}{% if submissions %}<table class="submission-list">
<thead><tr><th>Entry</th><th>Board</th><th>Contributor</th></tr></thead>
<tbody>
{% for submission in submissions %}<tr><td><a href="/cartridges/{{ submission.slug }}.html">{{ submission.title }}</a></td><td>{{ submission.board }}</td><td>{{ submission.contributor }}</td></tr>
{% endfor %}</tbody>
</table>{% else %}<p class="page-game__empty">No submissions yet.</p>{% endif %}
</article>"##;

const MAPPER_TEMPLATE: &str = r##"<article class="page page-mapper" data-component="{{ page.component }}">
<h2 class="page-mapper__title">{{ name }}</h2>
{% if content_html %}<div class="page-mapper__intro">{{ content_html | safe }}</div>
{% endif %}{% if games %}<h3>Games using this mapper</h3>
<ul class="page-mapper__games">
{% for game in games %}<li><a href="/cartridges/{{ game.slug }}.html">{{ game.name }}</a></li>
{% endfor %}</ul>
{% endif %}</article>"##;

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn registers_all_templates() {
        let engine = TemplateEngine::new().unwrap();

        for name in [
            "site.html",
            "header.html",
            "footer.html",
            "pages/console.html",
            "pages/cartridges.html",
            "pages/cartridge.html",
            "pages/game.html",
            "pages/mapper.html",
        ] {
            assert!(engine.env.get_template(name).is_ok(), "missing {name}");
        }
    }

    #[test]
    fn escapes_interpolated_text() {
        let engine = TemplateEngine::new().unwrap();

        let html = engine
            .render(
                "pages/game.html",
                context! {
                    page => context! { component => "Game" },
                    title => "<script>",
                },
            )
            .unwrap();

        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn renders_empty_list_message() {
        let engine = TemplateEngine::new().unwrap();

        let html = engine
            .render(
                "pages/cartridges.html",
                context! { page => context! { component => "Cartridges" } },
            )
            .unwrap();

        assert!(html.contains("No cartridges yet."));
    }
}
