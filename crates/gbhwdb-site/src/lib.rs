//! Page renderer and static page builder for the Game Boy hardware database.
//!
//! A page request names one of a closed set of page types; the renderer
//! selects the matching page component and wraps it in the shared site shell
//! (head metadata, header navigation, footer).

pub mod builder;
pub mod config;
pub mod navigation;
pub mod page;
pub mod renderer;
pub mod templates;

pub use builder::{BuildConfig, BuildError, BuildResult, SiteBuilder, SubmissionCounts};
pub use config::{load_toml, ConfigError, ConsoleCfg, SiteConfig, SiteFile};
pub use navigation::{NavEntry, Navigation};
pub use page::{Console, PageType};
pub use renderer::{RenderError, SiteProps, SiteRenderer};
