//! The closed set of page types the site can render.

use std::fmt;

/// A console hardware model with its own submission page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Console {
    Dmg,
    Sgb,
    Mgb,
    Mgl,
    Sgb2,
    Cgb,
    Agb,
    Ags,
    Gbs,
    Oxy,
}

impl Console {
    /// All console models in their canonical order.
    pub const ALL: [Console; 10] = [
        Console::Dmg,
        Console::Sgb,
        Console::Mgb,
        Console::Mgl,
        Console::Sgb2,
        Console::Cgb,
        Console::Agb,
        Console::Ags,
        Console::Gbs,
        Console::Oxy,
    ];

    /// Lowercase model code (e.g. "dmg").
    pub fn code(self) -> &'static str {
        match self {
            Console::Dmg => "dmg",
            Console::Sgb => "sgb",
            Console::Mgb => "mgb",
            Console::Mgl => "mgl",
            Console::Sgb2 => "sgb2",
            Console::Cgb => "cgb",
            Console::Agb => "agb",
            Console::Ags => "ags",
            Console::Gbs => "gbs",
            Console::Oxy => "oxy",
        }
    }

    /// Look up a console by its model code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Display name used when the configuration does not override it.
    pub fn default_name(self) -> &'static str {
        match self {
            Console::Dmg => "Game Boy",
            Console::Sgb => "Super Game Boy",
            Console::Mgb => "Game Boy Pocket",
            Console::Mgl => "Game Boy Light",
            Console::Sgb2 => "Super Game Boy 2",
            Console::Cgb => "Game Boy Color",
            Console::Agb => "Game Boy Advance",
            Console::Ags => "Game Boy Advance SP",
            Console::Gbs => "Game Boy Player",
            Console::Oxy => "Game Boy Micro",
        }
    }
}

/// Page type selecting which page component renders the content region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageType {
    Console(Console),
    Cartridges,
    Cartridge,
    Game,
    Mapper,
}

impl PageType {
    /// Parse a page type tag such as `dmg-console` or `game`.
    ///
    /// Returns `None` for tags outside the closed set.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "cartridges" => Some(PageType::Cartridges),
            "cartridge" => Some(PageType::Cartridge),
            "game" => Some(PageType::Game),
            "mapper" => Some(PageType::Mapper),
            _ => tag
                .strip_suffix("-console")
                .and_then(Console::from_code)
                .map(PageType::Console),
        }
    }

    /// Every page type, consoles first.
    pub fn all() -> impl Iterator<Item = PageType> {
        Console::ALL
            .into_iter()
            .map(PageType::Console)
            .chain([
                PageType::Cartridges,
                PageType::Cartridge,
                PageType::Game,
                PageType::Mapper,
            ])
    }

    /// Name of the page component rendering this page type.
    pub fn component(self) -> &'static str {
        match self {
            PageType::Console(console) => match console {
                Console::Dmg => "DmgConsole",
                Console::Sgb => "SgbConsole",
                Console::Mgb => "MgbConsole",
                Console::Mgl => "MglConsole",
                Console::Sgb2 => "Sgb2Console",
                Console::Cgb => "CgbConsole",
                Console::Agb => "AgbConsole",
                Console::Ags => "AgsConsole",
                Console::Gbs => "GbsConsole",
                Console::Oxy => "OxyConsole",
            },
            PageType::Cartridges => "Cartridges",
            PageType::Cartridge => "Cartridge",
            PageType::Game => "Game",
            PageType::Mapper => "Mapper",
        }
    }

    /// Template implementing the page component.
    pub(crate) fn template(self) -> &'static str {
        match self {
            PageType::Console(_) => "pages/console.html",
            PageType::Cartridges => "pages/cartridges.html",
            PageType::Cartridge => "pages/cartridge.html",
            PageType::Game => "pages/game.html",
            PageType::Mapper => "pages/mapper.html",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageType::Console(console) => write!(f, "{}-console", console.code()),
            PageType::Cartridges => f.write_str("cartridges"),
            PageType::Cartridge => f.write_str("cartridge"),
            PageType::Game => f.write_str("game"),
            PageType::Mapper => f.write_str("mapper"),
        }
    }
}
