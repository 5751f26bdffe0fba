//! Color themes applied to the document class.

use serde::Serialize;
use tracing::warn;

/// Line in the stock class file that selects the accent color.
pub const COLOR_MARKER: &str = "\\colorlet{awesome}{awesome-red}";

/// Themes the class file defines itself.
pub const STANDARD_STYLES: &[(&str, &str)] = &[
    ("emerald", "#00A388"),
    ("skyblue", "#0395DE"),
    ("red", "#DC3522"),
    ("pink", "#EF4089"),
    ("orange", "#FF6138"),
    ("nephritis", "#27AE60"),
    ("concrete", "#95A5A6"),
    ("darknight", "#131A28"),
];

/// Extra themes; their color is defined from the hex code when applied.
pub const EXTENDED_STYLES: &[(&str, &str)] = &[
    ("royal-blue", "#4169E1"),
    ("navy", "#000080"),
    ("azure", "#007FFF"),
    ("cobalt", "#0047AB"),
    ("teal", "#008080"),
    ("turquoise", "#40E0D0"),
    ("cerulean", "#007BA7"),
    ("steel-blue", "#4682B4"),
    ("forest", "#228B22"),
    ("mint", "#98FB98"),
    ("olive", "#808000"),
    ("sage", "#BCB88A"),
    ("lime", "#32CD32"),
    ("hunter", "#355E3B"),
    ("jade", "#00A86B"),
    ("crimson", "#DC143C"),
    ("ruby", "#E0115F"),
    ("maroon", "#800000"),
    ("coral", "#FF7F50"),
    ("salmon", "#FA8072"),
    ("burgundy", "#800020"),
    ("rose", "#FF007F"),
    ("violet", "#8F00FF"),
    ("lavender", "#B57EDC"),
    ("plum", "#8E4585"),
    ("magenta", "#FF00FF"),
    ("amethyst", "#9966CC"),
    ("indigo", "#4B0082"),
    ("orchid", "#DA70D6"),
    ("chocolate", "#7B3F00"),
    ("coffee", "#6F4E37"),
    ("tan", "#D2B48C"),
    ("sienna", "#A0522D"),
    ("mocha", "#A38068"),
    ("khaki", "#C3B091"),
    ("beige", "#F5F5DC"),
    ("amber", "#FFBF00"),
    ("gold", "#FFD700"),
    ("bronze", "#CD7F32"),
    ("honey", "#E6C700"),
    ("tangerine", "#F28500"),
    ("apricot", "#FBCEB1"),
    ("marigold", "#EAA221"),
    ("charcoal", "#36454F"),
    ("slate", "#708090"),
    ("graphite", "#464646"),
    ("silver", "#C0C0C0"),
    ("onyx", "#353839"),
    ("jet", "#343434"),
    ("ebony", "#555D50"),
];

pub const COLOR_FAMILIES: &[(&str, &[&str])] = &[
    (
        "Blues",
        &["skyblue", "royal-blue", "navy", "azure", "cobalt", "teal", "turquoise", "cerulean", "steel-blue"],
    ),
    (
        "Greens",
        &["emerald", "nephritis", "forest", "mint", "olive", "sage", "lime", "hunter", "jade"],
    ),
    (
        "Reds & Pinks",
        &["red", "pink", "crimson", "ruby", "maroon", "coral", "salmon", "burgundy", "rose"],
    ),
    (
        "Purples",
        &["violet", "lavender", "plum", "magenta", "amethyst", "indigo", "orchid"],
    ),
    (
        "Browns & Neutrals",
        &["chocolate", "coffee", "tan", "sienna", "mocha", "khaki", "beige"],
    ),
    (
        "Yellows & Oranges",
        &["orange", "amber", "gold", "bronze", "honey", "tangerine", "apricot", "marigold"],
    ),
    (
        "Grays & Blacks",
        &["concrete", "darknight", "charcoal", "slate", "graphite", "silver", "onyx", "jet", "ebony"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Style {
    pub name: &'static str,
    pub hex: &'static str,
    pub standard: bool,
}

impl Style {
    /// Looks a theme up by name, standard themes first.
    pub fn lookup(name: &str) -> Option<Style> {
        let find = |table: &'static [(&'static str, &'static str)], standard| {
            table
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(name, hex)| Style { name, hex, standard })
        };
        find(STANDARD_STYLES, true).or_else(|| find(EXTENDED_STYLES, false))
    }

    pub fn standard() -> impl Iterator<Item = Style> {
        STANDARD_STYLES.iter().map(|(name, hex)| Style {
            name,
            hex,
            standard: true,
        })
    }

    pub fn all() -> impl Iterator<Item = Style> {
        Self::standard().chain(EXTENDED_STYLES.iter().map(|(name, hex)| Style {
            name,
            hex,
            standard: false,
        }))
    }

    /// Markup that selects this theme in place of [`COLOR_MARKER`].
    fn color_commands(&self) -> String {
        let select = format!("\\colorlet{{awesome}}{{awesome-{}}}", self.name);
        if self.standard {
            select
        } else {
            format!(
                "\\definecolor{{awesome-{}}}{{HTML}}{{{}}}\n{select}",
                self.name,
                self.hex.trim_start_matches('#')
            )
        }
    }

    /// Returns the class file with this theme selected. A class without the
    /// marker line is returned unchanged.
    pub fn apply(&self, class_text: &str) -> String {
        if !class_text.contains(COLOR_MARKER) {
            warn!("Color marker not found in class file; '{}' not applied", self.name);
            return class_text.to_string();
        }
        class_text.replacen(COLOR_MARKER, &self.color_commands(), 1)
    }
}
