//! Static reference data: the pictogram symbol catalog, the default location
//! list, attack methods and category icons.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::{Category, Location, Symbol, SymbolSelection};

pub const EVERYTHING_FINE_ID: &str = "everything_fine";

const SYMBOLS: [(&str, &str, Category); 13] = [
    (EVERYTHING_FINE_ID, "Everything is fine", Category::General),
    ("push", "Pousser", Category::Physical),
    ("hit", "Frapper", Category::Physical),
    ("kick", "Donner un coup de pied", Category::Physical),
    ("pull", "Tirer", Category::Physical),
    ("insult", "Insulter", Category::Verbal),
    ("mock", "Se moquer", Category::Verbal),
    ("threat", "Menacer", Category::Verbal),
    ("exclude", "Exclure", Category::Social),
    ("ignore", "Ignorer", Category::Social),
    ("rumor", "Rumeurs", Category::Social),
    ("online", "Harcèlement en ligne", Category::Cyber),
    ("photo", "Photo partagée", Category::Cyber),
];

const LOCATIONS: [(&str, &str, &str); 7] = [
    ("classroom", "Salle de classe", "🏫"),
    ("playground", "Cour de récréation", "🏃"),
    ("cafeteria", "Cantine", "🍽️"),
    ("hallway", "Couloir", "🚪"),
    ("bathroom", "Toilettes", "🚻"),
    ("bus", "Bus scolaire", "🚌"),
    ("online", "En ligne", "💻"),
];

pub fn symbols() -> Vec<Symbol> {
    SYMBOLS
        .iter()
        .map(|(id, label, category)| Symbol {
            id: id.to_string(),
            label: label.to_string(),
            category: *category,
        })
        .collect()
}

pub fn symbols_in(category: Category) -> Vec<Symbol> {
    symbols()
        .into_iter()
        .filter(|symbol| symbol.category == category)
        .collect()
}

pub fn find_symbol(id: &str) -> Option<Symbol> {
    symbols().into_iter().find(|symbol| symbol.id == id)
}

pub fn everything_fine() -> SymbolSelection {
    SymbolSelection {
        id: EVERYTHING_FINE_ID.to_string(),
        label: "Everything is fine".to_string(),
        category: Category::General,
    }
}

pub fn default_locations() -> Vec<Location> {
    LOCATIONS
        .iter()
        .map(|(id, name, icon)| Location {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
        })
        .collect()
}

/// Used by the "everything is fine" shortcut when no location list loaded.
pub fn fallback_location() -> Location {
    Location {
        id: "general".to_string(),
        name: "General".to_string(),
        icon: "🏫".to_string(),
    }
}

/// How a physical incident was carried out. Every physical symbol is exactly
/// one method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackMethod {
    Pousser,
    Frapper,
    CoupDePied,
    Tirer,
}

impl AttackMethod {
    pub const ALL: [AttackMethod; 4] = [
        AttackMethod::Pousser,
        AttackMethod::Frapper,
        AttackMethod::CoupDePied,
        AttackMethod::Tirer,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            AttackMethod::Pousser => "pousser",
            AttackMethod::Frapper => "frapper",
            AttackMethod::CoupDePied => "coup_de_pied",
            AttackMethod::Tirer => "tirer",
        }
    }

    pub fn symbol_id(self) -> &'static str {
        match self {
            AttackMethod::Pousser => "push",
            AttackMethod::Frapper => "hit",
            AttackMethod::CoupDePied => "kick",
            AttackMethod::Tirer => "pull",
        }
    }

    pub fn from_symbol_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.symbol_id() == id)
    }

    pub fn to_selection(self) -> SymbolSelection {
        let label = SYMBOLS
            .iter()
            .find(|(id, _, _)| *id == self.symbol_id())
            .map(|(_, label, _)| label.to_string())
            .unwrap_or_else(|| self.tag().to_string());
        SymbolSelection {
            id: self.symbol_id().to_string(),
            label,
            category: Category::Physical,
        }
    }
}

impl fmt::Display for AttackMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for AttackMethod {
    type Err = ValidationError;

    /// Accepts either the method tag or the matching symbol id.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|method| method.tag() == wanted || method.symbol_id() == wanted)
            .ok_or(ValidationError::UnknownAttackMethod(wanted))
    }
}

/// Where an icon comes from, decided once when the catalog is authored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IconRef {
    Image { path: String },
    Glyph { symbol: String },
}

impl IconRef {
    fn image(path: &str) -> Self {
        IconRef::Image {
            path: path.to_string(),
        }
    }

    fn glyph(symbol: &str) -> Self {
        IconRef::Glyph {
            symbol: symbol.to_string(),
        }
    }

    /// Markdown rendering with `alt` as image text.
    pub fn to_markdown(&self, alt: &str) -> String {
        match self {
            IconRef::Image { path } => format!("![{alt}]({path})"),
            IconRef::Glyph { symbol } => symbol.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInfo {
    pub category: Category,
    pub label: &'static str,
    pub icon: IconRef,
}

pub fn category_info(category: Category) -> CategoryInfo {
    let (label, icon) = match category {
        Category::Physical => ("Physical Harassment", IconRef::image("icons/types/attack.png")),
        Category::Verbal => ("Verbal Harassment", IconRef::image("icons/types/mock.png")),
        Category::Social => ("Social Harassment", IconRef::image("icons/types/isolation.png")),
        Category::Cyber => ("Cyber Harassment", IconRef::glyph("💻")),
        Category::General => ("General", IconRef::glyph("✅")),
    };
    CategoryInfo {
        category,
        label,
        icon,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_ids_are_unique() {
        let all = symbols();
        let mut ids: Vec<&str> = all.iter().map(|symbol| symbol.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), all.len());
    }

    #[test]
    fn every_physical_symbol_is_an_attack_method() {
        for symbol in symbols_in(Category::Physical) {
            let method = AttackMethod::from_symbol_id(&symbol.id).unwrap();
            assert_eq!(method.to_selection(), SymbolSelection::from(&symbol));
        }
    }

    #[test]
    fn attack_methods_parse_from_tag_or_symbol() {
        assert_eq!("frapper".parse::<AttackMethod>().unwrap(), AttackMethod::Frapper);
        assert_eq!("kick".parse::<AttackMethod>().unwrap(), AttackMethod::CoupDePied);
        assert!("bite".parse::<AttackMethod>().is_err());
    }

    #[test]
    fn icons_render_by_kind() {
        assert_eq!(category_info(Category::Cyber).icon.to_markdown("cyber"), "💻");
        assert_eq!(
            category_info(Category::Verbal).icon.to_markdown("verbal"),
            "![verbal](icons/types/mock.png)"
        );
    }

    #[test]
    fn icon_serializes_as_tagged_union() {
        let json = serde_json::to_value(IconRef::glyph("💻")).unwrap();
        assert_eq!(json["kind"], "glyph");
        assert_eq!(json["symbol"], "💻");
    }
}
