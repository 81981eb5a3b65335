use serde::{Deserialize, Serialize};

use crate::space::Identity;
use crate::storage::KeyValueStore;

/// Key holding the preferred colour scheme
pub const THEME_KEY: &str = "hackbuddy-theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Stored theme, dark when nothing valid is stored
pub fn load_theme(store: &impl KeyValueStore) -> Theme {
    store
        .get(THEME_KEY)
        .and_then(|value| Theme::parse(&value))
        .unwrap_or_default()
}

pub fn save_theme(store: &mut impl KeyValueStore, theme: Theme) {
    store.set(THEME_KEY, theme.as_str());
}

/// Theme-aware accent colour for a space
///
/// # Arguments
/// * `identity` - Active identity, `None` for the shared space
/// * `theme` - Current theme
///
/// # Returns
/// * `&'static str` - Background class for the space header
pub fn space_color(identity: Option<Identity>, theme: Theme) -> &'static str {
    match (identity, theme) {
        (Some(Identity::Macha), Theme::Dark) => "bg-purple-700",
        (Some(Identity::Macha), Theme::Light) => "bg-purple-500",
        (Some(Identity::Veerendra), Theme::Dark) => "bg-blue-700",
        (Some(Identity::Veerendra), Theme::Light) => "bg-blue-500",
        (None, Theme::Dark) => "bg-indigo-700",
        (None, Theme::Light) => "bg-indigo-500",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn defaults_to_dark() {
        assert_eq!(load_theme(&MemoryStore::new()), Theme::Dark);
        let garbage = MemoryStore::with_entries([(THEME_KEY, "sepia")]);
        assert_eq!(load_theme(&garbage), Theme::Dark);
    }

    #[test]
    fn toggle_persists() {
        let mut store = MemoryStore::new();
        let theme = load_theme(&store).toggle();
        save_theme(&mut store, theme);

        assert_eq!(store.get(THEME_KEY).as_deref(), Some("light"));
        assert_eq!(load_theme(&store), Theme::Light);
        assert_eq!(Theme::Light.toggle(), Theme::Dark);
    }

    #[test]
    fn color_depends_on_theme() {
        assert_eq!(space_color(Some(Identity::Macha), Theme::Dark), "bg-purple-700");
        assert_eq!(space_color(Some(Identity::Veerendra), Theme::Light), "bg-blue-500");
        assert_eq!(space_color(None, Theme::Light), "bg-indigo-500");
    }
}
