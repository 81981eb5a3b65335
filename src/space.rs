use serde::{Deserialize, Serialize};
use std::fmt;

/// Accepted security codes for Macha's personal space
pub const MACHA_CODES: [&str; 2] = ["MACH4-2X5P", "MACH4-7Y3Q"];

/// Accepted security codes for Veerendra's personal space
pub const VEERENDRA_CODES: [&str; 2] = ["V33R-8K7Z", "V33R-9L2P"];

/// One of the two users who own a personal space
///
/// The shared dashboard has no identity at all, so callers hold an
/// `Option<Identity>` and treat `None` as the "Both" space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Identity {
    Macha,
    Veerendra,
}

impl Identity {
    /// Parse the lowercase identity string used in paths and storage
    ///
    /// # Arguments
    /// * `value` - Raw value, e.g. `"macha"`
    ///
    /// # Returns
    /// * `Option<Identity>` - The identity, or `None` for anything else
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "macha" => Some(Identity::Macha),
            "veerendra" => Some(Identity::Veerendra),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Identity::Macha => "macha",
            Identity::Veerendra => "veerendra",
        }
    }

    pub fn label(&self) -> SpaceLabel {
        match self {
            Identity::Macha => SpaceLabel::Macha,
            Identity::Veerendra => SpaceLabel::Veerendra,
        }
    }

    /// Security codes that unlock this identity's space
    pub fn codes(&self) -> &'static [&'static str] {
        match self {
            Identity::Macha => &MACHA_CODES,
            Identity::Veerendra => &VEERENDRA_CODES,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display label of a space, also used to scope board rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpaceLabel {
    Macha,
    Veerendra,
    Both,
}

impl SpaceLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpaceLabel::Macha => "Macha",
            SpaceLabel::Veerendra => "Veerendra",
            SpaceLabel::Both => "Both",
        }
    }

    /// Identity behind the label, `None` for the shared space
    pub fn identity(&self) -> Option<Identity> {
        match self {
            SpaceLabel::Macha => Some(Identity::Macha),
            SpaceLabel::Veerendra => Some(Identity::Veerendra),
            SpaceLabel::Both => None,
        }
    }

    /// Accent class used for the space badge and header
    pub fn accent_color(&self) -> &'static str {
        match self {
            SpaceLabel::Macha => "bg-purple-600",
            SpaceLabel::Veerendra => "bg-blue-600",
            SpaceLabel::Both => "bg-slate-600",
        }
    }
}

impl fmt::Display for SpaceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved space for a single navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Space {
    pub identity: Option<Identity>,
    pub label: SpaceLabel,
}

impl Space {
    pub const SHARED: Space = Space {
        identity: None,
        label: SpaceLabel::Both,
    };

    pub fn of(identity: Identity) -> Self {
        Space {
            identity: Some(identity),
            label: identity.label(),
        }
    }
}

/// Resolve the active space from a navigation path
///
/// A path mentioning `macha` wins over one mentioning `veerendra`; when the
/// path names neither, the remembered identity (the raw `current-user-id`
/// value) is used, and anything unrecognised falls back to the shared space.
///
/// # Arguments
/// * `path` - Current navigation path, e.g. `/veerendra/projects`
/// * `remembered` - Previously stored identity, if any
///
/// # Returns
/// * `Space` - Identity and label for this navigation
///
/// # Examples
/// ```
/// use hackbuddy::space::{resolve_space, Identity, SpaceLabel};
///
/// let space = resolve_space("/macha", None);
/// assert_eq!(space.identity, Some(Identity::Macha));
///
/// let shared = resolve_space("/hackathons", None);
/// assert_eq!(shared.label, SpaceLabel::Both);
/// ```
pub fn resolve_space(path: &str, remembered: Option<&str>) -> Space {
    if path.contains("macha") {
        return Space::of(Identity::Macha);
    }
    if path.contains("veerendra") {
        return Space::of(Identity::Veerendra);
    }

    match remembered.and_then(Identity::parse) {
        Some(identity) => Space::of(identity),
        None => Space::SHARED,
    }
}
