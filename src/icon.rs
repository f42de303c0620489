//! Named icons for content sections and category headers.
//!
//! Icon names arrive as free text from the admin API. They are resolved
//! against a fixed table; anything unknown becomes [`Icon::Default`].
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Icon {
    #[default]
    Default,
    Briefcase,
    Code,
    Palette,
    Megaphone,
    Headset,
    Question,
    Shield,
    Wallet,
    Globe,
    Users,
    Book,
}

const ICONS: &[(&str, Icon)] = &[
    ("default", Icon::Default),
    ("briefcase", Icon::Briefcase),
    ("code", Icon::Code),
    ("palette", Icon::Palette),
    ("megaphone", Icon::Megaphone),
    ("headset", Icon::Headset),
    ("question", Icon::Question),
    ("shield", Icon::Shield),
    ("wallet", Icon::Wallet),
    ("globe", Icon::Globe),
    ("users", Icon::Users),
    ("book", Icon::Book),
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown icon name: {0}")]
pub struct UnknownIcon(pub String);

impl Icon {
    /// Exact lookup, case-insensitive.
    pub fn lookup(name: &str) -> Option<Icon> {
        let name = name.trim();
        ICONS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, icon)| *icon)
    }

    /// Lookup that never fails.
    pub fn resolve(name: &str) -> Icon {
        Icon::lookup(name).unwrap_or_else(|| {
            warn!(name, "unknown icon name, using default");
            Icon::Default
        })
    }

    pub fn name(&self) -> &'static str {
        ICONS
            .iter()
            .find(|(_, icon)| icon == self)
            .map(|(name, _)| *name)
            .unwrap_or("default")
    }

    pub fn all() -> impl Iterator<Item = Icon> {
        ICONS.iter().map(|(_, icon)| *icon)
    }
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Icon {
    type Err = UnknownIcon;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Icon::lookup(s).ok_or_else(|| UnknownIcon(s.to_string()))
    }
}

impl Serialize for Icon {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Icon {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Icon::resolve(&raw))
    }
}
