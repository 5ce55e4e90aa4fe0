//! Identifiers and menu records shared by the store and the reconciler.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The identifier text.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }
    };
}

id_type!(
    /// Identifies a site (tenant).
    SiteId
);
id_type!(
    /// Identifies a page within a site.
    PageId
);
id_type!(
    /// Identifies a menu.
    MenuId
);
id_type!(
    /// Identifies a menu item.
    ItemId
);

/// The menus a page can opt into through its frontmatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MenuName {
    /// Header navigation.
    Main,
    /// Footer links.
    Footer,
}

impl MenuName {
    /// Every page-managed menu, in sync order.
    pub const ALL: [MenuName; 2] = [MenuName::Main, MenuName::Footer];

    /// The stored menu name.
    pub fn as_str(self) -> &'static str {
        match self {
            MenuName::Main => "Main",
            MenuName::Footer => "Footer",
        }
    }
}

impl fmt::Display for MenuName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no page-managed menu.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown menu name: {0}")]
pub struct UnknownMenuName(pub String);

impl FromStr for MenuName {
    type Err = UnknownMenuName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Main" => Ok(MenuName::Main),
            "Footer" => Ok(MenuName::Footer),
            other => Err(UnknownMenuName(other.to_string())),
        }
    }
}

/// A named, ordered collection of navigation items for one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    /// Menu id.
    pub id: MenuId,
    /// Owning site.
    pub site_id: SiteId,
    /// Name, unique per site.
    pub name: String,
}

/// Where a menu item points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MenuTarget {
    /// A page of the same site.
    Page(PageId),
    /// An external or absolute URL.
    Url(String),
}

/// One entry in a menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Item id.
    pub id: ItemId,
    /// Owning menu.
    pub menu_id: MenuId,
    /// Display text.
    pub label: String,
    /// Display position; ascending, unique per menu, gaps allowed.
    pub order: i64,
    /// Link target.
    pub target: MenuTarget,
}

impl MenuItem {
    /// The page this item links to, if it is a page item.
    pub fn page_id(&self) -> Option<&PageId> {
        match &self.target {
            MenuTarget::Page(page) => Some(page),
            MenuTarget::Url(_) => None,
        }
    }
}

/// Fields for a new item; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMenuItem {
    /// Display text.
    pub label: String,
    /// Display position.
    pub order: i64,
    /// Link target.
    pub target: MenuTarget,
}
