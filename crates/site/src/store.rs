//! The persistence collaborator the reconciler writes through.
//!
//! Every method is one atomic call from the caller's point of view. The
//! provided `ensure_menu` and `insert_page_item` fall back to two-step
//! read-then-write sequences; stores that can enforce uniqueness should
//! override them with a single conditional write.

use thiserror::Error;

use crate::model::{ItemId, Menu, MenuId, MenuItem, MenuTarget, NewMenuItem, PageId, SiteId};

/// Errors reported by a menu store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("store unavailable: {message}")]
    Unavailable {
        /// Backend-specific reason.
        message: String,
    },

    /// A write would break a uniqueness rule.
    #[error("constraint violation: {constraint}")]
    Constraint {
        /// Which rule was violated.
        constraint: String,
    },

    /// The referenced record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Record type.
        kind: &'static str,
        /// Requested id.
        id: String,
    },
}

/// Outcome of [`MenuStore::insert_page_item`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageItemInsert {
    /// A new item was appended.
    Inserted(MenuItem),
    /// The page already had an item in the menu; nothing was written.
    Existing(MenuItem),
}

/// Menu persistence used by the reconciler and the menu editor.
pub trait MenuStore: Send + Sync {
    /// Finds a site's menu by name.
    fn find_menu(&self, site: &SiteId, name: &str) -> Result<Option<Menu>, StoreError>;

    /// Creates an empty menu. Fails with `Constraint` if the name is taken.
    fn create_menu(&self, site: &SiteId, name: &str) -> Result<Menu, StoreError>;

    /// Removes a menu together with its items.
    fn delete_menu(&self, menu: &MenuId) -> Result<(), StoreError>;

    /// Finds the page's item in a menu.
    fn find_page_item(&self, menu: &MenuId, page: &PageId)
    -> Result<Option<MenuItem>, StoreError>;

    /// Adds an item to a menu.
    fn create_item(&self, menu: &MenuId, item: NewMenuItem) -> Result<MenuItem, StoreError>;

    /// Replaces an item's label, leaving id and order alone.
    fn update_item_label(&self, item: &ItemId, label: &str) -> Result<MenuItem, StoreError>;

    /// Moves an item to another position.
    fn set_item_order(&self, item: &ItemId, order: i64) -> Result<MenuItem, StoreError>;

    /// Removes an item. Remaining orders are not renumbered.
    fn delete_item(&self, item: &ItemId) -> Result<(), StoreError>;

    /// Highest order in a menu, `None` when empty.
    fn max_order(&self, menu: &MenuId) -> Result<Option<i64>, StoreError>;

    /// All menus of a site, in creation order.
    fn menus_for_site(&self, site: &SiteId) -> Result<Vec<Menu>, StoreError>;

    /// A menu's items in ascending order.
    fn items(&self, menu: &MenuId) -> Result<Vec<MenuItem>, StoreError>;

    /// Finds or creates a menu. The flag is true when the menu was created.
    fn ensure_menu(&self, site: &SiteId, name: &str) -> Result<(Menu, bool), StoreError> {
        if let Some(menu) = self.find_menu(site, name)? {
            return Ok((menu, false));
        }
        Ok((self.create_menu(site, name)?, true))
    }

    /// Appends an item for `page` at `max(order) + 1` unless one exists.
    fn insert_page_item(
        &self,
        menu: &MenuId,
        page: &PageId,
        label: &str,
    ) -> Result<PageItemInsert, StoreError> {
        if let Some(existing) = self.find_page_item(menu, page)? {
            return Ok(PageItemInsert::Existing(existing));
        }
        let order = self.max_order(menu)?.unwrap_or(0) + 1;
        let item = self.create_item(
            menu,
            NewMenuItem {
                label: label.to_string(),
                order,
                target: MenuTarget::Page(page.clone()),
            },
        )?;
        Ok(PageItemInsert::Inserted(item))
    }
}
