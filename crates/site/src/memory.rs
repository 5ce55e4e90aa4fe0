//! In-memory menu store.
//!
//! Enforces the same uniqueness rules a database schema would: one menu per
//! `(site, name)`, one item per `(menu, page)`, and one item per
//! `(menu, order)`. Each trait call holds the lock for its whole duration, so
//! `ensure_menu` and `insert_page_item` are atomic here.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::model::{ItemId, Menu, MenuId, MenuItem, MenuTarget, NewMenuItem, PageId, SiteId};
use crate::store::{MenuStore, PageItemInsert, StoreError};

#[derive(Debug, Default)]
struct State {
    menus: Vec<Menu>,
    items: Vec<MenuItem>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn menu(&self, site: &SiteId, name: &str) -> Option<&Menu> {
        self.menus
            .iter()
            .find(|menu| &menu.site_id == site && menu.name == name)
    }

    fn has_menu(&self, id: &MenuId) -> bool {
        self.menus.iter().any(|menu| &menu.id == id)
    }

    fn page_item(&self, menu: &MenuId, page: &PageId) -> Option<&MenuItem> {
        self.items
            .iter()
            .find(|item| &item.menu_id == menu && item.page_id() == Some(page))
    }

    fn max_order(&self, menu: &MenuId) -> Option<i64> {
        self.items
            .iter()
            .filter(|item| &item.menu_id == menu)
            .map(|item| item.order)
            .max()
    }

    fn order_taken(&self, menu: &MenuId, order: i64, except: Option<&ItemId>) -> bool {
        self.items.iter().any(|item| {
            &item.menu_id == menu && item.order == order && Some(&item.id) != except
        })
    }

    fn item_mut(&mut self, id: &ItemId) -> Result<&mut MenuItem, StoreError> {
        self.items
            .iter_mut()
            .find(|item| &item.id == id)
            .ok_or_else(|| StoreError::NotFound {
                kind: "menu item",
                id: id.to_string(),
            })
    }

    fn create_menu(&mut self, site: &SiteId, name: &str) -> Result<Menu, StoreError> {
        if self.menu(site, name).is_some() {
            return Err(StoreError::Constraint {
                constraint: format!("menu (site, name) = ({site}, {name})"),
            });
        }
        let menu = Menu {
            id: MenuId::new(self.next_id("menu")),
            site_id: site.clone(),
            name: name.to_string(),
        };
        self.menus.push(menu.clone());
        Ok(menu)
    }

    fn create_item(&mut self, menu: &MenuId, item: NewMenuItem) -> Result<MenuItem, StoreError> {
        if !self.has_menu(menu) {
            return Err(StoreError::NotFound {
                kind: "menu",
                id: menu.to_string(),
            });
        }
        if let MenuTarget::Page(page) = &item.target {
            if self.page_item(menu, page).is_some() {
                return Err(StoreError::Constraint {
                    constraint: format!("menu item (menu, page) = ({menu}, {page})"),
                });
            }
        }
        if self.order_taken(menu, item.order, None) {
            return Err(StoreError::Constraint {
                constraint: format!("menu item (menu, order) = ({menu}, {})", item.order),
            });
        }
        let item = MenuItem {
            id: ItemId::new(self.next_id("item")),
            menu_id: menu.clone(),
            label: item.label,
            order: item.order,
            target: item.target,
        };
        self.items.push(item.clone());
        Ok(item)
    }
}

/// In-memory implementation of [`MenuStore`].
///
/// Clones share the same data.
#[derive(Debug)]
pub struct MemoryMenuStore {
    state: Arc<RwLock<State>>,
}

impl Default for MemoryMenuStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryMenuStore {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl MemoryMenuStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
        }
    }

    /// Total number of items across all menus.
    pub fn item_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.items.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable {
        message: "menu store lock poisoned".to_string(),
    }
}

impl MenuStore for MemoryMenuStore {
    fn find_menu(&self, site: &SiteId, name: &str) -> Result<Option<Menu>, StoreError> {
        Ok(self.read()?.menu(site, name).cloned())
    }

    fn create_menu(&self, site: &SiteId, name: &str) -> Result<Menu, StoreError> {
        self.write()?.create_menu(site, name)
    }

    fn delete_menu(&self, menu: &MenuId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if !state.has_menu(menu) {
            return Err(StoreError::NotFound {
                kind: "menu",
                id: menu.to_string(),
            });
        }
        state.menus.retain(|existing| &existing.id != menu);
        state.items.retain(|item| &item.menu_id != menu);
        Ok(())
    }

    fn find_page_item(
        &self,
        menu: &MenuId,
        page: &PageId,
    ) -> Result<Option<MenuItem>, StoreError> {
        Ok(self.read()?.page_item(menu, page).cloned())
    }

    fn create_item(&self, menu: &MenuId, item: NewMenuItem) -> Result<MenuItem, StoreError> {
        self.write()?.create_item(menu, item)
    }

    fn update_item_label(&self, item: &ItemId, label: &str) -> Result<MenuItem, StoreError> {
        let mut state = self.write()?;
        let item = state.item_mut(item)?;
        item.label = label.to_string();
        Ok(item.clone())
    }

    fn set_item_order(&self, item: &ItemId, order: i64) -> Result<MenuItem, StoreError> {
        let mut state = self.write()?;
        let menu = state.item_mut(item)?.menu_id.clone();
        if state.order_taken(&menu, order, Some(item)) {
            return Err(StoreError::Constraint {
                constraint: format!("menu item (menu, order) = ({menu}, {order})"),
            });
        }
        let item = state.item_mut(item)?;
        item.order = order;
        Ok(item.clone())
    }

    fn delete_item(&self, item: &ItemId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let before = state.items.len();
        state.items.retain(|existing| &existing.id != item);
        if state.items.len() == before {
            return Err(StoreError::NotFound {
                kind: "menu item",
                id: item.to_string(),
            });
        }
        Ok(())
    }

    fn max_order(&self, menu: &MenuId) -> Result<Option<i64>, StoreError> {
        Ok(self.read()?.max_order(menu))
    }

    fn menus_for_site(&self, site: &SiteId) -> Result<Vec<Menu>, StoreError> {
        Ok(self
            .read()?
            .menus
            .iter()
            .filter(|menu| &menu.site_id == site)
            .cloned()
            .collect())
    }

    fn items(&self, menu: &MenuId) -> Result<Vec<MenuItem>, StoreError> {
        let mut items: Vec<MenuItem> = self
            .read()?
            .items
            .iter()
            .filter(|item| &item.menu_id == menu)
            .cloned()
            .collect();
        items.sort_by_key(|item| item.order);
        Ok(items)
    }

    fn ensure_menu(&self, site: &SiteId, name: &str) -> Result<(Menu, bool), StoreError> {
        let mut state = self.write()?;
        if let Some(menu) = state.menu(site, name) {
            return Ok((menu.clone(), false));
        }
        Ok((state.create_menu(site, name)?, true))
    }

    fn insert_page_item(
        &self,
        menu: &MenuId,
        page: &PageId,
        label: &str,
    ) -> Result<PageItemInsert, StoreError> {
        let mut state = self.write()?;
        if let Some(existing) = state.page_item(menu, page) {
            return Ok(PageItemInsert::Existing(existing.clone()));
        }
        let order = state.max_order(menu).unwrap_or(0) + 1;
        let item = state.create_item(
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
