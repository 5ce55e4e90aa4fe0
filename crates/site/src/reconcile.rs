//! Page-to-menu membership sync.
//!
//! For each menu the reconciler makes the store agree with one desired flag:
//! a page that wants to be listed gets exactly one item, appended after the
//! current last item; a page that does not has its item removed. Menus are
//! created on demand but never created just to record absence, and never
//! deleted. Url items are left alone.
//!
//! Menus are processed one at a time with no rollback: a failure on a later
//! menu keeps the changes already applied to earlier ones, and the error
//! carries them.

use serde::Serialize;
use thiserror::Error;

use crate::model::{ItemId, MenuId, MenuItem, MenuName, MenuTarget, NewMenuItem, PageId, SiteId};
use crate::store::{MenuStore, PageItemInsert, StoreError};

/// Label used when a page has neither a menu name nor a title.
pub const DEFAULT_LABEL: &str = "Page";

/// Picks the menu label: explicit name, else title, else `"Page"`.
pub fn item_label(name: Option<&str>, title: Option<&str>) -> String {
    name.filter(|s| !s.is_empty())
        .or(title.filter(|s| !s.is_empty()))
        .unwrap_or(DEFAULT_LABEL)
        .to_string()
}

/// One change written to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum MenuChange {
    /// The menu did not exist and was created.
    MenuCreated {
        /// Menu name.
        menu: MenuName,
        /// New menu id.
        menu_id: MenuId,
    },
    /// The page was appended to the menu.
    ItemCreated {
        /// Menu name.
        menu: MenuName,
        /// New item id.
        item_id: ItemId,
        /// Assigned position.
        order: i64,
    },
    /// The page's item got a new label.
    ItemRelabelled {
        /// Menu name.
        menu: MenuName,
        /// Item id.
        item_id: ItemId,
        /// Previous label.
        from: String,
        /// New label.
        to: String,
    },
    /// The page's item was removed.
    ItemRemoved {
        /// Menu name.
        menu: MenuName,
        /// Removed item id.
        item_id: ItemId,
    },
}

/// Changes applied by one reconciliation call, in the order they happened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Applied changes.
    pub changes: Vec<MenuChange>,
}

impl ReconcileReport {
    /// True when nothing was written.
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }
}

/// A store failure while syncing one menu.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to sync menu {menu}: {source}")]
pub struct ReconcileError {
    /// Menu being processed when the store failed.
    pub menu: MenuName,
    /// Changes that were already applied and are kept.
    pub applied: ReconcileReport,
    /// Underlying store error.
    #[source]
    pub source: StoreError,
}

/// Syncs a page's membership across menus.
pub struct MenuReconciler<'s, S: MenuStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: MenuStore + ?Sized> MenuReconciler<'s, S> {
    /// Creates a reconciler writing through `store`.
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Makes each menu in `desired` agree with its flag, in slice order.
    pub fn reconcile(
        &self,
        site: &SiteId,
        page: &PageId,
        label: &str,
        desired: &[(MenuName, bool)],
    ) -> Result<ReconcileReport, ReconcileError> {
        let mut report = ReconcileReport::default();
        for &(menu, want) in desired {
            if let Err(source) = self.sync_menu(site, page, label, menu, want, &mut report) {
                log::warn!("menu sync for page {page} stopped at {menu}: {source}");
                return Err(ReconcileError {
                    menu,
                    applied: report,
                    source,
                });
            }
        }
        Ok(report)
    }

    fn sync_menu(
        &self,
        site: &SiteId,
        page: &PageId,
        label: &str,
        menu: MenuName,
        want: bool,
        report: &mut ReconcileReport,
    ) -> Result<(), StoreError> {
        if !want {
            return self.remove(site, page, menu, report);
        }

        let (record, created) = self.store.ensure_menu(site, menu.as_str())?;
        if created {
            log::info!("created menu {menu} ({}) for site {site}", record.id);
            report.changes.push(MenuChange::MenuCreated {
                menu,
                menu_id: record.id.clone(),
            });
        }

        match self.store.insert_page_item(&record.id, page, label)? {
            PageItemInsert::Inserted(item) => {
                log::info!("added page {page} to {menu} at order {}", item.order);
                report.changes.push(MenuChange::ItemCreated {
                    menu,
                    item_id: item.id,
                    order: item.order,
                });
            }
            PageItemInsert::Existing(item) if item.label != label => {
                let updated = self.store.update_item_label(&item.id, label)?;
                log::info!(
                    "relabelled page {page} in {menu}: {:?} -> {:?}",
                    item.label,
                    updated.label
                );
                report.changes.push(MenuChange::ItemRelabelled {
                    menu,
                    item_id: item.id,
                    from: item.label,
                    to: updated.label,
                });
            }
            PageItemInsert::Existing(_) => {
                log::debug!("page {page} already listed in {menu}");
            }
        }
        Ok(())
    }

    fn remove(
        &self,
        site: &SiteId,
        page: &PageId,
        menu: MenuName,
        report: &mut ReconcileReport,
    ) -> Result<(), StoreError> {
        let Some(record) = self.store.find_menu(site, menu.as_str())? else {
            log::debug!("no {menu} menu for site {site}; nothing to remove");
            return Ok(());
        };
        let Some(item) = self.store.find_page_item(&record.id, page)? else {
            log::debug!("page {page} not listed in {menu}");
            return Ok(());
        };
        self.store.delete_item(&item.id)?;
        log::info!("removed page {page} from {menu}");
        report.changes.push(MenuChange::ItemRemoved {
            menu,
            item_id: item.id,
        });
        Ok(())
    }
}

/// Appends an external link to a site's menu, creating the menu if needed.
pub fn add_link_item<S: MenuStore + ?Sized>(
    store: &S,
    site: &SiteId,
    menu: &str,
    label: &str,
    url: &str,
) -> Result<MenuItem, StoreError> {
    let (record, _) = store.ensure_menu(site, menu)?;
    let order = store.max_order(&record.id)?.unwrap_or(0) + 1;
    store.create_item(
        &record.id,
        NewMenuItem {
            label: label.to_string(),
            order,
            target: MenuTarget::Url(url.to_string()),
        },
    )
}

/// Moves an item to an explicit position.
pub fn move_item<S: MenuStore + ?Sized>(
    store: &S,
    item: &ItemId,
    order: i64,
) -> Result<MenuItem, StoreError> {
    store.set_item_order(item, order)
}
