#![deny(missing_docs)]
//! Site layer for litemark: menus, page saves, and host routing.
//!
//! # Module Structure
//!
//! - `model` - Identifiers, menus, and menu items
//! - `store` - The persistence collaborator trait
//! - `memory` - In-memory reference store
//! - `reconcile` - Page-to-menu membership sync
//! - `page` - Page save driver (frontmatter to menu sync)
//! - `routing` - Host routing and public navigation helpers
//! - `config` - Site configuration

/// Site configuration.
pub mod config;
/// In-memory menu store.
pub mod memory;
/// Identifiers and menu records.
pub mod model;
/// Page save driver.
pub mod page;
/// Menu reconciliation engine.
pub mod reconcile;
/// Host routing and public page helpers.
pub mod routing;
/// Persistence collaborator.
pub mod store;

pub use config::{ConfigError, ROOT_DOMAIN_ENV, SiteConfig};
pub use memory::MemoryMenuStore;
pub use model::{
    ItemId, Menu, MenuId, MenuItem, MenuName, MenuTarget, NewMenuItem, PageId, SiteId,
    UnknownMenuName,
};
pub use page::{CreatedPage, NewPage, PageChanges, PageError, PageUpdate, create_page, update_page};
pub use reconcile::{
    MenuChange, MenuReconciler, ReconcileError, ReconcileReport, add_link_item, item_label,
    move_item,
};
pub use routing::{
    NavLink, PageLookup, PageMetadata, PageSummary, Route, nav_links, page_metadata, page_slug,
    route_request, tenant_key,
};
pub use store::{MenuStore, PageItemInsert, StoreError};
