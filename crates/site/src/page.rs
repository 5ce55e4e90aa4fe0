//! Page save driver: reads frontmatter from saved content and syncs menus.
//!
//! Page records themselves are persisted by the caller; these functions
//! return the derived fields to write alongside the content.

use litemark_core::{PageFrontmatter, split_page};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{MenuName, PageId, SiteId};
use crate::reconcile::{MenuReconciler, ReconcileError, ReconcileReport, item_label};
use crate::store::MenuStore;

/// Content used for pages created without any.
pub const DEFAULT_PAGE_CONTENT: &str = "# New Page";

/// Errors from saving a page.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PageError {
    /// The frontmatter block could not be read. `reason` is the parser's text.
    #[error("Invalid Frontmatter: {reason}")]
    Frontmatter {
        /// Parser-reported reason.
        reason: String,
    },

    /// A required field was empty.
    #[error("Missing fields: {field}")]
    MissingField {
        /// Name of the empty field.
        field: &'static str,
    },

    /// Menu sync failed part way.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

/// Fields sent by the editor when saving a page. `None` means unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageUpdate {
    /// Full page content, frontmatter included.
    pub content: Option<String>,
    /// Title from the editor's title field.
    pub title: Option<String>,
    /// Editor toggle for the Main menu.
    pub show_in_main: Option<bool>,
    /// Editor toggle for the Footer menu.
    pub show_in_footer: Option<bool>,
}

/// Fields derived from a save, for the caller to persist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageChanges {
    /// New title, `None` to keep the current one.
    pub title: Option<String>,
    /// New description, `None` to keep the current one.
    pub description: Option<String>,
    /// Frontmatter read from the content, when content was saved.
    pub frontmatter: Option<PageFrontmatter>,
    /// Menu changes applied.
    pub menus: ReconcileReport,
}

/// Applies a page save: frontmatter overrides and menu membership.
///
/// Menus are synced only when non-empty content is part of the update;
/// `Main` is processed before `Footer`. `current_title` is the stored title,
/// used for menu labels when neither the content nor the update names one.
pub fn update_page<S: MenuStore + ?Sized>(
    store: &S,
    site: &SiteId,
    page: &PageId,
    current_title: Option<&str>,
    update: &PageUpdate,
) -> Result<PageChanges, PageError> {
    let Some(content) = update.content.as_deref().filter(|c| !c.is_empty()) else {
        log::debug!("page {page} saved without content; skipping menu sync");
        return Ok(PageChanges {
            title: update.title.clone(),
            ..Default::default()
        });
    };

    let (frontmatter, _) = split_page(content).map_err(|err| PageError::Frontmatter {
        reason: err.reason(),
    })?;

    let title = frontmatter.title.clone().or_else(|| update.title.clone());
    let label = item_label(
        frontmatter.name.as_deref(),
        title.as_deref().or(current_title),
    );
    let desired = [
        (
            MenuName::Main,
            frontmatter.menu.main || update.show_in_main == Some(true),
        ),
        (
            MenuName::Footer,
            frontmatter.menu.footer || update.show_in_footer == Some(true),
        ),
    ];

    let menus = MenuReconciler::new(store).reconcile(site, page, &label, &desired)?;
    Ok(PageChanges {
        title,
        description: frontmatter.description.clone(),
        frontmatter: Some(frontmatter),
        menus,
    })
}

/// A page to create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewPage {
    /// Page title, also the menu label.
    pub title: String,
    /// Page slug.
    pub slug: String,
    /// Initial content; defaults to [`DEFAULT_PAGE_CONTENT`].
    pub content: Option<String>,
    /// List the page in the Main menu.
    pub show_in_main: bool,
    /// List the page in the Footer menu.
    pub show_in_footer: bool,
}

/// The validated page and the menu entries added for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedPage {
    /// Page title.
    pub title: String,
    /// Page slug.
    pub slug: String,
    /// Content to store.
    pub content: String,
    /// Menu changes applied.
    pub menus: ReconcileReport,
}

/// Validates a new page and lists it in the menus it asked for.
///
/// Creation only adds; unchecked menus are not touched.
pub fn create_page<S: MenuStore + ?Sized>(
    store: &S,
    site: &SiteId,
    page: &PageId,
    new_page: &NewPage,
) -> Result<CreatedPage, PageError> {
    if new_page.title.is_empty() {
        return Err(PageError::MissingField { field: "title" });
    }
    if new_page.slug.is_empty() {
        return Err(PageError::MissingField { field: "slug" });
    }

    let desired: Vec<(MenuName, bool)> = [
        (MenuName::Main, new_page.show_in_main),
        (MenuName::Footer, new_page.show_in_footer),
    ]
    .into_iter()
    .filter(|&(_, want)| want)
    .collect();

    let menus = MenuReconciler::new(store).reconcile(site, page, &new_page.title, &desired)?;
    Ok(CreatedPage {
        title: new_page.title.clone(),
        slug: new_page.slug.clone(),
        content: new_page
            .content
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_PAGE_CONTENT.to_string()),
        menus,
    })
}
