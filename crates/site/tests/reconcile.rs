use insta::assert_debug_snapshot;
use litemark_site::{
    ItemId, Menu, MenuChange, MenuId, MenuItem, MenuName, MenuReconciler, MenuStore,
    MemoryMenuStore, NewMenuItem, PageError, PageId, PageUpdate, SiteId, StoreError, update_page,
};

fn site() -> SiteId {
    SiteId::new("site-1")
}

fn main_items(store: &MemoryMenuStore) -> Vec<MenuItem> {
    let menu = store
        .find_menu(&site(), MenuName::Main.as_str())
        .unwrap()
        .expect("Main menu exists");
    store.items(&menu.id).unwrap()
}

fn save(store: &dyn MenuStore, page: &str, content: &str) -> Result<(), PageError> {
    let update = PageUpdate {
        content: Some(content.to_string()),
        ..Default::default()
    };
    update_page(store, &site(), &PageId::new(page), None, &update).map(|_| ())
}

#[test]
fn first_save_reports_menu_and_item_creation() {
    let store = MemoryMenuStore::new();
    let report = MenuReconciler::new(&store)
        .reconcile(&site(), &PageId::new("home"), "Home", &[(MenuName::Main, true)])
        .unwrap();
    assert_debug_snapshot!(report, @r#"
ReconcileReport {
    changes: [
        MenuCreated {
            menu: Main,
            menu_id: MenuId(
                "menu-1",
            ),
        },
        ItemCreated {
            menu: Main,
            item_id: ItemId(
                "item-2",
            ),
            order: 1,
        },
    ],
}
"#);
}

#[test]
fn reconciling_twice_is_a_noop() {
    let store = MemoryMenuStore::new();
    let reconciler = MenuReconciler::new(&store);
    let page = PageId::new("about");
    let desired = [(MenuName::Main, true), (MenuName::Footer, false)];

    reconciler.reconcile(&site(), &page, "About", &desired).unwrap();
    let before = main_items(&store);
    let second = reconciler.reconcile(&site(), &page, "About", &desired).unwrap();

    assert!(second.is_noop(), "{second:?}");
    assert_eq!(main_items(&store), before);
    assert_eq!(before.len(), 1);
    assert!(store.find_menu(&site(), "Footer").unwrap().is_none());
}

#[test]
fn toggling_off_keeps_the_menu_and_other_orders() {
    let store = MemoryMenuStore::new();
    for page in ["a", "b", "c"] {
        save(&store, page, "---\nmenu:\n  main: true\n---\n").unwrap();
    }
    save(&store, "b", "---\nmenu:\n  main: false\n---\n").unwrap();

    let remaining: Vec<(String, i64)> = main_items(&store)
        .iter()
        .filter_map(|item| Some((item.page_id()?.to_string(), item.order)))
        .collect();
    assert_eq!(remaining, vec![("a".to_string(), 1), ("c".to_string(), 3)]);
}

#[test]
fn pages_are_appended_in_sequence() {
    let store = MemoryMenuStore::new();
    save(&store, "one", "---\nmenu:\n  main: true\n  footer: true\n---\n").unwrap();
    save(&store, "two", "---\nmenu:\n  footer: true\n---\n").unwrap();
    save(&store, "two", "---\nmenu:\n  main: true\n  footer: true\n---\n").unwrap();
    save(&store, "three", "---\nmenu:\n  main: true\n---\n").unwrap();

    let orders: Vec<i64> = main_items(&store).iter().map(|item| item.order).collect();
    assert_eq!(orders, vec![1, 2, 3]);
    let labels: Vec<String> = main_items(&store).into_iter().map(|item| item.label).collect();
    assert_eq!(labels, vec!["Page", "Page", "Page"]);
}

#[test]
fn renaming_updates_the_label_in_place() {
    let store = MemoryMenuStore::new();
    save(&store, "other", "---\nmenu:\n  main: true\n---\n").unwrap();
    save(&store, "about", "---\nname: About\nmenu:\n  main: true\n---\n").unwrap();
    let before = main_items(&store);

    save(&store, "about", "---\nname: About Us\nmenu:\n  main: true\n---\n").unwrap();
    let after = main_items(&store);

    assert_eq!(after.len(), 2);
    assert_eq!(after[1].label, "About Us");
    assert_eq!(after[1].id, before[1].id);
    assert_eq!(after[1].order, before[1].order);
}

#[test]
fn invalid_frontmatter_leaves_menus_alone() {
    let store = MemoryMenuStore::new();
    let err = save(&store, "about", "---\nmenu: [main\n---\n").unwrap_err();
    assert!(err.to_string().starts_with("Invalid Frontmatter: "), "{err}");
    assert!(store.menus_for_site(&site()).unwrap().is_empty());
}

/// Delegates to a memory store but fails every lookup of one menu name.
struct FailingStore {
    inner: MemoryMenuStore,
    broken_menu: &'static str,
}

impl FailingStore {
    fn check(&self, name: &str) -> Result<(), StoreError> {
        if name == self.broken_menu {
            return Err(StoreError::Unavailable {
                message: format!("{name} table offline"),
            });
        }
        Ok(())
    }
}

impl MenuStore for FailingStore {
    fn find_menu(&self, site: &SiteId, name: &str) -> Result<Option<Menu>, StoreError> {
        self.check(name)?;
        self.inner.find_menu(site, name)
    }

    fn create_menu(&self, site: &SiteId, name: &str) -> Result<Menu, StoreError> {
        self.check(name)?;
        self.inner.create_menu(site, name)
    }

    fn delete_menu(&self, menu: &MenuId) -> Result<(), StoreError> {
        self.inner.delete_menu(menu)
    }

    fn find_page_item(
        &self,
        menu: &MenuId,
        page: &PageId,
    ) -> Result<Option<MenuItem>, StoreError> {
        self.inner.find_page_item(menu, page)
    }

    fn create_item(&self, menu: &MenuId, item: NewMenuItem) -> Result<MenuItem, StoreError> {
        self.inner.create_item(menu, item)
    }

    fn update_item_label(&self, item: &ItemId, label: &str) -> Result<MenuItem, StoreError> {
        self.inner.update_item_label(item, label)
    }

    fn set_item_order(&self, item: &ItemId, order: i64) -> Result<MenuItem, StoreError> {
        self.inner.set_item_order(item, order)
    }

    fn delete_item(&self, item: &ItemId) -> Result<(), StoreError> {
        self.inner.delete_item(item)
    }

    fn max_order(&self, menu: &MenuId) -> Result<Option<i64>, StoreError> {
        self.inner.max_order(menu)
    }

    fn menus_for_site(&self, site: &SiteId) -> Result<Vec<Menu>, StoreError> {
        self.inner.menus_for_site(site)
    }

    fn items(&self, menu: &MenuId) -> Result<Vec<MenuItem>, StoreError> {
        self.inner.items(menu)
    }
}

#[test]
fn failure_on_footer_keeps_main_changes() {
    let inner = MemoryMenuStore::new();
    let store = FailingStore {
        inner: inner.clone(),
        broken_menu: "Footer",
    };

    let err = save(
        &store,
        "about",
        "---\ntitle: About\nmenu:\n  main: true\n  footer: true\n---\n",
    )
    .unwrap_err();

    let PageError::Reconcile(err) = err else {
        panic!("expected a reconcile error, got {err:?}");
    };
    assert_eq!(err.menu, MenuName::Footer);
    assert!(matches!(err.source, StoreError::Unavailable { .. }));
    assert!(matches!(
        err.applied.changes.last(),
        Some(MenuChange::ItemCreated { menu: MenuName::Main, order: 1, .. })
    ));

    let items = main_items(&inner);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].label, "About");
}

#[test]
fn concurrent_saves_of_one_page_create_one_item() {
    let store = MemoryMenuStore::new();
    let page = PageId::new("racy");

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                MenuReconciler::new(&store)
                    .reconcile(&site(), &page, "Racy", &[(MenuName::Main, true)])
                    .unwrap();
            });
        }
    });

    let items = main_items(&store);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].order, 1);
    assert_eq!(store.menus_for_site(&site()).unwrap().len(), 1);
}
