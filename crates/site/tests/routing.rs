use insta::assert_snapshot;
use litemark_site::{
    MemoryMenuStore, MenuName, MenuReconciler, MenuStore, PageId, Route, SiteConfig, SiteId,
    add_link_item, nav_links, route_request, tenant_key,
};

#[test]
fn tenant_request_resolves_to_its_site_key() {
    let config = SiteConfig::from_json(r#"{"rootDomain": "litemark.dev"}"#).unwrap();
    let Route::Tenant { host, path } = route_request("acme.litemark.dev:443", "/pricing", &config)
    else {
        panic!("expected a tenant route");
    };
    assert_eq!(path, "/sites/acme.litemark.dev/pricing");
    assert_eq!(tenant_key(&host, &config), "acme");
}

#[test]
fn header_navigation_lists_pages_and_links() {
    let store = MemoryMenuStore::new();
    let site = SiteId::new("s");
    let reconciler = MenuReconciler::new(&store);
    reconciler
        .reconcile(&site, &PageId::new("p-home"), "Home", &[(MenuName::Main, true)])
        .unwrap();
    add_link_item(&store, &site, "Main", "Docs", "https://docs.example").unwrap();
    reconciler
        .reconcile(&site, &PageId::new("p-about"), "About", &[(MenuName::Main, true)])
        .unwrap();

    let menu = store.find_menu(&site, "Main").unwrap().unwrap();
    let links = nav_links(&store.items(&menu.id).unwrap(), |page| match page.as_str() {
        "p-home" => Some(String::new()),
        "p-about" => Some("about".to_string()),
        _ => None,
    });
    let rendered: Vec<String> = links
        .iter()
        .map(|link| format!("{} -> {}", link.label, link.url))
        .collect();
    assert_snapshot!(rendered.join(" | "), @"Home -> / | Docs -> https://docs.example | About -> /about");
}
