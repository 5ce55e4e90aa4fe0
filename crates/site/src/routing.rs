//! Host routing and the helpers public pages are built from.
//!
//! A request's host decides who serves it: the dashboard host is rewritten
//! under `/app`, bare `localhost` passes through, and every other host is a
//! tenant site rewritten under `/sites/<host>`.

use serde::Serialize;

use crate::config::{SiteConfig, strip_port};
use crate::model::{ItemId, MenuItem, MenuTarget, PageId};

const DASHBOARD_PREFIX: &str = "/app";

/// Where a request is served from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Route {
    /// Dashboard request, with its rewritten path.
    Dashboard {
        /// Path under `/app`.
        path: String,
    },
    /// Public tenant site.
    Tenant {
        /// Request host without port.
        host: String,
        /// Path under `/sites/<host>`.
        path: String,
    },
    /// Served as requested.
    PassThrough {
        /// Original path.
        path: String,
    },
}

impl Route {
    /// The path the request is served from.
    pub fn path(&self) -> &str {
        match self {
            Route::Dashboard { path } | Route::Tenant { path, .. } | Route::PassThrough { path } => {
                path
            }
        }
    }
}

/// Routes a request by its `Host` header. `path_and_query` starts with `/`.
pub fn route_request(host: &str, path_and_query: &str, config: &SiteConfig) -> Route {
    let host = host.replace(":%3A", ":");
    let hostname = strip_port(&host).to_ascii_lowercase();

    let is_dashboard = hostname.eq_ignore_ascii_case(&config.dashboard_host)
        || config
            .root_host()
            .is_some_and(|root| hostname.eq_ignore_ascii_case(root));
    let route = if is_dashboard {
        let path = if is_dashboard_path(path_and_query) {
            path_and_query.to_string()
        } else if path_and_query == "/" {
            DASHBOARD_PREFIX.to_string()
        } else {
            format!("{DASHBOARD_PREFIX}{path_and_query}")
        };
        Route::Dashboard { path }
    } else if hostname == "localhost" {
        Route::PassThrough {
            path: path_and_query.to_string(),
        }
    } else {
        Route::Tenant {
            path: format!("/sites/{hostname}{path_and_query}"),
            host: hostname,
        }
    };

    log::debug!("routing {host}{path_and_query} -> {}", route.path());
    route
}

fn is_dashboard_path(path: &str) -> bool {
    path.strip_prefix(DASHBOARD_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?']))
}

/// The key a tenant site is looked up by.
///
/// A subdomain of the root domain yields the subdomain; any other host is a
/// custom domain and is returned whole.
pub fn tenant_key<'a>(domain: &'a str, config: &SiteConfig) -> &'a str {
    config
        .root_host()
        .and_then(|root| {
            let split = domain.len().checked_sub(root.len())?;
            let suffix = domain.get(split..)?;
            suffix.eq_ignore_ascii_case(root).then(|| &domain[..split])
        })
        .and_then(|rest| rest.strip_suffix('.'))
        .filter(|sub| !sub.is_empty())
        .unwrap_or(domain)
}

/// Which page a public path asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLookup {
    /// The site's home page, or its page with the empty slug.
    Home,
    /// A page by slug; nested segments are joined with `/`.
    Slug(String),
}

/// Turns catch-all path segments into a page lookup.
pub fn page_slug<S: AsRef<str>>(segments: &[S]) -> PageLookup {
    if segments.is_empty() {
        return PageLookup::Home;
    }
    let slug: Vec<&str> = segments.iter().map(AsRef::as_ref).collect();
    PageLookup::Slug(slug.join("/"))
}

/// A rendered navigation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    /// Source item.
    pub id: ItemId,
    /// Link text.
    pub label: String,
    /// Link target.
    pub url: String,
}

/// Builds navigation links in display order.
///
/// Url items link to their url; page items link to `/<slug>`; a page item
/// whose page is gone links to `#`.
pub fn nav_links<F>(items: &[MenuItem], slug_of: F) -> Vec<NavLink>
where
    F: Fn(&PageId) -> Option<String>,
{
    let mut sorted: Vec<&MenuItem> = items.iter().collect();
    sorted.sort_by_key(|item| item.order);
    sorted
        .into_iter()
        .map(|item| NavLink {
            id: item.id.clone(),
            label: item.label.clone(),
            url: match &item.target {
                MenuTarget::Url(url) if !url.is_empty() => url.clone(),
                MenuTarget::Url(_) => "#".to_string(),
                MenuTarget::Page(page) => slug_of(page)
                    .map(|slug| format!("/{slug}"))
                    .unwrap_or_else(|| "#".to_string()),
            },
        })
        .collect()
}

/// The fields of a page that metadata is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSummary {
    /// Page title.
    pub title: String,
    /// Page description.
    pub description: Option<String>,
}

/// Document title and description for a public page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    /// Document title.
    pub title: String,
    /// Meta description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Builds page metadata; a missing page gets a "Page Not Found" title.
pub fn page_metadata(site_name: &str, page: Option<&PageSummary>) -> PageMetadata {
    let Some(page) = page else {
        return PageMetadata {
            title: "Page Not Found".to_string(),
            description: None,
        };
    };
    let description = page
        .description
        .clone()
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| format!("{site_name} - {}", page.title));
    PageMetadata {
        title: page.title.clone(),
        description: Some(description),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MenuId;

    fn config() -> SiteConfig {
        SiteConfig {
            root_domain: Some("litemark.dev".to_string()),
            ..SiteConfig::default()
        }
    }

    fn dashboard(path: &str) -> Route {
        Route::Dashboard {
            path: path.to_string(),
        }
    }

    #[test]
    fn dashboard_hosts_rewrite_under_app() {
        let config = config();
        assert_eq!(route_request("app.localhost:3000", "/", &config), dashboard("/app"));
        assert_eq!(
            route_request("litemark.dev", "/site/1?tab=menus", &config),
            dashboard("/app/site/1?tab=menus")
        );
        assert_eq!(route_request("app.localhost", "/app/site", &config), dashboard("/app/site"));
        assert_eq!(route_request("app.localhost", "/apples", &config), dashboard("/app/apples"));
    }

    #[test]
    fn localhost_passes_through() {
        assert_eq!(
            route_request("localhost:3000", "/sign-in", &SiteConfig::default()),
            Route::PassThrough {
                path: "/sign-in".to_string()
            }
        );
    }

    #[test]
    fn other_hosts_are_tenants() {
        let route = route_request("acme.localhost:3000", "/about?x=1", &SiteConfig::default());
        assert_eq!(
            route,
            Route::Tenant {
                host: "acme.localhost".to_string(),
                path: "/sites/acme.localhost/about?x=1".to_string(),
            }
        );
        assert_eq!(
            route_request("ACME.localhost", "/", &SiteConfig::default()).path(),
            "/sites/acme.localhost/"
        );
    }

    #[test]
    fn tenant_keys() {
        let config = config();
        assert_eq!(tenant_key("acme.litemark.dev", &config), "acme");
        assert_eq!(tenant_key("www.acme.com", &config), "www.acme.com");
        assert_eq!(tenant_key("notlitemark.dev", &config), "notlitemark.dev");
        assert_eq!(tenant_key("acme.localhost", &SiteConfig::default()), "acme.localhost");
    }

    #[test]
    fn configured_hosts_match_any_case() {
        let config = SiteConfig {
            root_domain: Some("LiteMark.Dev".to_string()),
            dashboard_host: "App.LiteMark.Dev".to_string(),
        };
        assert_eq!(route_request("litemark.dev", "/", &config), dashboard("/app"));
        assert_eq!(route_request("app.litemark.dev:443", "/x", &config), dashboard("/app/x"));
        assert_eq!(tenant_key("acme.litemark.dev", &config), "acme");
        assert_eq!(tenant_key("acme.LITEMARK.DEV", &config), "acme");
    }

    #[test]
    fn slugs_from_segments() {
        let empty: [&str; 0] = [];
        assert_eq!(page_slug(&empty), PageLookup::Home);
        assert_eq!(
            page_slug(&["docs", "intro"]),
            PageLookup::Slug("docs/intro".to_string())
        );
    }

    #[test]
    fn nav_links_follow_order_and_fall_back_to_hash() {
        let item = |id: &str, order: i64, target: MenuTarget| MenuItem {
            id: ItemId::new(id),
            menu_id: MenuId::new("m"),
            label: id.to_string(),
            order,
            target,
        };
        let items = [
            item("gone", 3, MenuTarget::Page(PageId::new("deleted"))),
            item("blog", 2, MenuTarget::Url("https://blog.example".to_string())),
            item("about", 1, MenuTarget::Page(PageId::new("p-about"))),
        ];
        let links = nav_links(&items, |page| {
            (page.as_str() == "p-about").then(|| "about".to_string())
        });
        let urls: Vec<&str> = links.iter().map(|link| link.url.as_str()).collect();
        assert_eq!(urls, vec!["/about", "https://blog.example", "#"]);
    }

    #[test]
    fn metadata_falls_back_to_site_and_title() {
        let page = PageSummary {
            title: "About".to_string(),
            description: None,
        };
        assert_eq!(
            page_metadata("Acme", Some(&page)).description.as_deref(),
            Some("Acme - About")
        );
        assert_eq!(page_metadata("Acme", None).title, "Page Not Found");
    }
}
