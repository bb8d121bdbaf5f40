use url::Url;

/// Navigation links in the region menu that are not regions.
pub const RESERVED_SUBDOMAINS: [&str; 4] = ["login", "about", "privacy", "terms"];

/// A geographic scope exposed by the site as a distinct subdomain with its
/// own event feed. Identity key is the subdomain, lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub name: String,
    pub subdomain: String,
}

/// Extract the region subdomain from a menu link target, e.g.
/// `https://ukraine.liveuamap.com/` -> `ukraine`. Links to the apex domain
/// carry no region and yield `None`.
pub fn subdomain_from_url(href: &str) -> Option<String> {
    let parsed = Url::parse(href).ok()?;
    let host = parsed.host_str()?;
    if host.split('.').count() < 3 {
        return None;
    }
    let (subdomain, _) = host.split_once('.')?;
    if subdomain.is_empty() {
        return None;
    }
    Some(subdomain.to_lowercase())
}

pub fn is_reserved_subdomain(subdomain: &str) -> bool {
    RESERVED_SUBDOMAINS
        .iter()
        .any(|reserved| subdomain.eq_ignore_ascii_case(reserved))
}
