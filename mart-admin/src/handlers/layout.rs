use crate::models::{CurrentUser, PageInfo};
use mart_core::access::AccessGate;

pub struct NavLink {
    pub href: String,
    pub label: &'static str,
    pub active: bool,
}

/// Header and navigation shared by every signed-in page.
pub struct Chrome {
    pub user_name: String,
    pub initials: String,
    pub role: String,
    pub links: Vec<NavLink>,
}

const RESOURCES: [(&str, &str); 4] = [
    ("/products", "Products"),
    ("/inventory", "Inventory"),
    ("/deliveries", "Deliveries"),
    ("/settings", "Settings"),
];

impl Chrome {
    /// Only links the user's role can open are shown. The first link is the
    /// configured landing page.
    pub fn new(gate: &AccessGate, user: &CurrentUser, current: &str) -> Self {
        let landing = (gate.paths().landing.as_str(), "Dashboard");
        let links = std::iter::once(landing)
            .chain(RESOURCES)
            .filter(|(href, _)| {
                gate.policy()
                    .required_role(href)
                    .map_or(true, |required| user.role().satisfies(required))
            })
            .map(|(href, label)| NavLink {
                href: href.to_string(),
                label,
                active: href == current,
            })
            .collect();

        Self {
            user_name: user.display_name(),
            initials: user.initials(),
            role: user.role().to_string(),
            links,
        }
    }
}

/// `<option>` entry for select inputs.
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    /// Options for `items`, preceded by an "All" entry with an empty value.
    pub fn with_all<T: Copy>(
        items: &[T],
        value: impl Fn(T) -> &'static str,
        label: impl Fn(T) -> &'static str,
        selected: &str,
    ) -> Vec<SelectOption> {
        std::iter::once(SelectOption {
            value: String::new(),
            label: "All".to_string(),
            selected: selected.is_empty(),
        })
        .chain(items.iter().map(|&item| SelectOption {
            value: value(item).to_string(),
            label: label(item).to_string(),
            selected: value(item) == selected,
        }))
        .collect()
    }
}

/// Previous/next links for a paginated list, keeping the active filters.
pub struct Pager {
    pub page: u32,
    pub total_pages: u64,
    pub total: u64,
    /// Empty when there is no previous page.
    pub prev_href: String,
    /// Empty when there is no next page.
    pub next_href: String,
}

impl Pager {
    pub fn new(info: PageInfo, path: &str, filters: &[(&str, &str)]) -> Self {
        let href = |page: u32| {
            let mut href = format!("{path}?page={page}");
            for (name, value) in filters.iter().filter(|(_, value)| !value.is_empty()) {
                href.push_str(&format!("&{name}={}", urlencoding::encode(value)));
            }
            href
        };

        Self {
            page: info.page,
            total_pages: info.total_pages(),
            total: info.total,
            prev_href: if info.has_prev() { href(info.prev()) } else { String::new() },
            next_href: if info.has_next() { href(info.next()) } else { String::new() },
        }
    }
}
