use regex::Regex;

use crate::config::BrandConfig;

/// Flags titles that open with a well-known brand name, e.g. `Facebook - Log In`.
#[derive(Debug, Clone)]
pub struct BrandTitleRule {
    pattern: Option<Regex>,
    brands: Vec<BrandConfig>,
    domain_check: bool,
}

impl BrandTitleRule {
    pub fn new(brands: &[BrandConfig], domain_check: bool) -> Self {
        let mut brands: Vec<BrandConfig> = brands
            .iter()
            .filter(|brand| !brand.name.is_empty())
            .cloned()
            .collect();
        // Alternation is leftmost-first, so longer names must come before their prefixes.
        brands.sort_by(|a, b| b.name.len().cmp(&a.name.len()));
        let pattern = if brands.is_empty() {
            None
        } else {
            let alternatives = brands
                .iter()
                .map(|brand| regex::escape(&brand.name))
                .collect::<Vec<_>>()
                .join("|");
            // Escaped literals always form a valid pattern.
            Regex::new(&format!("^(?:{alternatives})")).ok()
        };
        Self {
            pattern,
            brands,
            domain_check,
        }
    }

    /// Returns the impersonated brand name, if any.
    pub fn check(&self, title: &str, host: Option<&str>) -> Option<&str> {
        let matched = self.pattern.as_ref()?.find(title)?.as_str();
        let brand = self.brands.iter().find(|brand| brand.name == matched)?;
        if self.domain_check && host.is_some_and(|host| owns_host(brand, host)) {
            tracing::debug!(target: "heuristics", brand = %brand.name, host, "title matches brand on its own domain");
            return None;
        }
        Some(brand.name.as_str())
    }
}

fn owns_host(brand: &BrandConfig, host: &str) -> bool {
    brand.domains.iter().any(|domain| {
        host == domain
            || host
                .strip_suffix(domain.as_str())
                .is_some_and(|rest| rest.ends_with('.'))
    })
}
