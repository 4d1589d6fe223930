mod forms;
mod title;

use url::Url;

use crate::{
    config::HeuristicsConfig,
    domain::{HeuristicMatch, PageMetadata},
};

pub use forms::find_credential_form;
pub use title::BrandTitleRule;

/// Content-based phishing checks. Rules run in a fixed order and the first hit wins.
#[derive(Debug, Clone)]
pub struct ContentHeuristics {
    title_rule: BrandTitleRule,
}

impl ContentHeuristics {
    pub fn new(config: &HeuristicsConfig) -> Self {
        Self {
            title_rule: BrandTitleRule::new(&config.brands, config.brand_domain_check),
        }
    }

    pub fn evaluate(&self, url: &str, meta: &PageMetadata) -> Option<HeuristicMatch> {
        let host = Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase));

        if let Some(brand) = self.title_rule.check(&meta.title, host.as_deref()) {
            return Some(HeuristicMatch::BrandTitle {
                brand: brand.to_string(),
            });
        }

        find_credential_form(&meta.forms)
            .map(|form_index| HeuristicMatch::CredentialForm { form_index })
    }
}
