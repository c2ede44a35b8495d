use crate::config::GatewayConfig;
use crate::domain::ports::CallbackUrlBuilder;

/// Callback URLs under the shop's own host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUrls {
    scheme: String,
    host: String,
}

impl SiteUrls {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.callback_scheme(), config.site_host.as_str())
    }

    fn url(&self, path: &str, basket_id: u64) -> String {
        format!(
            "{}://{}/checkout/paydollar/{path}/{basket_id}/",
            self.scheme, self.host
        )
    }
}

impl CallbackUrlBuilder for SiteUrls {
    fn success_url(&self, basket_id: u64) -> String {
        self.url("success", basket_id)
    }

    fn fail_url(&self, basket_id: u64) -> String {
        self.url("fail", basket_id)
    }

    fn update_url(&self, basket_id: u64) -> String {
        self.url("shipping-options", basket_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_follow_configured_scheme() {
        let config = GatewayConfig {
            callback_https: false,
            site_host: "shop.example.com".into(),
            ..Default::default()
        };
        let urls = SiteUrls::from_config(&config);
        assert_eq!(
            urls.success_url(42),
            "http://shop.example.com/checkout/paydollar/success/42/"
        );
        assert_eq!(
            urls.fail_url(42),
            "http://shop.example.com/checkout/paydollar/fail/42/"
        );
        assert_eq!(
            urls.update_url(42),
            "http://shop.example.com/checkout/paydollar/shipping-options/42/"
        );
    }
}
