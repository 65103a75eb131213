//! Address advertised to IPTV apps in generated connections

use crate::config::Config;

/// Pick the public base URL of this server, first match wins:
/// `RAILWAY_STATIC_URL`, `RAILWAY_PUBLIC_DOMAIN`, `SERVER_ADDRESS`, `HOST`,
/// the request `Host` header, then `localhost`.
///
/// The result always has a scheme and never a trailing slash.
pub fn resolve(config: &Config, request_host: Option<&str>, forwarded_proto: Option<&str>) -> String {
    let address = if let Some(url) = &config.railway_static_url {
        with_scheme(url, "https")
    } else if let Some(domain) = &config.railway_public_domain {
        with_scheme(domain, "https")
    } else if let Some(address) = &config.server_address {
        with_scheme(address, "http")
    } else if let Some(host) = &config.host {
        let scheme = if config.https { "https" } else { "http" };
        let standard_port = matches!((scheme, config.port), ("http", 80) | ("https", 443));
        let base = with_scheme(host, scheme);
        if standard_port {
            base
        } else {
            format!("{}:{}", base, config.port)
        }
    } else if let Some(host) = request_host.map(str::trim).filter(|h| !h.is_empty()) {
        let scheme = match forwarded_proto.map(first_proto) {
            Some(proto) if proto.eq_ignore_ascii_case("https") => "https",
            _ => "http",
        };
        with_scheme(host, scheme)
    } else {
        format!("http://localhost:{}", config.port)
    };

    address.trim_end_matches('/').to_string()
}

/// First entry of a possibly comma-separated `X-Forwarded-Proto`
fn first_proto(value: &str) -> &str {
    value.split(',').next().unwrap_or("").trim()
}

fn with_scheme(address: &str, scheme: &str) -> String {
    let address = address.trim().trim_end_matches('/');
    if address.contains("://") {
        address.to_string()
    } else {
        format!("{}://{}", scheme, address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            port: 3000,
            ..Config::default()
        }
    }

    #[test]
    fn test_railway_static_url_wins() {
        let config = Config {
            railway_static_url: Some("xs.up.railway.app/".to_string()),
            railway_public_domain: Some("other.example.com".to_string()),
            server_address: Some("http://ignored".to_string()),
            ..base_config()
        };
        assert_eq!(resolve(&config, Some("req.host"), None), "https://xs.up.railway.app");
    }

    #[test]
    fn test_railway_public_domain() {
        let config = Config {
            railway_public_domain: Some("xs.example.com".to_string()),
            ..base_config()
        };
        assert_eq!(resolve(&config, None, None), "https://xs.example.com");
    }

    #[test]
    fn test_server_address_keeps_given_scheme() {
        let config = Config {
            server_address: Some("https://tv.example.com:8443/".to_string()),
            ..base_config()
        };
        assert_eq!(resolve(&config, None, None), "https://tv.example.com:8443");

        let config = Config {
            server_address: Some("tv.example.com".to_string()),
            ..base_config()
        };
        assert_eq!(resolve(&config, None, None), "http://tv.example.com");
    }

    #[test]
    fn test_host_variable_and_port() {
        let config = Config {
            host: Some("tv.example.com".to_string()),
            ..base_config()
        };
        assert_eq!(resolve(&config, None, None), "http://tv.example.com:3000");

        let config = Config {
            host: Some("tv.example.com".to_string()),
            https: true,
            port: 443,
            ..base_config()
        };
        assert_eq!(resolve(&config, None, None), "https://tv.example.com");
    }

    #[test]
    fn test_request_host_header() {
        assert_eq!(resolve(&base_config(), Some("tv.example.com"), None), "http://tv.example.com");
        assert_eq!(
            resolve(&base_config(), Some("tv.example.com"), Some("https, http")),
            "https://tv.example.com"
        );
    }

    #[test]
    fn test_localhost_fallback() {
        assert_eq!(resolve(&base_config(), None, None), "http://localhost:3000");
        assert_eq!(resolve(&base_config(), Some("  "), None), "http://localhost:3000");
    }
}
