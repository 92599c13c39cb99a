//! This module acts as the central "brain" of the scanner.
//! It contains the static, read-only signature tables every detector matches
//! against: CMS platforms, JavaScript frameworks, CDN providers and the
//! recommended security headers with their remediation advice.
//! Keeping them data-driven allows the detectors to stay small and the tables
//! to be updated without touching matching logic.

/// A technology identified by an ordered list of substring signatures.
///
/// Order matters: detectors report only the first signature that matches.
pub struct Signature {
    /// Display name of the technology (e.g., "WordPress").
    pub name: &'static str,
    /// Substrings searched for, in priority order.
    pub patterns: &'static [&'static str],
}

/// A recommended HTTP security header and what to do when it is missing.
pub struct SecurityHeaderCheck {
    /// Canonical header name (e.g., "Strict-Transport-Security").
    pub header: &'static str,
    /// Clear, actionable advice shown regardless of the detected status.
    pub advice: &'static str,
}

/// HSTS `max-age` (one year, in seconds) at or above which the policy is strong.
pub const HSTS_MIN_MAX_AGE: i64 = 31_536_000;

/// CMS platforms, matched against the lowercased page HTML and URL.
pub static CMS_SIGNATURES: &[Signature] = &[
    Signature { name: "WordPress", patterns: &["wp-content", "wp-includes", "wp-login", "wp-admin"] },
    Signature { name: "Joomla", patterns: &["option=com_", "/administrator/", "Joomla!"] },
    Signature { name: "Drupal", patterns: &["/sites/default/", "drupal.js", "Drupal.settings"] },
    Signature { name: "Magento", patterns: &["Magento", "/skin/frontend/", "/media/catalog/"] },
    Signature { name: "Shopify", patterns: &["cdn.shopify.com", "myshopify.com"] },
    Signature { name: "WooCommerce", patterns: &["woocommerce", "wc-ajax", "wp-content/plugins/woocommerce"] },
    Signature { name: "OpenCart", patterns: &["index.php?route=", "/catalog/view/theme/", "opencart"] },
    Signature { name: "PrestaShop", patterns: &["/modules/", "prestashop", "var prestashop"] },
    Signature { name: "TYPO3", patterns: &["typo3conf", "typo3temp", "TYPO3"] },
    Signature { name: "BigCommerce", patterns: &["bigcommerce", "cdn.bc0a.com"] },
    Signature { name: "Squarespace", patterns: &["squarespace.com", "static.squarespace.com"] },
];

/// JavaScript framework families, matched against script URLs and page text.
pub static JS_FRAMEWORK_SIGNATURES: &[Signature] = &[
    Signature { name: "jQuery", patterns: &["jquery", "jquery.min.js"] },
    Signature { name: "React", patterns: &["react", "react-dom"] },
    Signature { name: "Vue.js", patterns: &["vue", "vuex"] },
    Signature { name: "Angular", patterns: &["angular", "angular.js", "ng-app"] },
    Signature { name: "Alpine.js", patterns: &["alpine", "x-data"] },
    Signature { name: "Svelte", patterns: &["svelte"] },
    Signature { name: "Next.js", patterns: &["__NEXT_DATA__", "_next/static/"] },
    Signature { name: "Nuxt.js", patterns: &["__NUXT__", "/_nuxt/"] },
];

/// CDN providers and the lowercase fragments that betray them in
/// `name:value` header pairs or CNAME targets.
pub static CDN_INDICATORS: &[Signature] = &[
    Signature { name: "Cloudflare", patterns: &["cf-ray", "cloudflare"] },
    Signature { name: "Akamai", patterns: &["akamai", "akamai.net", "akamaitechnologies.com"] },
    Signature { name: "Fastly", patterns: &["fastly", "fastly.net"] },
    Signature { name: "Amazon CloudFront", patterns: &["x-amz-cf", "cloudfront.net"] },
    Signature { name: "Google Cloud CDN", patterns: &["x-goog", "google", "goog"] },
    Signature { name: "Microsoft Azure CDN", patterns: &["x-ms-cdn", "azureedge.net"] },
    Signature { name: "Vercel", patterns: &["vercel", "x-vercel"] },
    Signature { name: "Netlify", patterns: &["netlify", "x-nf"] },
    Signature { name: "Sucuri", patterns: &["sucuri"] },
    Signature { name: "StackPath", patterns: &["stackpath"] },
    Signature { name: "BunnyCDN", patterns: &["bunnycdn"] },
];

/// The security header checklist, in report order.
pub static SECURITY_HEADERS: &[SecurityHeaderCheck] = &[
    SecurityHeaderCheck {
        header: "Strict-Transport-Security",
        advice: "Implement HSTS with max-age >= 31536000 (1 year).",
    },
    SecurityHeaderCheck {
        header: "Content-Security-Policy",
        advice: "Define a CSP to prevent XSS attacks.",
    },
    SecurityHeaderCheck {
        header: "X-Frame-Options",
        advice: "Use 'DENY' or 'SAMEORIGIN' to prevent clickjacking.",
    },
    SecurityHeaderCheck {
        header: "X-Content-Type-Options",
        advice: "Set to 'nosniff' to prevent MIME-sniffing.",
    },
    SecurityHeaderCheck {
        header: "X-XSS-Protection",
        advice: "Set to '1; mode=block' to enable basic XSS protection.",
    },
    SecurityHeaderCheck {
        header: "Referrer-Policy",
        advice: "Set to 'strict-origin-when-cross-origin' for better privacy.",
    },
    SecurityHeaderCheck {
        header: "Permissions-Policy",
        advice: "Define a Permissions Policy to control browser features.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_sizes_match_the_detectors() {
        assert_eq!(CMS_SIGNATURES.len(), 11);
        assert_eq!(JS_FRAMEWORK_SIGNATURES.len(), 8);
        assert_eq!(CDN_INDICATORS.len(), 11);
        assert_eq!(SECURITY_HEADERS.len(), 7);
    }

    #[test]
    fn cdn_indicators_are_lowercase() {
        for cdn in CDN_INDICATORS {
            for pattern in cdn.patterns {
                assert_eq!(*pattern, pattern.to_lowercase(), "{}", cdn.name);
            }
        }
    }
}
