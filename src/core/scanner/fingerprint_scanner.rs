// src/core/scanner/fingerprint_scanner.rs

use tracing::debug;
use crate::core::models::{HeaderSet, TechnologyMap};
use scraper::{Html, Selector};
use regex::Regex;
use once_cell::sync::Lazy;

/// Defines the different types of checks that can be performed to identify a technology.
enum Check<'a> {
    /// Check for a pattern in a specific HTTP header.
    Header(&'a str, &'a Lazy<Regex>),
    /// Check for a pattern in the content of a specific meta tag.
    MetaTag(&'a str, &'a Lazy<Regex>),
    /// Check for a pattern in the HTML body.
    Body(&'a Lazy<Regex>),
    /// Check for a pattern in the `src` attribute of `<script>` tags.
    ScriptSrc(&'a Lazy<Regex>),
    /// Check for a pattern in the `href` attribute of `<link>` tags.
    LinkHref(&'a Lazy<Regex>),
    /// Check for a pattern in the `set-cookie` headers.
    Cookie(&'a Lazy<Regex>),
}

/// A rule that defines how to detect a specific technology.
struct FingerprintRule<'a> {
    tech_name: &'a str,
    /// BuiltWith-style category key (e.g., "web-servers").
    category: &'a str,
    check: Check<'a>,
}

/// A technology found on the page, with its version when a rule captured one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Technology {
    pub name: String,
    pub category: String,
    pub version: Option<String>,
}

impl Technology {
    fn display_name(&self) -> String {
        match &self.version {
            Some(v) => format!("{} {}", self.name, v),
            None => self.name.clone(),
        }
    }
}

// The first capture group, when present, is the version.
static RE_NGINX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)nginx(?:/([\d\.]+))?").unwrap());
static RE_NGINX_ERROR: Lazy<Regex> = Lazy::new(|| Regex::new(r"<hr><center>nginx</center>").unwrap());
static RE_APACHE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Apache(?:/([\d\.]+))?").unwrap());
static RE_APACHE_ERROR: Lazy<Regex> = Lazy::new(|| Regex::new(r"Apache Server at").unwrap());
static RE_IIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"Microsoft-IIS(?:/([\d\.]+))?").unwrap());
static RE_LITESPEED: Lazy<Regex> = Lazy::new(|| Regex::new(r"LiteSpeed").unwrap());
static RE_CLOUDFLARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"cloudflare").unwrap());
static RE_ANY: Lazy<Regex> = Lazy::new(|| Regex::new(r".+").unwrap());
static RE_WORDPRESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"WordPress ?([\d\.]+)?").unwrap());
static RE_WP_EMBED: Lazy<Regex> = Lazy::new(|| Regex::new(r"/wp-content/|/wp-includes/").unwrap());
static RE_JOOMLA: Lazy<Regex> = Lazy::new(|| Regex::new(r"Joomla!").unwrap());
static RE_DRUPAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"Drupal ?([\d\.]+)?").unwrap());
static RE_SHOPIFY: Lazy<Regex> = Lazy::new(|| Regex::new(r"cdn\.shopify\.com").unwrap());
static RE_MAGENTO: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)mage-cache|magento").unwrap());
static RE_PHP: Lazy<Regex> = Lazy::new(|| Regex::new(r"PHP(?:/([\d\.]+))?").unwrap());
static RE_PHPSESSID: Lazy<Regex> = Lazy::new(|| Regex::new(r"PHPSESSID").unwrap());
static RE_ASPNET: Lazy<Regex> = Lazy::new(|| Regex::new(r"([\d\.]+)").unwrap());
static RE_JSESSIONID: Lazy<Regex> = Lazy::new(|| Regex::new(r"JSESSIONID").unwrap());
static RE_DJANGO_CSRF: Lazy<Regex> = Lazy::new(|| Regex::new(r"csrftoken").unwrap());
static RE_RUBY_RAILS: Lazy<Regex> = Lazy::new(|| Regex::new(r"_rails_session").unwrap());
static RE_EXPRESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"Express").unwrap());
static RE_NEXTJS: Lazy<Regex> = Lazy::new(|| Regex::new(r"Next\.js ?([\d\.]+)?").unwrap());
static RE_NEXTJS_SCRIPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/_next/static/").unwrap());
static RE_NUXTJS: Lazy<Regex> = Lazy::new(|| Regex::new(r"__NUXT__").unwrap());
static RE_ANGULAR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"ng-version="([\d\.]+)""#).unwrap());
static RE_SVELTE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"class=["']svelte-"#).unwrap());
static RE_GATSBY: Lazy<Regex> = Lazy::new(|| Regex::new(r#"id=["']___gatsby["']"#).unwrap());
static RE_ASTRO: Lazy<Regex> = Lazy::new(|| Regex::new(r"Astro v([\d\.]+)").unwrap());
static RE_JQUERY_VERSIONED: Lazy<Regex> = Lazy::new(|| Regex::new(r"jquery(?:[-@/]|(?:\.min)?\.js\?ver=)(\d+\.\d+(?:\.\d+)?)").unwrap());
static RE_JQUERY: Lazy<Regex> = Lazy::new(|| Regex::new(r"jquery").unwrap());
static RE_REACT: Lazy<Regex> = Lazy::new(|| Regex::new(r"react-dom|data-reactroot|react\.development").unwrap());
static RE_VUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"data-v-app|__VUE_").unwrap());
static RE_BOOTSTRAP: Lazy<Regex> = Lazy::new(|| Regex::new(r#"bootstrap[@-]?(\d+\.\d+(?:\.\d+)?)?[^"']*\.css"#).unwrap());
static RE_GOOGLE_ANALYTICS: Lazy<Regex> = Lazy::new(|| Regex::new(r"google-analytics\.com/|googletagmanager\.com/").unwrap());
static RE_GOOGLE_FONTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"fonts\.googleapis\.com").unwrap());

/// The master list of all fingerprinting rules, in reporting order.
static RULES: &[FingerprintRule] = &[
    FingerprintRule { tech_name: "Nginx", category: "web-servers", check: Check::Header("server", &RE_NGINX) },
    FingerprintRule { tech_name: "Nginx", category: "web-servers", check: Check::Body(&RE_NGINX_ERROR) },
    FingerprintRule { tech_name: "Apache", category: "web-servers", check: Check::Header("server", &RE_APACHE) },
    FingerprintRule { tech_name: "Apache", category: "web-servers", check: Check::Body(&RE_APACHE_ERROR) },
    FingerprintRule { tech_name: "IIS", category: "web-servers", check: Check::Header("server", &RE_IIS) },
    FingerprintRule { tech_name: "LiteSpeed", category: "web-servers", check: Check::Header("server", &RE_LITESPEED) },
    FingerprintRule { tech_name: "Cloudflare", category: "cdn", check: Check::Header("server", &RE_CLOUDFLARE) },
    FingerprintRule { tech_name: "Amazon CloudFront", category: "cdn", check: Check::Header("x-amz-cf-id", &RE_ANY) },
    FingerprintRule { tech_name: "Fastly", category: "cdn", check: Check::Header("x-fastly-request-id", &RE_ANY) },
    FingerprintRule { tech_name: "WordPress", category: "cms", check: Check::MetaTag("generator", &RE_WORDPRESS) },
    FingerprintRule { tech_name: "WordPress", category: "cms", check: Check::Body(&RE_WP_EMBED) },
    FingerprintRule { tech_name: "Joomla", category: "cms", check: Check::MetaTag("generator", &RE_JOOMLA) },
    FingerprintRule { tech_name: "Drupal", category: "cms", check: Check::MetaTag("generator", &RE_DRUPAL) },
    FingerprintRule { tech_name: "Drupal", category: "cms", check: Check::Header("x-generator", &RE_DRUPAL) },
    FingerprintRule { tech_name: "Shopify", category: "ecommerce", check: Check::Header("x-shopid", &RE_ANY) },
    FingerprintRule { tech_name: "Shopify", category: "ecommerce", check: Check::ScriptSrc(&RE_SHOPIFY) },
    FingerprintRule { tech_name: "Magento", category: "ecommerce", check: Check::Cookie(&RE_MAGENTO) },
    FingerprintRule { tech_name: "PHP", category: "programming-languages", check: Check::Header("x-powered-by", &RE_PHP) },
    FingerprintRule { tech_name: "PHP", category: "programming-languages", check: Check::Cookie(&RE_PHPSESSID) },
    FingerprintRule { tech_name: "Java", category: "programming-languages", check: Check::Cookie(&RE_JSESSIONID) },
    FingerprintRule { tech_name: "ASP.NET", category: "web-frameworks", check: Check::Header("x-aspnet-version", &RE_ASPNET) },
    FingerprintRule { tech_name: "Django", category: "web-frameworks", check: Check::Cookie(&RE_DJANGO_CSRF) },
    FingerprintRule { tech_name: "Ruby on Rails", category: "web-frameworks", check: Check::Cookie(&RE_RUBY_RAILS) },
    FingerprintRule { tech_name: "Express", category: "web-frameworks", check: Check::Header("x-powered-by", &RE_EXPRESS) },
    FingerprintRule { tech_name: "Next.js", category: "javascript-frameworks", check: Check::Header("x-powered-by", &RE_NEXTJS) },
    FingerprintRule { tech_name: "Next.js", category: "javascript-frameworks", check: Check::ScriptSrc(&RE_NEXTJS_SCRIPT) },
    FingerprintRule { tech_name: "Nuxt.js", category: "javascript-frameworks", check: Check::Body(&RE_NUXTJS) },
    FingerprintRule { tech_name: "Angular", category: "javascript-frameworks", check: Check::Body(&RE_ANGULAR) },
    FingerprintRule { tech_name: "Svelte", category: "javascript-frameworks", check: Check::Body(&RE_SVELTE) },
    FingerprintRule { tech_name: "Gatsby", category: "javascript-frameworks", check: Check::Body(&RE_GATSBY) },
    FingerprintRule { tech_name: "Astro", category: "javascript-frameworks", check: Check::MetaTag("generator", &RE_ASTRO) },
    FingerprintRule { tech_name: "React", category: "javascript-frameworks", check: Check::Body(&RE_REACT) },
    FingerprintRule { tech_name: "Vue.js", category: "javascript-frameworks", check: Check::Body(&RE_VUE) },
    FingerprintRule { tech_name: "jQuery", category: "javascript-frameworks", check: Check::ScriptSrc(&RE_JQUERY_VERSIONED) },
    FingerprintRule { tech_name: "jQuery", category: "javascript-frameworks", check: Check::ScriptSrc(&RE_JQUERY) },
    FingerprintRule { tech_name: "Bootstrap", category: "ui-frameworks", check: Check::LinkHref(&RE_BOOTSTRAP) },
    FingerprintRule { tech_name: "Google Analytics", category: "analytics", check: Check::ScriptSrc(&RE_GOOGLE_ANALYTICS) },
    FingerprintRule { tech_name: "Google Font API", category: "font-scripts", check: Check::LinkHref(&RE_GOOGLE_FONTS) },
];

/// Applies the fingerprint database to a fetched page.
///
/// A technology matched by several rules is reported once, in the order of
/// its first matching rule; a later rule may fill in a missing version.
///
/// # Arguments
/// * `headers` - Response headers of the page.
/// * `body` - Raw HTML of the page.
pub fn lookup_technologies(headers: &HeaderSet, body: &str) -> Vec<Technology> {
    let document = Html::parse_document(body);
    let cookies = headers
        .iter()
        .filter(|(name, _)| name.eq_ignore_ascii_case("set-cookie"))
        .map(|(_, value)| value)
        .collect::<Vec<_>>()
        .join("; ");

    let mut found: Vec<Technology> = Vec::new();

    debug!(total_rules = %RULES.len(), "Applying fingerprinting rules.");
    for rule in RULES {
        let version = match &rule.check {
            Check::Header(name, re) => check_with_regex(headers.get(name), re),
            Check::MetaTag(name, re) => check_meta_tag(&document, name, re),
            Check::Body(re) => check_with_regex(Some(body), re),
            Check::ScriptSrc(re) => check_attr(&document, "script[src]", "src", re),
            Check::LinkHref(re) => check_attr(&document, "link[href]", "href", re),
            Check::Cookie(re) => check_with_regex(Some(&cookies), re),
        };

        let Some(v) = version else { continue };
        debug!(tech = %rule.tech_name, version = ?v, "Rule matched.");
        match found.iter_mut().find(|t| t.name == rule.tech_name) {
            Some(existing) => {
                if existing.version.is_none() && v.is_some() {
                    existing.version = v;
                }
            }
            None => found.push(Technology {
                name: rule.tech_name.to_string(),
                category: rule.category.to_string(),
                version: v,
            }),
        }
    }
    found
}

/// Groups detected technologies by category, keeping detection order inside
/// each category.
pub fn group_by_category(techs: &[Technology]) -> TechnologyMap {
    let mut map = TechnologyMap::new();
    for tech in techs {
        map.entry(tech.category.clone()).or_default().push(tech.display_name());
    }
    map
}

/// Applies a regex to an optional string slice.
///
/// `None` if nothing matched, `Some(None)` on a match without a version,
/// `Some(Some(version))` when the first capture group matched.
fn check_with_regex(text_option: Option<&str>, re: &Regex) -> Option<Option<String>> {
    text_option.and_then(|text| {
        re.captures(text).map(|caps| {
            caps.get(1)
                .map(|m| m.as_str().trim_end_matches('.').to_string())
                .filter(|s| !s.is_empty())
        })
    })
}

fn check_meta_tag(doc: &Html, name: &str, re: &Regex) -> Option<Option<String>> {
    let selector = Selector::parse(&format!("meta[name='{}']", name)).ok()?;
    let content = doc.select(&selector).next().and_then(|el| el.value().attr("content"));
    check_with_regex(content, re)
}

/// Checks an attribute of every element matching `css`; first match wins.
fn check_attr(doc: &Html, css: &str, attr: &str, re: &Regex) -> Option<Option<String>> {
    let selector = Selector::parse(css).ok()?;
    doc.select(&selector)
        .filter_map(|el| el.value().attr(attr))
        .find_map(|value| check_with_regex(Some(value), re))
}
