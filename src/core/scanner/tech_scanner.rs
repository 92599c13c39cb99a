// src/core/scanner/tech_scanner.rs

use tracing::{debug, info, warn};

use crate::core::error::ProbeError;
use crate::core::knowledge_base::{Signature, CMS_SIGNATURES, JS_FRAMEWORK_SIGNATURES};
use crate::core::models::{HeaderSet, Probe, SignatureMatches, TechnologyMap};
use crate::core::scanner::fingerprint_scanner::{group_by_category, lookup_technologies, Technology};
use reqwest::header::ACCEPT;
use scraper::{Html, Selector};

const BUILTWITH_REASON: &str = "Detected via BuiltWith";

/// A page fetched once and shared by every technology sub-probe.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub headers: HeaderSet,
    pub body: String,
}

/// Output of the technology branch of a scan.
#[derive(Debug, Clone)]
pub struct TechResults {
    pub technologies: Probe<TechnologyMap>,
    pub cms: Probe<SignatureMatches>,
    pub javascript_frameworks: Probe<SignatureMatches>,
}

/// Fetches the page and runs the fingerprint database, the CMS matcher and
/// the JS framework matcher over it.
///
/// A failed fetch is reported by all three sub-probes.
pub async fn run_tech_scan(client: &reqwest::Client, url: &str) -> TechResults {
    info!(url, "Starting technology detection.");

    let page = match fetch_page(client, url).await {
        Ok(page) => page,
        Err(e) => {
            warn!(url, error = %e, "Page fetch failed, technology detection skipped.");
            let error = e.to_string();
            return TechResults {
                technologies: Probe::failed(&error),
                cms: Probe::failed(&error),
                javascript_frameworks: Probe::failed(error),
            };
        }
    };

    let results = analyze_page(url, &page);
    info!(
        categories = results.technologies.as_done().map_or(0, |t| t.len()),
        cms = results.cms.as_done().map_or(0, |c| c.len()),
        js = results.javascript_frameworks.as_done().map_or(0, |j| j.len()),
        "Technology detection finished."
    );
    results
}

async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<FetchedPage, ProbeError> {
    let response = client
        .get(url)
        .header(ACCEPT, "text/html,application/xhtml+xml")
        .send()
        .await?;
    debug!(status = %response.status(), "Received page.");
    let headers = HeaderSet::new(response.headers().clone());
    let body = response.text().await?;
    debug!(bytes = body.len(), "Read page body.");
    Ok(FetchedPage { headers, body })
}

/// Runs the three sub-probes over an already fetched page.
pub fn analyze_page(url: &str, page: &FetchedPage) -> TechResults {
    let techs = lookup_technologies(&page.headers, &page.body);
    TechResults {
        technologies: Probe::Done(group_by_category(&techs)),
        cms: Probe::Done(detect_cms(url, &page.body, &techs)),
        javascript_frameworks: Probe::Done(detect_js_frameworks(&page.body)),
    }
}

/// Matches the page HTML and the URL against the CMS signatures.
///
/// The first matching signature of each CMS is the reported reason. CMS
/// entries of the fingerprint database are then added, replacing the reason of
/// a signature match for the same name.
pub fn detect_cms(url: &str, html: &str, techs: &[Technology]) -> SignatureMatches {
    let html = html.to_lowercase();
    let url = url.to_lowercase();

    let mut found: SignatureMatches = CMS_SIGNATURES
        .iter()
        .filter_map(|cms| {
            first_match(cms, |sig| html.contains(sig) || url.contains(sig))
                .map(|sig| (cms.name.to_string(), format!("Matched signature: {sig}")))
        })
        .collect();

    for tech in techs.iter().filter(|t| t.category == "cms") {
        debug!(cms = %tech.name, "CMS confirmed by fingerprint database.");
        found.insert(tech.name.clone(), BUILTWITH_REASON.to_string());
    }
    found
}

/// Matches script URLs and document text against the JS framework signatures.
pub fn detect_js_frameworks(html: &str) -> SignatureMatches {
    let (scripts, text) = scripts_and_text(html);

    JS_FRAMEWORK_SIGNATURES
        .iter()
        .filter_map(|lib| {
            first_match(lib, |sig| scripts.iter().any(|s| s.contains(sig)) || text.contains(sig))
                .map(|sig| (lib.name.to_string(), format!("Matched: {sig}")))
        })
        .collect()
}

/// Elements whose text never reaches the reader.
const HIDDEN_TEXT_PARENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Lowercased `<script src>` values and the visible document text.
fn scripts_and_text(html: &str) -> (Vec<String>, String) {
    let document = Html::parse_document(html);
    let scripts = match Selector::parse("script[src]") {
        Ok(selector) => document
            .select(&selector)
            .filter_map(|el| el.value().attr("src"))
            .map(str::to_lowercase)
            .collect(),
        Err(_) => Vec::new(),
    };
    let text = document
        .root_element()
        .descendants()
        .filter(|node| {
            !node.ancestors().any(|parent| {
                parent
                    .value()
                    .as_element()
                    .is_some_and(|el| HIDDEN_TEXT_PARENTS.contains(&el.name()))
            })
        })
        .filter_map(|node| node.value().as_text().map(|t| t.to_lowercase()))
        .collect::<String>();
    (scripts, text)
}

/// First signature (in table order) accepted by `matches`, compared lowercased.
/// Returns the signature as written in the table.
fn first_match(signature: &Signature, matches: impl Fn(&str) -> bool) -> Option<&'static str> {
    signature
        .patterns
        .iter()
        .copied()
        .find(|sig| matches(&sig.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{response::Html as HtmlBody, routing::get, Router};

    fn techs_with_cms(name: &str) -> Vec<Technology> {
        vec![Technology { name: name.into(), category: "cms".into(), version: None }]
    }

    #[test]
    fn wp_content_in_body_is_wordpress() {
        let found = detect_cms("https://blog.example.com/", "<link href='/wp-content/themes/x.css'>", &[]);
        assert_eq!(found["WordPress"], "Matched signature: wp-content");
    }

    #[test]
    fn wp_content_in_url_is_wordpress() {
        let found = detect_cms("https://example.com/wp-content/page", "<html></html>", &[]);
        assert_eq!(found["WordPress"], "Matched signature: wp-content");
    }

    #[test]
    fn first_signature_in_table_order_wins() {
        let found = detect_cms("https://example.com/", "wp-admin wp-includes", &[]);
        assert_eq!(found["WordPress"], "Matched signature: wp-includes");
    }

    #[test]
    fn mixed_case_signatures_match_lowercased_html() {
        let found = detect_cms("https://example.com/", "<meta name=generator content='Joomla! 4'>", &[]);
        assert_eq!(found["Joomla"], "Matched signature: Joomla!");
    }

    #[test]
    fn fingerprint_database_overrides_signature_reason() {
        let found = detect_cms("https://example.com/", "wp-content", &techs_with_cms("WordPress"));
        assert_eq!(found["WordPress"], BUILTWITH_REASON);

        let found = detect_cms("https://example.com/", "", &techs_with_cms("Ghost"));
        assert_eq!(found.len(), 1);
        assert_eq!(found["Ghost"], BUILTWITH_REASON);
    }

    #[test]
    fn js_frameworks_match_script_urls_and_text() {
        let html = r#"<html><body>
            <script src="/static/vendor/jquery.min.js"></script>
            <script id="__NEXT_DATA__" type="application/json">{"page":"/"}</script>
            <div x-data="{open:false}">menu</div>
        </body></html>"#;
        let found = detect_js_frameworks(html);
        assert_eq!(found["jQuery"], "Matched: jquery");
        assert!(!found.contains_key("Next.js"));
        assert!(!found.contains_key("Alpine.js"));
    }

    #[test]
    fn inline_script_and_style_bodies_are_ignored() {
        let html = "<html><head><style>.vue-card{color:red}</style></head>\
            <body><p>Hello</p><script>var reactive = 1; window.__NUXT__={}</script>\
            <noscript>angular</noscript></body></html>";
        assert!(detect_js_frameworks(html).is_empty());
    }

    #[test]
    fn visible_text_and_script_paths_are_searched() {
        let html = r#"<html><body><p>Built with Svelte</p>
            <script src="/_nuxt/app.3f2a.js"></script></body></html>"#;
        let found = detect_js_frameworks(html);
        assert_eq!(found["Svelte"], "Matched: svelte");
        assert_eq!(found["Nuxt.js"], "Matched: /_nuxt/");
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn plain_page_has_no_frameworks() {
        assert!(detect_js_frameworks("<html><body><p>hello</p></body></html>").is_empty());
    }

    #[tokio::test]
    async fn one_fetch_feeds_every_sub_probe() {
        let app = Router::new().route(
            "/",
            get(|| async {
                (
                    [("server", "nginx/1.25.3")],
                    HtmlBody(r#"<html><head><meta name="generator" content="WordPress 6.4.2"></head>
                        <body><script src="/wp-includes/js/jquery/jquery.min.js?ver=3.7.1"></script></body></html>"#),
                )
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let results = run_tech_scan(&client, &format!("http://{addr}/")).await;

        let techs = results.technologies.as_done().unwrap();
        assert_eq!(techs["web-servers"], vec!["Nginx 1.25.3"]);
        assert_eq!(techs["cms"], vec!["WordPress 6.4.2"]);
        assert_eq!(techs["javascript-frameworks"], vec!["jQuery 3.7.1"]);
        assert_eq!(results.cms.as_done().unwrap()["WordPress"], BUILTWITH_REASON);
        assert_eq!(results.javascript_frameworks.as_done().unwrap()["jQuery"], "Matched: jquery");
    }

    #[tokio::test]
    async fn failed_fetch_is_reported_by_all_sub_probes() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let results = run_tech_scan(&client, &format!("http://{addr}/")).await;
        assert!(results.technologies.error().is_some());
        assert!(results.cms.error().is_some());
        assert!(results.javascript_frameworks.error().is_some());
    }
}
