//! Listing URL and link extraction tests against the public API.

use disclosure_fetch::services::LinkExtractor;
use disclosure_fetch::site::{is_gate_url, SiteLayout};

fn listing(hrefs: &[&str]) -> String {
    let items: String = hrefs
        .iter()
        .map(|h| format!(r#"<tr><td><a href="{}">file</a></td></tr>"#, h))
        .collect();
    format!("<html><body><table>{}</table></body></html>", items)
}

#[test]
fn pagination_urls() {
    let site = SiteLayout::default();
    assert_eq!(
        site.listing_url(12, 0),
        "https://www.justice.gov/epstein/doj-disclosures/data-set-12-files"
    );
    assert_eq!(
        site.listing_url(12, 7),
        "https://www.justice.gov/epstein/doj-disclosures/data-set-12-files?page=7"
    );
    assert_eq!(site.home_url(), "https://www.justice.gov/epstein");
}

#[test]
fn extractor_keeps_only_the_requested_dataset() {
    let site = SiteLayout::default();
    let page = site.listing_url(2, 1);
    let html = listing(&[
        "/epstein/files/DataSet%202/EFTA00000200.pdf",
        "https://www.justice.gov/epstein/files/DataSet%202/EFTA00000201.pdf",
        "/epstein/files/DataSet%2012/EFTA00000202.pdf",
        "/epstein/files/DataSet%202/EFTA0000020.pdf",
        "/epstein/doj-disclosures/data-set-2-files?page=2",
    ]);

    let refs = LinkExtractor::new(&site).unwrap().extract(&html, &page, 2);
    let names: Vec<String> = refs.iter().map(|r| r.filename()).collect();
    assert_eq!(names, vec!["EFTA00000200.pdf", "EFTA00000201.pdf"]);
    assert!(refs.iter().all(|r| r.referer_url() == page && r.dataset() == 2));
}

#[test]
fn extractor_follows_a_custom_layout() {
    let site = SiteLayout {
        root: "https://records.example.org".to_string(),
        section: "archive".to_string(),
        disclosure_path: "releases".to_string(),
    };
    let page = site.listing_url(1, 0);
    let html = listing(&["../files/DataSet%201/EFTA00000001.pdf"]);

    let refs = LinkExtractor::new(&site).unwrap().extract(&html, &page, 1);
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].source_url(), site.document_url(1, "00000001"));
}

#[test]
fn gate_signal_is_case_insensitive() {
    assert!(is_gate_url("https://www.justice.gov/AGE-VERIFY?destination=%2Fepstein"));
    assert!(!is_gate_url("https://www.justice.gov/epstein/files/DataSet%201/EFTA00000001.pdf"));
}
