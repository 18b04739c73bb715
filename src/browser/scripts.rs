//! JavaScript evaluated inside the page.

use super::types::AffirmativeControl;

/// Resolves once the document is at least interactive.
pub const WAIT_FOR_READY_SCRIPT: &str = r#"
    new Promise((resolve) => {
        if (document.readyState === 'complete' || document.readyState === 'interactive') {
            resolve(document.readyState);
        } else {
            document.addEventListener('DOMContentLoaded', () => resolve(document.readyState));
            setTimeout(() => resolve('timeout'), 10000);
        }
    })
"#;

/// Quote a Rust string as a JavaScript string literal.
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Script that clicks the first visible element matching `control` and
/// evaluates to `true`, or evaluates to `false` if nothing matched.
///
/// When matches nest (`<li><a>Yes</a></li>`), the innermost one is clicked.
pub fn click_control_script(control: AffirmativeControl, label: &str) -> String {
    let label = js_string(label);
    let (selector, predicate) = match control {
        AffirmativeControl::ExactText => ("body *", "norm(el.innerText) === want"),
        AffirmativeControl::RoleButton => (
            "[role=\"button\"]",
            "norm(el.getAttribute('aria-label') || el.innerText) === want",
        ),
        AffirmativeControl::ButtonWithText => ("button", "norm(el.innerText).includes(want)"),
        AffirmativeControl::AnchorWithText => ("a", "norm(el.innerText).includes(want)"),
        AffirmativeControl::SubmitInput => ("input[type=\"submit\"]", "norm(el.value) === want"),
    };

    format!(
        r#"
        (() => {{
            const want = {label};
            const norm = (s) => (s || '').replace(/\s+/g, ' ').trim();
            const visible = (el) => el.getClientRects().length > 0;
            const matches = Array.from(document.querySelectorAll('{selector}'))
                .filter((el) => visible(el) && ({predicate}));
            const target = matches.find(
                (el) => !matches.some((other) => other !== el && el.contains(other))
            );
            if (!target) return false;
            target.click();
            return true;
        }})()
        "#
    )
}

/// Script that fetches `url` with the page's cookies and evaluates to
/// `{{status, url, contentType, data}}` or `{{error}}`.
///
/// The body is only read for statuses below 400 other than 204.
pub fn fetch_document_script(url: &str, referer: Option<&str>) -> String {
    let url = js_string(url);
    let referrer = referer
        .map(js_string)
        .unwrap_or_else(|| "undefined".to_string());

    format!(
        r#"
        (async () => {{
            try {{
                const response = await fetch({url}, {{
                    method: 'GET',
                    credentials: 'include',
                    referrer: {referrer},
                    headers: {{ 'Accept': 'application/pdf,*/*;q=0.8' }}
                }});

                const contentType = response.headers.get('content-type') || '';
                let data = '';
                if (response.status < 400 && response.status !== 204) {{
                    const bytes = new Uint8Array(await response.arrayBuffer());
                    let binary = '';
                    const chunk = 0x8000;
                    for (let i = 0; i < bytes.length; i += chunk) {{
                        binary += String.fromCharCode.apply(null, bytes.subarray(i, i + chunk));
                    }}
                    data = btoa(binary);
                }}

                return {{
                    status: response.status,
                    url: response.url,
                    contentType: contentType,
                    data: data
                }};
            }} catch (e) {{
                return {{ error: e.toString() }};
            }}
        }})()
        "#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_is_escaped() {
        let script = click_control_script(AffirmativeControl::ExactText, "Yes \"I'm\" 18");
        assert!(script.contains(r#"const want = "Yes \"I'm\" 18";"#));
    }

    #[test]
    fn test_each_control_has_its_selector() {
        let cases = [
            (AffirmativeControl::RoleButton, "[role=\"button\"]"),
            (AffirmativeControl::ButtonWithText, "querySelectorAll('button')"),
            (AffirmativeControl::AnchorWithText, "querySelectorAll('a')"),
            (AffirmativeControl::SubmitInput, "input[type=\"submit\"]"),
        ];
        for (control, needle) in cases {
            assert!(
                click_control_script(control, "Yes").contains(needle),
                "{:?}",
                control
            );
        }
    }

    #[test]
    fn test_nested_matches_click_the_innermost() {
        let script = click_control_script(AffirmativeControl::ExactText, "Yes");
        assert!(script.contains("querySelectorAll('body *')"));
        assert!(script.contains("!matches.some((other) => other !== el && el.contains(other))"));
        assert!(script.contains("target.click()"));
    }

    #[test]
    fn test_fetch_script_referrer() {
        let with = fetch_document_script("https://a.test/x.pdf", Some("https://a.test/list"));
        assert!(with.contains(r#"referrer: "https://a.test/list""#));
        assert!(with.contains("response.status !== 204"));

        let without = fetch_document_script("https://a.test/x.pdf", None);
        assert!(without.contains("referrer: undefined"));
    }
}
