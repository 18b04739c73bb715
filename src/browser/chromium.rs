//! Chromium-backed browsing surface over CDP.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::cdp::browser_protocol::emulation::SetTimezoneOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, SetUserAgentOverrideParams};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use super::scripts::{click_control_script, fetch_document_script, WAIT_FOR_READY_SCRIPT};
use super::{
    AffirmativeControl, BrowserCookie, BrowserEngineConfig, BrowsingSurface, PageLoad,
    SurfaceError,
};
use crate::models::FetchOutcome;

const ACTUATE_POLL: Duration = Duration::from_millis(250);

/// One Chromium tab, either launched locally or attached to a remote browser.
pub struct ChromiumSurface {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    config: BrowserEngineConfig,
}

impl ChromiumSurface {
    /// Launch (or connect to) a browser and open a blank tab.
    pub async fn launch(config: BrowserEngineConfig) -> anyhow::Result<Self> {
        let (browser, handler) = match config.remote_url.clone() {
            Some(remote_url) => Self::connect_remote(&config, &remote_url).await?,
            None => Self::launch_local(&config).await?,
        };

        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to open browser tab")?;

        let ua = SetUserAgentOverrideParams::builder()
            .user_agent(config.user_agent.clone())
            .accept_language(config.locale.clone())
            .build()
            .map_err(|e| anyhow::anyhow!("Invalid user agent override: {}", e))?;
        page.execute(ua)
            .await
            .context("Failed to set user agent")?;

        if !config.timezone.is_empty() {
            if let Err(e) = page
                .execute(SetTimezoneOverrideParams::new(config.timezone.clone()))
                .await
            {
                warn!("Could not set timezone {}: {}", config.timezone, e);
            }
        }

        Ok(Self {
            browser,
            page,
            handler,
            config,
        })
    }

    /// Find the browser executable for the configured channel.
    fn find_executable(config: &BrowserEngineConfig) -> anyhow::Result<PathBuf> {
        if let Some(ref path) = config.chrome_executable {
            if path.exists() {
                return Ok(path.clone());
            }
            anyhow::bail!("Browser executable not found: {}", path.display());
        }

        for path in config.channel.install_paths() {
            let p = Path::new(path);
            if p.exists() {
                info!("Found browser at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for name in config.channel.executable_names() {
            if let Ok(path) = which::which(name) {
                info!("Found browser in PATH: {}", path.display());
                return Ok(path);
            }
        }

        Err(anyhow::anyhow!(
            "Chrome/Chromium not found. Please install it:\n\
             - Arch/Manjaro: sudo pacman -S chromium\n\
             - Ubuntu/Debian: sudo apt install chromium-browser\n\
             - Fedora: sudo dnf install chromium\n\
             - Or pass --chrome-path / --remote-browser"
        ))
    }

    async fn launch_local(config: &BrowserEngineConfig) -> anyhow::Result<(Browser, JoinHandle<()>)> {
        let chrome_path = Self::find_executable(config)?;
        info!(
            "Launching browser (headless={}, channel={:?})",
            config.headless, config.channel
        );

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .request_timeout(Duration::from_secs(config.timeout));

        // with_head means NOT headless
        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg(format!("--lang={}", config.locale))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox");

        if config.block_images {
            builder = builder.arg("--blink-settings=imagesEnabled=false");
        }

        for arg in &config.chrome_args {
            builder = builder.arg(arg);
        }

        let browser_config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        let (browser, handler) = Browser::launch(browser_config)
            .await
            .context("Failed to launch browser")?;

        Ok((browser, Self::spawn_handler(handler)))
    }

    async fn connect_remote(
        config: &BrowserEngineConfig,
        url: &str,
    ) -> anyhow::Result<(Browser, JoinHandle<()>)> {
        info!(
            "Connecting to remote browser at {} (timeout: {}s)",
            url, config.timeout
        );

        // Get WebSocket URL from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .send()
            .await
            .context("Failed to connect to remote browser")?
            .json()
            .await
            .context("Failed to parse browser version info")?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("No webSocketDebuggerUrl in response"))?;

        debug!("Connecting to WebSocket: {}", ws_url);

        let handler_config = chromiumoxide::handler::HandlerConfig {
            request_timeout: Duration::from_secs(config.timeout),
            ..Default::default()
        };

        let (browser, handler) = Browser::connect_with_config(ws_url, handler_config)
            .await
            .context("Failed to connect to remote browser")?;

        Ok((browser, Self::spawn_handler(handler)))
    }

    fn spawn_handler(mut handler: chromiumoxide::Handler) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        })
    }

    async fn wait_until_ready(&self, timeout: Duration) {
        match tokio::time::timeout(timeout, self.page.evaluate(WAIT_FOR_READY_SCRIPT.to_string()))
            .await
        {
            Ok(Ok(result)) => {
                let state: String = result
                    .into_value()
                    .unwrap_or_else(|_| "unknown".to_string());
                debug!("Page ready state: {}", state);
            }
            Ok(Err(e)) => debug!("Could not check ready state: {}", e),
            Err(_) => warn!("Timeout waiting for page ready state"),
        }
    }

    /// Make sure the tab is on the same origin as `url` so its cookies apply.
    async fn ensure_origin(
        &mut self,
        url: &str,
        referer: Option<&str>,
        timeout: Duration,
    ) -> Result<(), SurfaceError> {
        let target = Url::parse(url).map_err(|e| SurfaceError::InvalidUrl(e.to_string()))?;
        let current = self.current_url().await?;
        let same_origin = Url::parse(&current)
            .map(|u| u.origin() == target.origin())
            .unwrap_or(false);
        if same_origin {
            return Ok(());
        }

        let landing = match referer {
            Some(r) => r.to_string(),
            None => target.origin().ascii_serialization(),
        };
        debug!("Switching tab to {} before fetching {}", landing, url);
        self.goto(&landing, None, timeout).await.map(|_| ())
    }
}

/// What is left of one attempt's budget once `spent` has elapsed.
fn remaining_budget(budget: Duration, spent: Duration) -> Duration {
    budget.saturating_sub(spent)
}

/// Map a Chromium `net::ERR_*` string to an error kind.
fn classify_net_error(text: String) -> SurfaceError {
    if text.contains("ERR_INVALID_URL") {
        SurfaceError::InvalidUrl(text)
    } else if text.contains("ERR_TIMED_OUT") {
        SurfaceError::Timeout(Duration::ZERO)
    } else if text.contains("ERR_ABORTED") {
        SurfaceError::Aborted(text)
    } else {
        SurfaceError::Transport(text)
    }
}

#[async_trait]
impl BrowsingSurface for ChromiumSurface {
    async fn goto(
        &mut self,
        url: &str,
        referer: Option<&str>,
        timeout: Duration,
    ) -> Result<PageLoad, SurfaceError> {
        let mut params = NavigateParams::builder().url(url);
        if let Some(referer) = referer {
            params = params.referrer(referer);
        }
        let params = params.build().map_err(SurfaceError::InvalidUrl)?;

        let started = tokio::time::Instant::now();
        let nav = tokio::time::timeout(timeout, self.page.execute(params))
            .await
            .map_err(|_| SurfaceError::Timeout(timeout))??;
        if let Some(error_text) = nav.result.error_text.clone() {
            return Err(classify_net_error(error_text));
        }

        self.wait_until_ready(remaining_budget(timeout, started.elapsed()))
            .await;

        let final_url = self.current_url().await?;
        Ok(PageLoad {
            final_url: if final_url.is_empty() {
                url.to_string()
            } else {
                final_url
            },
        })
    }

    async fn current_url(&mut self) -> Result<String, SurfaceError> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn html(&mut self) -> Result<String, SurfaceError> {
        Ok(self.page.content().await?)
    }

    async fn actuate(
        &mut self,
        control: AffirmativeControl,
        label: &str,
        timeout: Duration,
    ) -> Result<bool, SurfaceError> {
        let script = click_control_script(control, label);
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            match self.page.evaluate(script.clone()).await {
                Ok(result) => {
                    if result.into_value::<bool>().unwrap_or(false) {
                        return Ok(true);
                    }
                }
                Err(e) => debug!("Control check ({}) failed: {}", control.describe(), e),
            }

            if tokio::time::Instant::now() + ACTUATE_POLL > deadline {
                return Ok(false);
            }
            tokio::time::sleep(ACTUATE_POLL).await;
        }
    }

    async fn wait_for_settle(&mut self, timeout: Duration) -> Result<(), SurfaceError> {
        let started = tokio::time::Instant::now();
        tokio::time::timeout(timeout, self.page.wait_for_navigation())
            .await
            .map_err(|_| SurfaceError::Timeout(timeout))??;
        self.wait_until_ready(remaining_budget(timeout, started.elapsed()))
            .await;
        Ok(())
    }

    async fn fetch_document(
        &mut self,
        url: &str,
        referer: Option<&str>,
        timeout: Duration,
    ) -> Result<FetchOutcome, SurfaceError> {
        self.ensure_origin(url, referer, timeout).await?;

        let script = fetch_document_script(url, referer);
        let result: serde_json::Value =
            tokio::time::timeout(timeout, self.page.evaluate(script))
                .await
                .map_err(|_| SurfaceError::Timeout(timeout))??
                .into_value()
                .map_err(|e| SurfaceError::Script(e.to_string()))?;

        if let Some(error) = result.get("error").and_then(|e| e.as_str()) {
            return Err(SurfaceError::Transport(error.to_string()));
        }

        let status = result
            .get("status")
            .and_then(|s| s.as_u64())
            .and_then(|s| u16::try_from(s).ok())
            .filter(|s| *s != 0);
        let final_url = result
            .get("url")
            .and_then(|u| u.as_str())
            .filter(|u| !u.is_empty())
            .unwrap_or(url)
            .to_string();
        let content_type = result
            .get("contentType")
            .and_then(|c| c.as_str())
            .unwrap_or_default()
            .to_string();
        let data_b64 = result.get("data").and_then(|d| d.as_str()).unwrap_or("");

        let body = base64::engine::general_purpose::STANDARD
            .decode(data_b64)
            .map_err(|e| SurfaceError::Script(format!("bad base64 body: {}", e)))?;

        debug!(
            "Fetched {} bytes from {} (status {:?}, {})",
            body.len(),
            final_url,
            status,
            content_type
        );

        Ok(FetchOutcome {
            status,
            final_url,
            content_type,
            body,
        })
    }

    async fn export_cookies(&mut self) -> Result<Vec<BrowserCookie>, SurfaceError> {
        let cookies = self.page.get_cookies().await?;
        Ok(cookies
            .iter()
            .map(|c| BrowserCookie {
                name: c.name.clone(),
                value: c.value.clone(),
                domain: c.domain.clone(),
                path: c.path.clone(),
                secure: c.secure,
                http_only: c.http_only,
            })
            .collect())
    }

    async fn import_cookies(&mut self, cookies: &[BrowserCookie]) -> Result<usize, SurfaceError> {
        let mut accepted = 0;
        for cookie in cookies {
            if cookie.name.is_empty() || cookie.domain.is_empty() {
                continue;
            }

            let param = CookieParam::builder()
                .name(cookie.name.clone())
                .value(cookie.value.clone())
                .domain(cookie.domain.clone())
                .path(cookie.path.clone())
                .secure(cookie.secure)
                .http_only(cookie.http_only)
                .build();

            match param {
                Ok(param) => match self.page.set_cookie(param).await {
                    Ok(_) => accepted += 1,
                    Err(e) => warn!("Failed to set cookie {}: {}", cookie.name, e),
                },
                Err(e) => warn!("Failed to build cookie {}: {}", cookie.name, e),
            }
        }
        Ok(accepted)
    }

    async fn close(&mut self) -> Result<(), SurfaceError> {
        let _ = self.page.clone().close().await;
        if self.config.remote_url.is_none() {
            self.browser.close().await?;
            let _ = self.browser.wait().await;
        }
        self.handler.abort();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_wait_gets_only_the_remaining_budget() {
        let budget = Duration::from_secs(60);
        assert_eq!(
            remaining_budget(budget, Duration::from_secs(45)),
            Duration::from_secs(15)
        );
        assert_eq!(remaining_budget(budget, Duration::from_secs(90)), Duration::ZERO);
    }

    #[test]
    fn test_net_errors_are_classified() {
        assert!(matches!(
            classify_net_error("net::ERR_INVALID_URL".to_string()),
            SurfaceError::InvalidUrl(_)
        ));
        assert!(matches!(
            classify_net_error("net::ERR_TIMED_OUT".to_string()),
            SurfaceError::Timeout(_)
        ));
        assert!(matches!(
            classify_net_error("net::ERR_CONNECTION_RESET".to_string()),
            SurfaceError::Transport(_)
        ));
    }
}
