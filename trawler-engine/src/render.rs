use async_trait::async_trait;
use url::Url;

/// External collaborator that returns the fully rendered body HTML for a
/// URL. A rendering failure is non-fatal to the page: the classifier
/// degrades to an empty body and the fetch is still reported per its HTTP
/// outcome.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &Url) -> anyhow::Result<String>;
}

#[cfg(feature = "js-rendering")]
pub use headless::HeadlessRenderer;

#[cfg(feature = "js-rendering")]
mod headless {
    use super::PageRenderer;
    use anyhow::Context;
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use futures::StreamExt;
    use tokio::task::JoinHandle;
    use url::Url;

    /// Chromium-backed renderer. The CDP event handler runs on its own
    /// task and must be aborted when the browser goes away.
    pub struct HeadlessRenderer {
        browser: Browser,
        handler: JoinHandle<()>,
    }

    impl HeadlessRenderer {
        pub async fn launch() -> anyhow::Result<Self> {
            let config = BrowserConfig::builder()
                .build()
                .map_err(|e| anyhow::anyhow!(e))?;
            let (browser, mut handler) = Browser::launch(config)
                .await
                .context("failed to launch headless browser")?;

            let handler = tokio::spawn(async move {
                while handler.next().await.is_some() {}
            });

            Ok(Self { browser, handler })
        }

        pub async fn close(mut self) -> anyhow::Result<()> {
            self.browser.close().await?;
            self.handler.abort();
            Ok(())
        }
    }

    impl Drop for HeadlessRenderer {
        fn drop(&mut self) {
            self.handler.abort();
        }
    }

    #[async_trait]
    impl PageRenderer for HeadlessRenderer {
        async fn render(&self, url: &Url) -> anyhow::Result<String> {
            let page = self
                .browser
                .new_page(url.as_str())
                .await
                .context("failed to open page")?;
            page.wait_for_navigation().await?;
            let html = page.content().await?;
            page.close().await?;
            Ok(html)
        }
    }
}
