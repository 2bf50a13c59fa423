use super::browser::FakeBrowser;
use crate::domain::ports::{Browser, SessionFactory};
use crate::utils::error::{RegoError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Hands out sessions that all share one [`FakeBrowser`].
#[derive(Debug)]
pub struct FakeSessionFactory {
    browser: FakeBrowser,
    opened: AtomicUsize,
    fail: bool,
    open_delay: Duration,
}

impl FakeSessionFactory {
    pub fn new(browser: FakeBrowser) -> Self {
        Self {
            browser,
            opened: AtomicUsize::new(0),
            fail: false,
            open_delay: Duration::ZERO,
        }
    }

    /// A factory whose driver never starts.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(FakeBrowser::new())
        }
    }

    /// Holds each `open` for `delay` before returning the session.
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    pub fn browser(&self) -> &FakeBrowser {
        &self.browser
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for FakeSessionFactory {
    async fn open(&self) -> Result<Box<dyn Browser>> {
        if self.fail {
            return Err(RegoError::DriverStartError {
                message: "chromedriver is not available".to_string(),
            });
        }
        if !self.open_delay.is_zero() {
            tokio::time::sleep(self.open_delay).await;
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.browser.session_opened();
        Ok(Box::new(self.browser.clone()))
    }
}
