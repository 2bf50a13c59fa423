use crate::domain::locator::{ElementRef, Locator};
use crate::domain::ports::Browser;
use crate::utils::error::{RegoError, Result};
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

const STALE_ELEMENT: &str = "stale element reference";

#[derive(Debug, Clone, Copy)]
enum Condition<'a> {
    Present(&'a Locator),
    Visible(&'a Locator),
    Clickable(&'a Locator),
    AllPresent(&'a Locator),
    AnyPresent(&'a [Locator]),
}

impl Condition<'_> {
    fn describe(&self) -> String {
        match self {
            Condition::Present(l) => format!("presence of {}", l),
            Condition::Visible(l) => format!("visibility of {}", l),
            Condition::Clickable(l) => format!("{} to be clickable", l),
            Condition::AllPresent(l) => format!("presence of all {}", l),
            Condition::AnyPresent(ls) => format!(
                "any of [{}]",
                ls.iter().map(|l| l.to_string()).collect::<Vec<_>>().join(", ")
            ),
        }
    }
}

/// Polls the page until a condition holds, like an explicit wait.
pub struct Wait<'a> {
    browser: &'a dyn Browser,
    timeout: Duration,
    poll: Duration,
}

impl<'a> Wait<'a> {
    pub fn new(browser: &'a dyn Browser, timeout: Duration) -> Self {
        Self {
            browser,
            timeout,
            poll: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn secs(browser: &'a dyn Browser, seconds: u64) -> Self {
        Self::new(browser, Duration::from_secs(seconds))
    }

    pub fn poll_every(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }

    pub async fn until_present(&self, locator: &Locator) -> Result<ElementRef> {
        self.first(Condition::Present(locator)).await
    }

    pub async fn until_visible(&self, locator: &Locator) -> Result<ElementRef> {
        self.first(Condition::Visible(locator)).await
    }

    /// Displayed and enabled.
    pub async fn until_clickable(&self, locator: &Locator) -> Result<ElementRef> {
        self.first(Condition::Clickable(locator)).await
    }

    pub async fn until_all_present(&self, locator: &Locator) -> Result<Vec<ElementRef>> {
        self.until(Condition::AllPresent(locator)).await
    }

    /// The first element found among `locators`, checked in order on each poll.
    pub async fn until_any(&self, locators: &[Locator]) -> Result<ElementRef> {
        self.first(Condition::AnyPresent(locators)).await
    }

    async fn first(&self, condition: Condition<'_>) -> Result<ElementRef> {
        let found = self.until(condition).await?;
        found
            .into_iter()
            .next()
            .ok_or_else(|| RegoError::page(format!("{} matched nothing", condition.describe())))
    }

    async fn until(&self, condition: Condition<'_>) -> Result<Vec<ElementRef>> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(found) = self.probe(condition).await? {
                return Ok(found);
            }
            if Instant::now() >= deadline {
                return Err(RegoError::timeout(format!(
                    "waited {:?} for {}",
                    self.timeout,
                    condition.describe()
                )));
            }
            tokio::time::sleep(self.poll).await;
        }
    }

    async fn probe(&self, condition: Condition<'_>) -> Result<Option<Vec<ElementRef>>> {
        let browser = self.browser;
        match condition {
            Condition::Present(locator) => Ok(browser.find(locator).await?.map(|el| vec![el])),
            Condition::Visible(locator) => {
                let Some(el) = browser.find(locator).await? else {
                    return Ok(None);
                };
                let visible = not_stale(browser.is_displayed(&el).await)?;
                Ok(visible.then(|| vec![el]))
            }
            Condition::Clickable(locator) => {
                let Some(el) = browser.find(locator).await? else {
                    return Ok(None);
                };
                let clickable = not_stale(browser.is_displayed(&el).await)?
                    && not_stale(browser.is_enabled(&el).await)?;
                Ok(clickable.then(|| vec![el]))
            }
            Condition::AllPresent(locator) => {
                let found = browser.find_all(locator).await?;
                Ok((!found.is_empty()).then_some(found))
            }
            Condition::AnyPresent(locators) => {
                for locator in locators {
                    if let Some(el) = browser.find(locator).await? {
                        return Ok(Some(vec![el]));
                    }
                }
                Ok(None)
            }
        }
    }
}

/// A stale element counts as "not yet" rather than a failure.
fn not_stale(result: Result<bool>) -> Result<bool> {
    match result {
        Err(RegoError::WebDriverError { code, .. }) if code == STALE_ELEMENT => Ok(false),
        other => other,
    }
}

/// Runs an any-of wait and reports whether something showed up in time.
pub async fn appeared(browser: &dyn Browser, timeout: Duration, locators: &[Locator]) -> Result<bool> {
    match Wait::new(browser, timeout).until_any(locators).await {
        Ok(_) => Ok(true),
        Err(e) if e.is_timeout() => Ok(false),
        Err(e) => Err(e),
    }
}
