use crate::core::pacing::Pacing;
use crate::domain::locator::{ElementRef, Locator};
use crate::domain::ports::Browser;
use crate::utils::error::Result;

/// Clicks through JavaScript, which survives overlays that swallow native clicks.
pub async fn js_click(browser: &dyn Browser, element: &ElementRef) -> Result<()> {
    browser
        .execute("arguments[0].click();", vec![element.to_json()])
        .await
        .map(|_| ())
}

pub async fn scroll_into_view(browser: &dyn Browser, element: &ElementRef) -> Result<()> {
    browser
        .execute("arguments[0].scrollIntoView(true);", vec![element.to_json()])
        .await
        .map(|_| ())
}

pub async fn scroll_and_click(browser: &dyn Browser, element: &ElementRef) -> Result<()> {
    scroll_into_view(browser, element).await?;
    js_click(browser, element).await
}

pub async fn fill(browser: &dyn Browser, element: &ElementRef, text: &str) -> Result<()> {
    browser.clear(element).await?;
    browser.send_keys(element, text).await
}

/// Types one character at a time with short random gaps.
pub async fn type_slowly(
    browser: &dyn Browser,
    element: &ElementRef,
    text: &str,
    pacing: &Pacing,
) -> Result<()> {
    browser.clear(element).await?;
    for ch in text.chars() {
        browser.send_keys(element, &ch.to_string()).await?;
        pacing.between(0.1, 0.3).await;
    }
    Ok(())
}

/// Trimmed text of the first match, if any.
pub async fn text_of(browser: &dyn Browser, locator: &Locator) -> Result<Option<String>> {
    match browser.find(locator).await? {
        Some(el) => Ok(Some(browser.text(&el).await?.trim().to_string())),
        None => Ok(None),
    }
}

pub async fn text_in(browser: &dyn Browser, parent: &ElementRef, locator: &Locator) -> Result<Option<String>> {
    match browser.find_in(parent, locator).await? {
        Some(el) => Ok(Some(browser.text(&el).await?.trim().to_string())),
        None => Ok(None),
    }
}

/// Trimmed `value` of an input element.
pub async fn input_value(browser: &dyn Browser, element: &ElementRef) -> Result<String> {
    Ok(browser
        .property(element, "value")
        .await?
        .unwrap_or_default()
        .trim()
        .to_string())
}
