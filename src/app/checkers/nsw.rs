use crate::core::interact::{js_click, scroll_into_view, type_slowly};
use crate::core::pacing::Pacing;
use crate::core::wait::Wait;
use crate::core::{
    AuState, Browser, ElementRef, Locator, Plate, RegoStatus, StateChecker, VehicleDetails,
    VehicleInfo,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

pub const URL: &str = "https://check-registration.service.nsw.gov.au/frc?isLoginRequired=true";

const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(25);
const WAIT_SECS: u64 = 10;

pub fn recaptcha_frame() -> Locator {
    Locator::css("iframe[title='reCAPTCHA']")
}

pub fn check_button() -> Locator {
    Locator::xpath("//button[contains(text(), 'Check registration')]")
}

pub fn vehicle_section(plate: &Plate) -> Locator {
    Locator::id(format!("vehicle-{}-O", plate))
}

pub fn expiry_notice() -> Locator {
    Locator::xpath(".//strong[contains(text(), 'Registration expires')]")
}

/// Any element whose own text contains `fragment`.
pub fn page_text(fragment: &str) -> Locator {
    Locator::xpath(format!("//*[contains(text(), '{}')]", fragment))
}

/// Service NSW free registration check.
///
/// The page sits behind reCAPTCHA, so the flow types slowly and pauses between steps.
pub struct NswChecker {
    pacing: Pacing,
}

impl NswChecker {
    pub fn new(pacing: Pacing) -> Self {
        Self { pacing }
    }

    /// Sends browser-like headers alongside the session's own user agent.
    async fn override_headers(&self, browser: &dyn Browser) -> Result<()> {
        let user_agent = browser
            .execute("return navigator.userAgent;", vec![])
            .await?
            .as_str()
            .map(str::to_string)
            .unwrap_or_default();

        browser.cdp("Network.enable", json!({})).await?;
        browser
            .cdp(
                "Network.setUserAgentOverride",
                json!({
                    "userAgent": user_agent,
                    "acceptLanguage": "en-US,en;q=0.9",
                    "platform": "Win32",
                }),
            )
            .await?;
        browser
            .cdp(
                "Network.setExtraHTTPHeaders",
                json!({
                    "headers": {
                        "Accept": "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
                        "Accept-Language": "en-US,en;q=0.9",
                        "Upgrade-Insecure-Requests": "1",
                    }
                }),
            )
            .await?;
        Ok(())
    }

    async fn read_details(&self, browser: &dyn Browser, section: &ElementRef) -> Result<VehicleDetails> {
        let cells = browser
            .find_all_in(section, &Locator::xpath(".//div[not(*)]"))
            .await?;
        let mut texts = Vec::with_capacity(cells.len());
        for cell in &cells {
            texts.push(browser.text(cell).await?.trim().to_string());
        }
        Ok(details_from_grid(&texts))
    }
}

#[async_trait]
impl StateChecker for NswChecker {
    fn state(&self) -> AuState {
        AuState::Nsw
    }

    async fn check(&self, browser: &dyn Browser, plate: &Plate) -> Result<VehicleInfo> {
        browser.set_page_load_timeout(PAGE_LOAD_TIMEOUT).await?;
        if let Err(e) = self.override_headers(browser).await {
            tracing::warn!("Could not override NSW request headers: {}", e);
        }

        browser.goto(URL).await?;
        self.pacing.between(2.0, 4.0).await;

        let wait = Wait::secs(browser, WAIT_SECS);
        match wait.until_present(&recaptcha_frame()).await {
            Ok(_) => tracing::debug!("reCAPTCHA frame loaded"),
            Err(e) if e.is_timeout() => tracing::warn!("reCAPTCHA frame did not load"),
            Err(e) => return Err(e),
        }

        let plate_input = wait.until_present(&Locator::id("plateNumberInput")).await?;
        type_slowly(browser, &plate_input, plate.as_str(), &self.pacing).await?;
        self.pacing.between(0.5, 1.0).await;

        browser.execute("window.scrollBy(0, 100);", vec![]).await?;
        self.pacing.between(0.3, 0.7).await;

        let terms = wait.until_present(&Locator::id("termsAndConditions")).await?;
        scroll_into_view(browser, &terms).await?;
        self.pacing.between(0.3, 0.7).await;
        js_click(browser, &terms).await?;
        self.pacing.between(0.8, 1.5).await;

        let button = wait.until_present(&check_button()).await?;
        scroll_into_view(browser, &button).await?;
        self.pacing.between(0.3, 0.7).await;
        js_click(browser, &button).await?;

        self.pacing.pause_secs(5.0).await;

        let section = match wait.until_present(&vehicle_section(plate)).await {
            Ok(section) => section,
            Err(e) if e.is_timeout() => return self.explain_missing_result(browser).await,
            Err(e) => return Err(e),
        };

        let Some(expiry) = browser.find_in(&section, &expiry_notice()).await? else {
            return Ok(VehicleInfo::with_status(RegoStatus::Unregistered));
        };
        tracing::info!("NSW {}", browser.text(&expiry).await?.trim());

        let mut info = VehicleInfo::with_status(RegoStatus::Registered);
        match self.read_details(browser, &section).await {
            Ok(details) if !details.is_empty() => info.merge_details(details),
            Ok(_) => tracing::warn!("NSW vehicle section had no readable details"),
            Err(e) => {
                tracing::error!("Could not read NSW vehicle details: {}", e);
                info.error = Some("Found registration, but failed to fetch details.".to_string());
            }
        }
        Ok(info)
    }
}

impl NswChecker {
    async fn explain_missing_result(&self, browser: &dyn Browser) -> Result<VehicleInfo> {
        if browser.find(&page_text("Please complete the reCAPTCHA")).await?.is_some() {
            return Ok(VehicleInfo::failed(RegoStatus::Invalid, "reCAPTCHA check required."));
        }
        if browser.find(&page_text("No vehicles found")).await?.is_some() {
            return Ok(VehicleInfo::failed(
                RegoStatus::Invalid,
                "No vehicles found for this plate.",
            ));
        }
        Ok(VehicleInfo::failed(RegoStatus::Invalid, "Timeout waiting for results."))
    }
}

/// Reads label/value pairs from the vehicle grid's leaf cells.
pub fn details_from_grid(cells: &[String]) -> VehicleDetails {
    let mut details = VehicleDetails::default();
    for pair in cells.chunks_exact(2) {
        let (label, value) = (pair[0].to_lowercase(), pair[1].clone());
        let slot = match label.trim() {
            "make" => &mut details.make,
            "model" => &mut details.model,
            "colour" | "color" => &mut details.colour,
            "manufacture year" | "year of manufacture" | "year" => &mut details.year,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }
    details
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn grid_pairs_become_details() {
        let details = details_from_grid(&cells(&[
            "Make", "TOYOTA", "Model", "COROLLA", "Colour", "WHITE", "Manufacture year", "2019",
        ]));
        assert_eq!(details.make.as_deref(), Some("TOYOTA"));
        assert_eq!(details.model.as_deref(), Some("COROLLA"));
        assert_eq!(details.colour.as_deref(), Some("WHITE"));
        assert_eq!(details.year.as_deref(), Some("2019"));
    }

    #[test]
    fn unknown_labels_and_odd_cells_are_ignored() {
        let details = details_from_grid(&cells(&["Shape", "SEDAN", "Make", "MAZDA", "Colour"]));
        assert_eq!(details.make.as_deref(), Some("MAZDA"));
        assert!(details.model.is_none());
        assert!(details.colour.is_none());
    }

    #[test]
    fn vehicle_section_uses_the_plate() {
        let plate = Plate::parse("abc123").unwrap();
        assert_eq!(vehicle_section(&plate), Locator::id("vehicle-ABC123-O"));
    }
}
