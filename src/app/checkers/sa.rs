use crate::core::interact::{fill, scroll_and_click, text_in, text_of};
use crate::core::pacing::Pacing;
use crate::core::wait::{appeared, Wait};
use crate::core::{
    AuState, Browser, ElementRef, Locator, Plate, RegoStatus, StateChecker, VehicleDetails,
    VehicleInfo,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub const URL: &str = "https://account.ezyreg.sa.gov.au/account/check-registration.htm";

const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(40);
const WAIT_SECS: u64 = 45;
const RESULT_WAIT: Duration = Duration::from_secs(25);

pub fn results_container() -> Locator {
    Locator::id("registration-details-single")
}

pub fn error_message() -> Locator {
    Locator::css(".alert-danger .error-message, div.error")
}

pub fn make_label() -> Locator {
    Locator::xpath("//div[@id='registration-details-single']//div[contains(text(), 'Make')]")
}

/// Value cell next to a label inside the results container.
pub fn labelled_value(label: &str) -> Locator {
    Locator::xpath(format!(
        ".//div[contains(@class, 'form-group')][.//div[contains(text(), '{}')]]//div[contains(@class, 'text-left')]/div",
        label
    ))
}

/// EzyReg "Check registration" form.
pub struct SaChecker {
    pacing: Pacing,
}

impl SaChecker {
    pub fn new(pacing: Pacing) -> Self {
        Self { pacing }
    }

    async fn value(&self, browser: &dyn Browser, container: &ElementRef, label: &str) -> Result<Option<String>> {
        Ok(text_in(browser, container, &labelled_value(label))
            .await?
            .filter(|v| !v.is_empty()))
    }
}

#[async_trait]
impl StateChecker for SaChecker {
    fn state(&self) -> AuState {
        AuState::Sa
    }

    async fn check(&self, browser: &dyn Browser, plate: &Plate) -> Result<VehicleInfo> {
        browser.set_page_load_timeout(PAGE_LOAD_TIMEOUT).await?;
        browser.goto(URL).await?;

        let wait = Wait::secs(browser, WAIT_SECS);
        let plate_input = wait.until_visible(&Locator::id("plateNumber")).await?;
        fill(browser, &plate_input, plate.as_str()).await?;
        self.pacing.pause_secs(0.2).await;

        let proceed = wait.until_clickable(&Locator::id("step-1-2-submit")).await?;
        scroll_and_click(browser, &proceed).await?;

        let (results, errors) = (results_container(), error_message());
        if !appeared(browser, RESULT_WAIT, &[results.clone(), errors.clone()]).await? {
            return Ok(VehicleInfo::failed(
                RegoStatus::Unregistered,
                "Timeout waiting for SA results or error message.",
            ));
        }

        if let Some(message) = text_of(browser, &errors).await? {
            let lower = message.to_lowercase();
            if lower.contains("registration plate number not found") || lower.contains("not valid") {
                return Ok(VehicleInfo::failed(
                    RegoStatus::Invalid,
                    "Plate number not found or invalid.",
                ));
            }
            return Ok(VehicleInfo::failed(
                RegoStatus::Error,
                format!("Registration check failed: {}", message),
            ));
        }

        match wait.until_present(&make_label()).await {
            Ok(_) => {}
            Err(e) if e.is_timeout() => {
                return Ok(VehicleInfo::failed(
                    RegoStatus::Error,
                    "Timeout waiting for elements within the results container.",
                ))
            }
            Err(e) => return Err(e),
        }

        let Some(container) = browser.find(&results).await? else {
            return Ok(VehicleInfo::failed(
                RegoStatus::Error,
                "Results container structure not found or missing expected elements.",
            ));
        };

        let details = VehicleDetails {
            make: self.value(browser, &container, "Make").await?,
            model: self.value(browser, &container, "Body Type").await?,
            colour: self.value(browser, &container, "Primary Colour").await?,
            year: None,
        };
        let mut info = VehicleInfo::with_status(RegoStatus::Registered);
        info.merge_details(details);
        Ok(info)
    }
}
