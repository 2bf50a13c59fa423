use crate::core::interact::{fill, scroll_and_click, text_in, text_of};
use crate::core::pacing::Pacing;
use crate::core::wait::{appeared, Wait};
use crate::core::{AuState, Browser, Locator, Plate, RegoStatus, StateChecker, VehicleDetails, VehicleInfo};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub const URL: &str = "https://www.vicroads.vic.gov.au/registration/buy-sell-or-transfer-a-vehicle/check-vehicle-registration/vehicle-registration-enquiry/";

const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(30);
const WAIT_SECS: u64 = 20;
const RESULT_WAIT: Duration = Duration::from_secs(15);

pub fn submit_button() -> Locator {
    Locator::css("input.mvc-form__actions-btn[type='submit'], button.mvc-form__actions-btn[type='submit']")
}

pub fn results_module() -> Locator {
    Locator::class("form-module")
}

pub fn error_message() -> Locator {
    Locator::css(".notification--error, .panel-error, .alert-danger, .field-validation-error")
}

pub fn list_items() -> Locator {
    Locator::css(".vhr-panel__list-item-container")
}

pub fn fallback_list_items() -> Locator {
    Locator::xpath(".//div[contains(@class, 'list-item')]")
}

pub fn item_label() -> Locator {
    Locator::xpath(".//dt | .//*[contains(@class, 'label')]")
}

pub fn item_value() -> Locator {
    Locator::xpath(".//dd | .//*[contains(@class, 'value')]")
}

/// VicRoads vehicle registration enquiry.
pub struct VicChecker {
    pacing: Pacing,
}

impl VicChecker {
    pub fn new(pacing: Pacing) -> Self {
        Self { pacing }
    }
}

#[async_trait]
impl StateChecker for VicChecker {
    fn state(&self) -> AuState {
        AuState::Vic
    }

    async fn check(&self, browser: &dyn Browser, plate: &Plate) -> Result<VehicleInfo> {
        browser.set_page_load_timeout(PAGE_LOAD_TIMEOUT).await?;
        browser.goto(URL).await?;

        let wait = Wait::secs(browser, WAIT_SECS);
        let plate_input = wait.until_present(&Locator::id("RegistrationNumbercar")).await?;
        let submit = wait.until_clickable(&submit_button()).await?;

        fill(browser, &plate_input, plate.as_str()).await?;
        self.pacing.pause_secs(0.2).await;
        scroll_and_click(browser, &submit).await?;

        let (results, errors) = (results_module(), error_message());
        if !appeared(browser, RESULT_WAIT, &[results.clone(), errors.clone()]).await? {
            return Ok(VehicleInfo::failed(
                RegoStatus::Unregistered,
                "Timeout waiting for VIC results or error message (may indicate unregistered plate).",
            ));
        }

        if let Some(message) = text_of(browser, &errors).await? {
            if message.contains("No registration details found")
                || message.to_lowercase().contains("enter a valid registration")
            {
                return Ok(VehicleInfo::failed(
                    RegoStatus::Invalid,
                    "No registration details found or invalid plate format.",
                ));
            }
            return Ok(VehicleInfo::failed(
                RegoStatus::Error,
                format!("Registration check failed: {}", message),
            ));
        }

        let module = match wait.until_visible(&results).await {
            Ok(module) => module,
            Err(e) if e.is_timeout() => {
                return Ok(VehicleInfo::failed(
                    RegoStatus::Error,
                    "Could not find or process the results module structure.",
                ))
            }
            Err(e) => return Err(e),
        };

        let mut items = browser.find_all_in(&module, &list_items()).await?;
        if items.is_empty() {
            items = browser.find_all_in(&module, &fallback_list_items()).await?;
        }

        let mut fields = Vec::new();
        for item in &items {
            let label = text_in(browser, item, &item_label()).await?;
            let value = text_in(browser, item, &item_value()).await?;
            if let (Some(label), Some(value)) = (label, value) {
                fields.push((label, value));
            }
        }

        let summary = summarise(&fields);
        if summary.details.is_empty() {
            return Ok(VehicleInfo::failed(
                RegoStatus::Error,
                "Results module found, but could not extract any vehicle details.",
            ));
        }
        let mut info = VehicleInfo::with_status(summary.status);
        info.merge_details(summary.details);
        Ok(info)
    }
}

#[derive(Debug, PartialEq)]
pub struct Summary {
    pub status: RegoStatus,
    pub details: VehicleDetails,
}

/// Folds the result list's label/value pairs into details and a status.
pub fn summarise(fields: &[(String, String)]) -> Summary {
    let mut details = VehicleDetails::default();
    let mut status = RegoStatus::Registered;

    for (label, value) in fields {
        let label = label.trim().to_lowercase();
        let value = value.trim();
        if value.is_empty() || value == "-" {
            continue;
        }
        let owned = Some(value.to_string());
        match label.as_str() {
            "make" => details.make = owned,
            "year" => details.year = owned,
            "colour" | "primary colour" => details.colour = owned,
            "body type" => details.model = owned,
            _ if label.contains("status") || label.contains("sanctions") => {
                let lowered = value.to_lowercase();
                if !matches!(lowered.as_str(), "none" | "registered" | "current") {
                    status = RegoStatus::from_site_text(&lowered);
                }
            }
            _ => {}
        }
    }

    Summary { status, details }
}
