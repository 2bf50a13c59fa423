use crate::core::interact::{fill, js_click, text_of};
use crate::core::pacing::Pacing;
use crate::core::wait::{appeared, Wait};
use crate::core::{AuState, Browser, Locator, Plate, RegoStatus, StateChecker, VehicleDetails, VehicleInfo};
use crate::utils::error::{RegoError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::time::Duration;

pub const URL: &str = "https://www.service.transport.qld.gov.au/checkrego/public/Welcome.xhtml";

const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(30);
const WAIT_SECS: u64 = 20;
const RESULT_WAIT: Duration = Duration::from_secs(15);

const DESCRIPTION_START: &str = r"^\d{4}\s+[A-Z\s]+";
const DESCRIPTION_PARTS: &str = r"^(\d{4})\s+(\S+)\s+(.+)$";

pub fn continue_button() -> Locator {
    Locator::xpath("//button[contains(., 'Continue')] | //input[@value='Continue']")
}

pub fn accept_button() -> Locator {
    Locator::xpath(
        "//button[contains(., 'accept the conditions')] | //input[@value='I accept the conditions']",
    )
}

pub fn plate_input() -> Locator {
    Locator::xpath("//input[contains(@id, 'plateNumber')]")
}

pub fn search_button() -> Locator {
    Locator::xpath(
        "//button[contains(., 'Confirm')] | //input[@value='Confirm'] | //button[contains(., 'Search')]",
    )
}

pub fn results_list() -> Locator {
    Locator::css("dl.data")
}

pub fn error_message() -> Locator {
    Locator::css(".alert-error, .alert-danger, .msg-error, .feedbackPanelERROR")
}

/// Queensland TMR "Check registration" flow.
pub struct QldChecker {
    pacing: Pacing,
}

impl QldChecker {
    pub fn new(pacing: Pacing) -> Self {
        Self { pacing }
    }
}

#[async_trait]
impl StateChecker for QldChecker {
    fn state(&self) -> AuState {
        AuState::Qld
    }

    async fn check(&self, browser: &dyn Browser, plate: &Plate) -> Result<VehicleInfo> {
        browser.set_page_load_timeout(PAGE_LOAD_TIMEOUT).await?;
        browser.goto(URL).await?;

        let wait = Wait::secs(browser, WAIT_SECS);
        let proceed = wait.until_clickable(&continue_button()).await?;
        js_click(browser, &proceed).await?;

        let accept = wait.until_clickable(&accept_button()).await?;
        js_click(browser, &accept).await?;

        let input = wait.until_present(&plate_input()).await?;
        fill(browser, &input, plate.as_str()).await?;
        self.pacing.pause_secs(0.2).await;

        let search = wait.until_clickable(&search_button()).await?;
        js_click(browser, &search).await?;

        let (results, errors) = (results_list(), error_message());
        if !appeared(browser, RESULT_WAIT, &[results.clone(), errors.clone()]).await? {
            return Ok(VehicleInfo::failed(
                RegoStatus::Unregistered,
                "Timeout waiting for QLD results or error message.",
            ));
        }

        if let Some(message) = text_of(browser, &errors).await? {
            let lower = message.to_lowercase();
            if lower.contains("no record found") || lower.contains("plate number not found") {
                return Ok(VehicleInfo::failed(
                    RegoStatus::Invalid,
                    "No record found for this plate.",
                ));
            }
            return Ok(VehicleInfo::failed(
                RegoStatus::Error,
                format!("Registration check failed: {}", message),
            ));
        }

        let Some(list) = browser.find(&results).await? else {
            return Ok(VehicleInfo::failed(
                RegoStatus::Error,
                "Results section structure not found.",
            ));
        };

        let mut values = Vec::new();
        for item in browser.find_all_in(&list, &Locator::tag("dd")).await? {
            values.push(browser.text(&item).await?.trim().to_string());
        }

        let info = match describe(&values)? {
            Description::Parsed(details) => {
                let mut info = VehicleInfo::with_status(RegoStatus::Registered);
                info.merge_details(details);
                info
            }
            Description::Unparsable(text) => {
                tracing::warn!("Could not parse QLD vehicle description: {}", text);
                VehicleInfo::failed(
                    RegoStatus::Registered,
                    "Could not parse vehicle description format.",
                )
            }
            Description::Missing => VehicleInfo::failed(
                RegoStatus::Registered,
                "Could not find vehicle description in results.",
            ),
        };
        Ok(info)
    }
}

#[derive(Debug, PartialEq)]
pub enum Description {
    Parsed(VehicleDetails),
    Unparsable(String),
    Missing,
}

/// Finds the `YEAR MAKE MODEL...` line among the result values.
pub fn describe(values: &[String]) -> Result<Description> {
    let start = Regex::new(DESCRIPTION_START).map_err(|e| RegoError::page(e.to_string()))?;
    let parts = Regex::new(DESCRIPTION_PARTS).map_err(|e| RegoError::page(e.to_string()))?;

    let Some(line) = values.iter().find(|v| start.is_match(v)) else {
        return Ok(Description::Missing);
    };
    let Some(caps) = parts.captures(line) else {
        return Ok(Description::Unparsable(line.clone()));
    };
    Ok(Description::Parsed(VehicleDetails {
        year: Some(caps[1].to_string()),
        make: Some(caps[2].to_string()),
        model: Some(caps[3].trim().to_string()),
        colour: None,
    }))
}
