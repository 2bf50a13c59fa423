use crate::core::interact::{fill, input_value, scroll_and_click, text_in, text_of};
use crate::core::pacing::Pacing;
use crate::core::wait::{appeared, Wait};
use crate::core::{
    AuState, Browser, ElementRef, Locator, Plate, RegoStatus, StateChecker, VehicleDetails,
    VehicleInfo,
};
use crate::domain::model::NOT_AVAILABLE;
use crate::utils::error::{RegoError, Result};
use async_trait::async_trait;
use std::time::Duration;

pub const URL: &str = "https://rego.act.gov.au/regosoawicket/public/reg/FindRegistrationPage?0";

const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(25);
const FORM_WAIT_SECS: u64 = 15;
const RESULT_WAIT: Duration = Duration::from_secs(12);
const DETAILS_WAIT_SECS: u64 = 10;

pub fn error_panel() -> Locator {
    Locator::css(".feedbackPanelERROR span")
}

pub fn result_row() -> Locator {
    Locator::css(".panel.panel-info .panel-body table.table-bordered tbody tr.even")
}

/// Access Canberra "Find Registration" form.
pub struct ActChecker {
    pacing: Pacing,
}

impl ActChecker {
    pub fn new(pacing: Pacing) -> Self {
        Self { pacing }
    }

    /// Opens the vehicle page linked from the result row and reads its form fields.
    async fn fetch_details(&self, browser: &dyn Browser, row: &ElementRef) -> Result<VehicleDetails> {
        let link = browser
            .find_in(row, &Locator::css("td:first-child a"))
            .await?
            .ok_or_else(|| RegoError::page("result row has no vehicle link"))?;
        let href = browser
            .property(&link, "href")
            .await?
            .ok_or_else(|| RegoError::page("vehicle link has no href"))?;
        browser.goto(&href).await?;

        let wait = Wait::secs(browser, DETAILS_WAIT_SECS);
        let make = wait.until_present(&Locator::id("vehicleMake")).await?;
        let model = wait.until_present(&Locator::id("vehicleModel")).await?;
        let colour = wait.until_present(&Locator::id("vehicleColour")).await?;
        let manufactured = wait.until_present(&Locator::id("manufacturingDate")).await?;

        Ok(VehicleDetails {
            make: Some(input_value(browser, &make).await?),
            model: Some(input_value(browser, &model).await?),
            colour: Some(input_value(browser, &colour).await?),
            year: Some(year_from_manufacture_date(&input_value(browser, &manufactured).await?)),
        })
    }
}

#[async_trait]
impl StateChecker for ActChecker {
    fn state(&self) -> AuState {
        AuState::Act
    }

    async fn check(&self, browser: &dyn Browser, plate: &Plate) -> Result<VehicleInfo> {
        browser.set_page_load_timeout(PAGE_LOAD_TIMEOUT).await?;
        browser.goto(URL).await?;

        let wait = Wait::secs(browser, FORM_WAIT_SECS);
        let plate_input = wait.until_present(&Locator::id("plateNumber")).await?;
        let privacy_checkbox = wait.until_clickable(&Locator::id("privacyCheck")).await?;
        let next_button = wait.until_clickable(&Locator::id("id3")).await?;

        fill(browser, &plate_input, plate.as_str()).await?;
        scroll_and_click(browser, &privacy_checkbox).await?;
        self.pacing.pause_secs(0.2).await;
        scroll_and_click(browser, &next_button).await?;

        let (error_panel, result_row) = (error_panel(), result_row());
        if !appeared(browser, RESULT_WAIT, &[error_panel.clone(), result_row.clone()]).await? {
            return Ok(VehicleInfo::failed(
                RegoStatus::Unregistered,
                "Timeout waiting for results page or specific elements.",
            ));
        }

        if let Some(message) = text_of(browser, &error_panel).await? {
            if message.contains("No matching Registration details") {
                return Ok(VehicleInfo::failed(
                    RegoStatus::Invalid,
                    "No matching registration details found.",
                ));
            }
            return Ok(VehicleInfo::failed(
                RegoStatus::Error,
                format!("Unknown error message: {}", message),
            ));
        }

        let logic_error = || {
            VehicleInfo::failed(
                RegoStatus::Error,
                "Logic Error: Neither error nor success table found.",
            )
        };
        let Some(row) = browser.find(&result_row).await? else {
            return Ok(logic_error());
        };
        let Some(status_text) = text_in(browser, &row, &Locator::css("td:last-child")).await? else {
            return Ok(logic_error());
        };

        let mut info = match status_text.as_str() {
            "Currently Registered" => VehicleInfo::with_status(RegoStatus::Registered),
            "Currently Suspended" => VehicleInfo::with_status(RegoStatus::Suspended),
            other => VehicleInfo::failed(
                RegoStatus::Unknown,
                format!("Unknown status text: {}", other),
            ),
        };

        match self.fetch_details(browser, &row).await {
            Ok(details) => info.merge_details(details),
            Err(e) => {
                tracing::error!("Could not navigate/fetch ACT details: {}", e);
                if info.error.is_none() {
                    info.error = Some("Found registration, but failed to fetch details.".to_string());
                }
            }
        }
        Ok(info)
    }
}

/// Year part of an `MM/YYYY` manufacture date.
pub fn year_from_manufacture_date(date: &str) -> String {
    match date.trim().split('/').collect::<Vec<_>>().as_slice() {
        [_, year] if !year.trim().is_empty() => year.trim().to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}
