use crate::core::interact::{fill, js_click};
use crate::core::pacing::Pacing;
use crate::core::wait::Wait;
use crate::core::{AuState, Browser, Locator, Plate, RegoStatus, StateChecker, VehicleDetails, VehicleInfo};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

pub const URL: &str = "https://www.transport.tas.gov.au/rego-status/";

const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(30);
const WAIT_SECS: u64 = 20;

pub fn submit_button() -> Locator {
    Locator::css("form.form-plate input[type='submit']")
}

/// Transport Tasmania rego status page.
pub struct TasChecker {
    pacing: Pacing,
}

impl TasChecker {
    pub fn new(pacing: Pacing) -> Self {
        Self { pacing }
    }
}

#[async_trait]
impl StateChecker for TasChecker {
    fn state(&self) -> AuState {
        AuState::Tas
    }

    async fn check(&self, browser: &dyn Browser, plate: &Plate) -> Result<VehicleInfo> {
        browser.set_page_load_timeout(PAGE_LOAD_TIMEOUT).await?;
        browser.goto(URL).await?;

        let wait = Wait::secs(browser, WAIT_SECS);
        let plate_input = wait.until_present(&Locator::name("plate")).await?;
        let submit = wait.until_clickable(&submit_button()).await?;
        fill(browser, &plate_input, plate.as_str()).await?;
        js_click(browser, &submit).await?;
        self.pacing.pause_secs(2.0).await;

        let container = match wait.until_present(&Locator::class("container")).await {
            Ok(container) => container,
            Err(e) if e.is_timeout() => {
                return Ok(VehicleInfo::failed(
                    RegoStatus::Timeout,
                    "Timeout waiting for Tasmania results.",
                ))
            }
            Err(e) => return Err(e),
        };

        let mut fields = HashMap::new();
        for row in browser.find_all_in(&container, &Locator::class("row")).await? {
            let columns = browser.find_all_in(&row, &Locator::class("column")).await?;
            let [label, value] = columns.as_slice() else {
                continue;
            };
            let label = browser.text(label).await?;
            let value = match browser.find_all_in(value, &Locator::tag("span")).await?.first() {
                Some(span) => browser.text(span).await?.trim().to_string(),
                None => String::new(),
            };
            fields.insert(field_key(&label), value);
        }

        Ok(summarise(&fields))
    }
}

/// "Vehicle Make" becomes `vehicle_make`.
pub fn field_key(label: &str) -> String {
    label.trim().to_lowercase().replace(' ', "_")
}

pub fn status_from_text(text: &str) -> RegoStatus {
    let lower = text.to_lowercase();
    if ["unregistered", "expired", "cancelled"]
        .iter()
        .any(|word| lower.contains(word))
    {
        RegoStatus::Unregistered
    } else if lower.contains("registered") {
        RegoStatus::Registered
    } else {
        RegoStatus::Unknown
    }
}

pub fn summarise(fields: &HashMap<String, String>) -> VehicleInfo {
    let field = |key: &str| fields.get(key).filter(|v| !v.is_empty()).cloned();
    let status_text = field("registration_status").unwrap_or_default();

    let mut info = VehicleInfo::with_status(status_from_text(&status_text));
    info.merge_details(VehicleDetails {
        make: field("vehicle_make"),
        model: field("vehicle_model"),
        colour: field("colour"),
        year: field("manufacture_year"),
    });
    if info.status == RegoStatus::Unknown && !info.has_details() {
        info.error = Some("No registration details found on the results page.".to_string());
    }
    info
}
