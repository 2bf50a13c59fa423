use anyhow::Result;
use rego_check::app::checkers::{act, nsw, qld, sa, tas, vic};
use rego_check::app::checkers::{ActChecker, NswChecker, QldChecker, SaChecker, TasChecker, VicChecker};
use rego_check::core::pacing::Pacing;
use rego_check::core::{Locator, StateChecker};
use rego_check::testkit::{FakeBrowser, FakeElement};
use rego_check::{Plate, RegoStatus};
use serde_json::json;
use std::time::Duration;

const RESULTS: &str = "https://results.test/";
const DETAILS: &str = "https://details.test/";

fn plate() -> Plate {
    Plate::parse("abc123").unwrap()
}

fn el(locator: Locator) -> FakeElement {
    FakeElement::new(locator)
}

fn act_form() -> Vec<FakeElement> {
    vec![
        el(Locator::id("plateNumber")).property("value", ""),
        el(Locator::id("privacyCheck")),
        el(Locator::id("id3")).navigates_to(RESULTS),
    ]
}

fn act_registered_row(status: &str) -> FakeElement {
    el(act::result_row()).children([
        el(Locator::css("td:first-child a")).property("href", DETAILS),
        el(Locator::css("td:last-child")).text(status),
    ])
}

fn act_details() -> Vec<FakeElement> {
    vec![
        el(Locator::id("vehicleMake")).property("value", "TOYOTA"),
        el(Locator::id("vehicleModel")).property("value", "COROLLA "),
        el(Locator::id("vehicleColour")).property("value", "WHITE"),
        el(Locator::id("manufacturingDate")).property("value", "03/2017"),
    ]
}

/// A registered ACT plate follows the row link and reads the detail inputs.
#[tokio::test(start_paused = true)]
async fn test_act_registered_with_details() -> Result<()> {
    let browser = FakeBrowser::new()
        .with_page(act::URL, act_form())
        .with_page(RESULTS, vec![act_registered_row("Currently Registered")])
        .with_page(DETAILS, act_details());

    let info = ActChecker::new(Pacing::none()).check(&browser, &plate()).await?;

    assert_eq!(info.status, RegoStatus::Registered);
    assert_eq!(info.make, "TOYOTA");
    assert_eq!(info.model, "COROLLA");
    assert_eq!(info.colour, "WHITE");
    assert_eq!(info.year, "2017");
    assert_eq!(info.error, None);

    assert_eq!(browser.typed_into(&Locator::id("plateNumber")), "ABC123");
    assert!(browser.clicked(&Locator::id("privacyCheck")));
    assert_eq!(browser.visited(), vec![act::URL.to_string(), DETAILS.to_string()]);
    assert_eq!(browser.page_load_timeout(), Some(Duration::from_secs(25)));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_act_suspended_keeps_status_when_details_fail() -> Result<()> {
    let browser = FakeBrowser::new()
        .with_page(act::URL, act_form())
        .with_page(RESULTS, vec![act_registered_row("Currently Suspended")])
        .with_page(DETAILS, vec![]);

    let info = ActChecker::new(Pacing::none()).check(&browser, &plate()).await?;

    assert_eq!(info.status, RegoStatus::Suspended);
    assert_eq!(info.make, "N/A");
    assert_eq!(
        info.error.as_deref(),
        Some("Found registration, but failed to fetch details.")
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_act_unknown_status_text_is_reported() -> Result<()> {
    let browser = FakeBrowser::new()
        .with_page(act::URL, act_form())
        .with_page(RESULTS, vec![act_registered_row("Pending Transfer")])
        .with_page(DETAILS, act_details());

    let info = ActChecker::new(Pacing::none()).check(&browser, &plate()).await?;

    assert_eq!(info.status, RegoStatus::Unknown);
    assert_eq!(info.error.as_deref(), Some("Unknown status text: Pending Transfer"));
    assert_eq!(info.make, "TOYOTA");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_act_no_matching_registration_is_invalid() -> Result<()> {
    let browser = FakeBrowser::new()
        .with_page(act::URL, act_form())
        .with_page(
            RESULTS,
            vec![el(act::error_panel()).text("No matching Registration details were found")],
        );

    let info = ActChecker::new(Pacing::none()).check(&browser, &plate()).await?;

    assert_eq!(info.status, RegoStatus::Invalid);
    assert_eq!(info.error.as_deref(), Some("No matching registration details found."));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_act_other_error_text_is_an_error() -> Result<()> {
    let browser = FakeBrowser::new()
        .with_page(act::URL, act_form())
        .with_page(RESULTS, vec![el(act::error_panel()).text("Service unavailable")]);

    let info = ActChecker::new(Pacing::none()).check(&browser, &plate()).await?;

    assert_eq!(info.status, RegoStatus::Error);
    assert_eq!(info.error.as_deref(), Some("Unknown error message: Service unavailable"));
    Ok(())
}

/// Nothing showing up after submit means the plate is treated as unregistered.
#[tokio::test(start_paused = true)]
async fn test_act_empty_results_page_is_unregistered() -> Result<()> {
    let browser = FakeBrowser::new()
        .with_page(act::URL, act_form())
        .with_page(RESULTS, vec![]);

    let started = tokio::time::Instant::now();
    let info = ActChecker::new(Pacing::none()).check(&browser, &plate()).await?;

    assert_eq!(info.status, RegoStatus::Unregistered);
    assert_eq!(
        info.error.as_deref(),
        Some("Timeout waiting for results page or specific elements.")
    );
    assert!(started.elapsed() >= Duration::from_secs(12));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_act_missing_form_is_a_timeout_error() -> Result<()> {
    let browser = FakeBrowser::new().with_page(act::URL, vec![]);
    let err = ActChecker::new(Pacing::none())
        .check(&browser, &plate())
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    Ok(())
}

fn nsw_form() -> Vec<FakeElement> {
    vec![
        el(nsw::recaptcha_frame()),
        el(Locator::id("plateNumberInput")).property("value", ""),
        el(Locator::id("termsAndConditions")),
        el(nsw::check_button()).navigates_to(RESULTS),
    ]
}

fn leaf(text: &str) -> FakeElement {
    el(Locator::xpath(".//div[not(*)]")).text(text)
}

#[tokio::test(start_paused = true)]
async fn test_nsw_registered_vehicle_reads_the_grid() -> Result<()> {
    let browser = FakeBrowser::new()
        .with_script_result("return navigator.userAgent;", json!("Mozilla/5.0 Test"))
        .with_page(nsw::URL, nsw_form())
        .with_page(
            RESULTS,
            vec![el(nsw::vehicle_section(&plate())).children([
                el(nsw::expiry_notice()).text("Registration expires 12 March 2026"),
                leaf("Make"),
                leaf("MAZDA"),
                leaf("Model"),
                leaf("CX-5"),
                leaf("Colour"),
                leaf("RED"),
                leaf("Manufacture year"),
                leaf("2020"),
            ])],
        );

    let info = NswChecker::new(Pacing::none()).check(&browser, &plate()).await?;

    assert_eq!(info.status, RegoStatus::Registered);
    assert_eq!(info.make, "MAZDA");
    assert_eq!(info.model, "CX-5");
    assert_eq!(info.colour, "RED");
    assert_eq!(info.year, "2020");

    assert_eq!(browser.typed_into(&Locator::id("plateNumberInput")), "ABC123");
    assert!(browser.clicked(&Locator::id("termsAndConditions")));
    let cdp = browser.cdp_commands();
    assert!(cdp.contains(&"Network.setUserAgentOverride".to_string()));
    assert!(cdp.contains(&"Network.setExtraHTTPHeaders".to_string()));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_nsw_vehicle_without_expiry_is_unregistered() -> Result<()> {
    let browser = FakeBrowser::new()
        .with_page(nsw::URL, nsw_form())
        .with_page(RESULTS, vec![el(nsw::vehicle_section(&plate()))]);

    let info = NswChecker::new(Pacing::none()).check(&browser, &plate()).await?;
    assert_eq!(info.status, RegoStatus::Unregistered);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_nsw_missing_result_is_explained() -> Result<()> {
    let checker = NswChecker::new(Pacing::none());

    let captcha = FakeBrowser::new().with_page(nsw::URL, nsw_form()).with_page(
        RESULTS,
        vec![el(nsw::page_text("Please complete the reCAPTCHA"))],
    );
    let info = checker.check(&captcha, &plate()).await?;
    assert_eq!(info.status, RegoStatus::Invalid);
    assert_eq!(info.error.as_deref(), Some("reCAPTCHA check required."));

    let none = FakeBrowser::new()
        .with_page(nsw::URL, nsw_form())
        .with_page(RESULTS, vec![el(nsw::page_text("No vehicles found"))]);
    let info = checker.check(&none, &plate()).await?;
    assert_eq!(info.error.as_deref(), Some("No vehicles found for this plate."));

    let blank = FakeBrowser::new()
        .with_page(nsw::URL, nsw_form())
        .with_page(RESULTS, vec![]);
    let info = checker.check(&blank, &plate()).await?;
    assert_eq!(info.status, RegoStatus::Invalid);
    assert_eq!(info.error.as_deref(), Some("Timeout waiting for results."));
    Ok(())
}

/// Header overrides are best effort; a failing CDP bridge does not stop the lookup.
#[tokio::test(start_paused = true)]
async fn test_nsw_survives_cdp_failure() -> Result<()> {
    let browser = FakeBrowser::new()
        .failing("cdp", "unknown command", "cdp not supported")
        .with_page(nsw::URL, nsw_form())
        .with_page(RESULTS, vec![el(nsw::vehicle_section(&plate()))]);

    let info = NswChecker::new(Pacing::none()).check(&browser, &plate()).await?;
    assert_eq!(info.status, RegoStatus::Unregistered);
    Ok(())
}

fn qld_form() -> Vec<FakeElement> {
    vec![
        el(qld::continue_button()),
        el(qld::accept_button()),
        el(qld::plate_input()).property("value", ""),
        el(qld::search_button()).navigates_to(RESULTS),
    ]
}

#[tokio::test(start_paused = true)]
async fn test_qld_description_becomes_details() -> Result<()> {
    let browser = FakeBrowser::new().with_page(qld::URL, qld_form()).with_page(
        RESULTS,
        vec![el(qld::results_list()).children([
            el(Locator::tag("dd")).text("ABC123"),
            el(Locator::tag("dd")).text("2015 TOYOTA HILUX SR5"),
            el(Locator::tag("dd")).text("Current"),
        ])],
    );

    let info = QldChecker::new(Pacing::none()).check(&browser, &plate()).await?;

    assert_eq!(info.status, RegoStatus::Registered);
    assert_eq!(info.year, "2015");
    assert_eq!(info.make, "TOYOTA");
    assert_eq!(info.model, "HILUX SR5");
    assert_eq!(info.colour, "N/A");
    assert!(browser.clicked(&qld::continue_button()));
    assert!(browser.clicked(&qld::accept_button()));
    assert_eq!(browser.typed_into(&qld::plate_input()), "ABC123");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_qld_error_messages() -> Result<()> {
    let checker = QldChecker::new(Pacing::none());

    let missing = FakeBrowser::new()
        .with_page(qld::URL, qld_form())
        .with_page(RESULTS, vec![el(qld::error_message()).text("No record found.")]);
    let info = checker.check(&missing, &plate()).await?;
    assert_eq!(info.status, RegoStatus::Invalid);
    assert_eq!(info.error.as_deref(), Some("No record found for this plate."));

    let broken = FakeBrowser::new()
        .with_page(qld::URL, qld_form())
        .with_page(RESULTS, vec![el(qld::error_message()).text("System down")]);
    let info = checker.check(&broken, &plate()).await?;
    assert_eq!(info.status, RegoStatus::Error);
    assert_eq!(info.error.as_deref(), Some("Registration check failed: System down"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_qld_results_without_description_add_a_note() -> Result<()> {
    let browser = FakeBrowser::new().with_page(qld::URL, qld_form()).with_page(
        RESULTS,
        vec![el(qld::results_list()).child(el(Locator::tag("dd")).text("Current"))],
    );

    let info = QldChecker::new(Pacing::none()).check(&browser, &plate()).await?;
    assert_eq!(info.status, RegoStatus::Registered);
    assert_eq!(
        info.error.as_deref(),
        Some("Could not find vehicle description in results.")
    );
    Ok(())
}

fn sa_form() -> Vec<FakeElement> {
    vec![
        el(Locator::id("plateNumber")).property("value", ""),
        el(Locator::id("step-1-2-submit")).navigates_to(RESULTS),
    ]
}

#[tokio::test(start_paused = true)]
async fn test_sa_labelled_values() -> Result<()> {
    let browser = FakeBrowser::new().with_page(sa::URL, sa_form()).with_page(
        RESULTS,
        vec![el(sa::results_container()).children([
            el(sa::make_label()).text("Make"),
            el(sa::labelled_value("Make")).text("HYUNDAI"),
            el(sa::labelled_value("Body Type")).text("HATCHBACK"),
            el(sa::labelled_value("Primary Colour")).text("GREY"),
        ])],
    );

    let info = SaChecker::new(Pacing::none()).check(&browser, &plate()).await?;

    assert_eq!(info.status, RegoStatus::Registered);
    assert_eq!(info.make, "HYUNDAI");
    assert_eq!(info.model, "HATCHBACK");
    assert_eq!(info.colour, "GREY");
    assert_eq!(info.year, "N/A");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_sa_plate_not_found_is_invalid() -> Result<()> {
    let browser = FakeBrowser::new().with_page(sa::URL, sa_form()).with_page(
        RESULTS,
        vec![el(sa::error_message()).text("Registration plate number not found")],
    );

    let info = SaChecker::new(Pacing::none()).check(&browser, &plate()).await?;
    assert_eq!(info.status, RegoStatus::Invalid);
    assert_eq!(info.error.as_deref(), Some("Plate number not found or invalid."));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_sa_container_without_labels_is_an_error() -> Result<()> {
    let browser = FakeBrowser::new()
        .with_page(sa::URL, sa_form())
        .with_page(RESULTS, vec![el(sa::results_container())]);

    let info = SaChecker::new(Pacing::none()).check(&browser, &plate()).await?;
    assert_eq!(info.status, RegoStatus::Error);
    assert_eq!(
        info.error.as_deref(),
        Some("Timeout waiting for elements within the results container.")
    );
    Ok(())
}

fn vic_form() -> Vec<FakeElement> {
    vec![
        el(Locator::id("RegistrationNumbercar")).property("value", ""),
        el(vic::submit_button()).navigates_to(RESULTS),
    ]
}

fn vic_item(label: &str, value: &str) -> FakeElement {
    el(vic::list_items()).children([
        el(vic::item_label()).text(label),
        el(vic::item_value()).text(value),
    ])
}

#[tokio::test(start_paused = true)]
async fn test_vic_list_items_become_details() -> Result<()> {
    let browser = FakeBrowser::new().with_page(vic::URL, vic_form()).with_page(
        RESULTS,
        vec![el(vic::results_module()).children([
            vic_item("Make", "HOLDEN"),
            vic_item("Year", "2012"),
            vic_item("Registration expiry year", "2026"),
            vic_item("Primary colour", "SILVER"),
            vic_item("Body type", "SEDAN"),
            vic_item("Registration status", "Current"),
        ])],
    );

    let info = VicChecker::new(Pacing::none()).check(&browser, &plate()).await?;

    assert_eq!(info.status, RegoStatus::Registered);
    assert_eq!(info.make, "HOLDEN");
    assert_eq!(info.year, "2012");
    assert_eq!(info.colour, "SILVER");
    assert_eq!(info.model, "SEDAN");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_vic_outcomes_without_details() -> Result<()> {
    let checker = VicChecker::new(Pacing::none());

    let empty_module = FakeBrowser::new()
        .with_page(vic::URL, vic_form())
        .with_page(RESULTS, vec![el(vic::results_module())]);
    let info = checker.check(&empty_module, &plate()).await?;
    assert_eq!(info.status, RegoStatus::Error);
    assert_eq!(
        info.error.as_deref(),
        Some("Results module found, but could not extract any vehicle details.")
    );

    let invalid = FakeBrowser::new().with_page(vic::URL, vic_form()).with_page(
        RESULTS,
        vec![el(vic::error_message()).text("Please enter a valid registration number")],
    );
    let info = checker.check(&invalid, &plate()).await?;
    assert_eq!(info.status, RegoStatus::Invalid);

    let nothing = FakeBrowser::new()
        .with_page(vic::URL, vic_form())
        .with_page(RESULTS, vec![]);
    let info = checker.check(&nothing, &plate()).await?;
    assert_eq!(info.status, RegoStatus::Unregistered);
    Ok(())
}

fn tas_row(label: &str, value: &str) -> FakeElement {
    el(Locator::class("row")).children([
        el(Locator::class("column")).text(label),
        el(Locator::class("column")).child(el(Locator::tag("span")).text(value)),
    ])
}

fn tas_form() -> Vec<FakeElement> {
    vec![
        el(Locator::name("plate")).property("value", ""),
        el(tas::submit_button()).navigates_to(RESULTS),
    ]
}

#[tokio::test(start_paused = true)]
async fn test_tas_rows_become_details() -> Result<()> {
    let browser = FakeBrowser::new().with_page(tas::URL, tas_form()).with_page(
        RESULTS,
        vec![el(Locator::class("container")).children([
            tas_row("Registration Status", "Registered"),
            tas_row("Vehicle Make", "SUBARU"),
            tas_row("Vehicle Model", "OUTBACK"),
            tas_row("Colour", "GREEN"),
            tas_row("Manufacture Year", "2016"),
        ])],
    );

    let info = TasChecker::new(Pacing::none()).check(&browser, &plate()).await?;

    assert_eq!(info.status, RegoStatus::Registered);
    assert_eq!(info.make, "SUBARU");
    assert_eq!(info.model, "OUTBACK");
    assert_eq!(info.colour, "GREEN");
    assert_eq!(info.year, "2016");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_tas_missing_container_is_a_timeout() -> Result<()> {
    let browser = FakeBrowser::new()
        .with_page(tas::URL, tas_form())
        .with_page(RESULTS, vec![]);

    let info = TasChecker::new(Pacing::none()).check(&browser, &plate()).await?;
    assert_eq!(info.status, RegoStatus::Timeout);
    Ok(())
}
