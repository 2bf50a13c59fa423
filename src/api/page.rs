use crate::domain::model::{AuState, RegoStatus, VehicleInfo, NOT_AVAILABLE};
use crate::utils::error::Result;
use serde::Serialize;
use tera::{Context, Tera};

const INDEX_TEMPLATE: &str = include_str!("templates/index.html");
const INDEX: &str = "index.html";

/// Form and result page.
pub struct Pages {
    tera: Tera,
}

#[derive(Debug, Serialize)]
pub struct PageView {
    pub states: Vec<String>,
    pub plate: String,
    pub state: String,
    pub result: Option<ResultView>,
}

/// A lookup result shaped for display.
#[derive(Debug, Serialize, PartialEq)]
pub struct ResultView {
    pub status_class: String,
    pub status_label: String,
    pub make: String,
    pub model: String,
    pub colour: String,
    pub year: String,
    /// Failure text shown above the table.
    pub banner: Option<String>,
    /// Any other note, shown as a table row.
    pub note: Option<String>,
}

impl From<&VehicleInfo> for ResultView {
    fn from(info: &VehicleInfo) -> Self {
        let shown = |v: &str| {
            if v == NOT_AVAILABLE {
                "-".to_string()
            } else {
                v.to_string()
            }
        };
        let status = info.status.as_str().to_lowercase();
        let (banner, note) = match (&info.error, info.status.is_failure()) {
            (Some(e), true) => (Some(e.clone()), None),
            (Some(e), false) => (None, Some(e.clone())),
            (None, _) => (None, None),
        };
        Self {
            status_class: status.replace(' ', "-"),
            status_label: capitalize(&status),
            make: shown(&info.make),
            model: shown(&info.model),
            colour: shown(&info.colour),
            year: shown(&info.year),
            banner,
            note,
        }
    }
}

impl PageView {
    pub fn form(states: &[AuState]) -> Self {
        Self {
            states: states.iter().map(|s| s.code().to_string()).collect(),
            plate: String::new(),
            state: String::new(),
            result: None,
        }
    }

    pub fn with_result(mut self, plate: &str, state: &str, info: &VehicleInfo) -> Self {
        self.plate = plate.to_string();
        self.state = state.to_string();
        self.result = Some(ResultView::from(info));
        self
    }
}

impl Pages {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(INDEX, INDEX_TEMPLATE)?;
        Ok(Self { tera })
    }

    pub fn render(&self, view: &PageView) -> Result<String> {
        let context = Context::from_serialize(view)?;
        Ok(self.tera.render(INDEX, &context)?)
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The page shown when a form names a state without a checker.
pub fn unsupported_state(state: &str) -> VehicleInfo {
    VehicleInfo::failed(
        RegoStatus::Error,
        format!("Selected state \"{}\" is not supported.", state),
    )
}
