use crate::core::service::RegoService;
use crate::domain::model::{RegoStatus, VehicleInfo};
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;

/// One `state,plate` line of a batch input file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchRequest {
    pub state: String,
    pub plate: String,
}

/// One output line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRecord {
    pub state: String,
    pub plate: String,
    pub status: String,
    pub make: String,
    pub model: String,
    pub colour: String,
    pub year: String,
    pub error: String,
}

impl BatchRecord {
    pub fn new(request: &BatchRequest, info: VehicleInfo) -> Self {
        Self {
            state: request.state.trim().to_uppercase(),
            plate: request.plate.trim().to_uppercase(),
            status: info.status.as_str().to_string(),
            make: info.make,
            model: info.model,
            colour: info.colour,
            year: info.year,
            error: info.error.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub registered: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn from_records(records: &[BatchRecord]) -> Self {
        let registered = RegoStatus::Registered.as_str();
        Self {
            total: records.len(),
            registered: records.iter().filter(|r| r.status == registered).count(),
            failed: records
                .iter()
                .filter(|r| RegoStatus::from_site_text(&r.status).is_failure())
                .count(),
        }
    }
}

pub fn read_requests<R: Read>(reader: R) -> Result<Vec<BatchRequest>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut requests = Vec::new();
    for row in reader.deserialize() {
        requests.push(row?);
    }
    Ok(requests)
}

pub fn write_records<W: Write>(writer: W, records: &[BatchRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Looks up every request, keeping input order.
///
/// Lookups run concurrently; the service's session limit bounds how many
/// browsers are open at once.
pub async fn check_all(service: Arc<RegoService>, requests: Vec<BatchRequest>) -> Vec<BatchRecord> {
    let mut tasks = JoinSet::new();
    for (index, request) in requests.iter().cloned().enumerate() {
        let service = Arc::clone(&service);
        tasks.spawn(async move {
            let info = service.get_vehicle_info(&request.state, &request.plate).await;
            (index, BatchRecord::new(&request, info))
        });
    }

    let mut slots: Vec<Option<BatchRecord>> = vec![None; requests.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, record)) => slots[index] = Some(record),
            Err(e) => tracing::error!("Batch lookup task failed: {}", e),
        }
    }

    slots
        .into_iter()
        .zip(requests.iter())
        .map(|(slot, request)| {
            slot.unwrap_or_else(|| {
                BatchRecord::new(
                    request,
                    VehicleInfo::failed(RegoStatus::Error, "Lookup task did not complete."),
                )
            })
        })
        .collect()
}

/// Reads `input`, checks every row and writes the results to `output` (stdout when `None`).
pub async fn run_batch(
    service: Arc<RegoService>,
    input: &Path,
    output: Option<&Path>,
) -> Result<BatchSummary> {
    let requests = read_requests(std::fs::File::open(input)?)?;
    tracing::info!("Checking {} plates from {}", requests.len(), input.display());

    let records = check_all(service, requests).await;
    match output {
        Some(path) => write_records(std::fs::File::create(path)?, &records)?,
        None => write_records(std::io::stdout().lock(), &records)?,
    }

    let summary = BatchSummary::from_records(&records);
    tracing::info!(
        total = summary.total,
        registered = summary.registered,
        failed = summary.failed,
        "Batch finished"
    );
    Ok(summary)
}
