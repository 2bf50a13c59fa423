use anyhow::Result;
use async_trait::async_trait;
use rego_check::adapters::batch::{run_batch, BatchSummary};
use rego_check::core::{Browser, StateChecker};
use rego_check::testkit::{FakeBrowser, FakeSessionFactory};
use rego_check::{AuState, Plate, RegoService, RegoStatus, VehicleInfo};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};

/// Registers every plate, finishing later for plates that sort earlier.
struct StaggeredChecker;

#[async_trait]
impl StateChecker for StaggeredChecker {
    fn state(&self) -> AuState {
        AuState::Sa
    }

    async fn check(&self, browser: &dyn Browser, plate: &Plate) -> rego_check::Result<VehicleInfo> {
        browser.goto("https://batch.test/").await?;
        let delay = match plate.as_str() {
            "AAA111" => 3,
            _ => 1,
        };
        tokio::time::sleep(Duration::from_secs(delay)).await;

        let mut info = VehicleInfo::with_status(RegoStatus::Registered);
        info.make = "MAZDA".to_string();
        info.colour = "RED".to_string();
        Ok(info)
    }
}

fn service(factory: Arc<FakeSessionFactory>) -> Arc<RegoService> {
    Arc::new(RegoService::new(factory, vec![Arc::new(StaggeredChecker)], 3))
}

#[tokio::test(start_paused = true)]
async fn test_batch_writes_results_in_input_order() -> Result<()> {
    let mut input = NamedTempFile::new()?;
    input.write_all(b"state,plate\nsa,aaa111\nWA,ZZZ999\n SA , bbb222 \n")?;
    let dir = TempDir::new()?;
    let output = dir.path().join("results.csv");

    let factory = Arc::new(FakeSessionFactory::new(FakeBrowser::new()));
    let summary = run_batch(service(factory.clone()), input.path(), Some(&output)).await?;

    assert_eq!(
        summary,
        BatchSummary {
            total: 3,
            registered: 2,
            failed: 1,
        }
    );
    assert_eq!(
        std::fs::read_to_string(&output)?,
        "state,plate,status,make,model,colour,year,error\n\
         SA,AAA111,registered,MAZDA,N/A,RED,N/A,\n\
         WA,ZZZ999,error,N/A,N/A,N/A,N/A,\"State \"\"WA\"\" is not supported.\"\n\
         SA,BBB222,registered,MAZDA,N/A,RED,N/A,\n"
    );
    assert_eq!(factory.opened(), 2);
    assert_eq!(factory.browser().quit_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_batch_with_only_a_header_checks_nothing() -> Result<()> {
    let mut input = NamedTempFile::new()?;
    input.write_all(b"state,plate\n")?;
    let dir = TempDir::new()?;
    let output = dir.path().join("empty.csv");

    let factory = Arc::new(FakeSessionFactory::new(FakeBrowser::new()));
    let summary = run_batch(service(factory.clone()), input.path(), Some(&output)).await?;

    assert_eq!(summary, BatchSummary::default());
    assert_eq!(factory.opened(), 0);
    Ok(())
}

#[tokio::test]
async fn test_batch_rejects_rows_missing_a_column() -> Result<()> {
    let mut input = NamedTempFile::new()?;
    input.write_all(b"state\nACT\n")?;

    let factory = Arc::new(FakeSessionFactory::new(FakeBrowser::new()));
    let result = run_batch(service(factory), input.path(), None).await;

    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn test_batch_missing_input_file() -> Result<()> {
    let dir = TempDir::new()?;
    let factory = Arc::new(FakeSessionFactory::new(FakeBrowser::new()));
    let err = run_batch(service(factory), &dir.path().join("nope.csv"), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "IoError");
    Ok(())
}
