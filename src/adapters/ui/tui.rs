//! Implements InputPort. Inquire-based interactive prompts.
//!
//! Thin driver over InsertionPort: pick a point, pick a file, then confirm or cancel.

use crate::domain::{DomainError, MimeType, Outcome, ProposalToken};
use crate::ports::{InputPort, InsertionPort};
use crate::usecases::ContentQueryService;
use async_trait::async_trait;
use inquire::{Confirm, Select, Text};
use std::path::PathBuf;
use std::sync::Arc;

const MENU_INSERT: &str = "Insert promotional image";
const MENU_CAPACITY: &str = "Show capacity of a point";
const MENU_LIST: &str = "List content of a point";
const MENU_QUIT: &str = "Quit";

fn input_err(e: inquire::InquireError) -> DomainError {
    DomainError::Input(e.to_string())
}

/// One-line rendering of an outcome for the terminal.
fn outcome_line(outcome: &Outcome) -> String {
    let marker = match outcome {
        Outcome::Success(_) | Outcome::AwaitingConfirmation(_) => "[OK]",
        Outcome::Cancelled => "[--]",
        Outcome::ConnectivityError { .. } => "[!!]",
        _ => "[X]",
    };
    format!("{} {}", marker, outcome)
}

/// Confirm or cancel `token` according to the dialog answer. An aborted dialog
/// cancels the proposal and hands the prompt error back alongside the outcome.
async fn settle(
    insertion: &dyn InsertionPort,
    token: ProposalToken,
    answer: Result<bool, inquire::InquireError>,
) -> (Outcome, Option<DomainError>) {
    match answer {
        Ok(true) => (insertion.confirm_insertion(token).await, None),
        Ok(false) => (insertion.cancel_insertion(token).await, None),
        Err(e) => {
            let err = input_err(e);
            (insertion.cancel_insertion(token).await, Some(err))
        }
    }
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    insertion: Arc<dyn InsertionPort>,
    queries: Arc<ContentQueryService>,
}

impl TuiInputPort {
    pub fn new(insertion: Arc<dyn InsertionPort>, queries: Arc<ContentQueryService>) -> Self {
        Self { insertion, queries }
    }

    async fn insert_flow(&self) -> Result<(), DomainError> {
        let poi_id = Text::new("Point of interest id:")
            .prompt()
            .map_err(input_err)?;
        let path = PathBuf::from(Text::new("Image file:").prompt().map_err(input_err)?);

        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) => {
                println!("[X] cannot read {}: {}", path.display(), e);
                return Ok(());
            }
        };
        let mime = match MimeType::from_extension(&path) {
            Some(m) => m.as_str().to_string(),
            None => Text::new("Mime type:").prompt().map_err(input_err)?,
        };

        let proposed = self
            .insertion
            .request_insertion(poi_id.trim(), bytes, &mime)
            .await;
        println!("{}", outcome_line(&proposed));
        let Some(token) = proposed.token() else {
            return Ok(());
        };

        let answer = Confirm::new(&format!("Attach this image to '{}'?", poi_id.trim()))
            .with_default(true)
            .prompt();
        let (outcome, aborted) = settle(self.insertion.as_ref(), token, answer).await;
        println!("{}", outcome_line(&outcome));
        match aborted {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn capacity_flow(&self) -> Result<(), DomainError> {
        let poi_id = Text::new("Point of interest id:")
            .prompt()
            .map_err(input_err)?;
        match self.queries.capacity(poi_id.trim()).await {
            Ok(status) => println!(
                "{} ({}): {}/{} used, {} free",
                status.point.name,
                status.point.id,
                status.point.current_content_count,
                status.point.max_content_count,
                status.remaining
            ),
            Err(e) => println!("[X] {}", e),
        }
        Ok(())
    }

    async fn list_flow(&self) -> Result<(), DomainError> {
        let poi_id = Text::new("Point of interest id:")
            .prompt()
            .map_err(input_err)?;
        match self.queries.list_content(poi_id.trim()).await {
            Ok(items) if items.is_empty() => println!("(no content)"),
            Ok(items) => {
                for item in items {
                    let d = item.descriptor;
                    println!(
                        "#{}  {}x{}  {}  {} bytes  {}",
                        item.id,
                        d.width,
                        d.height,
                        d.mime_type,
                        d.byte_size,
                        item.created_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
            Err(e) => println!("[X] {}", e),
        }
        Ok(())
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        let options = vec![MENU_INSERT, MENU_CAPACITY, MENU_LIST, MENU_QUIT];
        loop {
            let choice = Select::new("What next?", options.clone())
                .prompt()
                .map_err(input_err)?;
            match choice {
                MENU_INSERT => self.insert_flow().await?,
                MENU_CAPACITY => self.capacity_flow().await?,
                MENU_LIST => self.list_flow().await?,
                _ => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::agency::MockNotifier;
    use crate::adapters::persistence::InMemoryRepo;
    use crate::domain::image::fixtures;
    use crate::domain::{ImageRejection, ImageValidator, PointOfInterest};
    use crate::ports::PoiDirectory;
    use crate::usecases::InsertionService;

    #[test]
    fn test_outcome_line_markers() {
        assert!(outcome_line(&Outcome::Cancelled).starts_with("[--]"));
        assert!(
            outcome_line(&Outcome::AwaitingConfirmation(ProposalToken::generate()))
                .starts_with("[OK]")
        );
        let line = outcome_line(&Outcome::InvalidImage(ImageRejection::Empty));
        assert_eq!(line, "[X] invalid image: image payload is empty");
    }

    #[tokio::test]
    async fn test_aborted_dialog_cancels_and_reports() {
        let repo = Arc::new(InMemoryRepo::with_points([PointOfInterest {
            id: "pier".into(),
            name: "Pier".into(),
            max_content_count: 1,
            current_content_count: 0,
        }]));
        let service = InsertionService::new(
            ImageValidator::default(),
            repo.clone(),
            repo.clone(),
            Arc::new(MockNotifier::new()),
        );
        let token = service
            .request_insertion("pier", fixtures::png(200, 200), "image/png")
            .await
            .token()
            .unwrap();

        let (outcome, aborted) = settle(
            &service,
            token,
            Err(inquire::InquireError::OperationCanceled),
        )
        .await;
        assert_eq!(outcome, Outcome::Cancelled);
        assert!(matches!(aborted, Some(DomainError::Input(_))));

        // The spent token surfaces as such instead of vanishing.
        let (again, aborted) = settle(&service, token, Ok(false)).await;
        assert_eq!(again, Outcome::InvalidProposalReference);
        assert!(aborted.is_none());
        assert_eq!(
            repo.find_by_id("pier").await.unwrap().unwrap().current_content_count,
            0
        );
    }
}
