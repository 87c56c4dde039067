use std::collections::BTreeSet;
use std::sync::Arc;

use storage::repository::CriteriaRepository;
use tidy_core::model::{Category, Difficulty, SelectionCriteria};

use crate::error::CriteriaServiceError;

/// Validated updates to the user's filter settings.
///
/// The settings surface must never leave the user with an empty selection,
/// so updates go through `SelectionCriteria::new` before persisting.
#[derive(Clone)]
pub struct CriteriaService {
    repo: Arc<dyn CriteriaRepository>,
}

impl CriteriaService {
    #[must_use]
    pub fn new(repo: Arc<dyn CriteriaRepository>) -> Self {
        Self { repo }
    }

    /// The saved criteria, `None` on a fresh install.
    ///
    /// # Errors
    ///
    /// Returns `CriteriaServiceError::Storage` on read failures.
    pub async fn get(&self) -> Result<Option<SelectionCriteria>, CriteriaServiceError> {
        Ok(self.repo.get_criteria().await?)
    }

    /// Validate and persist a new selection.
    ///
    /// # Errors
    ///
    /// Returns `CriteriaServiceError::Invalid` when either set is empty, or
    /// `CriteriaServiceError::Storage` on write failures.
    pub async fn update(
        &self,
        categories: BTreeSet<Category>,
        difficulties: BTreeSet<Difficulty>,
    ) -> Result<SelectionCriteria, CriteriaServiceError> {
        let criteria = SelectionCriteria::new(categories, difficulties)?;
        self.repo.save_criteria(&criteria).await?;
        Ok(criteria)
    }
}
