use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::models::{Eatery, EateryPage, Location, ServiceError, ServiceResult};
use crate::repositories::{EateryRepository, GeoQuery};

/// Directory logic for eatery search, lookup and bulk reloads.
///
/// Bulk reloads must not run concurrently with reads on the same
/// directory; serializing them is the caller's responsibility.
pub struct EateryService {
    repository: Arc<dyn EateryRepository>,
}

impl EateryService {
    pub fn new(repository: Arc<dyn EateryRepository>) -> Self {
        Self { repository }
    }

    /// Page of eateries with the given cuisine, sorted ascending by
    /// distance from `origin`.  Cuisine matching is case-insensitive.
    /// An unmatched cuisine yields an empty page, never an error.
    #[instrument(skip(self), fields(cuisine = %cuisine, offset = offset, count = count))]
    pub async fn locate(
        &self,
        cuisine: &str,
        origin: Location,
        offset: usize,
        count: usize,
    ) -> ServiceResult<EateryPage> {
        // One extra row probes for a next page without a second query.
        let query = GeoQuery {
            cuisine: cuisine.to_lowercase(),
            origin,
            offset,
            limit: count.saturating_add(1),
        };

        let mut located = self.repository.find_near(&query).await?;
        let has_next = located.len() > count;
        located.truncate(count);

        info!("Located {} eateries", located.len());
        Ok(EateryPage::new(located, offset, count, has_next))
    }

    /// Exact lookup by eatery id.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_eatery(&self, id: &str) -> ServiceResult<Eatery> {
        match self.repository.find_by_id(id).await? {
            Some(eatery) => Ok(eatery),
            None => {
                warn!("Eatery not found");
                Err(ServiceError::EateryNotFound { id: id.to_string() })
            }
        }
    }

    /// Replace the whole directory with `eateries`, rebuilding indexes.
    #[instrument(skip(self, eateries), fields(count = eateries.len()))]
    pub async fn load_eateries(&self, eateries: Vec<Eatery>) -> ServiceResult<()> {
        self.repository.replace_all(eateries).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LinkRel, LocatedEatery, RepositoryError};
    use crate::repositories::MockEateryRepository;
    use mockall::predicate::*;

    fn located(id: &str, dist: f64) -> LocatedEatery {
        LocatedEatery {
            id: id.to_string(),
            name: id.to_string(),
            cuisine: "Chinese".to_string(),
            loc: Location::new(42.1, -75.9),
            dist,
        }
    }

    fn origin() -> Location {
        Location::new(42.09, -75.92)
    }

    #[tokio::test]
    async fn test_locate_folds_cuisine_and_probes_next_page() {
        let mut repository = MockEateryRepository::new();
        repository
            .expect_find_near()
            .withf(|query: &GeoQuery| {
                query.cuisine == "chinese" && query.offset == 0 && query.limit == 3
            })
            .returning(|_| Ok(vec![located("e1", 0.4), located("e2", 1.2), located("e3", 2.0)]));

        let service = EateryService::new(Arc::new(repository));
        let page = service.locate("CHInese", origin(), 0, 2).await.unwrap();

        // Three rows came back for a window of two: the page is full and
        // a next page exists.
        assert_eq!(page.eateries.len(), 2);
        assert!(page.has_next());
        assert!(!page.has_prev());
        assert_eq!(page.link(LinkRel::Next).unwrap().offset, 2);
    }

    #[tokio::test]
    async fn test_locate_extreme_count_saturates_probe_limit() {
        let mut repository = MockEateryRepository::new();
        repository
            .expect_find_near()
            .withf(|query: &GeoQuery| query.limit == usize::MAX)
            .returning(|_| Ok(Vec::new()));

        let service = EateryService::new(Arc::new(repository));
        let page = service
            .locate("chinese", origin(), 0, usize::MAX)
            .await
            .unwrap();
        assert!(page.eateries.is_empty());
    }

    #[tokio::test]
    async fn test_locate_last_page_has_no_next() {
        let mut repository = MockEateryRepository::new();
        repository
            .expect_find_near()
            .returning(|_| Ok(vec![located("e3", 2.0)]));

        let service = EateryService::new(Arc::new(repository));
        let page = service.locate("chinese", origin(), 2, 2).await.unwrap();

        assert_eq!(page.eateries.len(), 1);
        assert!(!page.has_next());
        assert!(page.has_prev());
        assert_eq!(page.link(LinkRel::Prev).unwrap().offset, 0);
    }

    #[tokio::test]
    async fn test_locate_no_matches_is_empty_page() {
        let mut repository = MockEateryRepository::new();
        repository.expect_find_near().returning(|_| Ok(Vec::new()));

        let service = EateryService::new(Arc::new(repository));
        let page = service.locate("ethiopian", origin(), 0, 5).await.unwrap();

        assert!(page.eateries.is_empty());
        assert!(!page.has_prev());
        assert!(!page.has_next());
    }

    #[tokio::test]
    async fn test_get_eatery_missing_is_not_found() {
        let mut repository = MockEateryRepository::new();
        repository
            .expect_find_by_id()
            .with(eq("nope"))
            .returning(|_| Ok(None));

        let service = EateryService::new(Arc::new(repository));
        let error = service.get_eatery("nope").await.unwrap_err();
        assert!(matches!(error, ServiceError::EateryNotFound { .. }));
    }

    #[tokio::test]
    async fn test_load_failure_surfaces_as_repository_error() {
        let mut repository = MockEateryRepository::new();
        repository.expect_replace_all().returning(|_| {
            Err(RepositoryError::Driver {
                message: "insert failed".to_string(),
            })
        });

        let service = EateryService::new(Arc::new(repository));
        let error = service.load_eateries(Vec::new()).await.unwrap_err();
        assert!(matches!(error, ServiceError::Repository { .. }));
    }
}
