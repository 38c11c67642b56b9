use std::future::Future;

use super::storage::StoreError;

/// Outcome of a first-error-aborts pass over a batch.
#[derive(Debug)]
pub struct BatchReport {
    /// Items that succeeded before the batch stopped.
    pub completed: usize,
    pub failure: Option<BatchFailure>,
}

#[derive(Debug)]
pub struct BatchFailure {
    pub item: String,
    pub error: StoreError,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Applies `op` to each item in order and stops at the first error.
///
/// Effects of items before the failure are kept; items after it are never
/// passed to `op`.
pub async fn run_batch<T, L, F, Fut>(
    items: impl IntoIterator<Item = T>,
    label: L,
    mut op: F,
) -> BatchReport
where
    L: Fn(&T) -> String,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<(), StoreError>>,
{
    let mut completed = 0;

    for item in items {
        let name = label(&item);
        if let Err(error) = op(item).await {
            return BatchReport {
                completed,
                failure: Some(BatchFailure { item: name, error }),
            };
        }
        completed += 1;
    }

    BatchReport {
        completed,
        failure: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stops_at_first_failure() {
        let mut attempted = Vec::new();

        let report = run_batch(
            vec!["a", "b", "missing", "c"],
            |name| name.to_string(),
            |name| {
                attempted.push(name);
                async move {
                    if name == "missing" {
                        Err(StoreError::NotFound(name.to_string()))
                    } else {
                        Ok(())
                    }
                }
            },
        )
        .await;

        assert_eq!(attempted, vec!["a", "b", "missing"]);
        assert_eq!(report.completed, 2);
        let failure = report.failure.unwrap();
        assert_eq!(failure.item, "missing");
        assert!(matches!(failure.error, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn empty_batch_succeeds() {
        let report = run_batch(Vec::<String>::new(), |s| s.clone(), |_| async { Ok(()) }).await;
        assert!(report.is_success());
        assert_eq!(report.completed, 0);
    }
}
