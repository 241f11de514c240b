use std::{
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

#[derive(Clone, Default)]
pub(crate) struct Tasks {
    current: Arc<Mutex<TaskTracker>>,
}

impl Tasks {
    pub fn spawn<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .spawn(task)
    }

    /// Waits for every task spawned before the call. Tasks spawned meanwhile
    /// go to a fresh tracker, which also waits for the retired one so a
    /// concurrent `settle` still covers them.
    pub async fn settle(&self) {
        let retired = {
            let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            let retired = std::mem::replace(&mut *current, TaskTracker::new());
            retired.close();

            let waiter = retired.clone();
            current.spawn(async move { waiter.wait().await });
            retired
        };

        retired.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use crate::tasks::Tasks;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn concurrent_settles_both_return() {
        let tasks = Tasks::default();
        let (release, released) = oneshot::channel::<()>();
        tasks.spawn(async move {
            let _ = released.await;
        });

        let first = tokio::spawn({
            let tasks = tasks.clone();
            async move { tasks.settle().await }
        });
        let second = tokio::spawn({
            let tasks = tasks.clone();
            async move { tasks.settle().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!first.is_finished());
        assert!(!second.is_finished());

        release.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(2), async {
            first.await.unwrap();
            second.await.unwrap();
        })
        .await
        .unwrap();

        // still usable afterwards
        tasks.spawn(async {}).await.unwrap();
        tokio::time::timeout(Duration::from_secs(2), tasks.settle())
            .await
            .unwrap();
    }
}
