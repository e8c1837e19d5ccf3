//! Test doubles shared by the watcher tests.

use mockall::mock;
use slmwatch_core::{BoxFuture, InitialJobData};
use slmwatch_queue::{JobId, JobQueue, QueueResult, SuccessorPayload};

// The queue trait returns a borrowed boxed future, so the mock exposes a
// plain method and the trait impl wraps its result.
mock! {
    pub Queue {
        pub fn enqueue_mock(
            &self,
            initial_job_data: InitialJobData,
            successor: SuccessorPayload,
        ) -> QueueResult<JobId>;
    }
}

impl JobQueue for MockQueue {
    fn enqueue(
        &self,
        initial_job_data: InitialJobData,
        successor: SuccessorPayload,
    ) -> BoxFuture<'_, QueueResult<JobId>> {
        let result = self.enqueue_mock(initial_job_data, successor);
        Box::pin(async move { result })
    }
}
