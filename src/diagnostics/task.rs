// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Units of asynchronous diagnostic work.

use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::{Future, IntoFuture};
use tokio::sync::oneshot;

/// Result of a task: `Ok(None)` means "no result" and keeps the previously
/// published state.
pub type TaskResult<T> = anyhow::Result<Option<Vec<T>>>;

/// One step of a diagnostic request.
///
/// A provider returns its tasks in the order they should be merged. The
/// driver awaits them one at a time, so a cheap task placed first is
/// published before an expensive one placed after it, no matter which
/// finishes first.
pub struct DiagnosticTask<T> {
    data: BoxFuture<'static, TaskResult<T>>,
}

impl<T: Send + 'static> DiagnosticTask<T> {
    /// Wraps a future producing the task's data.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = TaskResult<T>> + Send + 'static,
    {
        Self {
            data: future.boxed(),
        }
    }

    /// A task whose data is already known.
    #[must_use]
    pub fn ready(items: Vec<T>) -> Self {
        Self::new(futures::future::ready(Ok(Some(items))))
    }

    /// A task that yields "no result".
    #[must_use]
    pub fn no_result() -> Self {
        Self::new(futures::future::ready(Ok(None)))
    }

    /// A task that fails with `error`.
    #[must_use]
    pub fn failed(error: anyhow::Error) -> Self {
        Self::new(futures::future::ready(Err(error)))
    }

    /// Creates a task resolved from elsewhere, e.g. by a worker thread.
    ///
    /// Dropping the resolver without resolving yields "no result".
    #[must_use]
    pub fn channel() -> (TaskResolver<T>, Self) {
        let (sender, receiver) = oneshot::channel();
        let task = Self::new(async move { receiver.await.unwrap_or(Ok(None)) });
        (TaskResolver { sender }, task)
    }
}

impl<T: 'static> IntoFuture for DiagnosticTask<T> {
    type Output = TaskResult<T>;
    type IntoFuture = BoxFuture<'static, TaskResult<T>>;

    fn into_future(self) -> Self::IntoFuture {
        self.data
    }
}

impl<T> std::fmt::Debug for DiagnosticTask<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticTask").finish_non_exhaustive()
    }
}

/// Completion side of [`DiagnosticTask::channel`].
#[derive(Debug)]
pub struct TaskResolver<T> {
    sender: oneshot::Sender<TaskResult<T>>,
}

impl<T> TaskResolver<T> {
    /// Resolves the task with data.
    pub fn resolve(self, items: Vec<T>) {
        self.finish(Ok(Some(items)));
    }

    /// Resolves the task with "no result".
    pub fn no_result(self) {
        self.finish(Ok(None));
    }

    /// Fails the task.
    pub fn fail(self, error: anyhow::Error) {
        self.finish(Err(error));
    }

    /// Whether the driver has stopped waiting for this task.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.sender.is_closed()
    }

    fn finish(self, result: TaskResult<T>) {
        // The driver may have moved on to a newer request
        let _ = self.sender.send(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};

    #[tokio::test]
    async fn test_ready_and_no_result() -> Result<()> {
        assert_eq!(DiagnosticTask::ready(vec![1, 2]).await?, Some(vec![1, 2]));
        assert_eq!(DiagnosticTask::<i32>::no_result().await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_task_reports_error() {
        let result = DiagnosticTask::<i32>::failed(anyhow!("boom")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_channel_resolves_from_another_task() -> Result<()> {
        let (resolver, task) = DiagnosticTask::channel();
        tokio::spawn(async move {
            resolver.resolve(vec!["late"]);
        });
        assert_eq!(task.await?, Some(vec!["late"]));
        Ok(())
    }

    #[tokio::test]
    async fn test_dropped_resolver_is_no_result() -> Result<()> {
        let (resolver, task) = DiagnosticTask::<i32>::channel();
        drop(resolver);
        assert_eq!(task.await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_resolver_sees_abandoned_task() {
        let (resolver, task) = DiagnosticTask::<i32>::channel();
        assert!(!resolver.is_abandoned());
        drop(task);
        assert!(resolver.is_abandoned());
    }
}
