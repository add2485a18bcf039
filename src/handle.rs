use super::{
    errors::SpawnError,
    model::JoinOrdering,
    result::SpawnResult,
};
use std::{
    any::Any,
    future::Future,
    panic,
    pin::Pin,
    task::{Context, Poll},
    thread,
};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::oneshot::{self, error::TryRecvError};


/// Unit of work as stored in the queue: a type-erased, run-once closure.
pub(crate) type Task = Box<dyn FnOnce() + Send + 'static>;


pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn into_spawn_result<T>(received: Result<thread::Result<T>, oneshot::error::RecvError>) -> SpawnResult<T> {
    match received {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(payload)) => Err(SpawnError::Panic(panic_message(payload.as_ref()))),
        Err(_) => Err(SpawnError::ChannelClosed),
    }
}


/// One-shot handle to the result of a submitted task.
///
/// The result can be taken once, either by blocking with [`JoinHandle::join`]
/// or by awaiting the handle. Dropping the handle does not stop the task;
/// its result is discarded when it completes.
#[derive(Debug)]
pub struct JoinHandle<T> {
    receiver: oneshot::Receiver<thread::Result<T>>,
}

impl<T> JoinHandle<T> {

    pub(crate) fn new(receiver: oneshot::Receiver<thread::Result<T>>) -> Self {
        Self { receiver }
    }

    /// Blocks the current thread until the task finishes.
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context;
    /// await the handle there instead.
    pub fn join(self) -> SpawnResult<T> {
        into_spawn_result(self.receiver.blocking_recv())
    }

    /// Like [`JoinHandle::join`], but a panic inside the task is resumed on
    /// the calling thread with its original payload, as if the callable had
    /// been invoked directly.
    ///
    /// # Panics
    ///
    /// Re-raises the task's panic. Same async-context restriction as `join`.
    pub fn join_or_resume(self) -> SpawnResult<T> {
        match self.receiver.blocking_recv() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(payload)) => panic::resume_unwind(payload),
            Err(_) => Err(SpawnError::ChannelClosed),
        }
    }

    /// Returns the result if the task has already finished, `None` otherwise.
    ///
    /// After a result has been returned the handle is spent and further calls
    /// yield `Err(SpawnError::ChannelClosed)`.
    pub fn try_join(&mut self) -> Option<SpawnResult<T>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(into_spawn_result(Ok(result))),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(SpawnError::ChannelClosed)),
        }
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = SpawnResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(res) => Poll::Ready(into_spawn_result(res)),
            Poll::Pending => Poll::Pending,
        }
    }
}


/// Awaits every handle and collects the results.
///
/// With [`JoinOrdering::Ordered`] results line up with `handles`; with
/// [`JoinOrdering::UnOrdered`] they arrive in completion order.
pub async fn join_handles<T>(handles: Vec<JoinHandle<T>>, ordering: JoinOrdering) -> Vec<SpawnResult<T>> {
    if handles.is_empty() {
        return Vec::new();
    }

    match ordering {
        JoinOrdering::Ordered => futures::future::join_all(handles).await,
        JoinOrdering::UnOrdered => {
            let len = handles.len();
            let mut futures = FuturesUnordered::from_iter(handles);
            let mut results = Vec::with_capacity(len);

            while let Some(result) = futures.next().await {
                results.push(result);
            }

            results
        }
    }
}
