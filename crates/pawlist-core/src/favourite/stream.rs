//! Favourites streams that follow the signed-in user.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::stream::{self, BoxStream, FusedStream, Stream, StreamExt};
use tokio::sync::watch;

use super::store::{Collection, Record};
use crate::error::Result;
use crate::user::User;

/// Turns the current-user channel into a stream that yields the current value
/// first, then every later change. Ends when the sender is dropped.
pub fn user_changes(receiver: watch::Receiver<Option<User>>) -> BoxStream<'static, Option<User>> {
    stream::unfold((receiver, true), |(mut receiver, first)| async move {
        if !first && receiver.changed().await.is_err() {
            return None;
        }
        let user = receiver.borrow_and_update().clone();
        Some((user, (receiver, false)))
    })
    .boxed()
}

/// Record list of the current user's favourites collection.
///
/// Every time the user changes, the query for the previous user is dropped and
/// a new one is opened: with a user, `find()` on the collection; without one,
/// a single empty list and no query at all. Items of an abandoned query are
/// never emitted.
///
/// An `Err` from a query is forwarded once and ends the stream. The stream
/// also ends once the user channel is closed and the last query completed.
pub struct FavouritesStream<T: Record> {
    users: BoxStream<'static, Option<User>>,
    collection: Arc<dyn Collection<T>>,
    current: Option<BoxStream<'static, Result<Vec<T>>>>,
    users_done: bool,
    finished: bool,
}

impl<T: Record> FavouritesStream<T> {
    pub fn new(users: BoxStream<'static, Option<User>>, collection: Arc<dyn Collection<T>>) -> Self {
        Self {
            users,
            collection,
            current: None,
            users_done: false,
            finished: false,
        }
    }

    fn open(&self, user: Option<User>) -> BoxStream<'static, Result<Vec<T>>> {
        match user {
            Some(user) => {
                tracing::debug!(
                    collection = self.collection.name(),
                    user_id = %user.id,
                    "opening favourites query"
                );
                self.collection.find()
            }
            None => stream::once(async { Ok(Vec::new()) }).boxed(),
        }
    }
}

impl<T: Record> Stream for FavouritesStream<T> {
    type Item = Result<Vec<T>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        if this.finished {
            return Poll::Ready(None);
        }

        // Only the latest user matters; replacing `current` drops the old query.
        while !this.users_done {
            match this.users.poll_next_unpin(cx) {
                Poll::Ready(Some(user)) => {
                    let next = this.open(user);
                    this.current = Some(next);
                }
                Poll::Ready(None) => this.users_done = true,
                Poll::Pending => break,
            }
        }

        if let Some(current) = this.current.as_mut() {
            match current.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(records))) => return Poll::Ready(Some(Ok(records))),
                Poll::Ready(Some(Err(err))) => {
                    tracing::warn!(
                        collection = this.collection.name(),
                        error = %err,
                        "favourites query failed"
                    );
                    this.current = None;
                    this.finished = true;
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(None) => this.current = None,
                Poll::Pending => {}
            }
        }

        if this.users_done && this.current.is_none() {
            this.finished = true;
            return Poll::Ready(None);
        }

        Poll::Pending
    }
}

impl<T: Record> FusedStream for FavouritesStream<T> {
    fn is_terminated(&self) -> bool {
        self.finished
    }
}
