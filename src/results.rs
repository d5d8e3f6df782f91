//! Append-only list of fetched images.
//!
//! The list is what a display layer renders. Entries are only ever pushed to
//! the end, in the order fetches complete, and never removed or replaced.
//! Instead of polling, a display can [`subscribe`](ResultList::subscribe) and
//! receive every appended image as it lands.

use crate::types::DecodedImage;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Notification sent to subscribers for every append
#[derive(Clone, Debug)]
pub struct Appended {
    /// Position of the new entry
    pub index: usize,
    /// The appended image
    pub image: DecodedImage,
}

/// Shared, append-only, ordered collection of decoded images
///
/// Cloning is cheap; all clones see the same list. Only the pipeline appends.
#[derive(Clone)]
pub struct ResultList {
    images: Arc<RwLock<Vec<DecodedImage>>>,
    appended_tx: broadcast::Sender<Appended>,
}

impl ResultList {
    /// Create an empty list whose subscribers buffer up to `capacity` notifications
    pub(crate) fn new(capacity: usize) -> Self {
        let (appended_tx, _rx) = broadcast::channel(capacity.max(1));
        Self {
            images: Arc::new(RwLock::new(Vec::new())),
            appended_tx,
        }
    }

    /// Append an image and notify subscribers, returning its index
    pub(crate) fn push(&self, image: DecodedImage) -> usize {
        let index = {
            let mut images = self
                .images
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            images.push(image.clone());
            images.len() - 1
        };

        // No subscribers is fine
        let _ = self.appended_tx.send(Appended { index, image });
        index
    }

    /// Receive a notification for every image appended after this call
    ///
    /// Notifications are buffered per subscriber up to `workers.event_capacity`.
    /// A subscriber that falls further behind receives `RecvError::Lagged` and
    /// skips ahead; the skipped entries are still in the list, so catch up with
    /// [`since`](Self::since) from the first index not yet rendered and keep
    /// receiving. Notifications for indices already rendered can then be ignored.
    pub fn subscribe(&self) -> broadcast::Receiver<Appended> {
        self.appended_tx.subscribe()
    }

    /// Entries from `start` to the end of the list, as notifications
    pub fn since(&self, start: usize) -> Vec<Appended> {
        self.read()
            .iter()
            .enumerate()
            .skip(start)
            .map(|(index, image)| Appended {
                index,
                image: image.clone(),
            })
            .collect()
    }

    /// Number of images in the list
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether nothing has been appended yet
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Image at `index`, if any
    pub fn get(&self, index: usize) -> Option<DecodedImage> {
        self.read().get(index).cloned()
    }

    /// Most recently appended image
    pub fn last(&self) -> Option<DecodedImage> {
        self.read().last().cloned()
    }

    /// Copy of the current list in arrival order
    ///
    /// Images share pixel buffers with the list, so this copies handles only.
    pub fn snapshot(&self) -> Vec<DecodedImage> {
        self.read().clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<DecodedImage>> {
        // The lock only guards a Vec push, so a poisoned lock still holds a consistent list
        self.images
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for ResultList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultList")
            .field("len", &self.len())
            .finish()
    }
}
