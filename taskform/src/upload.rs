//! State of file uploads filling parameter value slots.
//!
//! Starting an upload clears its slot and remembers the previous value. The slot stays marked as
//! uploading, and fails validation, until the upload finishes. A failed or cancelled upload puts
//! the previous value back.

use futures::future::{AbortHandle, AbortRegistration};
use paramtree::{ParamId, Value, validate::UploadStatus};

/// Identifies one started upload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UploadTicket {
    pub id: ParamId,
    pub index: usize,
    serial: u64,
}

struct PendingUpload {
    serial: u64,
    previous: Value,
    abort: AbortHandle,
}

/// Uploads in progress, by value slot.
#[derive(Default)]
pub struct UploadTracker {
    next_serial: u64,
    pending: hashbrown::HashMap<(ParamId, usize), PendingUpload>,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks slot `index` of `id` as uploading. `previous` is the value the slot held before it
    /// was cleared. The upload must be run as an abortable future with the returned
    /// registration.
    ///
    /// An upload already filling the slot is aborted, and its previous value is kept.
    pub fn begin(
        &mut self,
        id: &ParamId,
        index: usize,
        previous: Value,
    ) -> (UploadTicket, AbortRegistration) {
        let (abort, registration) = AbortHandle::new_pair();
        let serial = self.next_serial;
        self.next_serial += 1;

        let key = (id.clone(), index);
        let previous = match self.pending.remove(&key) {
            Some(replaced) => {
                log::debug!("Replacing upload into {id}[{index}].");
                replaced.abort.abort();
                replaced.previous
            }
            None => previous,
        };
        self.pending.insert(
            key,
            PendingUpload {
                serial,
                previous,
                abort,
            },
        );

        let ticket = UploadTicket {
            id: id.clone(),
            index,
            serial,
        };
        (ticket, registration)
    }

    /// Ends the upload of `ticket`, returning the value the slot held before it started. Returns
    /// `None` if the upload was since replaced or forgotten, in which case the slot must be left
    /// alone.
    pub fn finish(&mut self, ticket: &UploadTicket) -> Option<Value> {
        let key = (ticket.id.clone(), ticket.index);
        match self.pending.get(&key) {
            Some(pending) if pending.serial == ticket.serial => {
                self.pending.remove(&key).map(|pending| pending.previous)
            }
            _ => None,
        }
    }

    /// Aborts the upload into a slot. Its previous value is restored once the aborted transfer
    /// is finished. Returns true if an upload was pending.
    pub fn cancel(&self, id: &ParamId, index: usize) -> bool {
        match self.pending.get(&(id.clone(), index)) {
            Some(pending) => {
                pending.abort.abort();
                true
            }
            None => false,
        }
    }

    /// Aborts and forgets every upload into `id` or any parameter below it. Returns the slots
    /// of those uploads with the values they held before, which the caller must put back.
    pub fn cancel_within(&mut self, id: &ParamId) -> Vec<(ParamId, usize, Value)> {
        let slots: Vec<(ParamId, usize)> = self
            .pending
            .keys()
            .filter(|(slot_id, _)| slot_id == id || slot_id.is_within(id))
            .cloned()
            .collect();
        slots
            .into_iter()
            .filter_map(|key| {
                let pending = self.pending.remove(&key)?;
                log::debug!("Cancelling upload into {}[{}].", key.0, key.1);
                pending.abort.abort();
                Some((key.0, key.1, pending.previous))
            })
            .collect()
    }

    /// Aborts and forgets every upload.
    pub fn cancel_all(&mut self) {
        for ((id, index), pending) in self.pending.drain() {
            log::debug!("Cancelling upload into {id}[{index}].");
            pending.abort.abort();
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl UploadStatus for UploadTracker {
    fn is_uploading(&self, id: &ParamId, index: usize) -> bool {
        self.pending.contains_key(&(id.clone(), index))
    }
}

/// The stored path reported by a transfer, without its surrounding quotes.
pub fn stored_path(response: &str) -> String {
    response.replace('"', "")
}

/// Short, decoded form of a stored path: its file name, or its last directory followed by `/`.
pub fn display_file_name(path: &str) -> String {
    let last_separator = path.rfind('/');
    let last_point = path.rfind('.');

    let short = if last_point > last_separator {
        match path.rfind(['/', '\\']) {
            Some(position) => path[position + 1..].to_owned(),
            None => path.to_owned(),
        }
    } else {
        let trimmed = path.strip_suffix('/').unwrap_or(path);
        let name = match trimmed.rfind('/') {
            Some(position) => &trimmed[position + 1..],
            None => trimmed,
        };
        format!("{name}/")
    };

    percent_encoding::percent_decode_str(&short)
        .decode_utf8_lossy()
        .into_owned()
}
