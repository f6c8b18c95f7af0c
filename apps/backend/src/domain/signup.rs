//! In-memory roster mutations. The service runs these inside a store
//! transaction and writes the group back on success.

use time::{OffsetDateTime, UtcOffset};

use crate::domain::group::{Entry, Group, QueueType};
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind};

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Append a new entry to `queue`. Names are trimmed and compared without case.
pub fn add_entry(
    group: &mut Group,
    queue: QueueType,
    name: &str,
    pin: &str,
    now: OffsetDateTime,
) -> Result<(), DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("Player name must not be empty"));
    }
    if group.queue(queue).iter().any(|e| same_name(&e.name, name)) {
        return Err(DomainError::conflict(
            ConflictKind::DuplicateName,
            "Player with the same name already exists",
        ));
    }

    let entry = Entry {
        name: name.to_string(),
        pin: pin.to_string(),
        signup_time: now.to_offset(UtcOffset::UTC),
        seq: group.next_seq(),
    };
    group.queue_mut(queue).push(entry);
    Ok(())
}

/// Remove the first entry in stored order whose name matches.
///
/// The supplied PIN must equal that entry's PIN or the group PIN. A later
/// entry with the same name is never considered.
pub fn remove_entry(
    group: &mut Group,
    queue: QueueType,
    name: &str,
    pin: &str,
) -> Result<Entry, DomainError> {
    let name = name.trim();
    let idx = group
        .queue(queue)
        .iter()
        .position(|e| same_name(&e.name, name))
        .ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Player, "Can't find player with that name")
        })?;

    let entry = &group.queue(queue)[idx];
    if pin != entry.pin && pin != group.pin {
        return Err(DomainError::wrong_credential("Wrong PIN"));
    }
    Ok(group.queue_mut(queue).remove(idx))
}
