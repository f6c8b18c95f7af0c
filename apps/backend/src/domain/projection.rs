//! Display-ready view of a group. PINs never leave this module.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::domain::group::{Entry, Group, QueueType};
use crate::domain::roster::resolve;
use crate::domain::timezone;
use crate::errors::domain::{DomainError, InfraErrorKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub name: String,
    /// RFC 3339 in the local offset
    pub signup_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupView {
    pub id: i64,
    pub location: String,
    pub description: Option<String>,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub single_limit: u32,
    pub double_limit: u32,
    pub single_players: Vec<PlayerView>,
    pub single_waitlist: Vec<PlayerView>,
    pub double_players: Vec<PlayerView>,
    pub double_waitlist: Vec<PlayerView>,
    pub can_signup: bool,
    pub can_retreat: bool,
}

fn format_err(e: time::error::Format) -> DomainError {
    DomainError::infra(
        InfraErrorKind::Other("Format".into()),
        format!("failed to format time: {e}"),
    )
}

fn player_views(entries: &[&Entry]) -> Result<Vec<PlayerView>, DomainError> {
    entries
        .iter()
        .map(|e| {
            Ok(PlayerView {
                name: e.name.clone(),
                signup_time: timezone::to_local(e.signup_time)
                    .format(&Rfc3339)
                    .map_err(format_err)?,
            })
        })
        .collect()
}

fn queue_views(
    group: &Group,
    queue: QueueType,
) -> Result<(Vec<PlayerView>, Vec<PlayerView>), DomainError> {
    let limit = usize::try_from(group.limit(queue)).unwrap_or(usize::MAX);
    let resolution = resolve(group.queue(queue), limit);
    Ok((
        player_views(&resolution.confirmed)?,
        player_views(&resolution.waitlisted)?,
    ))
}

/// Resolve both queues and render times in the local timezone.
pub fn resolve_group(group: &Group, now: OffsetDateTime) -> Result<GroupView, DomainError> {
    let (single_players, single_waitlist) = queue_views(group, QueueType::Single)?;
    let (double_players, double_waitlist) = queue_views(group, QueueType::Double)?;

    Ok(GroupView {
        id: group.id,
        location: group.location.clone(),
        description: group.description.clone(),
        date: timezone::format_date(group.start_time).map_err(format_err)?,
        start_time: timezone::format_clock(group.start_time).map_err(format_err)?,
        end_time: timezone::format_clock(group.end_time).map_err(format_err)?,
        single_limit: group.single_limit,
        double_limit: group.double_limit,
        single_players,
        single_waitlist,
        double_players,
        double_waitlist,
        can_signup: now < group.start_time,
        can_retreat: now < group.retreat_deadline,
    })
}
