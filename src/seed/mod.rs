//! Synthetic records generated at process start.
//!
//! Generation is deterministic for a given base instant so tests can
//! pin exact values; the server passes the current time.

use serde::Deserialize;
use serde_json::{json, Value};
use time::macros::time;
use time::{Duration, OffsetDateTime};

use crate::clock::format_iso;
use crate::models::Record;
use crate::schema::{
    EntitySchema, ACTIVITY_STATUSES, ACTIVITY_TYPES, USER_ROLES, USER_STATUSES,
};

const ORGANIZERS: &[&str] = &["市场部", "品牌组", "活动组", "产品部"];
const LOCATIONS: &[&str] = &["线上直播间", "上海虹桥会议中心", "深圳科创园", "北京总部"];
const DEPARTMENTS: &[&str] = &["综合管理部", "市场营销部", "产品研发部", "客户成功部"];

/// How many records each collection starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SeedCounts {
    pub activities: usize,
    pub managed_users: usize,
    pub events: usize,
}

impl Default for SeedCounts {
    fn default() -> Self {
        Self {
            activities: 24,
            managed_users: 36,
            events: 24,
        }
    }
}

impl SeedCounts {
    pub fn for_collection(&self, name: &str) -> usize {
        match name {
            "activities" => self.activities,
            "managed-users" => self.managed_users,
            "events" => self.events,
            _ => 0,
        }
    }
}

/// Generate the initial records for a collection.
pub fn generate(schema: &EntitySchema, count: usize, now: OffsetDateTime) -> Vec<Record> {
    match schema.name {
        "activities" => activities(count, now),
        "managed-users" => managed_users(count, now),
        "events" => events(count, now),
        _ => Vec::new(),
    }
}

pub fn activities(count: usize, now: OffsetDateTime) -> Vec<Record> {
    scheduled_items(count, now, "活动策划会", "场活动的筹备详情，包含议程、嘉宾和宣传重点。")
}

pub fn events(count: usize, now: OffsetDateTime) -> Vec<Record> {
    scheduled_items(count, now, "船员活动", "次船员活动的安排说明，包含集合时间和注意事项。")
}

/// Activity-shaped records: item `i` starts at 09:00 UTC, `i` days after `now`.
fn scheduled_items(
    count: usize,
    now: OffsetDateTime,
    title: &str,
    description_tail: &str,
) -> Vec<Record> {
    (0..count)
        .map(|index| {
            let base = now + Duration::days(index as i64);
            let start = base.replace_time(time!(9:00));
            let end = start + Duration::hours(2 + (index % 3) as i64);
            into_record(json!({
                "id": (index + 1).to_string(),
                "title": format!("{title} {}", index + 1),
                "type": cycle(ACTIVITY_TYPES, index),
                "status": cycle(ACTIVITY_STATUSES, index),
                "organizer": cycle(ORGANIZERS, index),
                "location": cycle(LOCATIONS, index),
                "participants": 20 + (index % 5) * 15,
                "startTime": format_iso(start),
                "endTime": format_iso(end),
                "description": format!("这是第 {} {description_tail}", index + 1),
                "createdAt": format_iso(base - Duration::days(3)),
                "updatedAt": format_iso(base - Duration::days(1)),
            }))
        })
        .collect()
}

/// User `i` was created `i + 7` days before `now`.
pub fn managed_users(count: usize, now: OffsetDateTime) -> Vec<Record> {
    (0..count)
        .map(|index| {
            let base = now - Duration::days(index as i64);
            let notes = if index % 2 == 0 {
                "重点客户维护对象。"
            } else {
                "可安排参与活动支持。"
            };
            into_record(json!({
                "id": (index + 1).to_string(),
                "name": format!("用户 {}", index + 1),
                "email": format!("user{}@example.com", index + 1),
                "phone": format!("1380000{index:04}"),
                "department": cycle(DEPARTMENTS, index),
                "role": cycle(USER_ROLES, index),
                "status": cycle(USER_STATUSES, index),
                "lastLogin": format_iso(base - Duration::hours((index % 5) as i64)),
                "createdAt": format_iso(base - Duration::days(7)),
                "notes": notes,
            }))
        })
        .collect()
}

fn cycle(values: &[&'static str], index: usize) -> &'static str {
    values[index % values.len()]
}

fn into_record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ACTIVITIES, EVENTS, MANAGED_USERS};
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-05-01 08:30:15 UTC);

    #[test]
    fn default_counts_match_dashboard_fixtures() {
        let counts = SeedCounts::default();
        assert_eq!(generate(&ACTIVITIES, counts.activities, NOW).len(), 24);
        assert_eq!(generate(&MANAGED_USERS, counts.managed_users, NOW).len(), 36);
        assert_eq!(generate(&EVENTS, counts.events, NOW).len(), 24);
    }

    #[test]
    fn activity_fields_follow_index_pattern() {
        let items = activities(6, NOW);
        let third = &items[2];
        assert_eq!(third["id"], "3");
        assert_eq!(third["title"], "活动策划会 3");
        assert_eq!(third["type"], "hybrid");
        assert_eq!(third["status"], "live");
        assert_eq!(third["organizer"], "活动组");
        assert_eq!(third["location"], "深圳科创园");
        assert_eq!(third["participants"], 50);
        assert_eq!(third["startTime"], "2024-05-03T09:00:00.000Z");
        assert_eq!(third["endTime"], "2024-05-03T13:00:00.000Z");
        assert_eq!(third["createdAt"], "2024-04-30T08:30:15.000Z");
        assert_eq!(third["updatedAt"], "2024-05-02T08:30:15.000Z");
    }

    #[test]
    fn records_keep_schema_field_order() {
        let item = &activities(1, NOW)[0];
        let keys: Vec<&str> = item.keys().map(String::as_str).collect();
        let layout: Vec<&str> = ACTIVITIES.fields.iter().map(|f| f.name).collect();
        assert_eq!(keys, layout);

        let user = &managed_users(1, NOW)[0];
        let keys: Vec<&str> = user.keys().map(String::as_str).collect();
        let layout: Vec<&str> = MANAGED_USERS.fields.iter().map(|f| f.name).collect();
        assert_eq!(keys, layout);
    }

    #[test]
    fn managed_user_fields_follow_index_pattern() {
        let users = managed_users(12, NOW);
        let user = &users[11];
        assert_eq!(user["id"], "12");
        assert_eq!(user["email"], "user12@example.com");
        assert_eq!(user["phone"], "13800000011");
        assert_eq!(user["role"], "viewer");
        assert_eq!(user["status"], "suspended");
        assert_eq!(user["department"], "客户成功部");
        assert_eq!(user["notes"], "可安排参与活动支持。");
        assert_eq!(user["lastLogin"], "2024-04-20T07:30:15.000Z");
        assert_eq!(user["createdAt"], "2024-04-13T08:30:15.000Z");
    }

    #[test]
    fn events_have_their_own_titles() {
        let items = events(2, NOW);
        assert_eq!(items[1]["title"], "船员活动 2");
        assert_eq!(items[1]["participants"], 35);
    }
}
