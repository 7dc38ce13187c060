//! Per-collection entity schemas.
//!
//! A single query engine and mutation layer serve every collection; a
//! schema supplies what differs between them: which string fields the
//! keyword searches, which categorical fields accept exact-match
//! filters, which timestamp the date range applies to, and how each
//! field is filled on create and merged on update.

use serde::Serialize;

/// Storage shape of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Timestamp,
    /// Closed set of allowed values.
    Category(&'static [&'static str]),
}

/// How a field is populated when a record is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateDefault {
    /// Left out of the record unless the request supplies it.
    Absent,
    /// Freshly generated identifier.
    Id,
    /// Creation instant.
    Now,
    /// Creation instant shifted forward by whole hours.
    NowPlusHours(i64),
    Text(&'static str),
    Number(i64),
}

/// How a field reacts to an update request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateRule {
    /// Request value replaces the stored one, blank or not.
    Overwrite,
    /// A blank request value leaves the stored one in place.
    KeepWhenBlank,
    /// Owned by the store; request values are ignored.
    Fixed,
    /// Set to the update instant.
    Stamp,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub on_create: CreateDefault,
    pub on_update: UpdateRule,
}

impl FieldSpec {
    const fn new(
        name: &'static str,
        kind: FieldKind,
        on_create: CreateDefault,
        on_update: UpdateRule,
    ) -> Self {
        Self {
            name,
            kind,
            on_create,
            on_update,
        }
    }

    /// System fields are never taken from a request body.
    pub fn is_system(&self) -> bool {
        matches!(self.on_update, UpdateRule::Fixed | UpdateRule::Stamp)
    }
}

/// Schema for one collection.
#[derive(Debug)]
pub struct EntitySchema {
    /// Collection name used in URLs and on the CLI (`/api/<name>`).
    pub name: &'static str,
    /// Fields in the order they appear in serialized records.
    pub fields: &'static [FieldSpec],
    /// String fields searched by `keyword`.
    pub keyword_fields: &'static [&'static str],
    /// Categorical fields accepted as exact-match filters.
    pub filter_fields: &'static [&'static str],
    /// Timestamp field constrained by `startTime`/`endTime`.
    pub date_field: Option<&'static str>,
    /// Message returned when an update arrives without an id.
    pub missing_id_message: &'static str,
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_filter_field(&self, name: &str) -> bool {
        self.filter_fields.contains(&name)
    }

    /// Allowed values for a categorical field, if it is one.
    pub fn choices(&self, name: &str) -> &'static [&'static str] {
        match self.field(name).map(|f| f.kind) {
            Some(FieldKind::Category(values)) => values,
            _ => &[],
        }
    }

    pub fn describe(&self) -> CollectionInfo {
        CollectionInfo {
            name: self.name,
            fields: self.fields.iter().map(|f| f.name).collect(),
            keyword_fields: self.keyword_fields.to_vec(),
            filter_fields: self.filter_fields.to_vec(),
            date_field: self.date_field,
        }
    }
}

/// JSON description of a collection, returned by `GET /collections`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionInfo {
    pub name: &'static str,
    pub fields: Vec<&'static str>,
    pub keyword_fields: Vec<&'static str>,
    pub filter_fields: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_field: Option<&'static str>,
}

pub const ACTIVITY_TYPES: &[&str] = &["online", "offline", "hybrid"];
pub const ACTIVITY_STATUSES: &[&str] = &["draft", "scheduled", "live", "completed", "cancelled"];
pub const USER_ROLES: &[&str] = &["admin", "manager", "editor", "viewer"];
pub const USER_STATUSES: &[&str] = &["active", "pending", "suspended"];

use CreateDefault as C;
use FieldKind as K;
use UpdateRule as U;

/// Activity and event records share one field layout.
const SCHEDULED_ITEM_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", K::Text, C::Id, U::Fixed),
    FieldSpec::new("title", K::Text, C::Absent, U::Overwrite),
    FieldSpec::new("type", K::Category(ACTIVITY_TYPES), C::Text("online"), U::Overwrite),
    FieldSpec::new("status", K::Category(ACTIVITY_STATUSES), C::Text("draft"), U::Overwrite),
    FieldSpec::new("organizer", K::Text, C::Text("未指定"), U::Overwrite),
    FieldSpec::new("location", K::Text, C::Text("待定"), U::Overwrite),
    FieldSpec::new("participants", K::Number, C::Number(0), U::KeepWhenBlank),
    FieldSpec::new("startTime", K::Timestamp, C::Now, U::KeepWhenBlank),
    FieldSpec::new("endTime", K::Timestamp, C::NowPlusHours(2), U::KeepWhenBlank),
    FieldSpec::new("description", K::Text, C::Absent, U::Overwrite),
    FieldSpec::new("createdAt", K::Timestamp, C::Now, U::Fixed),
    FieldSpec::new("updatedAt", K::Timestamp, C::Now, U::Stamp),
];

pub static ACTIVITIES: EntitySchema = EntitySchema {
    name: "activities",
    fields: SCHEDULED_ITEM_FIELDS,
    keyword_fields: &["title", "organizer", "location"],
    filter_fields: &["status", "type"],
    date_field: Some("startTime"),
    missing_id_message: "缺少活动 ID",
};

pub static EVENTS: EntitySchema = EntitySchema {
    name: "events",
    fields: SCHEDULED_ITEM_FIELDS,
    keyword_fields: &["title", "organizer", "location"],
    filter_fields: &["status", "type"],
    date_field: Some("startTime"),
    missing_id_message: "缺少事件 ID",
};

pub static MANAGED_USERS: EntitySchema = EntitySchema {
    name: "managed-users",
    fields: &[
        FieldSpec::new("id", K::Text, C::Id, U::Fixed),
        FieldSpec::new("name", K::Text, C::Absent, U::Overwrite),
        FieldSpec::new("email", K::Text, C::Absent, U::Overwrite),
        FieldSpec::new("phone", K::Text, C::Absent, U::Overwrite),
        FieldSpec::new("department", K::Text, C::Absent, U::Overwrite),
        FieldSpec::new("role", K::Category(USER_ROLES), C::Text("viewer"), U::KeepWhenBlank),
        FieldSpec::new("status", K::Category(USER_STATUSES), C::Text("pending"), U::KeepWhenBlank),
        FieldSpec::new("lastLogin", K::Timestamp, C::Now, U::KeepWhenBlank),
        FieldSpec::new("createdAt", K::Timestamp, C::Now, U::Fixed),
        FieldSpec::new("notes", K::Text, C::Absent, U::Overwrite),
    ],
    keyword_fields: &["name", "email", "department", "phone"],
    filter_fields: &["status", "role"],
    date_field: None,
    missing_id_message: "缺少用户 ID",
};

/// Every collection served by the process, in display order.
pub fn all() -> [&'static EntitySchema; 3] {
    [&ACTIVITIES, &MANAGED_USERS, &EVENTS]
}

/// Look up a schema by collection name.
pub fn by_name(name: &str) -> Option<&'static EntitySchema> {
    all().into_iter().find(|schema| schema.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn by_name_resolves_every_collection() {
        for schema in all() {
            assert!(std::ptr::eq(by_name(schema.name).expect("schema"), schema));
        }
        assert!(by_name("vessels").is_none());
    }

    #[test]
    fn searchable_and_filterable_fields_exist_in_layout() {
        for schema in all() {
            for name in schema.keyword_fields.iter().chain(schema.filter_fields) {
                assert!(
                    schema.field(name).is_some(),
                    "{} lists unknown field {name}",
                    schema.name
                );
            }
            if let Some(date) = schema.date_field {
                assert_eq!(schema.field(date).map(|f| f.kind), Some(FieldKind::Timestamp));
            }
        }
    }

    #[test]
    fn filter_fields_are_categorical() {
        for schema in all() {
            for name in schema.filter_fields {
                assert!(!schema.choices(name).is_empty(), "{name} has no choices");
            }
        }
        assert_eq!(MANAGED_USERS.choices("role"), USER_ROLES);
        assert!(ACTIVITIES.choices("title").is_empty());
    }

    #[test]
    fn system_fields_are_id_and_timestamps() {
        let system: Vec<_> = ACTIVITIES
            .fields
            .iter()
            .filter(|f| f.is_system())
            .map(|f| f.name)
            .collect();
        assert_eq!(system, vec!["id", "createdAt", "updatedAt"]);
    }
}
