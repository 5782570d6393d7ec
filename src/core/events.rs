// src/core/events.rs

//! Event-channel names and the semantics the relay attaches to them.
//!
//! The relay forwards almost everything verbatim; the one place it looks
//! inside a payload is the `user` channel, where a deactivated account must
//! additionally produce a targeted `force logout` broadcast. That decision is
//! made exactly once, here, by parsing the heterogeneous legacy `estado`
//! field into an explicit `AccountStatus`.

use crate::core::RelayError;
use serde_json::Value;
use strum_macros::{Display, EnumIter, EnumString};

/// Channel name of the handshake frame sent to a freshly accepted client.
pub const WELCOME: &str = "welcome";

/// Channel name of the targeted logout broadcast.
pub const FORCE_LOGOUT: &str = "force logout";

/// Channel name used for per-client error replies. Never broadcast.
pub const ERROR: &str = "error";

/// The record field carrying the account-active flag on the `user` channel.
pub const ESTADO_FIELD: &str = "estado";

/// The record field carrying the stable identifier on every channel.
pub const ID_FIELD: &str = "id";

/// The catalog entities whose changes the relay forwards between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
    User,
    Articulo,
    Categoria,
    Marca,
    Proveedor,
}

impl EntityKind {
    /// Maps an inbound event name (`"update user"`) to its entity kind.
    /// Returns `None` for anything that is not a known update event.
    pub fn parse_update_event(event: &str) -> Option<Self> {
        event.strip_prefix("update ")?.parse().ok()
    }

    /// The outbound event name this entity's updates are rebroadcast under.
    pub fn updated_event(&self) -> &'static str {
        match self {
            EntityKind::User => "user updated",
            EntityKind::Articulo => "articulo updated",
            EntityKind::Categoria => "categoria updated",
            EntityKind::Marca => "marca updated",
            EntityKind::Proveedor => "proveedor updated",
        }
    }

    /// The inbound event name clients use to publish updates of this entity.
    pub fn update_event(&self) -> &'static str {
        match self {
            EntityKind::User => "update user",
            EntityKind::Articulo => "update articulo",
            EntityKind::Categoria => "update categoria",
            EntityKind::Marca => "update marca",
            EntityKind::Proveedor => "update proveedor",
        }
    }
}

/// Whether a user account is allowed to hold a session.
///
/// The upstream schema was never consistent about the `estado` field: call
/// sites produced a boolean, an integer, or a status string. The canonical
/// representation is boolean; the other two are accepted as legacy encodings
/// at this single parse boundary and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
}

impl AccountStatus {
    /// Derives the status from a raw `estado` value. Only the three known
    /// deactivation encodings map to `Inactive`; anything else, including an
    /// absent field, is treated as still active and no logout fires.
    pub fn from_estado(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Bool(false)) => AccountStatus::Inactive,
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => AccountStatus::Inactive,
            Some(Value::String(s)) if s == "inactive" => AccountStatus::Inactive,
            _ => AccountStatus::Active,
        }
    }

    pub fn is_inactive(&self) -> bool {
        matches!(self, AccountStatus::Inactive)
    }
}

/// The relay's view of an inbound `update user` payload: the stable id and
/// the account status, decided once at the ingest boundary. Everything else
/// in the record stays opaque.
#[derive(Debug, Clone, PartialEq)]
pub struct UserChange {
    pub id: Option<String>,
    pub status: AccountStatus,
}

impl UserChange {
    pub fn from_record(record: &Value) -> Self {
        Self {
            id: record.get(ID_FIELD).and_then(id_as_string),
            status: AccountStatus::from_estado(record.get(ESTADO_FIELD)),
        }
    }
}

/// Canonicalizes an id value to a string. Numeric ids are rendered in their
/// decimal form so both sides of the comparison in the connector agree.
pub fn id_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Extracts the target user id from a `force logout` payload.
pub fn logout_target(data: &Value) -> Option<String> {
    id_as_string(data)
}

/// Classifies an inbound frame event name, rejecting unknown channels.
pub fn classify_inbound(event: &str) -> Result<EntityKind, RelayError> {
    EntityKind::parse_update_event(event).ok_or_else(|| RelayError::UnknownEvent(event.to_string()))
}
