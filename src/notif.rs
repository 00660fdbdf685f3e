use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use failure::Fail;
use serde::Serialize;

pub const DEFAULT_URGENCY:     &str = "normal";
pub const DEFAULT_OBJECT_PATH: &str = "/org/freedesktop/Notifications";
pub const DEFAULT_BUS_NAME:    &str = "org.freedesktop.Notifications";
pub const DEFAULT_INTERFACE:   &str = "org.freedesktop.Notifications";
pub const DEFAULT_MESSAGE_BUS: &str = "session";
pub const DEFAULT_ICON:        &str = "dialog-warning";
pub const DEFAULT_EXPIRE:      u64  = 3;

/// Everything that is rejected before a bus connection is ever opened.
/// The CLI maps these to exit status 1.
#[derive(Debug, Fail, PartialEq)]
pub enum ValidationError {
    #[fail(display = "Invalid urgency setting: {}", _0)]
    InvalidUrgency(String),
    #[fail(display = "Invalid message bus setting: {}", _0)]
    InvalidMessageBus(String),
    #[fail(display = "Invalid expiration: {}", _0)]
    InvalidExpiration(String),
    #[fail(display = "Missing required option: --{}", _0)]
    MissingOption(&'static str),
    #[fail(display = "The keys: summary and body are required! Check your JSON!")]
    MissingKeys,
    #[fail(display = "The JSON data is invalid: {}", _0)]
    InvalidJson(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Normal,
    Critical,
}

impl Urgency {
    /// Value of the `urgency` hint on the wire.
    pub fn code(self) -> u32 {
        match self {
            Urgency::Low      => 0,
            Urgency::Normal   => 1,
            Urgency::Critical => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Low      => "low",
            Urgency::Normal   => "normal",
            Urgency::Critical => "critical",
        }
    }
}

impl FromStr for Urgency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low"      => Ok(Urgency::Low),
            "normal"   => Ok(Urgency::Normal),
            "critical" => Ok(Urgency::Critical),
            _          => Err(ValidationError::InvalidUrgency(s.to_owned())),
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BusScope {
    Session,
    System,
}

impl BusScope {
    pub fn as_str(self) -> &'static str {
        match self {
            BusScope::Session => "session",
            BusScope::System  => "system",
        }
    }
}

impl FromStr for BusScope {
    type Err = ValidationError;

    // case-sensitive on purpose: "Session" is rejected
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "session" => Ok(BusScope::Session),
            "system"  => Ok(BusScope::System),
            _         => Err(ValidationError::InvalidMessageBus(s.to_owned())),
        }
    }
}

impl fmt::Display for BusScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification fields as they come in from flags, environment, a defaults
/// file or a JSON document, before any checking.
#[derive(Clone, Debug, PartialEq)]
pub struct RawNotification {
    pub summary:     String,
    pub body:        String,
    pub urgency:     String,
    pub object_path: String,
    pub bus_name:    String,
    pub interface:   String,
    pub message_bus: String,
    pub icon:        String,
    pub expire:      u64,
}

impl RawNotification {
    /// A raw notification with every optional field at its built-in default.
    pub fn with_defaults(summary: &str, body: &str) -> RawNotification {
        RawNotification {
            summary:     summary.to_owned(),
            body:        body.to_owned(),
            urgency:     DEFAULT_URGENCY.to_owned(),
            object_path: DEFAULT_OBJECT_PATH.to_owned(),
            bus_name:    DEFAULT_BUS_NAME.to_owned(),
            interface:   DEFAULT_INTERFACE.to_owned(),
            message_bus: DEFAULT_MESSAGE_BUS.to_owned(),
            icon:        DEFAULT_ICON.to_owned(),
            expire:      DEFAULT_EXPIRE,
        }
    }

    /// Checks expiration, urgency and bus scope, in that order.
    pub fn validate(self) -> Result<NotificationRequest, ValidationError> {
        let expire_timeout = wire_timeout(self.expire)?;
        let urgency        = self.urgency.parse::<Urgency>()?;
        let message_bus    = self.message_bus.parse::<BusScope>()?;

        Ok(NotificationRequest {
            summary:     self.summary,
            body:        self.body,
            urgency,
            object_path: self.object_path,
            bus_name:    self.bus_name,
            interface:   self.interface,
            message_bus,
            icon:        self.icon,
            expire:      self.expire,
            expire_timeout,
        })
    }
}

/// 0 asks the server for its own default (-1 on the wire), anything else is
/// seconds turned into milliseconds.
fn wire_timeout(expire: u64) -> Result<i32, ValidationError> {
    if expire == 0 {
        return Ok(-1);
    }

    expire
        .checked_mul(1000)
        .and_then(|ms| i32::try_from(ms).ok())
        .ok_or_else(|| ValidationError::InvalidExpiration(expire.to_string()))
}

/// A validated request. Only built through [`RawNotification::validate`].
#[derive(Clone, Debug, PartialEq)]
pub struct NotificationRequest {
    pub summary:     String,
    pub body:        String,
    pub urgency:     Urgency,
    pub object_path: String,
    pub bus_name:    String,
    pub interface:   String,
    pub message_bus: BusScope,
    pub icon:        String,
    pub expire:      u64,
    expire_timeout:  i32,
}

impl NotificationRequest {
    /// The `expire_timeout` argument of `Notify`, in milliseconds.
    pub fn expire_timeout(&self) -> i32 {
        self.expire_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn raw() -> RawNotification {
        RawNotification::with_defaults("Hi", "There")
    }

    #[test]
    fn urgency_maps_to_wire_codes() {
        for (name, code) in &[("low", 0), ("normal", 1), ("critical", 2)] {
            let request = RawNotification { urgency: name.to_string(), ..raw() }
                .validate()
                .unwrap();
            assert_eq!(request.urgency.code(), *code);
            assert_eq!(request.urgency.as_str(), *name);
        }
    }

    #[test]
    fn unknown_urgency_is_rejected() {
        let result = RawNotification { urgency: "urgent".into(), ..raw() }.validate();
        assert_eq!(result, Err(ValidationError::InvalidUrgency("urgent".into())));
        assert_eq!(
            result.unwrap_err().to_string(),
            "Invalid urgency setting: urgent"
        );
    }

    #[test]
    fn unknown_bus_scope_is_rejected() {
        for scope in &["Session", "SYSTEM", "user", ""] {
            let result = RawNotification { message_bus: scope.to_string(), ..raw() }.validate();
            assert_matches!(result, Err(ValidationError::InvalidMessageBus(ref s)) if s == scope);
        }
    }

    #[test]
    fn enums_serialize_as_their_lowercase_names() {
        assert_eq!(serde_json::to_value(Urgency::Critical).unwrap(), "critical");
        assert_eq!(serde_json::to_value(BusScope::System).unwrap(), "system");
    }

    #[test]
    fn both_bus_scopes_are_accepted() {
        let session = raw().validate().unwrap();
        let system  = RawNotification { message_bus: "system".into(), ..raw() }.validate().unwrap();
        assert_eq!(session.message_bus, BusScope::Session);
        assert_eq!(system.message_bus, BusScope::System);
    }

    #[test]
    fn zero_expire_means_server_default() {
        let request = RawNotification { expire: 0, ..raw() }.validate().unwrap();
        assert_eq!(request.expire_timeout(), -1);
        assert_eq!(request.expire, 0);
    }

    #[test]
    fn expire_is_converted_to_milliseconds() {
        let request = RawNotification { expire: 5, ..raw() }.validate().unwrap();
        assert_eq!(request.expire_timeout(), 5000);
    }

    #[test]
    fn expire_overflowing_int32_is_rejected() {
        let result = RawNotification { expire: 3_000_000, ..raw() }.validate();
        assert_matches!(result, Err(ValidationError::InvalidExpiration(_)));
    }

    #[test]
    fn expiration_is_checked_before_urgency() {
        let result = RawNotification { expire: u64::MAX, urgency: "bogus".into(), ..raw() }.validate();
        assert_matches!(result, Err(ValidationError::InvalidExpiration(_)));
    }

    #[test]
    fn defaults_backfill_every_optional_field() {
        let request = raw().validate().unwrap();
        assert_eq!(request.urgency, Urgency::Normal);
        assert_eq!(request.object_path, "/org/freedesktop/Notifications");
        assert_eq!(request.bus_name, "org.freedesktop.Notifications");
        assert_eq!(request.interface, "org.freedesktop.Notifications");
        assert_eq!(request.message_bus, BusScope::Session);
        assert_eq!(request.icon, "dialog-warning");
        assert_eq!(request.expire, 3);
        assert_eq!(request.expire_timeout(), 3000);
    }
}
