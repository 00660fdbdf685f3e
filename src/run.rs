use std::collections::HashMap;

use log::{debug, warn};
use zbus::zvariant::Value;

use crate::notif::{BusScope, NotificationRequest};

/// Application name sent as the first `Notify` argument.
pub const APP_NAME:         &str = "hdn";
pub const NOTIFY_METHOD:    &str = "Notify";
pub const NOTIFY_SIGNATURE: &str = "susssasa{sv}i";

/// Argument tuple of `org.freedesktop.Notifications.Notify`, in wire order.
pub type NotifyArgs<'a> = (
    &'a str,                      // app_name
    u32,                          // replaces_id
    &'a str,                      // app_icon
    &'a str,                      // summary
    &'a str,                      // body
    Vec<&'a str>,                 // actions
    HashMap<&'a str, Value<'a>>,  // hints
    i32,                          // expire_timeout
);

/// One encoded `Notify` call: where it goes and what it carries.
#[derive(Clone, Debug, PartialEq)]
pub struct NotifyCall {
    pub destination:    String,
    pub path:           String,
    pub interface:      String,
    pub replaces_id:    u32,
    pub icon:           String,
    pub summary:        String,
    pub body:           String,
    pub actions:        Vec<String>,
    pub urgency:        u32,
    pub expire_timeout: i32,
}

impl NotifyCall {
    pub fn new(request: &NotificationRequest) -> NotifyCall {
        NotifyCall {
            destination:    request.bus_name.clone(),
            path:           request.object_path.clone(),
            interface:      request.interface.clone(),
            replaces_id:    0, // never replace an existing notification
            icon:           request.icon.clone(),
            summary:        request.summary.clone(),
            body:           request.body.clone(),
            actions:        Vec::new(),
            urgency:        request.urgency.code(),
            expire_timeout: request.expire_timeout(),
        }
    }

    pub fn args(&self) -> NotifyArgs<'_> {
        let mut hints = HashMap::new();
        hints.insert("urgency", Value::U32(self.urgency));

        (
            APP_NAME,
            self.replaces_id,
            self.icon.as_str(),
            self.summary.as_str(),
            self.body.as_str(),
            self.actions.iter().map(String::as_str).collect(),
            hints,
            self.expire_timeout,
        )
    }
}

/// What came back for a `Notify` call.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    /// Method return, carrying the server-assigned id.
    Return(u32),
    /// Error reply, carrying its first argument (or the error name).
    Error(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum NotificationOutcome {
    Success { dbus_message_id: u32 },
    Failure { message: String },
}

impl From<Reply> for NotificationOutcome {
    fn from(reply: Reply) -> Self {
        match reply {
            Reply::Return(id)  => NotificationOutcome::Success { dbus_message_id: id },
            Reply::Error(text) => NotificationOutcome::Failure { message: strip_curly_quotes(&text).to_owned() },
        }
    }
}

/// Daemons like to wrap error text in “”; only those two are removed, and
/// only at the ends.
pub fn strip_curly_quotes(text: &str) -> &str {
    text.trim_matches(|c: char| c == '\u{201c}' || c == '\u{201d}')
}

/// Opens connections to a message bus.
#[cfg_attr(test, mockall::automock)]
pub trait Bus {
    fn open(&self, scope: BusScope) -> Result<Box<dyn BusConnection>, failure::Error>;
}

/// An open bus connection. `close` is called exactly once, by
/// [`ConnectionGuard`].
#[cfg_attr(test, mockall::automock)]
pub trait BusConnection {
    /// Sends `call` and blocks until its reply arrives. Error replies are
    /// `Ok(Reply::Error)`; `Err` is for everything that is not a reply.
    fn send_and_get_reply(&mut self, call: &NotifyCall) -> Result<Reply, failure::Error>;
    fn close(&mut self);
}

/// Closes the wrapped connection when dropped, whichever way `send` returns.
pub struct ConnectionGuard {
    connection: Box<dyn BusConnection>,
}

impl ConnectionGuard {
    pub fn new(connection: Box<dyn BusConnection>) -> ConnectionGuard {
        ConnectionGuard { connection }
    }

    pub fn send_and_get_reply(&mut self, call: &NotifyCall) -> Result<Reply, failure::Error> {
        self.connection.send_and_get_reply(call)
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.connection.close();
    }
}

/// One request/reply exchange. Connection failures are returned as `Err`,
/// error replies as `NotificationOutcome::Failure`.
pub fn send(bus: &dyn Bus, request: &NotificationRequest) -> Result<NotificationOutcome, failure::Error> {
    let call           = NotifyCall::new(request);
    let mut connection = ConnectionGuard::new(bus.open(request.message_bus)?);

    let reply = connection.send_and_get_reply(&call)?;
    Ok(NotificationOutcome::from(reply))
}

/// Sorts what zbus handed back for a `Notify` call: a method return carries
/// the id, an error reply its text, anything else never reached a daemon.
pub fn reply_from(result: zbus::Result<zbus::Message>) -> Result<Reply, failure::Error> {
    match result {
        Ok(message) => {
            let id: u32 = message.body().deserialize()?;
            debug!("notification accepted with id {}", id);
            Ok(Reply::Return(id))
        }
        Err(zbus::Error::MethodError(name, text, _)) => {
            debug!("error reply {}", name);
            Ok(Reply::Error(text.unwrap_or_else(|| name.to_string())))
        }
        Err(e) => Err(e.into()),
    }
}

/// The real thing, backed by zbus' blocking API.
pub struct DBus;

impl Bus for DBus {
    fn open(&self, scope: BusScope) -> Result<Box<dyn BusConnection>, failure::Error> {
        debug!("connecting to the {} bus", scope);
        let connection = match scope {
            BusScope::Session => zbus::blocking::Connection::session()?,
            BusScope::System  => zbus::blocking::Connection::system()?,
        };
        Ok(Box::new(DBusConnection { connection: Some(connection) }))
    }
}

pub struct DBusConnection {
    connection: Option<zbus::blocking::Connection>,
}

impl BusConnection for DBusConnection {
    fn send_and_get_reply(&mut self, call: &NotifyCall) -> Result<Reply, failure::Error> {
        let connection = self
            .connection
            .as_ref()
            .ok_or_else(|| failure::err_msg("bus connection already closed"))?;

        debug!("calling {}.{} on {} at {}", call.interface, NOTIFY_METHOD, call.destination, call.path);
        let result = connection.call_method(
            Some(call.destination.as_str()),
            call.path.as_str(),
            Some(call.interface.as_str()),
            NOTIFY_METHOD,
            &call.args(),
        );

        reply_from(result)
    }

    fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            debug!("closing bus connection");
            if let Err(e) = connection.close() {
                warn!("could not close bus connection: {}", e);
            }
        }
    }
}
