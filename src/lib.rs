//! Send one desktop notification through `org.freedesktop.Notifications`
//! and describe what happened as a flat JSON record.
//!
//! Input resolution ([`config`], [`document`]) produces a
//! [`RawNotification`], [`notif`] validates it, [`run`] performs the D-Bus
//! round trip and [`report`] merges the outcome with the request.

pub mod config;
pub mod document;
pub mod notif;
pub mod report;
pub mod run;

pub use config::{Config, PartialNotification};
pub use document::InputSource;
pub use notif::{BusScope, NotificationRequest, RawNotification, Urgency, ValidationError};
pub use report::Report;
pub use run::{Bus, BusConnection, DBus, NotificationOutcome, NotifyCall, Reply};

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Named options, with the environment and defaults file behind them.
    Send(PartialNotification),
    /// A JSON document.
    Json(InputSource),
}

pub fn run(command: Command, config: &Config, bus: &dyn Bus) -> Result<Report, failure::Error> {
    let raw = match command {
        Command::Send(flags)  => config.resolve(flags, config::process_env)?,
        Command::Json(source) => document::resolve(&source.read()?, config)?,
    };
    notify(bus, raw)
}

/// Validates `raw` and only then touches the bus. An error reply is still
/// `Ok`, with `success: false` in the report.
pub fn notify(bus: &dyn Bus, raw: RawNotification) -> Result<Report, failure::Error> {
    let request = raw.validate()?;
    let outcome = run::send(bus, &request)?;
    Ok(Report::merge(outcome, request))
}
