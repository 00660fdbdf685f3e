use std::cell::RefCell;
use std::rc::Rc;

use hdn::{
    document, Bus, BusConnection, BusScope, Config, NotifyCall, RawNotification, Reply, ValidationError,
};

#[derive(Default)]
struct Counters {
    opened: usize,
    closed: usize,
    calls:  Vec<NotifyCall>,
}

/// A bus whose connections answer every call with `reply` and record what
/// happened to them.
struct FakeBus {
    reply:    Reply,
    counters: Rc<RefCell<Counters>>,
    scopes:   RefCell<Vec<BusScope>>,
}

impl FakeBus {
    fn replying(reply: Reply) -> FakeBus {
        FakeBus {
            reply,
            counters: Rc::new(RefCell::new(Counters::default())),
            scopes:   RefCell::new(Vec::new()),
        }
    }

    fn opened(&self) -> usize {
        self.counters.borrow().opened
    }

    fn closed(&self) -> usize {
        self.counters.borrow().closed
    }
}

struct FakeConnection {
    reply:    Reply,
    counters: Rc<RefCell<Counters>>,
}

impl Bus for FakeBus {
    fn open(&self, scope: BusScope) -> Result<Box<dyn BusConnection>, failure::Error> {
        self.counters.borrow_mut().opened += 1;
        self.scopes.borrow_mut().push(scope);
        Ok(Box::new(FakeConnection {
            reply:    self.reply.clone(),
            counters: Rc::clone(&self.counters),
        }))
    }
}

impl BusConnection for FakeConnection {
    fn send_and_get_reply(&mut self, call: &NotifyCall) -> Result<Reply, failure::Error> {
        self.counters.borrow_mut().calls.push(call.clone());
        Ok(self.reply.clone())
    }

    fn close(&mut self) {
        self.counters.borrow_mut().closed += 1;
    }
}

fn from_json(text: &str) -> RawNotification {
    document::resolve(text, &Config::default()).unwrap()
}

#[test]
fn success_reply_is_reported_with_every_request_field() {
    let bus    = FakeBus::replying(Reply::Return(42));
    let report = hdn::notify(&bus, from_json(r#"{"summary":"Hi","body":"There"}"#)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

    assert_eq!(value["success"], true);
    assert_eq!(value["dbus_message_id"], 42);
    assert_eq!(value["summary"], "Hi");
    assert_eq!(value["body"], "There");
    assert_eq!(value["urgency"], "normal");
    assert_eq!(value["object_path"], "/org/freedesktop/Notifications");
    assert_eq!(value["bus_name"], "org.freedesktop.Notifications");
    assert_eq!(value["interface"], "org.freedesktop.Notifications");
    assert_eq!(value["message_bus"], "session");
    assert_eq!(value["icon"], "dialog-warning");
    assert_eq!(value["expire"], 3);

    assert_eq!(bus.opened(), 1);
    assert_eq!(bus.closed(), 1);
}

#[test]
fn error_reply_is_reported_without_curly_quotes() {
    let bus    = FakeBus::replying(Reply::Error("\u{201c}Invalid icon\u{201d}".into()));
    let report = hdn::notify(&bus, from_json(r#"{"summary":"Hi","body":"There","icon":"nope"}"#)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

    assert_eq!(value["success"], false);
    assert_eq!(value["message"], "Invalid icon");
    assert_eq!(value["icon"], "nope");
    assert!(value.get("dbus_message_id").is_none());

    assert_eq!(bus.opened(), 1);
    assert_eq!(bus.closed(), 1);
}

#[test]
fn wire_call_carries_urgency_code_and_timeout() {
    for (urgency, code) in &[("low", 0u32), ("normal", 1), ("critical", 2)] {
        let bus  = FakeBus::replying(Reply::Return(1));
        let text = format!(r#"{{"summary":"s","body":"b","urgency":"{}","expire":5}}"#, urgency);
        hdn::notify(&bus, from_json(&text)).unwrap();

        let counters = bus.counters.borrow();
        let call     = &counters.calls[0];
        assert_eq!(call.urgency, *code);
        assert_eq!(call.expire_timeout, 5000);
        assert_eq!(call.replaces_id, 0);
        assert!(call.actions.is_empty());
    }
}

#[test]
fn zero_expire_asks_for_server_default() {
    let bus = FakeBus::replying(Reply::Return(1));
    hdn::notify(&bus, from_json(r#"{"summary":"s","body":"b","expire":0}"#)).unwrap();
    assert_eq!(bus.counters.borrow().calls[0].expire_timeout, -1);
}

#[test]
fn system_bus_is_opened_when_asked() {
    let bus = FakeBus::replying(Reply::Return(1));
    hdn::notify(&bus, from_json(r#"{"summary":"s","body":"b","message_bus":"system"}"#)).unwrap();
    assert_eq!(*bus.scopes.borrow(), vec![BusScope::System]);
}

#[test]
fn validation_failures_make_no_connection() {
    let bus = FakeBus::replying(Reply::Return(1));

    let bad_urgency = from_json(r#"{"summary":"s","body":"b","urgency":"loud"}"#);
    let err = hdn::notify(&bus, bad_urgency).unwrap_err();
    assert_eq!(err.to_string(), "Invalid urgency setting: loud");

    let bad_bus = from_json(r#"{"summary":"s","body":"b","message_bus":"System"}"#);
    let err = hdn::notify(&bus, bad_bus).unwrap_err();
    assert_eq!(err.to_string(), "Invalid message bus setting: System");

    assert_eq!(bus.opened(), 0);
    assert_eq!(bus.closed(), 0);
}

#[test]
fn incomplete_document_is_rejected_before_sending() {
    assert_eq!(
        document::resolve(r#"{"summary":"only"}"#, &Config::default()),
        Err(ValidationError::MissingKeys)
    );
}
