use std::path::Path;
use std::process;

use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use log::LevelFilter;

use hdn::config::{self, Config, PartialNotification};
use hdn::{Command, DBus, InputSource, Report, ValidationError};

/// Status for input rejected before the bus was touched.
const EXIT_INVALID: i32 = 1;

fn main() -> Result<(), failure::Error> {
    let matches = cli().get_matches();
    init_logging(matches.is_present("verbose"));

    match execute(&matches) {
        Ok(report) => {
            println!("{}", report.to_json()?);
            Ok(())
        }
        Err(e) => match exit_status(&e) {
            Some(status) => {
                eprintln!("{}", e);
                process::exit(status);
            }
            None => Err(e),
        },
    }
}

fn execute(matches: &ArgMatches<'_>) -> Result<Report, failure::Error> {
    let config  = Config::new(matches.value_of("config").map(Path::new))?;
    let command = match matches.subcommand() {
        ("send", Some(send)) => Command::Send(send_flags(send)?),
        ("json", Some(json)) => Command::Json(InputSource::from_arg(json.value_of("FILE"))),
        (other, _)           => return Err(failure::format_err!("unknown command {}", other)),
    };
    hdn::run(command, &config, &DBus)
}

/// Validation errors end the process with [`EXIT_INVALID`]; `None` means the
/// error is returned from `main` as is.
fn exit_status(e: &failure::Error) -> Option<i32> {
    e.downcast_ref::<ValidationError>().map(|_| EXIT_INVALID)
}

// stderr only, stdout is reserved for the JSON report.
fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

fn send_flags(matches: &ArgMatches<'_>) -> Result<PartialNotification, ValidationError> {
    let value = |name: &str| matches.value_of(name).map(str::to_owned);

    Ok(PartialNotification {
        summary:     value("summary"),
        body:        value("body"),
        urgency:     value("urgency"),
        object_path: value("object-path"),
        bus_name:    value("bus-name"),
        interface:   value("interface"),
        message_bus: value("message-bus"),
        icon:        value("icon"),
        expire:      matches.value_of("expire").map(config::parse_expire).transpose()?,
    })
}

fn option<'a>(name: &'a str, help: &'a str) -> Arg<'a, 'a> {
    Arg::with_name(name)
        .long(name)
        .value_name("VALUE")
        .takes_value(true)
        .help(help)
}

fn cli() -> App<'static, 'static> {
    App::new("hdn")
        .version(crate_version!())
        .about("Send a notification to D-Bus and print the result as JSON.")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(Arg::with_name("config")
            .long("config")
            .value_name("FILE")
            .takes_value(true)
            .help("TOML file with default notification settings"))
        .arg(Arg::with_name("verbose")
            .short("v")
            .long("verbose")
            .help("Log what is being sent to stderr"))
        .subcommand(SubCommand::with_name("send")
            .about("Send a notification described by options")
            .after_help("Options fall back to HDN_<OPTION> environment variables, then to the defaults file.")
            .arg(option("summary",     "Summary of the notification [env: HDN_SUMMARY]"))
            .arg(option("body",        "Body of the notification [env: HDN_BODY]"))
            .arg(option("urgency",     "Urgency: low, normal, critical [env: HDN_URGENCY] [default: normal]"))
            .arg(option("object-path", "Object path [env: HDN_OBJECT_PATH] [default: /org/freedesktop/Notifications]"))
            .arg(option("bus-name",    "Bus name [env: HDN_BUS_NAME] [default: org.freedesktop.Notifications]"))
            .arg(option("interface",   "Interface [env: HDN_INTERFACE] [default: org.freedesktop.Notifications]"))
            .arg(option("message-bus", "Message bus: session, system [env: HDN_MESSAGE_BUS] [default: session]"))
            .arg(option("icon",        "Icon name from the freedesktop icon naming spec [env: HDN_ICON] [default: dialog-warning]"))
            .arg(option("expire",      "Expiration in seconds, 0 for the server default [env: HDN_EXPIRE] [default: 3]")))
        .subcommand(SubCommand::with_name("json")
            .about("Send a notification described by a JSON document")
            .arg(Arg::with_name("FILE")
                .index(1)
                .help("JSON file to read; '-' or nothing reads stdin")))
}
