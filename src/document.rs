use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use log::debug;

use crate::config::{Config, PartialNotification};
use crate::notif::{RawNotification, ValidationError};

/// Where `hdn json` reads its document from. Chosen by the argument alone,
/// never by looking at whether stdin is a terminal.
#[derive(Clone, Debug, PartialEq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    /// `None` and `-` mean standard input.
    pub fn from_arg(arg: Option<&str>) -> InputSource {
        match arg {
            None | Some("-") => InputSource::Stdin,
            Some(path)       => InputSource::File(PathBuf::from(path)),
        }
    }

    pub fn read(&self) -> Result<String, failure::Error> {
        match self {
            InputSource::Stdin => {
                debug!("reading JSON document from stdin");
                let mut contents = String::new();
                io::stdin().read_to_string(&mut contents)?;
                Ok(contents)
            }
            InputSource::File(path) => {
                debug!("reading JSON document from {}", path.display());
                fs::read_to_string(path)
                    .map_err(|e| failure::format_err!("could not read {}: {}", path.display(), e))
            }
        }
    }
}

/// Decodes a document and checks that `summary` and `body` are there. Other
/// keys are optional and unknown keys are ignored.
pub fn parse(text: &str) -> Result<PartialNotification, ValidationError> {
    let document: PartialNotification = serde_json::from_str(text.trim())
        .map_err(|e| ValidationError::InvalidJson(e.to_string()))?;

    if document.summary.is_none() || document.body.is_none() {
        return Err(ValidationError::MissingKeys);
    }
    Ok(document)
}

/// Document path: document > defaults file > built-in. The environment is
/// not consulted here.
pub fn resolve(text: &str, config: &Config) -> Result<RawNotification, ValidationError> {
    parse(text)?.or(config.defaults.clone()).complete()
}
