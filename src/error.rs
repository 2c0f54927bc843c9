use std::error::Error;
use std::fmt;

use crate::types::LayerId;

// ------------------------------ ERROR DEFINITIONS & IMPLEMENTATIONS -------------------------------------------------------------

/// This is the central error type for the whole library, everything fallible returns it.
/// The final parameter of most variants carries static context on where the error occurred.
#[derive(Debug)]
pub enum StandoffError {
    /// A range with `end < start` or a range that does not fit the targeted text
    InvalidRange(usize, usize, &'static str),
    /// No layer or text with this identifier exists in the store
    IdError(LayerId, &'static str),
    /// An item with this identifier already exists in the store
    DuplicateIdError(LayerId, &'static str),
    /// An anchor references a target that does not exist
    UnknownTarget(LayerId, &'static str),
    /// A qualified name uses a namespace prefix that was never declared
    UnknownPrefix(String, &'static str),
    /// A string could not be parsed into a [`crate::Name`]
    NameError(String, &'static str),
    /// The underlying XML parser reported an error, the conversion is aborted
    XmlError(quick_xml::Error, &'static str),
    /// An XML escape sequence could not be resolved
    EscapeError(quick_xml::escape::EscapeError, &'static str),
    /// An XML attribute could not be parsed
    AttrError(quick_xml::events::attributes::AttrError, &'static str),
    IoError(std::io::Error, &'static str),
    /// Error during JSON (de)serialization, the second parameter holds the filename
    JsonError(
        serde_path_to_error::Error<serde_json::Error>,
        String,
        &'static str,
    ),
    /// The text writer callback failed
    WriteError(std::fmt::Error, &'static str),
    OtherError(&'static str),
}

impl From<&StandoffError> for String {
    /// Returns the error message as a String
    fn from(error: &StandoffError) -> String {
        match error {
            StandoffError::InvalidRange(start, end, contextmsg) => format!(
                "InvalidRange: [{},{}) is not a valid range ({})",
                start, end, contextmsg
            ),
            StandoffError::IdError(id, contextmsg) => {
                format!("IdError: No such ID: {} ({})", id, contextmsg)
            }
            StandoffError::DuplicateIdError(id, contextmsg) => {
                format!("DuplicateIdError: ID already exists: {} ({})", id, contextmsg)
            }
            StandoffError::UnknownTarget(id, contextmsg) => format!(
                "UnknownTarget: Anchor references a target that does not exist: {} ({})",
                id, contextmsg
            ),
            StandoffError::UnknownPrefix(prefix, contextmsg) => format!(
                "UnknownPrefix: Namespace prefix was never declared: {} ({})",
                prefix, contextmsg
            ),
            StandoffError::NameError(name, contextmsg) => {
                format!("NameError: Unable to parse name: {} ({})", name, contextmsg)
            }
            StandoffError::XmlError(err, contextmsg) => {
                format!("XmlError: {} ({})", err, contextmsg)
            }
            StandoffError::EscapeError(err, contextmsg) => {
                format!("EscapeError: {} ({})", err, contextmsg)
            }
            StandoffError::AttrError(err, contextmsg) => {
                format!("AttrError: {} ({})", err, contextmsg)
            }
            StandoffError::IoError(err, contextmsg) => format!("IoError: {} ({})", err, contextmsg),
            StandoffError::JsonError(err, filename, contextmsg) => format!(
                "JsonError: Error parsing {}: {} ({})",
                filename, err, contextmsg
            ),
            StandoffError::WriteError(err, contextmsg) => {
                format!("WriteError: {} ({})", err, contextmsg)
            }
            StandoffError::OtherError(contextmsg) => format!("OtherError: {}", contextmsg),
        }
    }
}

impl fmt::Display for StandoffError {
    /// Formats the error message for printing
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let errmsg: String = String::from(self);
        write!(f, "[StandoffError] {}", errmsg)
    }
}

impl Error for StandoffError {}
