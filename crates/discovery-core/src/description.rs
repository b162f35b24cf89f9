//! UPnP device description parsing.
//!
//! Cameras answer the SSDP probe with the URL of a small XML document. Only a
//! handful of elements matter here; they are matched by local name so a
//! vendor namespace prefix (`ns:X_accessURL`) makes no difference.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::error::{DiscoveryError, Result};

/// Fields extracted from a device description document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceDescription {
    pub friendly_name: String,
    pub model_name: String,
    pub serial_number: String,
    pub udn: String,
    pub control_base_url: String,
}

impl DeviceDescription {
    /// Attaches the address the device was reached at.
    pub fn into_descriptor(self, source_ip: impl Into<String>) -> DeviceDescriptor {
        DeviceDescriptor {
            friendly_name: self.friendly_name,
            model_name: self.model_name,
            serial_number: self.serial_number,
            udn: self.udn,
            control_base_url: self.control_base_url,
            source_ip: source_ip.into(),
        }
    }
}

/// A discovered camera. Unique by `udn`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub friendly_name: String,
    pub model_name: String,
    pub serial_number: String,
    pub udn: String,
    /// Base URL of the control API, e.g. `http://192.168.1.2:8080/ccapi`
    pub control_base_url: String,
    pub source_ip: String,
}

impl DeviceDescriptor {
    /// Friendly name, or the model name when the camera reports none.
    pub fn display_name(&self) -> &str {
        if self.friendly_name.is_empty() {
            &self.model_name
        } else {
            &self.friendly_name
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    FriendlyName,
    ModelName,
    SerialNumber,
    Udn,
    AccessUrl,
}

impl Field {
    fn from_local_name(name: &[u8]) -> Option<Field> {
        match name {
            b"friendlyName" => Some(Field::FriendlyName),
            b"modelName" => Some(Field::ModelName),
            b"serialNumber" => Some(Field::SerialNumber),
            b"UDN" => Some(Field::Udn),
            b"X_accessURL" => Some(Field::AccessUrl),
            _ => None,
        }
    }
}

#[derive(Default)]
struct Collected {
    friendly_name: Option<String>,
    model_name: Option<String>,
    serial_number: Option<String>,
    udn: Option<String>,
    access_url: Option<String>,
}

impl Collected {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::FriendlyName => &mut self.friendly_name,
            Field::ModelName => &mut self.model_name,
            Field::SerialNumber => &mut self.serial_number,
            Field::Udn => &mut self.udn,
            Field::AccessUrl => &mut self.access_url,
        }
    }
}

fn invalid(err: impl std::fmt::Display) -> DiscoveryError {
    DiscoveryError::InvalidDeviceDescription(err.to_string())
}

/// Parses a device description document.
///
/// The first occurrence of each element wins and its text is trimmed. Only
/// the access URL is mandatory.
pub fn parse_device_description(xml: &str) -> Result<DeviceDescription> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut collected = Collected::default();
    // One entry per open element; `Some` when it is an element we extract
    let mut open: Vec<Option<Field>> = Vec::new();
    let mut text = String::new();
    let mut seen_root = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                seen_root = true;
                open.push(Field::from_local_name(e.local_name().as_ref()));
                text.clear();
            }
            Ok(Event::Empty(_)) => seen_root = true,
            Ok(Event::Text(ref e)) => {
                if matches!(open.last(), Some(Some(_))) {
                    text.push_str(&e.unescape().map_err(invalid)?);
                }
            }
            Ok(Event::CData(e)) => {
                if matches!(open.last(), Some(Some(_))) {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(_)) => {
                if let Some(Some(field)) = open.pop() {
                    let slot = collected.slot(field);
                    if slot.is_none() {
                        *slot = Some(text.trim().to_string());
                    }
                }
                text.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(invalid(format!(
                    "error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(invalid("document has no root element"));
    }
    if !open.is_empty() {
        return Err(invalid("document ended inside an open element"));
    }

    let control_base_url = collected
        .access_url
        .filter(|url| !url.is_empty())
        .ok_or(DiscoveryError::MissingControlUrl)?;

    Ok(DeviceDescription {
        friendly_name: collected.friendly_name.unwrap_or_default(),
        model_name: collected.model_name.unwrap_or_default(),
        serial_number: collected.serial_number.unwrap_or_default(),
        udn: collected.udn.unwrap_or_default(),
        control_base_url,
    })
}
