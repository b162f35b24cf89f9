//! Terminal rendering for command results

use ccapi_client_core::{DeviceDescriptor, SettingResponse};
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Control URL")]
    control_url: String,
}

impl From<&DeviceDescriptor> for DeviceRow {
    fn from(device: &DeviceDescriptor) -> Self {
        DeviceRow {
            name: device.display_name().to_string(),
            model: device.model_name.clone(),
            serial: device.serial_number.clone(),
            ip: device.source_ip.clone(),
            control_url: device.control_base_url.clone(),
        }
    }
}

pub fn device_table(devices: &[DeviceDescriptor]) -> String {
    let rows: Vec<DeviceRow> = devices.iter().map(DeviceRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// `value` line plus the accepted values, marking the current one.
pub fn setting_summary(name: &str, setting: &SettingResponse) -> String {
    let value = setting.value.as_deref().unwrap_or("(unavailable)");
    let mut rendered = format!("{}: {}", name, value);

    if let Some(ability) = &setting.ability {
        let choices: Vec<String> = ability
            .iter()
            .map(|choice| {
                if Some(choice.as_str()) == setting.value.as_deref() {
                    format!("[{}]", choice)
                } else {
                    choice.clone()
                }
            })
            .collect();
        rendered.push_str(&format!("\n  accepts: {}", choices.join(" ")));
    }
    rendered
}
