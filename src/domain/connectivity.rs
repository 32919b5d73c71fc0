/// Upstream internet links of the on-board router
use crate::errors::DecodeError;
use crate::utils::{optional_field, parse_quoted, strip_jsonp};
use serde::Deserialize;
use std::net::IpAddr;

/// Names of the German mobile networks by PLMN code
fn operator_name(plmn: i64) -> Option<&'static str> {
    match plmn {
        26201 => Some("T-Mobile"),
        26202 | 26204 | 26209 => Some("Vodafone"),
        26203 | 26205 | 26277 => Some("E-plus"),
        26207 | 26208 | 26211 => Some("O2"),
        _ => None,
    }
}

/// State of the physical modem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Down,
    Up,
}

/// State of the logical connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Available,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPointName {
    pub name: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl AccessPointName {
    /// Parse "name,user,password" where "-1" marks a missing part
    fn parse(text: &str) -> Self {
        let mut fields = text.split(',').map(str::to_string);
        Self {
            name: fields.next().unwrap_or_default(),
            user: optional_field(fields.next()),
            password: optional_field(fields.next()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UmtsInfo {
    pub net_status: Option<String>,
    /// Location Area Code
    pub lac: Option<String>,
    pub cell_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub index: u32,
    pub device_type: String,
    pub device_subtype: String,
    pub device_state: DeviceState,
    pub link_state: LinkState,
    /// Signal strength in dBm
    pub rssi: f64,
    pub technology: String,
    pub operator: Option<String>,
    pub apn: Option<AccessPointName>,
    pub umts: UmtsInfo,
}

impl Link {
    pub fn is_up(&self) -> bool {
        self.device_state == DeviceState::Up && self.link_state == LinkState::Available
    }

    fn from_wire(wire: WireLink) -> Result<Self, DecodeError> {
        // "-1" and "0" mean no operator
        let operator_id: i64 = parse_quoted("operator_id", wire.operator_id.as_deref())?;
        let operator = (operator_id > 0).then(|| {
            operator_name(operator_id)
                .map(str::to_string)
                .unwrap_or_else(|| operator_id.to_string())
        });
        let umts = wire.umts_info.unwrap_or_default();

        Ok(Self {
            index: parse_quoted("index", wire.index.as_deref())?,
            device_type: wire.device_type.unwrap_or_default(),
            device_subtype: wire.device_subtype.unwrap_or_default(),
            device_state: match wire.device_state.as_deref() {
                Some("up") => DeviceState::Up,
                _ => DeviceState::Down,
            },
            link_state: match wire.link_state.as_deref() {
                Some("available") => LinkState::Available,
                _ => LinkState::Disconnected,
            },
            rssi: parse_quoted("rssi", wire.rssi.as_deref())?,
            technology: wire.technology.unwrap_or_default(),
            operator,
            apn: wire.apninfo.as_deref().map(AccessPointName::parse),
            umts: UmtsInfo {
                net_status: optional_field(umts.net_status),
                lac: optional_field(umts.lac),
                cell_id: optional_field(umts.cellid),
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Connectivity {
    pub version: String,
    pub online: bool,
    pub bundle_id: String,
    pub bundle_ip: Option<IpAddr>,
    pub links: Vec<Link>,
}

impl Connectivity {
    pub fn from_jsonp(body: &str) -> Result<Self, DecodeError> {
        let wire: WireConnectivity = serde_json::from_str(strip_jsonp(body))?;

        let bundle_ip: Option<IpAddr> = match optional_field(wire.bundleip) {
            Some(ip) => Some(ip.parse().map_err(|_| DecodeError::InvalidField {
                field: "bundleip",
                value: ip.clone(),
            })?),
            None => None,
        };
        let online: u8 = parse_quoted("online", wire.online.as_deref())?;

        Ok(Self {
            version: wire.version.unwrap_or_default(),
            online: online == 1,
            bundle_id: wire.bundleid.unwrap_or_default(),
            bundle_ip,
            links: wire
                .links
                .unwrap_or_default()
                .into_iter()
                .map(Link::from_wire)
                .collect::<Result<_, _>>()?,
        })
    }

    pub fn links_up(&self) -> usize {
        self.links.iter().filter(|l| l.is_up()).count()
    }
}

#[derive(Debug, Deserialize)]
struct WireConnectivity {
    version: Option<String>,
    online: Option<String>,
    bundleid: Option<String>,
    bundleip: Option<String>,
    links: Option<Vec<WireLink>>,
}

#[derive(Debug, Deserialize)]
struct WireLink {
    index: Option<String>,
    device_type: Option<String>,
    device_subtype: Option<String>,
    device_state: Option<String>,
    link_state: Option<String>,
    rssi: Option<String>,
    technology: Option<String>,
    operator_id: Option<String>,
    apninfo: Option<String>,
    umts_info: Option<WireUmtsInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct WireUmtsInfo {
    net_status: Option<String>,
    lac: Option<String>,
    cellid: Option<String>,
}
