//! SSDP probe construction and response header extraction.

/// SSDP multicast group and port.
pub const SSDP_MULTICAST_ADDR: &str = "239.255.255.250:1900";

/// Service type advertised by cameras exposing the control API.
pub const CCAPI_SERVICE_TYPE: &str =
    "urn:schemas-canon-com:service:ICPO-CameraControlAPIService:1";

/// Builds an `M-SEARCH` request for `search_target`.
pub fn build_msearch(host: &str, search_target: &str, mx: u8) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: {}\r\n\
         ST: {}\r\n\
         \r\n",
        host, mx, search_target
    )
}

/// Finds a header value in an SSDP response. The name match is
/// case-insensitive and the value is trimmed.
pub fn extract_header<'a>(datagram: &'a str, name: &str) -> Option<&'a str> {
    datagram.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim())
    })
}

/// Headers of an SSDP search response. Only `LOCATION` is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsdpResponse<'a> {
    pub location: &'a str,
    pub search_target: Option<&'a str>,
    pub usn: Option<&'a str>,
    pub server: Option<&'a str>,
}

impl<'a> SsdpResponse<'a> {
    pub fn parse(datagram: &'a str) -> Option<Self> {
        let location = extract_header(datagram, "LOCATION").filter(|l| !l.is_empty())?;
        Some(SsdpResponse {
            location,
            search_target: extract_header(datagram, "ST"),
            usn: extract_header(datagram, "USN"),
            server: extract_header(datagram, "SERVER"),
        })
    }
}
