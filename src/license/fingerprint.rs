// Machine Fingerprints
// Opaque machine fields plus the day counter (days since the UNIX epoch) they
// were taken on. Fields may contain any octets including commas; the day
// counter is whatever follows the last comma.

use std::fmt;
use std::fs;
use std::net::{Ipv4Addr, UdpSocket};
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

/// Separator between the machine fields and the day counter.
pub const FIELD_DELIMITER: u8 = b',';

const SECONDS_PER_DAY: i64 = 86_400;

/// Errors parsing a fingerprint from its wire forms.
#[derive(Debug, Error)]
pub enum FingerprintError {
    /// Transport text is not standard base64.
    #[error("invalid base64 fingerprint: {0}")]
    Base64(#[from] base64::DecodeError),

    /// No delimiter before the day counter.
    #[error("fingerprint has no day counter")]
    MissingDelimiter,

    /// Day counter is not a run of decimal digits.
    #[error("invalid day counter: {0:?}")]
    InvalidDayCount(String),

    /// Day counter lies before the epoch and cannot be signed.
    #[error("day counter {0} is out of range")]
    DayCountOutOfRange(i64),
}

/// Failure collecting machine identifiers.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// A required identifier could not be read.
    #[error("{field} unavailable: {reason}")]
    Unavailable { field: &'static str, reason: String },
}

/// Machine fields plus the day counter they were captured on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    fields: Vec<u8>,
    day_count: i64,
}

impl Fingerprint {
    pub fn new(fields: impl Into<Vec<u8>>, day_count: i64) -> Self {
        Self {
            fields: fields.into(),
            day_count,
        }
    }

    /// Fingerprint stamped with today's day counter.
    pub fn today(fields: impl Into<Vec<u8>>) -> Self {
        Self::new(fields, current_day_count())
    }

    /// The concatenated machine identifiers.
    pub fn fields(&self) -> &[u8] {
        &self.fields
    }

    pub fn day_count(&self) -> i64 {
        self.day_count
    }

    /// Fails when the day counter cannot appear in a signed license.
    pub fn check_day_count(&self) -> Result<(), FingerprintError> {
        if self.day_count < 0 {
            return Err(FingerprintError::DayCountOutOfRange(self.day_count));
        }
        Ok(())
    }

    /// Wire form: `<fields>,<day_count>`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.fields.len() + 21);
        out.extend_from_slice(&self.fields);
        out.push(FIELD_DELIMITER);
        out.extend_from_slice(self.day_count.to_string().as_bytes());
        out
    }

    /// Parse the wire form, splitting at the last delimiter.
    ///
    /// The day counter must be plain ASCII digits, so a parsed fingerprint
    /// never carries a negative day.
    pub fn parse(bytes: &[u8]) -> Result<Self, FingerprintError> {
        let split = bytes
            .iter()
            .rposition(|&b| b == FIELD_DELIMITER)
            .ok_or(FingerprintError::MissingDelimiter)?;
        let (fields, day) = (&bytes[..split], &bytes[split + 1..]);

        let invalid =
            || FingerprintError::InvalidDayCount(String::from_utf8_lossy(day).into_owned());
        if day.is_empty() || !day.iter().all(u8::is_ascii_digit) {
            return Err(invalid());
        }
        let day_count = std::str::from_utf8(day)
            .ok()
            .and_then(|d| d.parse::<i64>().ok())
            .ok_or_else(invalid)?;

        Ok(Self::new(fields, day_count))
    }

    /// Standard (RFC 4648, padded) base64 of the wire form.
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.to_bytes())
    }

    pub fn from_base64(text: &str) -> Result<Self, FingerprintError> {
        let bytes = BASE64.decode(text.trim())?;
        Self::parse(&bytes)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            String::from_utf8_lossy(&self.fields),
            FIELD_DELIMITER as char,
            self.day_count
        )
    }
}

/// Whole days since the UNIX epoch at `at`.
pub fn day_count_at(at: DateTime<Utc>) -> i64 {
    at.timestamp().div_euclid(SECONDS_PER_DAY)
}

pub fn current_day_count() -> i64 {
    day_count_at(Utc::now())
}

/// Anything that can produce the running machine's fingerprint.
pub trait FingerprintSource {
    fn fingerprint(&self) -> Result<Fingerprint, CollectorError>;
}

/// Fixed machine fields, stamped with the current day unless pinned.
#[derive(Debug, Clone)]
pub struct StaticFingerprintSource {
    fields: Vec<u8>,
    day_count: Option<i64>,
}

impl StaticFingerprintSource {
    pub fn new(fields: impl Into<Vec<u8>>) -> Self {
        Self {
            fields: fields.into(),
            day_count: None,
        }
    }

    /// Pin the day counter instead of reading the clock.
    pub fn on_day(mut self, day_count: i64) -> Self {
        self.day_count = Some(day_count);
        self
    }
}

impl FingerprintSource for StaticFingerprintSource {
    fn fingerprint(&self) -> Result<Fingerprint, CollectorError> {
        let day = self.day_count.unwrap_or_else(current_day_count);
        Ok(Fingerprint::new(self.fields.clone(), day))
    }
}

/// Collects MAC, IPv4, disk serial and CPU id from a Linux host.
///
/// Fields are concatenated without separators. The disk serial is optional
/// (many virtual disks have none); the other three are required.
#[derive(Debug, Clone)]
pub struct SystemFingerprintSource {
    net_dir: PathBuf,
    block_dir: PathBuf,
    cpuinfo: PathBuf,
}

impl Default for SystemFingerprintSource {
    fn default() -> Self {
        Self {
            net_dir: PathBuf::from("/sys/class/net"),
            block_dir: PathBuf::from("/sys/block"),
            cpuinfo: PathBuf::from("/proc/cpuinfo"),
        }
    }
}

impl SystemFingerprintSource {
    /// Read identifiers from alternate sysfs/procfs locations.
    pub fn with_roots(
        net_dir: impl Into<PathBuf>,
        block_dir: impl Into<PathBuf>,
        cpuinfo: impl Into<PathBuf>,
    ) -> Self {
        Self {
            net_dir: net_dir.into(),
            block_dir: block_dir.into(),
            cpuinfo: cpuinfo.into(),
        }
    }

    /// First non-loopback hardware address, lowercase hex without colons.
    pub fn mac_address(&self) -> Result<String, CollectorError> {
        let unavailable = |reason: String| CollectorError::Unavailable {
            field: "mac address",
            reason,
        };

        for iface in sorted_entries(&self.net_dir).map_err(unavailable)? {
            if iface == "lo" {
                continue;
            }
            let path = self.net_dir.join(&iface).join("address");
            let Ok(addr) = fs::read_to_string(&path) else {
                continue;
            };
            let mac: String = addr
                .trim()
                .chars()
                .filter(|c| *c != ':')
                .collect::<String>()
                .to_ascii_lowercase();
            if !mac.is_empty() && mac.chars().any(|c| c != '0') {
                debug!(%iface, "using interface for fingerprint");
                return Ok(mac);
            }
        }

        Err(unavailable("no network interface with a hardware address".to_string()))
    }

    /// Serial number of the first physical block device, empty when none
    /// reports one.
    pub fn disk_serial(&self) -> String {
        let devices = match sorted_entries(&self.block_dir) {
            Ok(devices) => devices,
            Err(reason) => {
                warn!(%reason, "cannot list block devices, disk serial omitted");
                return String::new();
            }
        };

        for dev in devices {
            if dev.starts_with("loop") || dev.starts_with("ram") || dev.starts_with("zram") {
                continue;
            }
            let path = self.block_dir.join(&dev).join("device").join("serial");
            if let Ok(serial) = fs::read_to_string(&path) {
                let serial: String = serial.chars().filter(|c| !c.is_whitespace()).collect();
                if !serial.is_empty() {
                    return serial;
                }
            }
        }

        warn!("no block device reports a serial, disk serial omitted");
        String::new()
    }

    /// CPU identifier from `/proc/cpuinfo`, spaces stripped.
    pub fn cpu_id(&self) -> Result<String, CollectorError> {
        let unavailable = |reason: String| CollectorError::Unavailable {
            field: "cpu id",
            reason,
        };

        let info = fs::read_to_string(&self.cpuinfo)
            .map_err(|e| unavailable(format!("{}: {e}", self.cpuinfo.display())))?;

        for key in ["Serial", "model name", "cpu model"] {
            let value = info.lines().find_map(|line| {
                let (name, value) = line.split_once(':')?;
                (name.trim() == key).then(|| value.replace(' ', "").trim().to_string())
            });
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                return Ok(value);
            }
        }

        Err(unavailable("no identifying line in cpuinfo".to_string()))
    }
}

impl FingerprintSource for SystemFingerprintSource {
    fn fingerprint(&self) -> Result<Fingerprint, CollectorError> {
        let mac = self.mac_address()?;
        let ip = local_ipv4()?;
        let disk = self.disk_serial();
        let cpu = self.cpu_id()?;

        Ok(Fingerprint::today(format!("{mac}{ip}{disk}{cpu}")))
    }
}

/// Address of the interface holding the default IPv4 route.
///
/// Connecting a UDP socket only selects a route; nothing is sent.
fn local_ipv4() -> Result<Ipv4Addr, CollectorError> {
    let unavailable = |reason: String| CollectorError::Unavailable {
        field: "ipv4 address",
        reason,
    };

    let socket =
        UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).map_err(|e| unavailable(e.to_string()))?;
    socket
        .connect((Ipv4Addr::new(192, 0, 2, 1), 9))
        .map_err(|e| unavailable(e.to_string()))?;

    match socket.local_addr().map_err(|e| unavailable(e.to_string()))?.ip() {
        std::net::IpAddr::V4(ip) if !ip.is_unspecified() => Ok(ip),
        other => Err(unavailable(format!("unusable local address {other}"))),
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<String>, String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map_err(|e| format!("{}: {e}", dir.display()))?
        .flatten()
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    Ok(names)
}
