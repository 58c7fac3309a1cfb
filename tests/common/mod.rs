//! Minimal FIT encoder for building test fixtures in memory.

#![allow(dead_code)]

use chrono::{DateTime, Utc};

pub const FILE_ID: u16 = 0;
pub const SESSION: u16 = 18;
pub const RECORD: u16 = 20;
pub const DEVICE_INFO: u16 = 23;

pub const GARMIN: u16 = 1;
pub const WAHOO_FITNESS: u16 = 32;
pub const ZWIFT: u16 = 260;

pub const FILE_ACTIVITY: u8 = 4;
pub const FILE_COURSE: u8 = 6;

pub const SPORT_RUNNING: u8 = 1;
pub const SPORT_CYCLING: u8 = 2;
pub const SUB_SPORT_GENERIC: u8 = 0;
pub const SUB_SPORT_TREADMILL: u8 = 1;
pub const SUB_SPORT_INDOOR_CYCLING: u8 = 6;
pub const SUB_SPORT_VIRTUAL_ACTIVITY: u8 = 58;

// seconds between the unix epoch and 1989-12-31T00:00:00Z
const FIT_EPOCH_OFFSET: i64 = 631_065_600;

const CRC_TABLE: [u16; 16] = [
    0x0000, 0xCC01, 0xD801, 0x1400, 0xF001, 0x3C00, 0x2800, 0xE401, 0xA001, 0x6C00, 0x7800,
    0xB401, 0x5000, 0x9C01, 0x8801, 0x4400,
];

#[derive(Debug, Clone)]
pub enum FitValue {
    Enum(u8),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    SInt32(i32),
    String(String),
}

impl FitValue {
    fn base_type(&self) -> u8 {
        match self {
            FitValue::Enum(_) => 0x00,
            FitValue::UInt8(_) => 0x02,
            FitValue::UInt16(_) => 0x84,
            FitValue::UInt32(_) => 0x86,
            FitValue::SInt32(_) => 0x85,
            FitValue::String(_) => 0x07,
        }
    }

    fn size(&self) -> u8 {
        match self {
            FitValue::Enum(_) | FitValue::UInt8(_) => 1,
            FitValue::UInt16(_) => 2,
            FitValue::UInt32(_) | FitValue::SInt32(_) => 4,
            FitValue::String(s) => (s.len() + 1) as u8,
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        match self {
            FitValue::Enum(v) | FitValue::UInt8(v) => out.push(*v),
            FitValue::UInt16(v) => out.extend_from_slice(&v.to_le_bytes()),
            FitValue::UInt32(v) => out.extend_from_slice(&v.to_le_bytes()),
            FitValue::SInt32(v) => out.extend_from_slice(&v.to_le_bytes()),
            FitValue::String(s) => {
                out.extend_from_slice(s.as_bytes());
                out.push(0);
            }
        }
    }
}

/// Writes every message with its own definition on local message type 0.
#[derive(Default)]
pub struct FitWriter {
    data: Vec<u8>,
}

impl FitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(mut self, global: u16, fields: &[(u8, FitValue)]) -> Self {
        self.data.push(0x40);
        self.data.push(0);
        self.data.push(0); // little endian
        self.data.extend_from_slice(&global.to_le_bytes());
        self.data.push(fields.len() as u8);
        for (number, value) in fields {
            self.data.push(*number);
            self.data.push(value.size());
            self.data.push(value.base_type());
        }

        self.data.push(0x00);
        for (_, value) in fields {
            value.write(&mut self.data);
        }
        self
    }

    pub fn file_id(self, file_type: u8, manufacturer: u16) -> Self {
        self.message(
            FILE_ID,
            &[
                (0, FitValue::Enum(file_type)),
                (1, FitValue::UInt16(manufacturer)),
            ],
        )
    }

    pub fn session(self, sport: u8, sub_sport: u8) -> Self {
        self.message(
            SESSION,
            &[(5, FitValue::Enum(sport)), (6, FitValue::Enum(sub_sport))],
        )
    }

    /// A file_id carrying only the file type.
    pub fn file_id_without_manufacturer(self, file_type: u8) -> Self {
        self.message(FILE_ID, &[(0, FitValue::Enum(file_type))])
    }

    /// With a manufacturer, fitparser resolves `product` into subfields like `garmin_product`.
    pub fn device_info(
        self,
        device_index: u8,
        manufacturer: Option<u16>,
        product: u16,
        product_name: &str,
    ) -> Self {
        let mut fields = vec![(0, FitValue::UInt8(device_index))];
        if let Some(manufacturer) = manufacturer {
            fields.push((2, FitValue::UInt16(manufacturer)));
        }
        fields.push((4, FitValue::UInt16(product)));
        if !product_name.is_empty() {
            fields.push((27, FitValue::String(product_name.to_string())));
        }
        self.message(DEVICE_INFO, &fields)
    }

    /// A record with position, altitude (m), speed (m/s) and GPS accuracy (m).
    pub fn record(self, at: DateTime<Utc>, lat: f64, lon: f64) -> Self {
        self.message(
            RECORD,
            &[
                (253, FitValue::UInt32(fit_time(at))),
                (0, FitValue::SInt32(semicircles(lat))),
                (1, FitValue::SInt32(semicircles(lon))),
                (2, FitValue::UInt16(((10.0 + 500.0) * 5.0) as u16)),
                (6, FitValue::UInt16(3_250)),
                (31, FitValue::UInt8(4)),
            ],
        )
    }

    /// A record without position fields, as logged indoors.
    pub fn record_without_position(self, at: DateTime<Utc>) -> Self {
        self.message(
            RECORD,
            &[
                (253, FitValue::UInt32(fit_time(at))),
                (6, FitValue::UInt16(3_250)),
            ],
        )
    }

    /// A positioned record whose timestamp field is missing.
    pub fn record_without_timestamp(self, lat: f64, lon: f64) -> Self {
        self.message(
            RECORD,
            &[
                (0, FitValue::SInt32(semicircles(lat))),
                (1, FitValue::SInt32(semicircles(lon))),
            ],
        )
    }

    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() + 16);
        out.push(14);
        out.push(0x20);
        out.extend_from_slice(&2132u16.to_le_bytes());
        out.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
        out.extend_from_slice(b".FIT");
        let header_crc = crc(&out);
        out.extend_from_slice(&header_crc.to_le_bytes());

        out.extend_from_slice(&self.data);
        let file_crc = crc(&out);
        out.extend_from_slice(&file_crc.to_le_bytes());
        out
    }
}

pub fn fit_time(at: DateTime<Utc>) -> u32 {
    (at.timestamp() - FIT_EPOCH_OFFSET) as u32
}

pub fn semicircles(degrees: f64) -> i32 {
    (degrees * (2_147_483_648.0 / 180.0)).round() as i32
}

fn crc(bytes: &[u8]) -> u16 {
    bytes.iter().fold(0u16, |mut crc, &byte| {
        let mut tmp = CRC_TABLE[(crc & 0xF) as usize];
        crc = (crc >> 4) & 0x0FFF;
        crc = crc ^ tmp ^ CRC_TABLE[(byte & 0xF) as usize];

        tmp = CRC_TABLE[(crc & 0xF) as usize];
        crc = (crc >> 4) & 0x0FFF;
        crc ^ tmp ^ CRC_TABLE[((byte >> 4) & 0xF) as usize]
    })
}
