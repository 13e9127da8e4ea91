//! Fixed vehicle and zone catalogs.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RideOption {
    pub cab_type: &'static str,
    pub name: &'static str,
    pub weight: u32,
}

pub const RIDE_OPTIONS: &[RideOption] = &[
    RideOption { cab_type: "Uber", name: "UberX", weight: 8 },
    RideOption { cab_type: "Uber", name: "UberPool", weight: 8 },
    RideOption { cab_type: "Uber", name: "WAV", weight: 8 },
    RideOption { cab_type: "Lyft", name: "Lyft", weight: 8 },
    RideOption { cab_type: "Lyft", name: "Shared", weight: 8 },
    RideOption { cab_type: "Lyft", name: "Lyft XL", weight: 8 },
    RideOption { cab_type: "Uber", name: "UberXL", weight: 9 },
    RideOption { cab_type: "Lyft", name: "Lux", weight: 8 },
    RideOption { cab_type: "Uber", name: "Black", weight: 9 },
    RideOption { cab_type: "Uber", name: "Black SUV", weight: 9 },
    RideOption { cab_type: "Lyft", name: "Lux Black", weight: 9 },
    RideOption { cab_type: "Lyft", name: "Lux Black XL", weight: 8 },
];

/// Static traffic partition of the zone set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CongestionClass {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Zone {
    pub name: &'static str,
    pub class: CongestionClass,
    pub weight: u32,
}

pub const ZONES: &[Zone] = &[
    Zone { name: "Financial District", class: CongestionClass::High, weight: 12 },
    Zone { name: "Back Bay", class: CongestionClass::High, weight: 10 },
    Zone { name: "Fenway", class: CongestionClass::High, weight: 9 },
    Zone { name: "Theatre District", class: CongestionClass::High, weight: 8 },
    Zone { name: "Boston University", class: CongestionClass::Medium, weight: 5 },
    Zone { name: "South Station", class: CongestionClass::Medium, weight: 6 },
    Zone { name: "North Station", class: CongestionClass::Medium, weight: 5 },
    Zone { name: "Beacon Hill", class: CongestionClass::Medium, weight: 3 },
    Zone { name: "Haymarket Square", class: CongestionClass::Low, weight: 2 },
    Zone { name: "North End", class: CongestionClass::Low, weight: 2 },
    Zone { name: "Northeastern University", class: CongestionClass::Low, weight: 1 },
    Zone { name: "West End", class: CongestionClass::Low, weight: 1 },
];

pub fn congestion_class(zone: &str) -> Option<CongestionClass> {
    ZONES.iter().find(|z| z.name == zone).map(|z| z.class)
}
