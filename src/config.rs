use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;

use crate::attendance::AttendancePolicy;
use crate::attendance::geo::{GeoPoint, OfficeGeoConfig};
use crate::attendance::lateness::ShiftConfig;

pub const DEFAULT_API_PREFIX: &str = "/api";

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,

    /// Authoritative geofence and shift; clients only ever see a copy.
    pub attendance_policy: AttendancePolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Fails on a missing required
    /// key or an unparseable value, so the server never starts half-configured.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} must be set"));

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parse_or(&lookup, "ACCESS_TOKEN_TTL", 900)?, // 15 min
            refresh_token_ttl: parse_or(&lookup, "REFRESH_TOKEN_TTL", 604_800)?, // 7 days

            rate_login_per_min: parse_or(&lookup, "RATE_LOGIN_PER_MIN", 60)?,
            rate_refresh_per_min: parse_or(&lookup, "RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: parse_or(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| DEFAULT_API_PREFIX.to_string()),
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),

            attendance_policy: policy_from_lookup(&lookup)?,
        })
    }
}

/// Reads the attendance policy keys on their own; the maintenance tools
/// need the policy without the server settings.
pub fn policy_from_lookup<F>(lookup: &F) -> Result<AttendancePolicy>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} must be set"));

    let latitude: f64 = parse_required(lookup, "OFFICE_LATITUDE")?;
    let longitude: f64 = parse_required(lookup, "OFFICE_LONGITUDE")?;
    let radius_meters: f64 = parse_required(lookup, "OFFICE_RADIUS_METERS")?;

    let center = GeoPoint::try_new(Some(latitude), Some(longitude))
        .context("OFFICE_LATITUDE/OFFICE_LONGITUDE")?;
    let office = OfficeGeoConfig::new(center, radius_meters).context("OFFICE_RADIUS_METERS")?;

    let shift = ShiftConfig::parse(&required("SHIFT_TIMEZONE")?, &required("SHIFT_START_TIME")?)
        .context("SHIFT_TIMEZONE/SHIFT_START_TIME")?;

    Ok(AttendancePolicy { office, shift })
}

pub fn policy_from_env() -> Result<AttendancePolicy> {
    dotenv().ok();
    policy_from_lookup(&|key: &str| env::var(key).ok())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has invalid value '{raw}'")),
        None => Ok(default),
    }
}

fn parse_required<F, T>(lookup: &F, key: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = lookup(key).ok_or_else(|| anyhow!("{key} must be set"))?;
    raw.trim()
        .parse()
        .with_context(|| format!("{key} has invalid value '{raw}'"))
}
