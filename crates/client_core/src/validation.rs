//! Client-side checks on the add-car form, run before anything goes on the wire.

use std::{collections::BTreeSet, fmt, str::FromStr};

use shared::domain::{ConnectorType, NewCar};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundViolation {
    BelowMinimum { min: i64 },
    AboveMaximum { max: i64 },
}

impl fmt::Display for BoundViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundViolation::BelowMinimum { min } => {
                write!(f, "Input should be greater than {}", min - 1)
            }
            BoundViolation::AboveMaximum { max } => {
                write!(f, "Input should be less than or equal to {max}")
            }
        }
    }
}

/// Inclusive integer bound check. The upper bound is only checked when present.
pub fn validate_integer(value: i64, min: i64, max: Option<i64>) -> Result<(), BoundViolation> {
    if value < min {
        return Err(BoundViolation::BelowMinimum { min });
    }
    match max {
        Some(max) if value > max => Err(BoundViolation::AboveMaximum { max }),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CarField {
    Name,
    BatteryChargeLimit,
    BatterySize,
    MaxKwAc,
    MaxKwDc,
}

impl CarField {
    pub const ALL: [CarField; 5] = [
        CarField::Name,
        CarField::BatteryChargeLimit,
        CarField::BatterySize,
        CarField::MaxKwAc,
        CarField::MaxKwDc,
    ];

    pub fn key(self) -> &'static str {
        match self {
            CarField::Name => "name",
            CarField::BatteryChargeLimit => "battery_charge_limit",
            CarField::BatterySize => "battery_size",
            CarField::MaxKwAc => "max_kw_ac",
            CarField::MaxKwDc => "max_kw_dc",
        }
    }
}

impl fmt::Display for CarField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown car form field '{0}'")]
pub struct UnknownCarField(pub String);

impl FromStr for CarField {
    type Err = UnknownCarField;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace('-', "_");
        CarField::ALL
            .into_iter()
            .find(|field| field.key() == normalized)
            .or(match normalized.as_str() {
                "limit" | "charge_limit" => Some(CarField::BatteryChargeLimit),
                "size" | "battery" => Some(CarField::BatterySize),
                "ac" | "kw_ac" => Some(CarField::MaxKwAc),
                "dc" | "kw_dc" => Some(CarField::MaxKwDc),
                _ => None,
            })
            .ok_or_else(|| UnknownCarField(raw.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    NotAnInteger,
    Bound(BoundViolation),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: CarField,
    pub kind: ValidationErrorKind,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn message(&self) -> String {
        match self.kind {
            ValidationErrorKind::NotAnInteger => "Input should be a valid integer".to_string(),
            ValidationErrorKind::Bound(violation) => violation.to_string(),
        }
    }
}

/// Order matters: the first failing rule is the one the user sees.
const NUMERIC_RULES: [(CarField, i64, Option<i64>); 4] = [
    (CarField::BatteryChargeLimit, 1, Some(100)),
    (CarField::BatterySize, 1, None),
    (CarField::MaxKwAc, 1, None),
    (CarField::MaxKwDc, 1, None),
];

/// Raw contents of the add-car form, as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarForm {
    pub name: String,
    pub connector_types: BTreeSet<ConnectorType>,
    pub battery_charge_limit: String,
    pub battery_size: String,
    pub max_kw_ac: String,
    pub max_kw_dc: String,
}

impl CarForm {
    pub fn field(&self, field: CarField) -> &str {
        match field {
            CarField::Name => &self.name,
            CarField::BatteryChargeLimit => &self.battery_charge_limit,
            CarField::BatterySize => &self.battery_size,
            CarField::MaxKwAc => &self.max_kw_ac,
            CarField::MaxKwDc => &self.max_kw_dc,
        }
    }

    pub fn set_field(&mut self, field: CarField, value: impl Into<String>) {
        let value = value.into();
        match field {
            CarField::Name => self.name = value,
            CarField::BatteryChargeLimit => self.battery_charge_limit = value,
            CarField::BatterySize => self.battery_size = value,
            CarField::MaxKwAc => self.max_kw_ac = value,
            CarField::MaxKwDc => self.max_kw_dc = value,
        }
    }

    /// Checkbox semantics: flips membership, returns whether it is now selected.
    pub fn toggle_connector(&mut self, connector: ConnectorType) -> bool {
        if self.connector_types.remove(&connector) {
            false
        } else {
            self.connector_types.insert(connector);
            true
        }
    }

    /// Runs every numeric rule in order and assembles the create payload.
    pub fn validate(&self) -> Result<NewCar, ValidationError> {
        let mut values = [0i64; NUMERIC_RULES.len()];
        for (slot, (field, min, max)) in values.iter_mut().zip(NUMERIC_RULES) {
            let value = parse_leading_integer(self.field(field)).ok_or(ValidationError {
                field,
                kind: ValidationErrorKind::NotAnInteger,
            })?;
            validate_integer(value, min, max).map_err(|violation| ValidationError {
                field,
                kind: ValidationErrorKind::Bound(violation),
            })?;
            *slot = value;
        }
        let [battery_charge_limit, battery_size, max_kw_ac, max_kw_dc] = values;

        Ok(NewCar {
            name: self.name.clone(),
            connector_types: self.connector_types.clone(),
            battery_charge_limit,
            battery_size,
            max_kw_ac,
            max_kw_dc,
        })
    }
}

/// Reads an optional sign and the leading run of digits, ignoring any trailing
/// text (`"80kW"` is 80). `None` when there are no digits at all. Digit runs
/// past the `i64` range saturate so the bound rules still judge them.
pub fn parse_leading_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let magnitude = rest[..digits_len]
        .bytes()
        .try_fold(0i64, |acc, digit| {
            acc.checked_mul(10)?.checked_add(i64::from(digit - b'0'))
        })
        .unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}
