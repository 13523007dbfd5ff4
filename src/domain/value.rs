//! Runtime values held by tree nodes and produced by builtins.
//!
//! A [`Value`] is either raw data (text, numbers, dates, ...) or a shared
//! [`Component`] instance. Raw declarative text is converted into the
//! primitive kinds here; anything richer goes through a literal parser.

use std::fmt;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::domain::component::Component;
use crate::domain::error::{DomainError, DomainResult};

/// Primitive kinds addressable through the type alias table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Text,
    Int,
    Long,
    Short,
    Byte,
    SByte,
    UInt,
    ULong,
    UShort,
    Bool,
    Decimal,
    Float,
    Double,
    Char,
    DateTime,
    TimeSpan,
    Guid,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Text => "string",
            ValueKind::Int => "int",
            ValueKind::Long => "long",
            ValueKind::Short => "short",
            ValueKind::Byte => "byte",
            ValueKind::SByte => "sbyte",
            ValueKind::UInt => "uint",
            ValueKind::ULong => "ulong",
            ValueKind::UShort => "ushort",
            ValueKind::Bool => "bool",
            ValueKind::Decimal => "decimal",
            ValueKind::Float => "float",
            ValueKind::Double => "double",
            ValueKind::Char => "char",
            ValueKind::DateTime => "datetime",
            ValueKind::TimeSpan => "timespan",
            ValueKind::Guid => "guid",
        }
    }

    /// Signed integer range, if this is a signed integral kind.
    fn signed_range(self) -> Option<(i64, i64)> {
        match self {
            ValueKind::Int => Some((i32::MIN as i64, i32::MAX as i64)),
            ValueKind::Long => Some((i64::MIN, i64::MAX)),
            ValueKind::Short => Some((i16::MIN as i64, i16::MAX as i64)),
            ValueKind::SByte => Some((i8::MIN as i64, i8::MAX as i64)),
            _ => None,
        }
    }

    /// Unsigned integer upper bound, if this is an unsigned integral kind.
    fn unsigned_max(self) -> Option<u64> {
        match self {
            ValueKind::UInt => Some(u32::MAX as u64),
            ValueKind::ULong => Some(u64::MAX),
            ValueKind::UShort => Some(u16::MAX as u64),
            ValueKind::Byte => Some(u8::MAX as u64),
            _ => None,
        }
    }
}

/// Shape modifier of a primitive kind: `T`, `T?` or `T[]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar,
    Nullable,
    Array,
}

/// A materialized value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Char(char),
    Text(String),
    DateTime(NaiveDateTime),
    TimeSpan(Duration),
    Guid(Uuid),
    List(Vec<Value>),
    Object(Arc<dyn Component>),
}

impl Value {
    /// Wrap a component instance into a shared value.
    pub fn object(component: impl Component) -> Self {
        Value::Object(Arc::new(component))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<dyn Component>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Downcast an object value to a concrete component type.
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_object()?.as_any().downcast_ref::<T>()
    }

    /// Name of the value's runtime type.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => ValueKind::Bool.name().to_string(),
            Value::Int(_) => ValueKind::Long.name().to_string(),
            Value::UInt(_) => ValueKind::ULong.name().to_string(),
            Value::Float(_) => ValueKind::Double.name().to_string(),
            Value::Char(_) => ValueKind::Char.name().to_string(),
            Value::Text(_) => ValueKind::Text.name().to_string(),
            Value::DateTime(_) => ValueKind::DateTime.name().to_string(),
            Value::TimeSpan(_) => ValueKind::TimeSpan.name().to_string(),
            Value::Guid(_) => ValueKind::Guid.name().to_string(),
            Value::List(_) => "list".to_string(),
            Value::Object(o) => o.type_name().to_string(),
        }
    }

    /// Convert into the given primitive kind and shape.
    ///
    /// Text is parsed; other primitives go through their display form.
    /// Null passes through unchanged for every shape.
    pub fn convert(self, kind: ValueKind, shape: Shape) -> DomainResult<Value> {
        match (self, shape) {
            (Value::Null, _) => Ok(Value::Null),
            (Value::List(items), Shape::Array) => items
                .into_iter()
                .map(|item| item.convert(kind, Shape::Scalar))
                .collect::<DomainResult<Vec<_>>>()
                .map(Value::List),
            (Value::Text(text), Shape::Array) => {
                if text.trim().is_empty() {
                    return Ok(Value::List(Vec::new()));
                }
                text.split(',')
                    .map(|item| convert_text(item.trim(), kind))
                    .collect::<DomainResult<Vec<_>>>()
                    .map(Value::List)
            }
            (other, Shape::Array) => Ok(Value::List(vec![other.convert(kind, Shape::Scalar)?])),
            (Value::Text(text), Shape::Nullable) if text.trim().is_empty() => Ok(Value::Null),
            (value, _) => convert_scalar(value, kind),
        }
    }
}

fn convert_scalar(value: Value, kind: ValueKind) -> DomainResult<Value> {
    match (value, kind) {
        (Value::Object(o), _) => Err(DomainError::conversion(o.type_name(), kind.name())),
        (Value::List(_), _) => Err(DomainError::conversion("list", kind.name())),
        (Value::Text(text), _) => convert_text(&text, kind),
        (Value::Int(i), k) if k.signed_range().is_some() => check_signed(i, k),
        (Value::UInt(u), k) if k.unsigned_max().is_some() => check_unsigned(u, k),
        (Value::Float(f), ValueKind::Float | ValueKind::Double | ValueKind::Decimal) => {
            Ok(Value::Float(f))
        }
        (Value::Int(i), ValueKind::Float | ValueKind::Double | ValueKind::Decimal) => {
            Ok(Value::Float(i as f64))
        }
        (v @ Value::Bool(_), ValueKind::Bool)
        | (v @ Value::Char(_), ValueKind::Char)
        | (v @ Value::DateTime(_), ValueKind::DateTime)
        | (v @ Value::TimeSpan(_), ValueKind::TimeSpan)
        | (v @ Value::Guid(_), ValueKind::Guid) => Ok(v),
        (other, _) => convert_text(&other.to_string(), kind),
    }
}

fn check_signed(value: i64, kind: ValueKind) -> DomainResult<Value> {
    match kind.signed_range() {
        Some((min, max)) if value >= min && value <= max => Ok(Value::Int(value)),
        _ => Err(DomainError::conversion(value.to_string(), kind.name())),
    }
}

fn check_unsigned(value: u64, kind: ValueKind) -> DomainResult<Value> {
    match kind.unsigned_max() {
        Some(max) if value <= max => Ok(Value::UInt(value)),
        _ => Err(DomainError::conversion(value.to_string(), kind.name())),
    }
}

fn convert_text(text: &str, kind: ValueKind) -> DomainResult<Value> {
    let fail = || DomainError::conversion(text, kind.name());
    let trimmed = text.trim();

    match kind {
        ValueKind::Text => Ok(Value::Text(text.to_string())),
        k if k.signed_range().is_some() => {
            let parsed = trimmed.parse::<i64>().map_err(|_| fail())?;
            check_signed(parsed, k)
        }
        k if k.unsigned_max().is_some() => {
            let parsed = trimmed.parse::<u64>().map_err(|_| fail())?;
            check_unsigned(parsed, k)
        }
        ValueKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
            _ => Err(fail()),
        },
        ValueKind::Float | ValueKind::Double | ValueKind::Decimal => {
            trimmed.parse::<f64>().map(Value::Float).map_err(|_| fail())
        }
        ValueKind::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(fail()),
            }
        }
        ValueKind::DateTime => parse_datetime(trimmed).map(Value::DateTime).ok_or_else(fail),
        ValueKind::TimeSpan => parse_timespan(trimmed).map(Value::TimeSpan).ok_or_else(fail),
        ValueKind::Guid => Uuid::parse_str(trimmed).map(Value::Guid).map_err(|_| fail()),
        _ => Err(fail()),
    }
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse `[-][d.]hh:mm[:ss[.fff]]`, or a bare integer number of days.
fn parse_timespan(text: &str) -> Option<Duration> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    if let Ok(days) = body.parse::<i64>() {
        let span = Duration::try_days(days)?;
        return Some(if negative { -span } else { span });
    }

    let (days, clock) = match body.split_once('.') {
        Some((d, rest)) if rest.contains(':') && !d.contains(':') => (d.parse::<i64>().ok()?, rest),
        _ => (0, body),
    };

    let mut parts = clock.split(':');
    let hours = parts.next()?.parse::<i64>().ok()?;
    let minutes = parts.next()?.parse::<i64>().ok()?;
    let seconds = match parts.next() {
        Some(s) => s.parse::<f64>().ok()?,
        None => 0.0,
    };
    if parts.next().is_some() || !(0..60).contains(&minutes) || !(0.0..60.0).contains(&seconds) {
        return None;
    }

    // Out-of-range components are a conversion failure, not a panic.
    let millis = (seconds * 1000.0).round() as i64;
    let span = Duration::try_days(days)?
        .checked_add(&Duration::try_hours(hours)?)?
        .checked_add(&Duration::try_minutes(minutes)?)?
        .checked_add(&Duration::try_milliseconds(millis)?)?;
    Some(if negative { -span } else { span })
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::UInt(u) => write!(f, "{u}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            Value::TimeSpan(d) => {
                let sign = if *d < Duration::zero() { "-" } else { "" };
                let total = d.num_seconds().abs();
                let (days, rem) = (total / 86_400, total % 86_400);
                if days > 0 {
                    write!(f, "{sign}{days}.")?;
                } else {
                    write!(f, "{sign}")?;
                }
                write!(f, "{:02}:{:02}:{:02}", rem / 3600, (rem % 3600) / 60, rem % 60)
            }
            Value::Guid(g) => write!(f, "{g}"),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", parts.join(","))
            }
            Value::Object(o) => write!(f, "{}", o.type_name()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::TimeSpan(a), Value::TimeSpan(b)) => a == b,
            (Value::Guid(a), Value::Guid(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Arc<dyn Component>> for Value {
    fn from(value: Arc<dyn Component>) -> Self {
        Value::Object(value)
    }
}
