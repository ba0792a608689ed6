//! String method handlers
//!
//! Indices count characters, not bytes.

use crate::vm::builtins::{arg, expect_args, expect_args_between, int_arg, str_arg};
use crate::vm::interpreter::EvalResult;
use crate::vm::value::Value;
use crate::vm::{VmError, MAX_SEQUENCE_LEN};

pub const METHODS: &[&str] = &[
    "length",
    "size",
    "isEmpty",
    "charAt",
    "indexOf",
    "lastIndexOf",
    "substring",
    "toUpperCase",
    "toLowerCase",
    "trim",
    "startsWith",
    "endsWith",
    "contains",
    "replace",
    "split",
    "repeat",
    "padStart",
    "padEnd",
    "chars",
    "toInt",
    "toFloat",
    "equals",
    "toString",
];

/// Call a string method
pub fn call(s: &str, name: &str, args: Vec<Value>) -> EvalResult<Value> {
    let value = match name {
        "length" | "size" => {
            expect_args(&args, 0)?;
            Value::Int(s.chars().count() as i64)
        }
        "isEmpty" => Value::Bool(s.is_empty()),
        "charAt" => {
            let index = int_arg(&args, 0, "charAt")?;
            match usize::try_from(index).ok().and_then(|i| s.chars().nth(i)) {
                Some(c) => Value::str(c.to_string()),
                None => Value::str(""),
            }
        }
        "indexOf" => {
            let needle = str_arg(&args, 0, "indexOf")?;
            Value::Int(s.find(needle).map_or(-1, |byte| char_index(s, byte)))
        }
        "lastIndexOf" => {
            let needle = str_arg(&args, 0, "lastIndexOf")?;
            Value::Int(s.rfind(needle).map_or(-1, |byte| char_index(s, byte)))
        }
        "substring" => {
            expect_args_between(&args, 1, 2)?;
            let len = s.chars().count() as i64;
            let start = int_arg(&args, 0, "substring")?.clamp(0, len);
            let end = match args.get(1) {
                Some(_) => int_arg(&args, 1, "substring")?.clamp(start, len),
                None => len,
            };
            Value::from(
                s.chars()
                    .skip(start as usize)
                    .take((end - start) as usize)
                    .collect::<String>(),
            )
        }
        "toUpperCase" => Value::from(s.to_uppercase()),
        "toLowerCase" => Value::from(s.to_lowercase()),
        "trim" => Value::str(s.trim()),
        "startsWith" => Value::Bool(s.starts_with(str_arg(&args, 0, "startsWith")?)),
        "endsWith" => Value::Bool(s.ends_with(str_arg(&args, 0, "endsWith")?)),
        "contains" => Value::Bool(s.contains(str_arg(&args, 0, "contains")?)),
        "replace" => {
            expect_args(&args, 2)?;
            let from = str_arg(&args, 0, "replace")?;
            let to = str_arg(&args, 1, "replace")?;
            Value::from(s.replace(from, to))
        }
        "split" => {
            let parts: Vec<Value> = match args.first() {
                None => s.split_whitespace().map(Value::str).collect(),
                Some(_) => {
                    let sep = str_arg(&args, 0, "split")?;
                    if sep.is_empty() {
                        s.chars().map(|c| Value::str(c.to_string())).collect()
                    } else {
                        s.split(sep).map(Value::str).collect()
                    }
                }
            };
            Value::array(parts)
        }
        "repeat" => {
            let times = int_arg(&args, 0, "repeat")?;
            if times < 0 {
                return Err(VmError::Runtime(format!("repeat count must be >= 0, got {}", times)).into());
            }
            match s.len().checked_mul(times as usize) {
                Some(len) if len <= MAX_SEQUENCE_LEN => Value::from(s.repeat(times as usize)),
                _ => {
                    return Err(
                        VmError::SizeLimit(format!("string repeated {} times", times)).into()
                    )
                }
            }
        }
        "padStart" | "padEnd" => {
            expect_args_between(&args, 1, 2)?;
            let width = int_arg(&args, 0, name)?.max(0) as usize;
            if width > MAX_SEQUENCE_LEN {
                return Err(VmError::SizeLimit(format!("{} width {}", name, width)).into());
            }
            let fill = match args.get(1) {
                Some(_) => str_arg(&args, 1, name)?.to_string(),
                None => " ".to_string(),
            };
            Value::from(pad(s, width, &fill, name == "padStart"))
        }
        "chars" => Value::array(s.chars().map(|c| Value::str(c.to_string())).collect()),
        "toInt" => match parse_int(s) {
            Some(i) => Value::Int(i),
            None => return Err(VmError::Type(format!("cannot convert '{}' to Int", s)).into()),
        },
        "toFloat" => match s.trim().parse::<f64>() {
            Ok(f) => Value::Float(f),
            Err(_) => return Err(VmError::Type(format!("cannot convert '{}' to Float", s)).into()),
        },
        "equals" => Value::Bool(Value::str(s).equals(&arg(&args, 0))),
        "toString" => Value::str(s),
        _ => return Err(VmError::attribute("String", name).into()),
    };
    Ok(value)
}

fn char_index(s: &str, byte: usize) -> i64 {
    s[..byte].chars().count() as i64
}

fn pad(s: &str, width: usize, fill: &str, at_start: bool) -> String {
    let len = s.chars().count();
    if len >= width || fill.is_empty() {
        return s.to_string();
    }
    let padding: String = fill.chars().cycle().take(width - len).collect();
    if at_start {
        padding + s
    } else {
        format!("{}{}", s, padding)
    }
}

/// Parse an integer, accepting a float spelling (`"3.0"`) by truncation.
pub(crate) fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call_str(s: &str, name: &str, args: Vec<Value>) -> Value {
        match call(s, name, args) {
            Ok(value) => value,
            Err(_) => panic!("{} failed", name),
        }
    }

    #[test]
    fn test_char_based_indexing() {
        assert_eq!(call_str("héllo", "indexOf", vec![Value::str("l")]).as_int(), Some(2));
        assert_eq!(call_str("héllo", "charAt", vec![Value::Int(1)]).as_str(), Some("é"));
        assert_eq!(call_str("héllo", "charAt", vec![Value::Int(9)]).as_str(), Some(""));
        assert_eq!(
            call_str("héllo", "substring", vec![Value::Int(1), Value::Int(3)]).as_str(),
            Some("él")
        );
    }

    #[test]
    fn test_split_and_pad() {
        assert_eq!(call_str("a,b,c", "split", vec![Value::str(",")]).to_string(), "[a, b, c]");
        assert_eq!(call_str("7", "padStart", vec![Value::Int(3), Value::str("0")]).as_str(), Some("007"));
        assert_eq!(call_str("ab", "padEnd", vec![Value::Int(4)]).as_str(), Some("ab  "));
    }

    #[test]
    fn test_oversized_repeat_and_pad_fail() {
        assert!(call("ab", "repeat", vec![Value::Int(i64::MAX)]).is_err());
        assert!(call("ab", "padStart", vec![Value::Int(i64::MAX)]).is_err());
        assert_eq!(call_str("", "repeat", vec![Value::Int(i64::MAX)]).as_str(), Some(""));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(call_str(" 42 ", "toInt", vec![]).as_int(), Some(42));
        assert_eq!(parse_int("3.9"), Some(3));
        assert!(call("x", "toInt", vec![]).is_err());
    }
}
