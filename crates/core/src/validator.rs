//! Named predicates run over an argument's value after it is converted.

use std::fmt::{Debug, Display, Formatter};

use itertools::Itertools;

use crate::error::{Error, Result};

type Check<T> = Box<dyn Fn(&T) -> std::result::Result<(), String>>;

pub struct Validator<T> {
    name: String,
    usage: String,
    check: Check<T>,
}

impl<T> Validator<T> {
    /// `check` returns the reason the value was rejected.
    pub fn new(
        name: impl Into<String>,
        usage: impl Into<String>,
        check: impl Fn(&T) -> std::result::Result<(), String> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            usage: usage.into(),
            check: Box::new(check),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short description shown in the usage text, e.g. `MinLength(3)`.
    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming `key` and this validator.
    pub fn validate(&self, key: &str, value: &T) -> Result<()> {
        (self.check)(value).map_err(|reason| Error::validation(key, &self.name, reason))
    }
}

impl<T> Debug for Validator<T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Validator")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

/// Values with a length: characters for strings, items for lists.
pub trait Length {
    fn length(&self) -> usize;
}

impl Length for String {
    fn length(&self) -> usize {
        self.chars().count()
    }
}

impl<T> Length for Vec<T> {
    fn length(&self) -> usize {
        self.len()
    }
}

pub fn non_empty<T: Length + 'static>() -> Validator<T> {
    Validator::new("NonEmpty", "NonEmpty()", |value: &T| {
        if value.length() == 0 {
            Err("value must not be empty".to_string())
        } else {
            Ok(())
        }
    })
}

pub fn min_length<T: Length + 'static>(min: usize) -> Validator<T> {
    Validator::new("MinLength", format!("MinLength({min})"), move |value: &T| {
        if value.length() < min {
            Err(format!("length must be at least {min}"))
        } else {
            Ok(())
        }
    })
}

pub fn max_length<T: Length + 'static>(max: usize) -> Validator<T> {
    Validator::new("MaxLength", format!("MaxLength({max})"), move |value: &T| {
        if value.length() > max {
            Err(format!("length must be at most {max}"))
        } else {
            Ok(())
        }
    })
}

pub fn contains(substring: &str) -> Validator<String> {
    let substring = substring.to_string();
    Validator::new("Contains", format!("Contains(\"{substring}\")"), move |value: &String| {
        if value.contains(&substring) {
            Ok(())
        } else {
            Err(format!("value must contain \"{substring}\""))
        }
    })
}

pub fn in_list<I, S>(choices: I) -> Validator<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let choices: Vec<String> = choices.into_iter().map(Into::into).collect();
    Validator::new("InList", format!("InList({})", choices.join(", ")), move |value: &String| {
        if choices.contains(value) {
            Ok(())
        } else {
            Err(format!("value must be one of [{}]", choices.iter().join(" ")))
        }
    })
}

fn compare<T>(
    name: &str,
    usage: String,
    reason: String,
    accept: impl Fn(&T) -> bool + 'static,
) -> Validator<T> {
    Validator::new(name, usage, move |value: &T| {
        if accept(value) {
            Ok(())
        } else {
            Err(reason.clone())
        }
    })
}

pub fn positive<T: PartialOrd + Default + 'static>() -> Validator<T> {
    compare(
        "Positive",
        "Positive()".to_string(),
        "value must be positive".to_string(),
        |value: &T| *value > T::default(),
    )
}

pub fn non_negative<T: PartialOrd + Default + 'static>() -> Validator<T> {
    compare(
        "NonNegative",
        "NonNegative()".to_string(),
        "value must be non-negative".to_string(),
        |value: &T| *value >= T::default(),
    )
}

pub fn greater_than<T: PartialOrd + Display + 'static>(bound: T) -> Validator<T> {
    compare(
        "GT",
        format!("GT({bound})"),
        format!("value must be greater than {bound}"),
        move |value: &T| *value > bound,
    )
}

pub fn at_least<T: PartialOrd + Display + 'static>(bound: T) -> Validator<T> {
    compare(
        "GTE",
        format!("GTE({bound})"),
        format!("value must be at least {bound}"),
        move |value: &T| *value >= bound,
    )
}

pub fn less_than<T: PartialOrd + Display + 'static>(bound: T) -> Validator<T> {
    compare(
        "LT",
        format!("LT({bound})"),
        format!("value must be less than {bound}"),
        move |value: &T| *value < bound,
    )
}

pub fn at_most<T: PartialOrd + Display + 'static>(bound: T) -> Validator<T> {
    compare(
        "LTE",
        format!("LTE({bound})"),
        format!("value must be at most {bound}"),
        move |value: &T| *value <= bound,
    )
}

/// Inclusive on both ends.
pub fn between<T: PartialOrd + Display + 'static>(low: T, high: T) -> Validator<T> {
    compare(
        "Between",
        format!("Between({low}, {high})"),
        format!("value must be between {low} and {high}"),
        move |value: &T| *value >= low && *value <= high,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_message_names_key_and_validator() {
        let err = min_length::<String>(3)
            .validate("NAME", &"ab".to_string())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation for \"NAME\" failed: [MinLength] length must be at least 3"
        );
    }

    #[test]
    fn test_length_validators() {
        assert!(non_empty::<String>().validate("k", &String::new()).is_err());
        assert!(non_empty::<Vec<i64>>().validate("k", &vec![1]).is_ok());
        assert!(max_length::<Vec<String>>(1)
            .validate("k", &vec!["a".to_string(), "b".to_string()])
            .is_err());
    }

    #[test]
    fn test_string_validators() {
        assert!(contains("@").validate("k", &"a@b".to_string()).is_ok());
        let err = in_list(["red", "blue"]).validate("COLOR", &"green".to_string()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation for \"COLOR\" failed: [InList] value must be one of [red blue]"
        );
    }

    #[test]
    fn test_numeric_validators() {
        assert!(positive::<i64>().validate("k", &0).is_err());
        assert!(non_negative::<i64>().validate("k", &0).is_ok());
        assert!(greater_than(1.5).validate("k", &1.5).is_err());
        assert!(at_least(1.5).validate("k", &1.5).is_ok());
        assert!(less_than(10_i64).validate("k", &10).is_err());
        assert!(at_most(10_i64).validate("k", &10).is_ok());
        assert!(between(1_i64, 3).validate("k", &3).is_ok());
        assert!(between(1_i64, 3).validate("k", &4).is_err());
    }

    #[test]
    fn test_usage_text() {
        assert_eq!(between(1_i64, 3).usage(), "Between(1, 3)");
        assert_eq!(in_list(["a", "b"]).usage(), "InList(a, b)");
        assert_eq!(positive::<f64>().name(), "Positive");
    }
}
