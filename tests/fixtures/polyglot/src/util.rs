use std::fmt;

pub fn show(value: impl fmt::Display) -> String {
    // use regex::Regex;
    value.to_string()
}
