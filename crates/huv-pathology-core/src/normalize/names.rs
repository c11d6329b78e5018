//! Patient name splitting and ID cleanup.

use crate::config::NameSplitPolicy;
use crate::models::PatientName;

/// Split a full name into first/middle name and two surnames.
///
/// | tokens | result |
/// |---|---|
/// | 1 | first |
/// | 2 | first, first surname |
/// | 3 | depends on `policy` |
/// | 4+ | first, middle, first surname, rest joined as second surname |
pub fn split_full_name(full_name: &str, policy: NameSplitPolicy) -> PatientName {
    let tokens: Vec<&str> = full_name.split_whitespace().collect();
    let mut name = PatientName::default();

    match tokens.as_slice() {
        [] => {}
        [first] => {
            name.first_name = first.to_string();
        }
        [first, surname] => {
            name.first_name = first.to_string();
            name.first_surname = surname.to_string();
        }
        [first, second, third] => {
            name.first_name = first.to_string();
            match policy {
                NameSplitPolicy::MiddleName => {
                    name.middle_name = second.to_string();
                    name.first_surname = third.to_string();
                }
                NameSplitPolicy::TwoSurnames => {
                    name.first_surname = second.to_string();
                    name.second_surname = third.to_string();
                }
            }
        }
        [first, middle, surname, rest @ ..] => {
            name.first_name = first.to_string();
            name.middle_name = middle.to_string();
            name.first_surname = surname.to_string();
            name.second_surname = rest.join(" ");
        }
    }

    name
}

/// Keep only the ASCII digits of an identification number.
pub fn clean_identification(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}
