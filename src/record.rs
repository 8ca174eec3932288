//! Validated output records and the name splitter

/// Name decomposed into first / middle / last parts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameParts {
    pub first: String,
    pub middle: String,
    pub last: String,
}

/// Split a full name on whitespace.
///
/// The first token is the first name, the last token the last name (only when
/// there are at least two tokens) and anything in between is the middle name.
pub fn split_name(full_name: &str) -> NameParts {
    let tokens: Vec<&str> = full_name.split_whitespace().collect();

    match tokens.as_slice() {
        [] => NameParts::default(),
        [only] => NameParts {
            first: (*only).to_string(),
            ..Default::default()
        },
        [first, interior @ .., last] => NameParts {
            first: (*first).to_string(),
            middle: interior.join(" "),
            last: (*last).to_string(),
        },
    }
}

/// A record that passed validation and de-duplication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Full trimmed name as extracted
    pub name: String,
    /// `YYYY-MM-DD`, exactly as matched in the input
    pub dob: String,
    /// `DDD-DD-DDDD`, exactly as matched in the input
    pub ssn: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    /// Year component of `dob`
    pub year: i32,
}

impl Record {
    pub fn new(name: String, dob: String, ssn: String, year: i32) -> Self {
        let NameParts {
            first,
            middle,
            last,
        } = split_name(&name);

        Self {
            name,
            dob,
            ssn,
            first_name: first,
            middle_name: middle,
            last_name: last,
            year,
        }
    }

    /// `first + " " + last`, the default grouping key
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
