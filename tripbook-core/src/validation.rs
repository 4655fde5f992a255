use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

use crate::trip::NewTrip;
use crate::user::NewUser;

pub const EMAIL_MIN_LEN: usize = 6;
pub const EMAIL_MAX_LEN: usize = 250;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 128;
pub const TEXT_MAX_LEN: usize = 128;

/// A single field constraint that an entity can violate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rule {
    EmailTooShort,
    EmailTooLong,
    EmailMalformed,
    PasswordTooShort,
    PasswordTooLong,
    FirstnameBlank,
    FirstnameTooLong,
    MiddleNameTooLong,
    SurnameBlank,
    SurnameTooLong,
    AddressTooLong,
    PostalCodeTooLong,
    UserInvalidChars,
    TripOriginBlank,
    TripOriginTooLong,
    TripDestinationBlank,
    TripDestinationTooLong,
    TripLocationBlank,
    TripLocationTooLong,
    TripInvalidChars,
    TripCostNotPositive,
    TripDatesInverted,
}

impl Rule {
    /// Stable identifier, safe to hand to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Rule::EmailTooShort => "email.too_short",
            Rule::EmailTooLong => "email.too_long",
            Rule::EmailMalformed => "email.malformed",
            Rule::PasswordTooShort => "password.too_short",
            Rule::PasswordTooLong => "password.too_long",
            Rule::FirstnameBlank => "firstname.blank",
            Rule::FirstnameTooLong => "firstname.too_long",
            Rule::MiddleNameTooLong => "middle_name.too_long",
            Rule::SurnameBlank => "surname.blank",
            Rule::SurnameTooLong => "surname.too_long",
            Rule::AddressTooLong => "address.too_long",
            Rule::PostalCodeTooLong => "postal_code.too_long",
            Rule::UserInvalidChars => "user.invalid_chars",
            Rule::TripOriginBlank => "trip.origin.blank",
            Rule::TripOriginTooLong => "trip.origin.too_long",
            Rule::TripDestinationBlank => "trip.destination.blank",
            Rule::TripDestinationTooLong => "trip.destination.too_long",
            Rule::TripLocationBlank => "trip.location.blank",
            Rule::TripLocationTooLong => "trip.location.too_long",
            Rule::TripInvalidChars => "trip.invalid_chars",
            Rule::TripCostNotPositive => "trip.cost.not_positive",
            Rule::TripDatesInverted => "trip.dates.inverted",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for Rule {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.code())
    }
}

/// The set of rules an entity breaks. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Violations(BTreeSet<Rule>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, rule: Rule) -> bool {
        self.0.contains(&rule)
    }

    pub fn iter(&self) -> impl Iterator<Item = Rule> + '_ {
        self.0.iter().copied()
    }

    fn check(&mut self, broken: bool, rule: Rule) {
        if broken {
            self.0.insert(rule);
        }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<&str> = self.0.iter().map(Rule::code).collect();
        f.write_str(&codes.join(", "))
    }
}

impl Extend<Rule> for Violations {
    fn extend<I: IntoIterator<Item = Rule>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

// Postgres rejects NUL in text columns.
fn has_control(value: &str) -> bool {
    value.chars().any(char::is_control)
}

/// Minimal shape check: `local@domain.tld`, no whitespace or control
/// characters, exactly one `@`.
pub fn is_email_shaped(email: &str) -> bool {
    if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    match domain.find('.') {
        Some(dot) => dot > 0 && dot < domain.len() - 1 && !domain.ends_with('.'),
        None => false,
    }
}

pub fn validate_email(email: &str) -> Violations {
    let mut violations = Violations::new();
    let len = char_len(email);
    violations.check(len < EMAIL_MIN_LEN, Rule::EmailTooShort);
    violations.check(len > EMAIL_MAX_LEN, Rule::EmailTooLong);
    violations.check(!is_email_shaped(email), Rule::EmailMalformed);
    violations
}

pub fn validate_password(password: &str) -> Violations {
    let mut violations = Violations::new();
    let len = char_len(password);
    violations.check(len < PASSWORD_MIN_LEN, Rule::PasswordTooShort);
    violations.check(len > PASSWORD_MAX_LEN, Rule::PasswordTooLong);
    violations
}

pub fn validate_user(user: &NewUser) -> Violations {
    let mut violations = validate_email(&user.email);
    violations.extend(validate_password(&user.password).iter());

    violations.check(is_blank(&user.firstname), Rule::FirstnameBlank);
    violations.check(char_len(&user.firstname) > TEXT_MAX_LEN, Rule::FirstnameTooLong);
    violations.check(char_len(&user.middle_name) > TEXT_MAX_LEN, Rule::MiddleNameTooLong);
    violations.check(is_blank(&user.surname), Rule::SurnameBlank);
    violations.check(char_len(&user.surname) > TEXT_MAX_LEN, Rule::SurnameTooLong);
    violations.check(char_len(&user.address) > TEXT_MAX_LEN, Rule::AddressTooLong);
    violations.check(char_len(&user.postal_code) > TEXT_MAX_LEN, Rule::PostalCodeTooLong);

    let texts = [&user.firstname, &user.middle_name, &user.surname, &user.address, &user.postal_code];
    violations.check(texts.iter().any(|t| has_control(t)), Rule::UserInvalidChars);
    violations
}

pub fn validate_trip(trip: &NewTrip) -> Violations {
    let mut violations = Violations::new();
    violations.check(is_blank(&trip.origin), Rule::TripOriginBlank);
    violations.check(is_blank(&trip.destination), Rule::TripDestinationBlank);
    violations.check(is_blank(&trip.location), Rule::TripLocationBlank);
    violations.check(char_len(&trip.origin) > TEXT_MAX_LEN, Rule::TripOriginTooLong);
    violations.check(char_len(&trip.destination) > TEXT_MAX_LEN, Rule::TripDestinationTooLong);
    violations.check(char_len(&trip.location) > TEXT_MAX_LEN, Rule::TripLocationTooLong);
    violations.check(
        [&trip.origin, &trip.destination, &trip.location].iter().any(|t| has_control(t)),
        Rule::TripInvalidChars,
    );
    violations.check(trip.cost <= 0, Rule::TripCostNotPositive);
    violations.check(trip.return_date <= trip.departure_date, Rule::TripDatesInverted);
    violations
}
