//! Checkout form and field validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A contact or shipping field on the checkout form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FormField {
    FirstName,
    LastName,
    Phone,
    Email,
    Address,
    City,
    State,
    Pincode,
}

impl FormField {
    /// Returns the field name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::FirstName => "firstName",
            FormField::LastName => "lastName",
            FormField::Phone => "phone",
            FormField::Email => "email",
            FormField::Address => "address",
            FormField::City => "city",
            FormField::State => "state",
            FormField::Pincode => "pincode",
        }
    }
}

impl std::fmt::Display for FormField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Contact and shipping details collected before payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutForm {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

impl CheckoutForm {
    /// Full customer name as sent to the order service.
    pub fn customer_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }

    /// Validates every field, returning per-field messages.
    ///
    /// Rules: all fields required; phone exactly 10 digits once
    /// whitespace is stripped; pincode exactly 6 digits; email of the
    /// usual `name@host.tld` shape. An empty map means the form is
    /// submittable.
    pub fn validate(&self) -> BTreeMap<FormField, String> {
        let mut errors = BTreeMap::new();

        if self.first_name.trim().is_empty() {
            errors.insert(FormField::FirstName, "First name is required".to_string());
        }

        if self.last_name.trim().is_empty() {
            errors.insert(FormField::LastName, "Last name is required".to_string());
        }

        if self.phone.trim().is_empty() {
            errors.insert(FormField::Phone, "Phone number is required".to_string());
        } else if !is_valid_phone(&self.phone) {
            errors.insert(
                FormField::Phone,
                "Please enter a valid 10-digit phone number".to_string(),
            );
        }

        if self.email.trim().is_empty() {
            errors.insert(FormField::Email, "Email is required".to_string());
        } else if !is_valid_email(&self.email) {
            errors.insert(
                FormField::Email,
                "Please enter a valid email address".to_string(),
            );
        }

        if self.address.trim().is_empty() {
            errors.insert(
                FormField::Address,
                "Delivery address is required".to_string(),
            );
        }

        if self.city.trim().is_empty() {
            errors.insert(FormField::City, "City is required".to_string());
        }

        if self.state.trim().is_empty() {
            errors.insert(FormField::State, "State is required".to_string());
        }

        if self.pincode.trim().is_empty() {
            errors.insert(FormField::Pincode, "Pincode is required".to_string());
        } else if !is_exactly_digits(&self.pincode, 6) {
            errors.insert(
                FormField::Pincode,
                "Please enter a valid 6-digit pincode".to_string(),
            );
        }

        errors
    }
}

/// Phone numbers may contain spaces; the digits must be exactly 10.
fn is_valid_phone(value: &str) -> bool {
    let digits: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    is_exactly_digits(&digits, 10)
}

fn is_exactly_digits(value: &str, count: usize) -> bool {
    value.len() == count && value.chars().all(|c| c.is_ascii_digit())
}

/// Accepts `local@host.tld` with a non-empty local part and a dot in
/// the domain with characters on both sides.
fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}
