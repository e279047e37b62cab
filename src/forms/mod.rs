//! Stateful form validation.
//!
//! A [`FormController`] binds a [`FormDescriptor`] (field order plus the
//! [`FieldType`] of each field) to the current raw values, the last
//! validation message per field, and the touched flags that decide when a
//! message should be shown. Each wizard step owns one controller; the step
//! controller calls [`FormController::validate_form`] as the gate before
//! advancing.

use std::collections::BTreeMap;

use crate::validation::{validate, FieldType, ValidationContext, ValidationResult};

/// Declarative description of a single form field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub field_type: FieldType,
}

impl FieldSpec {
    pub const fn new(key: &'static str, label: &'static str, field_type: FieldType) -> Self {
        Self {
            key,
            label,
            field_type,
        }
    }
}

/// Named, ordered collection of fields.
#[derive(Debug, Clone)]
pub struct FormDescriptor {
    pub name: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl FormDescriptor {
    pub fn new(name: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self { name, fields }
    }

    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.key == key)
    }
}

/// Which interaction events revalidate a field immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationTriggers {
    pub on_change: bool,
    pub on_blur: bool,
}

impl Default for ValidationTriggers {
    fn default() -> Self {
        Self {
            on_change: true,
            on_blur: true,
        }
    }
}

pub struct FormController {
    descriptor: FormDescriptor,
    initial: BTreeMap<String, String>,
    fields: BTreeMap<String, String>,
    errors: BTreeMap<String, String>,
    touched: BTreeMap<String, bool>,
    validity: BTreeMap<String, bool>,
    triggers: ValidationTriggers,
    country_code: Option<String>,
}

impl FormController {
    /// Creates a controller and runs the initial validation pass so that
    /// [`FormController::is_valid`] is accurate before any interaction.
    pub fn new(descriptor: FormDescriptor, initial: BTreeMap<String, String>) -> Self {
        Self::with_triggers(descriptor, initial, ValidationTriggers::default())
    }

    pub fn with_triggers(
        descriptor: FormDescriptor,
        initial: BTreeMap<String, String>,
        triggers: ValidationTriggers,
    ) -> Self {
        let initial: BTreeMap<String, String> = descriptor
            .fields
            .iter()
            .map(|field| {
                let value = initial.get(field.key).cloned().unwrap_or_default();
                (field.key.to_string(), value)
            })
            .collect();

        let mut controller = Self {
            fields: initial.clone(),
            initial,
            errors: BTreeMap::new(),
            touched: BTreeMap::new(),
            validity: BTreeMap::new(),
            descriptor,
            triggers,
            country_code: None,
        };
        controller.validate_form();
        controller
    }

    pub fn empty(descriptor: FormDescriptor) -> Self {
        Self::new(descriptor, BTreeMap::new())
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn descriptor(&self) -> &FormDescriptor {
        &self.descriptor
    }

    /// Country code passed to phone and postal-code validation. Changing it
    /// revalidates every field so the aggregate stays consistent.
    pub fn set_country_code(&mut self, country_code: Option<&str>) {
        let normalized = country_code
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_ascii_uppercase);
        if normalized != self.country_code {
            self.country_code = normalized;
            self.validate_form();
        }
    }

    pub fn country_code(&self) -> Option<&str> {
        self.country_code.as_deref()
    }

    pub fn handle_change(&mut self, name: &str, value: impl Into<String>) {
        if !self.write_field(name, value.into()) {
            return;
        }
        self.touched.insert(name.to_string(), true);
        if self.triggers.on_change {
            self.validate_field(name);
        }
    }

    pub fn handle_blur(&mut self, name: &str, value: impl Into<String>) {
        if !self.write_field(name, value.into()) {
            return;
        }
        self.touched.insert(name.to_string(), true);
        if self.triggers.on_blur {
            self.validate_field(name);
        }
    }

    /// Programmatic write used when a parent pushes derived data in. Does not
    /// mark the field as touched.
    pub fn set_field_value(&mut self, name: &str, value: impl Into<String>) {
        if !self.write_field(name, value.into()) {
            return;
        }
        if self.triggers.on_change {
            self.validate_field(name);
        }
    }

    /// Revalidates every field and returns the aggregate result.
    pub fn validate_form(&mut self) -> bool {
        let keys: Vec<&'static str> = self.descriptor.fields.iter().map(|f| f.key).collect();
        for key in keys {
            self.validate_field(key);
        }
        self.is_valid()
    }

    /// Restores the initial values and clears errors and touched flags.
    pub fn reset_form(&mut self) {
        self.fields = self.initial.clone();
        self.touched.clear();
        self.errors.clear();
        self.validity.clear();
        let keys: Vec<&'static str> = self.descriptor.fields.iter().map(|f| f.key).collect();
        for key in keys {
            let result = self.run_validator(key);
            self.validity.insert(key.to_string(), result.is_valid);
        }
    }

    /// Fields that have never been validated count as invalid.
    pub fn is_valid(&self) -> bool {
        self.descriptor
            .fields
            .iter()
            .all(|field| self.validity.get(field.key).copied().unwrap_or(false))
    }

    pub fn is_field_valid(&self, name: &str) -> bool {
        self.validity.get(name).copied().unwrap_or(false)
    }

    /// Last validation message for a field, `None` when it passed.
    pub fn field_error(&self, name: &str) -> Option<&str> {
        self.errors
            .get(name)
            .map(String::as_str)
            .filter(|message| !message.is_empty())
    }

    /// Error to display: only reported once the field has been touched.
    pub fn visible_error(&self, name: &str) -> Option<&str> {
        if self.is_touched(name) {
            self.field_error(name)
        } else {
            None
        }
    }

    pub fn is_touched(&self, name: &str) -> bool {
        self.touched.get(name).copied().unwrap_or(false)
    }

    pub fn value(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn touched(&self) -> &BTreeMap<String, bool> {
        &self.touched
    }

    fn write_field(&mut self, name: &str, value: String) -> bool {
        if self.descriptor.field(name).is_none() {
            tracing::warn!(form = self.descriptor.name, field = name, "ignoring unknown field");
            return false;
        }
        self.fields.insert(name.to_string(), value);
        true
    }

    fn validate_field(&mut self, name: &str) {
        let result = self.run_validator(name);
        self.validity.insert(name.to_string(), result.is_valid);
        self.errors.insert(name.to_string(), result.message);
    }

    fn run_validator(&self, name: &str) -> ValidationResult {
        let Some(field) = self.descriptor.field(name) else {
            return ValidationResult::valid();
        };
        let context = ValidationContext::named(field.label).with_country(self.country_code());
        validate(self.value(name), field.field_type, &context)
    }
}
